use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Add(String, u8),
    Remove(String, u8),
    Get(String, usize),
}

fn word_strategy() -> impl Strategy<Value = String> + Clone {
    // A tiny alphabet forces shared prefixes, splits and merges.
    "[abc]{1,6}"
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let word = word_strategy();
    let op = prop_oneof![
        50 => (word.clone(), 0u8..8).prop_map(|(k, v)| Op::Add(k, v)),
        30 => (word.clone(), 0u8..8).prop_map(|(k, v)| Op::Remove(k, v)),
        20 => ("[abc]{0,3}", 0usize..6).prop_map(|(q, n)| Op::Get(q, n)),
    ];
    prop::collection::vec(op, 0..=300)
}

fn terminated(k: &str) -> String {
    format!("{k}{TERMINATOR}")
}

/// Values whose key starts with `query`, ordered by terminated key: the
/// terminator sorts after every letter, so "abc" comes before "ab".
fn model_get(model: &BTreeMap<String, BTreeSet<u8>>, query: &str) -> Vec<u8> {
    let mut hits: Vec<(String, &BTreeSet<u8>)> = model
        .iter()
        .filter(|(k, _)| k.starts_with(query))
        .map(|(k, vs)| (terminated(k), vs))
        .collect();
    hits.sort_by(|a, b| a.0.cmp(&b.0));
    hits.into_iter()
        .flat_map(|(_, vs)| vs.iter().copied())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t: RadixTree<u8> = RadixTree::new();
        let mut m: BTreeMap<String, BTreeSet<u8>> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Add(k, v) => {
                    let added_t = t.add(&terminated(&k), v).unwrap();
                    let added_m = m.entry(k).or_default().insert(v);
                    prop_assert_eq!(added_t, added_m);
                }
                Op::Remove(k, v) => {
                    let removed_t = t.remove(&terminated(&k), &v).unwrap();
                    let removed_m = match m.get_mut(&k) {
                        Some(vs) => {
                            let r = vs.remove(&v);
                            if vs.is_empty() {
                                m.remove(&k);
                            }
                            r
                        }
                        None => false,
                    };
                    prop_assert_eq!(removed_t, removed_m);
                }
                Op::Get(q, n) => {
                    let mut got = Vec::new();
                    let accepted = t.get_bounded(&q, &mut got, n);
                    let mut expected = model_get(&m, &q);
                    expected.truncate(n);
                    prop_assert_eq!(accepted, expected.len());
                    prop_assert_eq!(got, expected);
                }
            }
            prop_assert_eq!(t.len(), m.len());
        }

        let issues = t.verify_integrity();
        prop_assert!(issues.is_empty(), "{:?}", issues);
        let keys: BTreeSet<String> = t.keys().into_iter().collect();
        let expected: BTreeSet<String> = m.keys().cloned().collect();
        prop_assert_eq!(keys, expected);
    }

    #[test]
    fn prop_prefix_containment(words in prop::collection::vec(word_strategy(), 1..40)) {
        let mut t: RadixTree<usize> = RadixTree::new();
        for (i, w) in words.iter().enumerate() {
            t.add(&terminated(w), i).unwrap();
        }
        for (i, w) in words.iter().enumerate() {
            for end in 0..=w.len() {
                let mut found = BTreeSet::new();
                t.get(&w[..end], &mut found);
                prop_assert!(found.contains(&i), "{:?} under {:?}", i, &w[..end]);
            }
        }
    }

    #[test]
    fn prop_bounded_results(words in prop::collection::vec(word_strategy(), 0..40), n in 0usize..10) {
        let mut t: RadixTree<usize> = RadixTree::new();
        for (i, w) in words.iter().enumerate() {
            t.add(&terminated(w), i).unwrap();
        }
        let mut found = Vec::new();
        let accepted = t.get_bounded("", &mut found, n);
        prop_assert!(found.len() <= n);
        prop_assert_eq!(accepted, found.len());
    }

    #[test]
    fn prop_remove_everything_leaves_empty_root(words in prop::collection::vec(word_strategy(), 0..40)) {
        let mut t: RadixTree<usize> = RadixTree::new();
        for (i, w) in words.iter().enumerate() {
            t.add(&terminated(w), i).unwrap();
        }
        for (i, w) in words.iter().enumerate().rev() {
            prop_assert!(t.remove(&terminated(w), &i).unwrap());
            let issues = t.verify_integrity();
            prop_assert!(issues.is_empty(), "{:?}", issues);
        }
        prop_assert!(t.is_empty());
        prop_assert_eq!(t.node_count(), 0);
    }
}
