use super::*;
use crate::config::IndexConfig;
use crate::source::MemoryTable;

use proptest::prelude::*;

type Row = [String; 2];

#[derive(Clone, Debug)]
enum Op {
    SetTerm(String),
    SetCell(usize, usize, String),
    SetRows(usize, Vec<Row>),
    Insert(usize, Vec<Row>),
    Delete(usize, usize),
    Trim,
}

fn cell() -> impl Strategy<Value = String> + Clone {
    "[abcA]{0,4}"
}

fn row() -> impl Strategy<Value = Row> + Clone {
    (cell(), cell()).prop_map(|(a, b)| [a, b])
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        10 => "[abA]{0,3}".prop_map(Op::SetTerm),
        30 => (any::<usize>(), 0usize..2, cell()).prop_map(|(r, c, v)| Op::SetCell(r, c, v)),
        20 => (any::<usize>(), prop::collection::vec(row(), 1..4)).prop_map(|(r, rs)| Op::SetRows(r, rs)),
        20 => (any::<usize>(), prop::collection::vec(row(), 1..4)).prop_map(|(r, rs)| Op::Insert(r, rs)),
        15 => (any::<usize>(), 1usize..4).prop_map(|(r, n)| Op::Delete(r, n)),
        5 => Just(Op::Trim),
    ];
    prop::collection::vec(op, 0..60)
}

fn depth_strategy() -> impl Strategy<Value = Option<usize>> {
    prop_oneof![Just(None), Just(Some(0)), Just(Some(1)), Just(Some(3))]
}

/// Brute-force filter: backing rows with a cell containing `term`.
fn expected_rows(table: &MemoryTable, term: &str) -> Vec<usize> {
    let term = term.to_lowercase();
    (0..table.row_count())
        .filter(|&r| {
            term.is_empty()
                || (0..table.column_count()).any(|c| {
                    table
                        .get(r, c)
                        .is_some_and(|v| v.to_lowercase().contains(&term))
                })
        })
        .collect()
}

/// Apply `events` to `shadow`, the visible row ids before the operation.
/// Every row an event touches must be one the operation touched.
fn replay(
    shadow: &mut Vec<u64>,
    events: &[ViewEvent],
    now: &[u64],
    touched: &[u64],
) -> std::result::Result<(), TestCaseError> {
    for event in events {
        match *event {
            ViewEvent::Reset => *shadow = now.to_vec(),
            ViewEvent::RowsInserted { first, last } => {
                prop_assert!(first <= last && first <= shadow.len() && last < now.len());
                for id in &now[first..=last] {
                    prop_assert!(touched.contains(id), "inserted untouched row {}", id);
                }
                shadow.splice(first..first, now[first..=last].iter().copied());
            }
            ViewEvent::RowsDeleted { first, last } => {
                prop_assert!(first <= last && last < shadow.len());
                for id in &shadow[first..=last] {
                    prop_assert!(touched.contains(id), "deleted untouched row {}", id);
                }
                shadow.drain(first..=last);
            }
            ViewEvent::CellsUpdated { first, last, .. } => {
                prop_assert!(first <= last && last < shadow.len());
                for id in &shadow[first..=last] {
                    prop_assert!(touched.contains(id), "updated untouched row {}", id);
                }
            }
        }
    }
    prop_assert_eq!(&shadow[..], now);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_events_replay_to_current_view(
        initial in prop::collection::vec(row(), 0..12),
        ops in ops_strategy(),
        depth in depth_strategy(),
        forward in any::<bool>(),
    ) {
        let mut table = MemoryTable::new(2);
        table.insert_rows(0, initial.clone()).unwrap();
        // Stable identity for each backing row, parallel to `table`.
        let mut ids: Vec<u64> = (0..initial.len() as u64).collect();
        let mut next_id = ids.len() as u64;

        let config = ViewConfig {
            index: IndexConfig::default().base_depth(depth),
            forward_content_updates: forward,
        };
        let mut view = FilterView::with_config(&table, config).unwrap();
        let mut term = String::new();

        for op in ops {
            let visible_ids = |view: &FilterView, ids: &[u64]| -> Vec<u64> {
                view.visible_rows().iter().map(|&r| ids[r]).collect()
            };
            let mut shadow = visible_ids(&view, &ids);
            let rows = table.row_count();

            let (events, touched): (ViewChanges, Vec<u64>) = match op {
                Op::SetTerm(t) => {
                    term = t;
                    (view.set_search_term(&term).unwrap(), ids.clone())
                }
                Op::SetCell(r, c, v) => {
                    if rows == 0 {
                        continue;
                    }
                    let r = r % rows;
                    let event = table.set_value(r, c, v).unwrap();
                    (view.handle(&table, event).unwrap(), vec![ids[r]])
                }
                Op::SetRows(r, new_rows) => {
                    if rows == 0 {
                        continue;
                    }
                    let first = r % rows;
                    let last = (first + new_rows.len() - 1).min(rows - 1);
                    for (row, values) in (first..=last).zip(new_rows) {
                        table.set_row(row, values).unwrap();
                    }
                    let event = SourceEvent::RowsUpdated { first, last };
                    (view.handle(&table, event).unwrap(), ids[first..=last].to_vec())
                }
                Op::Insert(r, new_rows) => {
                    let at = r % (rows + 1);
                    let count = new_rows.len() as u64;
                    let event = table.insert_rows(at, new_rows).unwrap().unwrap();
                    let new_ids: Vec<u64> = (next_id..next_id + count).collect();
                    next_id += count;
                    ids.splice(at..at, new_ids.iter().copied());
                    (view.handle(&table, event).unwrap(), new_ids)
                }
                Op::Delete(r, n) => {
                    if rows == 0 {
                        continue;
                    }
                    let first = r % rows;
                    let last = (first + n - 1).min(rows - 1);
                    let event = table.remove_rows(first, last).unwrap();
                    let gone: Vec<u64> = ids.drain(first..=last).collect();
                    (view.handle(&table, event).unwrap(), gone)
                }
                Op::Trim => {
                    view.trim_index_to_base_depth().unwrap();
                    (ViewChanges::new(), Vec::new())
                }
            };

            prop_assert_eq!(view.visible_rows(), &expected_rows(&table, &term)[..]);
            let now = visible_ids(&view, &ids);
            replay(&mut shadow, &events, &now, &touched)?;
        }

        if !term.is_empty() {
            let needle = term.to_lowercase();
            for pos in 0..view.row_count() {
                let row = view.row_in_backing_model(pos).unwrap();
                for column in 0..table.column_count() {
                    let contains = table
                        .get(row, column)
                        .is_some_and(|v| v.to_lowercase().contains(&needle));
                    prop_assert_eq!(view.is_cell_matching(pos, column).unwrap(), contains);
                }
            }
        }
    }
}
