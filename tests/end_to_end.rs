use std::collections::BTreeSet;

use rowsift::radix::{KeyCollector, NodeCounter};
use rowsift::{
    ColumnScope, FilterView, MemoryTable, RadixTree, SourceEvent, ViewConfig, ViewEvent,
    TERMINATOR,
};

fn key(s: &str) -> String {
    format!("{s}{TERMINATOR}")
}

#[test]
fn trie_cat_car_cap() {
    let mut tree: RadixTree<&str> = RadixTree::new();
    tree.add(&key("cat"), "A").unwrap();
    tree.add(&key("car"), "B").unwrap();
    tree.add(&key("cap"), "C").unwrap();

    let mut all = Vec::new();
    assert_eq!(tree.get("ca", &mut all), 3);
    assert_eq!(all, vec!["C", "B", "A"]);

    let mut two = Vec::new();
    assert_eq!(tree.get_bounded("ca", &mut two, 2), 2);
    assert_eq!(two.len(), 2);

    assert_eq!(tree.node_count(), 4);
    let mut counter = NodeCounter::new();
    tree.accept(&mut counter);
    assert_eq!(counter.count(), 5);

    let mut collector = KeyCollector::new();
    tree.accept(&mut collector);
    let keys: BTreeSet<String> = collector.into_keys().into_iter().collect();
    let expected: BTreeSet<String> = ["cat", "car", "cap"].map(String::from).into();
    assert_eq!(keys, expected);
}

#[test]
fn fruit_filter_and_clear() {
    let table = MemoryTable::single_column(["apple", "banana", "grape"]);
    let mut view = FilterView::new(&table).unwrap();

    view.set_search_term("an").unwrap();
    let visible: Vec<_> = (0..view.row_count())
        .map(|pos| view.value_at(&table, pos, 0).unwrap().unwrap().into_owned())
        .collect();
    assert_eq!(visible, vec!["banana"]);

    let mut events: Vec<ViewEvent> = Vec::new();
    for event in view.clear_search().unwrap() {
        events.push(event);
    }
    assert_eq!(events, vec![ViewEvent::Reset]);
    assert_eq!(view.row_count(), 3);
}

#[test]
fn contiguous_reveal_is_one_insert() {
    let mut table = MemoryTable::single_column(["x1", "y2", "y3", "y4", "x5"]);
    let mut view = FilterView::new(&table).unwrap();
    view.set_search_term("x").unwrap();
    assert_eq!(view.visible_rows(), &[0, 4]);

    for row in 1..=3 {
        table.set_value(row, 0, format!("x{row}")).unwrap();
    }
    let changes = view
        .handle(
            &table,
            SourceEvent::CellsUpdated {
                first: 1,
                last: 3,
                column: 0,
            },
        )
        .unwrap();
    assert_eq!(changes.as_slice(), &[ViewEvent::RowsInserted { first: 1, last: 3 }]);
    assert_eq!(view.visible_rows(), &[0, 1, 2, 3, 4]);
}

#[test]
fn mixed_visibility_change_is_one_reset() {
    let mut table = MemoryTable::single_column(["x1", "y2", "x3"]);
    let mut view = FilterView::new(&table).unwrap();
    view.set_search_term("x").unwrap();

    table.set_value(0, 0, "y1").unwrap();
    table.set_value(1, 0, "x2").unwrap();
    let changes = view
        .handle(&table, SourceEvent::RowsUpdated { first: 0, last: 1 })
        .unwrap();
    assert_eq!(changes.as_slice(), &[ViewEvent::Reset]);
    assert_eq!(view.visible_rows(), &[1, 2]);
}

#[test]
fn unchanged_outcome_is_silent() {
    let mut table = MemoryTable::single_column(["x1", "y2", "x3"]);
    let mut view = FilterView::new(&table).unwrap();
    view.set_search_term("x").unwrap();

    let event = table.set_value(1, 0, "z2").unwrap();
    assert!(view.handle(&table, event).unwrap().is_empty());

    let mut repainting = FilterView::with_config(
        &table,
        ViewConfig {
            forward_content_updates: true,
            ..ViewConfig::default()
        },
    )
    .unwrap();
    repainting.set_search_term("x").unwrap();
    let event = table.set_value(2, 0, "x33").unwrap();
    assert_eq!(
        repainting.handle(&table, event).unwrap().as_slice(),
        &[ViewEvent::CellsUpdated {
            first: 1,
            last: 1,
            column: ColumnScope::Column(0)
        }]
    );
}

#[test]
fn long_session_stays_consistent() {
    let mut table = MemoryTable::from_rows(vec![
        vec!["Order 1001", "shipped"],
        vec!["Order 1002", "pending"],
        vec!["Order 1003", "shipped"],
    ]);
    let mut view = FilterView::new(&table).unwrap();
    view.set_search_term("SHIP").unwrap();
    assert_eq!(view.visible_rows(), &[0, 2]);

    let event = table
        .insert_rows(3, [["Order 1004", "shipped"], ["Order 1005", "pending"]])
        .unwrap()
        .unwrap();
    assert_eq!(
        view.handle(&table, event).unwrap().as_slice(),
        &[ViewEvent::RowsInserted { first: 2, last: 2 }]
    );

    let event = table.set_value(1, 1, "shipped").unwrap();
    assert_eq!(
        view.handle(&table, event).unwrap().as_slice(),
        &[ViewEvent::RowsInserted { first: 1, last: 1 }]
    );
    assert_eq!(view.visible_rows(), &[0, 1, 2, 3]);

    let event = table.remove_rows(0, 1).unwrap();
    assert_eq!(
        view.handle(&table, event).unwrap().as_slice(),
        &[ViewEvent::RowsDeleted { first: 0, last: 1 }]
    );
    assert_eq!(view.visible_rows(), &[0, 1]);
    assert!(view.is_cell_matching(0, 1).unwrap());
    assert!(!view.is_cell_matching(0, 0).unwrap());

    view.set_search_term("order 100").unwrap();
    assert_eq!(view.row_count(), 3);
    view.trim_index_to_base_depth().unwrap();
    assert_eq!(view.indexer().depth(), Some(3));
}
