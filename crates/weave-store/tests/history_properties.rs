//! Property tests for record history through the public store API.

use proptest::prelude::*;
use weave_core::Value;
use weave_store::{HistoryConfig, ModelStore};

fn distinct_values(max: usize) -> impl Strategy<Value = Vec<i64>> {
    proptest::collection::btree_set(any::<i64>(), 1..max)
        .prop_map(|set| set.into_iter().collect())
}

proptest! {
    #[test]
    fn undo_n_then_redo_n_round_trips(values in distinct_values(15), undos in 0usize..20) {
        let store = ModelStore::new();
        for v in &values {
            store.set("n", Value::Int(*v)).unwrap();
        }
        let before = store.get("n");
        let steps = undos.min(values.len() - 1);

        for _ in 0..steps {
            prop_assert!(store.undo("n"));
        }
        prop_assert_eq!(store.get("n"), Some(Value::Int(values[values.len() - 1 - steps])));
        for _ in 0..steps {
            prop_assert!(store.redo("n"));
        }
        prop_assert_eq!(store.get("n"), before);
        prop_assert!(!store.can_redo("n"));
    }

    #[test]
    fn history_never_exceeds_depth(depth in 1usize..8, values in distinct_values(40)) {
        let store = ModelStore::with_config(HistoryConfig::with_max_depth(depth));
        for v in &values {
            store.set("n", Value::Int(*v)).unwrap();
            prop_assert!(store.history_len("n").unwrap() <= depth);
        }
        let kept = values.len().min(depth);
        prop_assert_eq!(store.history_len("n"), Some(kept));

        prop_assert_eq!(store.rewind("n"), kept > 1);
        prop_assert_eq!(store.get("n"), Some(Value::Int(values[values.len() - kept])));
    }

    #[test]
    fn restores_never_append(values in distinct_values(10), moves in proptest::collection::vec(0u8..4, 0..30)) {
        let store = ModelStore::new();
        for v in &values {
            store.set("n", Value::Int(*v)).unwrap();
        }
        let len = store.history_len("n");
        for m in moves {
            match m {
                0 => { store.undo("n"); }
                1 => { store.redo("n"); }
                2 => { store.rewind("n"); }
                _ => { store.fast_forward("n"); }
            }
            prop_assert_eq!(store.history_len("n"), len);
        }
    }
}

#[test]
fn set_after_undo_discards_redo_tail() {
    let store = ModelStore::new();
    for n in 0..4 {
        store.set("n", n.into()).unwrap();
    }
    store.undo("n");
    store.undo("n");
    store.set("n", 99.into()).unwrap();

    assert!(!store.can_redo("n"));
    assert_eq!(store.history_len("n"), Some(3));
    assert!(store.undo("n"));
    assert_eq!(store.get("n"), Some(Value::Int(1)));
}
