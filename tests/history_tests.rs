use live_chart_model::{History, MAX_ROLLBACK};

#[test]
fn test_empty_history() {
    let mut history = History::<i32>::new();
    assert!(history.is_empty());
    assert_eq!(history.current_index(), None);
    assert_eq!(history.current_state(), None);
    assert!(!history.undoable());
    assert!(!history.redoable());
    assert_eq!(history.undo(), None);
    assert_eq!(history.redo(), None);
}

#[test]
fn test_single_state_is_not_undoable() {
    let mut history = History::new();
    history.save_state(1);
    assert_eq!(history.current_state(), Some(&1));
    assert!(!history.undoable(), "there is nothing before the first state");
    assert!(!history.redoable());
}

#[test]
fn test_undo_redo_return_new_current_state() {
    let mut history = History::new();
    for state in 0..4 {
        history.save_state(state);
    }
    assert_eq!(history.undo(), Some(&2));
    assert_eq!(history.undo(), Some(&1));
    assert!(history.redoable());
    assert_eq!(history.redo(), Some(&2));
    assert_eq!(history.redo(), Some(&3));
    assert_eq!(history.redo(), None, "already at the newest state");
    assert_eq!(history.current_state(), Some(&3));
}

#[test]
fn test_round_trip_back_to_initial_state() {
    let mut history = History::new();
    history.save_state("initial".to_string());
    let n = 10;
    for i in 0..n {
        history.save_state(format!("state {i}"));
    }
    for _ in 0..n {
        assert!(history.undo().is_some());
    }
    assert_eq!(history.current_state().map(String::as_str), Some("initial"));

    let before = history.current_state().cloned();
    history.redo();
    history.undo();
    assert_eq!(history.current_state().cloned(), before, "undo after redo restores the state");
}

#[test]
fn test_fork_discards_redo_branch() {
    let mut history = History::new();
    for state in [1, 2, 3, 4] {
        history.save_state(state);
    }
    history.undo();
    history.undo();
    assert_eq!(history.current_state(), Some(&2));

    history.save_state(10);
    history.save_state(11);
    let states: Vec<i32> = history.iter().copied().collect();
    assert_eq!(states, vec![1, 2, 10, 11]);
    assert!(!history.redoable());
    assert_eq!(history.current_index(), Some(3));
}

#[test]
fn test_exceed_max_rollbacks() {
    let mut history = History::new();
    assert_eq!(history.capacity(), MAX_ROLLBACK);
    for state in 0..MAX_ROLLBACK + 9 {
        history.save_state(state);
    }
    assert_eq!(history.len(), MAX_ROLLBACK);
    assert_eq!(history.current_state(), Some(&(MAX_ROLLBACK + 8)));
    for _ in 0..MAX_ROLLBACK - 1 {
        assert!(history.undo().is_some());
    }
    assert_eq!(history.current_state(), Some(&9), "the oldest states were dropped");
    assert_eq!(history.undo(), None);
}

#[test]
fn test_pointer_stays_on_rollover() {
    let mut history = History::with_capacity(3);
    for state in [1, 2, 3] {
        history.save_state(state);
    }
    assert_eq!(history.current_index(), Some(2));
    history.save_state(4);
    assert_eq!(history.current_index(), Some(2), "the pointer does not advance on rollover");
    assert_eq!(history.current_state(), Some(&4));
    assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
}

#[test]
fn test_clear() {
    let mut history = History::new();
    history.save_state(1);
    history.save_state(2);
    history.clear();
    assert!(history.is_empty());
    assert_eq!(history.current_state(), None);
    assert!(!history.undoable());
}
