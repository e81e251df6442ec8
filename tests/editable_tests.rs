use std::sync::Arc;

use live_chart_model::*;
use parking_lot::Mutex;

fn editable_model() -> (UpdateSource, EditableCurveDataModel) {
    let source = UpdateSource::new();
    let mut model = EditableCurveDataModel::new(&source).unwrap();
    source.send(CurveData::new(vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 1.0]).unwrap());
    model.process_pending();
    (source, model)
}

#[test]
fn test_received_data_is_clean() {
    let (_source, model) = editable_model();
    assert_eq!(model.len(), 3);
    assert_eq!(model.edit_state(), EditState::Clean);
    assert!(!model.sendable_state_exists());
    assert!(!model.undoable());
}

#[test]
fn test_replace_selection_undo_redo() {
    let (_source, mut model) = editable_model();
    let selection = model.selection_in_xrange(0.0, 1.0);
    assert_eq!(selection, vec![0, 1]);

    let replacement = CurveData::new(vec![0.0, 1.0], vec![5.0, 5.0]).unwrap();
    model.replace_selection(&selection, &replacement);
    assert_eq!(model.full_data_buffer().y, vec![5.0, 5.0, 1.0]);
    assert_eq!(model.edit_state(), EditState::Dirty);

    assert!(model.undo());
    assert_eq!(model.full_data_buffer().y, vec![1.0, 2.0, 1.0]);
    assert_eq!(model.edit_state(), EditState::Clean);
    assert!(!model.undo(), "the received curve is the oldest state");

    assert!(model.redo());
    assert_eq!(model.full_data_buffer().y, vec![5.0, 5.0, 1.0]);
    assert!(!model.redo());
}

#[test]
fn test_replacement_of_different_length_is_sorted_in() {
    let (_source, mut model) = editable_model();
    let replacement = CurveData::new(vec![1.5, 0.5, 1.0], vec![3.0, 3.0, 3.0]).unwrap();
    model.replace_selection(&[1], &replacement);
    assert_eq!(model.full_data_buffer().x, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
}

#[test]
fn test_selection_in_empty_or_inverted_range() {
    let (_source, model) = editable_model();
    assert!(model.selection_in_xrange(5.0, 6.0).is_empty());
    assert!(model.selection_in_xrange(1.0, 0.0).is_empty());
}

#[test]
fn test_commit_sends_to_handler() {
    let (source, mut model) = editable_model();
    let sent = Arc::new(Mutex::new(Vec::new()));
    let sink = sent.clone();
    source.set_edit_handler(move |curve| {
        sink.lock().push(curve.clone());
        Ok(())
    });
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_sink = events.clone();
    model.subscribe(move |event| events_sink.lock().push(event.clone()));

    assert!(!model.commit(), "nothing to send yet");

    model.replace_selection(&[2], &CurveData::new(vec![2.0], vec![9.0]).unwrap());
    assert!(model.commit());
    let expected = CurveData::new(vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 9.0]).unwrap();
    assert_eq!(*sent.lock(), vec![expected.clone()]);
    assert_eq!(events.lock().last(), Some(&ModelEvent::Edited(expected)));
    assert_eq!(model.edit_state(), EditState::Clean);

    assert!(model.undo());
    assert_eq!(model.edit_state(), EditState::Dirty, "the committed state moved on");
}

#[test]
fn test_failing_commit_keeps_edits() {
    let (source, mut model) = editable_model();
    source.set_edit_handler(|_| Err(eyre::eyre!("device refused the curve")));
    model.replace_selection(&[0], &CurveData::new(vec![0.0], vec![0.0]).unwrap());
    assert!(!model.commit());
    assert_eq!(model.edit_state(), EditState::Dirty);

    source.clear_edit_handler();
    assert!(model.commit(), "without a handler the edit is accepted");
    assert_eq!(model.edit_state(), EditState::Clean);
}

#[test]
fn test_handle_editing_records_history() {
    let (_source, mut model) = editable_model();
    let edited = CurveData::new(vec![0.0, 1.0], vec![3.0, 3.0]).unwrap();
    model.handle_editing(&edited);
    assert_eq!(model.full_data_buffer(), edited);
    assert!(model.sendable_state_exists());
    assert_eq!(model.history().len(), 2);

    assert!(model.undo());
    assert_eq!(model.len(), 3);
}

#[test]
fn test_new_data_from_source_replaces_edits() {
    let (source, mut model) = editable_model();
    model.replace_selection(&[0], &CurveData::new(vec![0.0], vec![7.0]).unwrap());
    source.send(CurveData::new(vec![10.0], vec![1.0]).unwrap());
    source.send(BarData::new(1.0, 0.0, 1.0));
    model.process_pending();
    assert_eq!(model.full_data_buffer(), CurveData::new(vec![10.0], vec![1.0]).unwrap());
    assert_eq!(model.edit_state(), EditState::Clean);
    assert!(model.undoable(), "the edit before the update can still be restored");
}

#[test]
fn test_history_capacity() {
    let source = UpdateSource::new();
    let mut model = EditableCurveDataModel::with_history_capacity(&source, 3).unwrap();
    model.handle_data(&CurveData::new(vec![0.0], vec![0.0]).unwrap().into());
    for y in 1..6 {
        model.handle_editing(&CurveData::new(vec![0.0], vec![y as f64]).unwrap());
    }
    assert_eq!(model.history().len(), 3);
    assert!(model.undo());
    assert!(model.undo());
    assert!(!model.undo());
    assert_eq!(model.full_data_buffer().y, vec![3.0]);
}

#[test]
fn test_curve_with_gap_is_clean_after_receive_and_commit() {
    let source = UpdateSource::new();
    let mut model = EditableCurveDataModel::new(&source).unwrap();
    source.send(CurveData::new(vec![0.0, 1.0, 2.0], vec![1.0, f64::NAN, 1.0]).unwrap());
    model.process_pending();
    assert_eq!(model.len(), 3);
    assert_eq!(model.edit_state(), EditState::Clean);
    assert!(!model.commit(), "nothing to send yet");

    model.replace_selection(&[2], &CurveData::new(vec![2.0], vec![4.0]).unwrap());
    assert_eq!(model.edit_state(), EditState::Dirty);
    assert!(model.commit());
    assert_eq!(model.edit_state(), EditState::Clean);
    assert!(!model.sendable_state_exists());
}
