use std::sync::Arc;

use live_chart_model::*;
use parking_lot::Mutex;
use serde_json::json;

fn curve_source(n: usize) -> (UpdateSource, LiveCurveDataModel) {
    let source = UpdateSource::new();
    let mut model = LiveCurveDataModel::new(&source).unwrap();
    for i in 0..n {
        source.send(PointData::new(i as f64, i as f64));
    }
    model.process_pending();
    (source, model)
}

fn recorder<F>(subscribe: F) -> Arc<Mutex<Vec<ModelEvent>>>
where
    F: FnOnce(Box<dyn Fn(&ModelEvent) + Send>),
{
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    subscribe(Box::new(move |event: &ModelEvent| sink.lock().push(event.clone())));
    events
}

#[test]
fn test_builder_requires_source() {
    let result = LiveCurveDataModel::builder().buffer_size(10).build();
    assert!(matches!(result, Err(DataModelError::MissingDataSource)));
}

#[test]
fn test_builder_rejects_zero_capacity() {
    let source = UpdateSource::new();
    let result = LiveBarDataModel::builder().source(&source).buffer_size(0).build();
    assert!(matches!(result, Err(DataModelError::InvalidConfiguration(_))));
}

#[test]
fn test_model_lifecycle() {
    let source = UpdateSource::new();
    let mut model = LiveCurveDataModel::new(&source).unwrap();
    assert_eq!(model.state(), ModelState::Idle);
    assert_eq!(source.subscriber_count(), 1);

    source.send(PointData::new(1.0, 1.0));
    source.send(PointData::new(2.0, 1.0));
    assert_eq!(model.len(), 0, "nothing is applied before processing");
    assert_eq!(model.process_pending(), 2);
    assert_eq!(model.state(), ModelState::Receiving);
    assert_eq!(model.len(), 2);

    model.dispose();
    assert_eq!(model.state(), ModelState::Disposed);
    assert_eq!(source.subscriber_count(), 0);
    source.send(PointData::new(3.0, 1.0));
    assert_eq!(model.process_pending(), 0);
    assert!(!model.handle_data(&PointData::new(4.0, 1.0).into()));
    assert_eq!(model.len(), 2);
}

#[test]
fn test_buffer_size_limits_live_model() {
    let source = UpdateSource::new();
    let mut model = LiveCurveDataModel::builder()
        .source(&source)
        .buffer_size(3)
        .build()
        .unwrap();
    for i in 0..5 {
        source.send(PointData::new(i as f64, 0.0));
    }
    model.process_pending();
    assert_eq!(model.full_data_buffer().x, vec![2.0, 3.0, 4.0]);

    model.set_buffer_size(2).unwrap();
    assert_eq!(model.buffer_size(), 2);
    assert_eq!(model.full_data_buffer().x, vec![3.0, 4.0]);
    assert!(model.set_buffer_size(0).is_err());
}

#[test]
fn test_non_fitting_data_is_ignored() {
    let source = UpdateSource::new();
    let mut curve = LiveCurveDataModel::new(&source).unwrap();
    let mut bars = LiveBarDataModel::new(&source).unwrap();

    source.send(BarData::new(1.0, 0.0, 2.0));
    source.send(PointData::new(1.0, 3.0));
    curve.process_pending();
    bars.process_pending();

    assert_eq!(curve.full_data_buffer(), CurveData::new(vec![1.0], vec![3.0]).unwrap());
    assert_eq!(
        bars.full_data_buffer(),
        BarCollectionData::new(vec![1.0], vec![0.0], vec![2.0]).unwrap()
    );
    assert!(!bars.handle_data(&PlottingItemData::Gap), "bars have no gaps");
}

#[test]
fn test_invalid_entries_are_filtered() {
    let (_source, mut model) = curve_source(0);
    let curve = CurveData::new(vec![0.0, f64::NAN, 2.0], vec![1.0, 1.0, 1.0]).unwrap();
    assert!(model.handle_data(&curve.into()));
    assert_eq!(model.full_data_buffer().x, vec![0.0, 2.0]);

    assert!(!model.handle_data(&PointData::new(f64::NAN, 5.0).into()));
    assert_eq!(model.len(), 2);

    let mut markers = LiveTimestampMarkerDataModel::new(&UpdateSource::new()).unwrap();
    assert!(!markers.handle_data(&TimestampMarkerData::new(f64::NAN, "r", "lost").into()));
    assert!(markers.is_empty());
}

#[test]
fn test_ragged_collections_are_skipped() {
    let (source, mut model) = curve_source(1);
    let events = recorder(|listener| {
        model.subscribe(listener);
    });
    source.send(CurveData {
        x: vec![1.0, 2.0],
        y: vec![1.0],
    });
    assert_eq!(model.process_pending(), 1);
    assert_eq!(model.len(), 1);
    assert!(events.lock().is_empty());

    let mut bars = LiveInjectionBarDataModel::new(&source).unwrap();
    let mut static_bars = StaticInjectionBarDataModel::new(&source);
    source.send(InjectionBarCollectionData {
        x: vec![1.0, 2.0],
        y: vec![1.0, 1.0],
        heights: vec![1.0, 1.0],
        widths: vec![1.0, 1.0],
        labels: vec![],
    });
    assert_eq!(bars.process_pending(), 1);
    assert!(bars.is_empty());
    assert_eq!(static_bars.process_pending(), 1);
    assert!(static_bars.is_empty());

    let short_bars: PlottingItemData = BarCollectionData {
        x: vec![1.0],
        y: vec![],
        heights: vec![1.0],
    }
    .into();
    let mut live_bars = LiveBarDataModel::new(&source).unwrap();
    let mut static_bar_graph = StaticBarDataModel::new(&source);
    assert!(!live_bars.handle_data(&short_bars));
    assert!(!static_bar_graph.handle_data(&short_bars));
    assert!(live_bars.is_empty() && static_bar_graph.is_empty());
}

#[test]
fn test_repeated_gap_does_not_notify() {
    let (source, mut model) = curve_source(2);
    let events = recorder(|listener| {
        model.subscribe(listener);
    });
    source.send_gap();
    source.send_gap();
    model.process_pending();
    assert_eq!(*events.lock(), vec![ModelEvent::DataChanged]);
    assert_eq!(model.len(), 3);
}

#[test]
fn test_out_of_order_points_are_sorted() {
    let (source, mut model) = curve_source(0);
    for x in [3.0, 1.0, 2.0, 0.0] {
        source.send(PointData::new(x, x * 10.0));
    }
    model.process_pending();
    let curve = model.full_data_buffer();
    assert_eq!(curve.x, vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(curve.y, vec![0.0, 10.0, 20.0, 30.0]);
}

#[test]
fn test_gap_from_source() {
    let (source, mut model) = curve_source(2);
    source.send_gap();
    source.send(PointData::new(2.0, 2.0));
    source.send(PointData::gap());
    source.send(PointData::new(3.0, 3.0));
    model.process_pending();

    let curve = model.full_data_buffer();
    assert_eq!(curve.x, vec![0.0, 1.0, 1.0, 2.0, 2.0, 3.0]);
    assert!(curve.y[2].is_nan() && curve.y[4].is_nan());

    let subset = model.subset_for_xrange(1.5, 3.0);
    assert_eq!(subset.x, vec![2.0, 2.0, 3.0]);
    assert_eq!(subset.leading, 0, "padding does not reach across a gap");
}

#[test]
fn test_bar_collection_round_trip() {
    let source = UpdateSource::new();
    let mut model = StaticBarDataModel::new(&source);
    let bars = BarCollectionData::new(
        vec![10.0, 20.0, 30.0],
        vec![0.0, 1.0, 2.0],
        vec![3.0, 4.0, 5.0],
    )
    .unwrap();
    source.send(bars.clone());
    assert_eq!(model.process_pending(), 1);
    assert_eq!(model.full_data_buffer(), bars);
}

#[test]
fn test_curve_subset_keeps_one_point_before_window() {
    let (_source, model) = curve_source(10);
    let subset = model.subset_for_xrange(2.5, 5.5);
    assert_eq!(subset.x, vec![2.0, 3.0, 4.0, 5.0]);
    assert_eq!(subset.columns.y, vec![2.0, 3.0, 4.0, 5.0]);
    assert_eq!(subset.leading, 1);
    assert_eq!(subset.trailing, 0);
    assert_eq!(subset.window_range(), 1..4);
}

#[test]
fn test_bar_and_marker_padding() {
    let source = UpdateSource::new();
    let mut bars = LiveBarDataModel::new(&source).unwrap();
    let mut markers = LiveTimestampMarkerDataModel::new(&source).unwrap();
    for i in 0..10 {
        source.send(BarData::new(i as f64, 0.0, 1.0));
        source.send(TimestampMarkerData::new(i as f64, "r", format!("m{i}")));
    }
    bars.process_pending();
    markers.process_pending();

    let subset = bars.subset_for_xrange(2.5, 5.5);
    assert_eq!(subset.x, vec![2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!((subset.leading, subset.trailing), (1, 1));

    let subset = markers.subset_for_xrange(2.5, 5.5);
    assert_eq!(subset.x, vec![3.0, 4.0, 5.0]);
    assert_eq!(subset.columns.labels, vec!["m3", "m4", "m5"]);
}

#[test]
fn test_subset_for_time_span() {
    let (source, mut model) = curve_source(10);
    let span = TimeSpan::new(5.0, 1.0).unwrap();
    let subset = model.subset_for_time_span(&span);
    assert_eq!(subset.x, vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    assert_eq!(subset.window_range(), 1..6);

    source.send_timestamp(20.0);
    model.process_pending();
    assert_eq!(model.latest_timestamp(), Some(20.0));
    let subset = model.subset_for_time_span(&span);
    assert!(subset.window_range().is_empty(), "no data within [15, 19]");

    let subset = model.subset_for_time_span(&TimeSpan::unbounded());
    assert_eq!(subset.len(), 10);
}

#[test]
fn test_time_span_on_empty_model() {
    let (_source, model) = curve_source(0);
    assert_eq!(model.latest_timestamp(), None);
    assert!(model.subset_for_time_span(&TimeSpan::default_window()).is_empty());
}

#[test]
fn test_interpolated_subset_through_model() {
    let (_source, model) = curve_source(4);
    let curve = model.subset_for_xrange_interpolated(0.5, 2.5);
    assert_eq!(curve.x, vec![0.5, 1.0, 2.0, 2.5]);
    assert_eq!(curve.y, vec![0.5, 1.0, 2.0, 2.5]);
}

#[test]
fn test_min_dx_and_max_primary_val() {
    let source = UpdateSource::new();
    let mut model = LiveBarDataModel::new(&source).unwrap();
    assert_eq!(model.max_primary_val(), None);
    assert!(model.min_dx().is_infinite());
    for x in [0.0, 3.0, 1.0] {
        source.send(BarData::new(x, 0.0, 1.0));
    }
    model.process_pending();
    assert_eq!(model.min_dx(), 1.0);
    assert_eq!(model.max_primary_val(), Some(3.0));
}

#[test]
fn test_replace_data_source() {
    let (old, mut model) = curve_source(3);
    let new = UpdateSource::new();

    model.replace_data_source(&new, false);
    assert!(model.data_source().same_source(&new));
    assert_eq!(old.subscriber_count(), 0);
    old.send(PointData::new(10.0, 0.0));
    new.send(PointData::new(3.0, 0.0));
    model.process_pending();
    assert_eq!(model.full_data_buffer().x, vec![0.0, 1.0, 2.0, 3.0]);

    let events = recorder(|listener| {
        model.subscribe(listener);
    });
    model.replace_data_source(&old, true);
    assert!(model.is_empty());
    assert_eq!(model.state(), ModelState::Idle);
    assert_eq!(*events.lock(), vec![ModelEvent::DataChanged]);
}

#[test]
fn test_listeners_are_notified_on_change_only() {
    let (source, mut model) = curve_source(0);
    let events = recorder(|listener| {
        model.subscribe(listener);
    });
    source.send(PointData::new(1.0, 1.0));
    source.send(BarData::new(1.0, 0.0, 1.0));
    source.send_timestamp(5.0);
    model.process_pending();
    assert_eq!(events.lock().len(), 1);

    let id = model.subscribe(|_| {});
    assert!(model.unsubscribe(id));
    assert!(!model.unsubscribe(id));
}

#[test]
fn test_values_through_factory() {
    let source = UpdateSource::with_factory(PlottingItemDataFactory::with_clock(FixedClock(100.0)));
    let mut model = LiveInjectionBarDataModel::new(&source).unwrap();
    source
        .send_value(DataKind::InjectionBar, &[json!(1.0), json!(2.0), json!("label")])
        .unwrap();
    source
        .send_value(
            DataKind::InjectionBarCollection,
            &[json!([1.0, 1.0]), json!([2.0, 2.0]), json!([0.5, 0.5]), json!([90.0, 95.0])],
        )
        .unwrap();
    model.process_pending();

    let bars = model.full_data_buffer();
    assert_eq!(bars.x, vec![90.0, 95.0, 100.0]);
    assert_eq!(bars.labels, vec!["", "", "label"]);
    assert_eq!(bars.widths[0], 0.5);
}

#[test]
fn test_static_model_replaces_content() {
    let source = UpdateSource::new();
    let mut model = StaticCurveDataModel::new(&source);
    let events = recorder(|listener| {
        model.subscribe(listener);
    });

    source.send(CurveData::new(vec![2.0, 1.0], vec![1.0, 2.0]).unwrap());
    model.process_pending();
    assert_eq!(
        model.full_data_buffer(),
        CurveData::new(vec![2.0, 1.0], vec![1.0, 2.0]).unwrap(),
        "arrival order is kept"
    );

    source.send(PointData::new(5.0, 5.0));
    source.send_timestamp(10.0);
    source.send_gap();
    model.process_pending();
    assert_eq!(model.full_data_buffer(), CurveData::new(vec![5.0], vec![5.0]).unwrap());
    assert_eq!(events.lock().len(), 2);
}

#[test]
fn test_static_model_replace_data_source() {
    let old = UpdateSource::new();
    let new = UpdateSource::new();
    let mut model = StaticTimestampMarkerDataModel::new(&old);
    model.replace_data_source(&new);
    assert!(model.data_source().same_source(&new));
    old.send(TimestampMarkerData::new(1.0, "r", "old"));
    new.send(TimestampMarkerData::new(2.0, "g", "new"));
    model.process_pending();
    assert_eq!(model.len(), 1);
    assert_eq!(model.full_data_buffer().labels, vec!["new"]);
}
