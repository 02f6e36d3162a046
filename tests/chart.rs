use std::sync::Arc;

use dataviewer::{
    Chart, ChartError, ChartHandle, ChartSettings, CurveHandle, DomainKind, EventFilter, EventKind,
    EventController, MemoryStore, SignalId, XRange,
};

fn setup() -> (Arc<MemoryStore>, ChartHandle) {
    let store = Arc::new(MemoryStore::new());
    let chart = ChartHandle::new(Chart::new(store.clone(), ChartSettings::default()));
    (store, chart)
}

fn signal(store: &MemoryStore, kind: DomainKind) -> SignalId {
    if kind == DomainKind::FrequencySequence {
        return store.register_sequence("seq", "dB", 0.0, 10.0, vec![vec![0.0; 64]; 3]);
    }
    store.register_signal(kind, "sig", "V", 0.0, 0.5, (0..400).map(|i| (i % 17) as f64).collect())
}

fn expected(chart: DomainKind, candidate: DomainKind) -> bool {
    use DomainKind::*;
    match (chart, candidate) {
        (Time | TimeLimit, Time | TimeLimit) => true,
        (Frequency | FrequencyLimit, Frequency | FrequencyLimit) => true,
        // a second sequence is refused for a different reason
        (FrequencySequence, FrequencySequence) => false,
        _ => false,
    }
}

#[test]
fn compatibility_matrix() {
    for first in DomainKind::ALL {
        for second in DomainKind::ALL {
            let (store, chart) = setup();
            chart.add_curve(signal(&store, first)).unwrap();
            let result = chart.add_curve(signal(&store, second));
            let accepted = result.is_ok();
            assert_eq!(
                accepted,
                expected(first, second),
                "{first} chart taking a {second} curve: {result:?}"
            );
            match result {
                Err(ChartError::IncompatibleDomain { chart: c, candidate }) => {
                    assert_eq!((c, candidate), (first, second));
                }
                Err(ChartError::SequenceAlreadyActive(_)) => {
                    assert_eq!((first, second), (DomainKind::FrequencySequence, DomainKind::FrequencySequence));
                }
                Err(other) => panic!("unexpected error {other}"),
                Ok(_) => {}
            }
            let expected_count = if accepted { 2 } else { 1 };
            assert_eq!(chart.lock().curve_count(), expected_count);
        }
    }
}

#[test]
fn redraw_twice_gives_identical_polylines() {
    let (store, chart) = setup();
    let id = signal(&store, DomainKind::Time);
    chart.add_curve(id).unwrap();
    chart.set_range(12.0, 150.0);
    let first = chart.drawables();
    chart.set_range(12.0, 150.0);
    let second = chart.drawables();
    assert_eq!(first[0].polyline, second[0].polyline);
}

#[test]
fn adding_extends_the_range_to_cover_the_new_signal() {
    let (store, chart) = setup();
    let short = store.register_signal(DomainKind::Frequency, "a", "dB", 100.0, 1.0, vec![0.0; 100]);
    let long = store.register_signal(DomainKind::FrequencyLimit, "b", "dB", 50.0, 1.0, vec![0.0; 500]);
    chart.add_curve(short).unwrap();
    chart.set_range(120.0, 130.0);
    chart.add_curve(long).unwrap();
    assert_eq!(chart.visible_range(), Some(XRange::new(50.0, 550.0)));
}

#[test]
fn polylines_stay_within_budget_for_huge_signals() {
    let store = Arc::new(MemoryStore::new());
    let settings = ChartSettings {
        point_budget: 200,
        ..Default::default()
    };
    let chart = ChartHandle::new(Chart::new(store.clone(), settings));
    let id = store.register_signal(
        DomainKind::Time,
        "big",
        "V",
        0.0,
        1e-6,
        (0..2_000_000).map(|i| ((i as f64) * 0.001).sin()).collect(),
    );
    chart.add_curve(id).unwrap();
    assert!(chart.drawables()[0].polyline.len() <= 400);
    chart.set_range(0.5, 0.5001);
    let drawables = chart.drawables();
    let zoomed = &drawables[0].polyline;
    assert!(zoomed.len() <= 400 && !zoomed.is_empty());
}

#[test]
fn events_report_curve_lifecycle() {
    let store = Arc::new(MemoryStore::new());
    let events = EventController::new();
    let rx = events.subscribe(EventFilter::only(
        EventKind::CURVE_ADDED | EventKind::CURVE_REMOVED | EventKind::CURVE_DROPPED,
    ));
    let chart = ChartHandle::new(Chart::new(store.clone(), ChartSettings::default()).with_events(events));
    let a = signal(&store, DomainKind::Time);
    let b = signal(&store, DomainKind::Time);
    chart.add_curve(a).unwrap();
    chart.add_curve(b).unwrap();
    chart.remove_curve(CurveHandle(a)).unwrap();
    store.remove_signal(b);
    chart.set_range(1.0, 2.0);

    let kinds: Vec<EventKind> = rx.try_iter().map(|e| e.kinds).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::CURVE_ADDED,
            EventKind::CURVE_ADDED,
            EventKind::CURVE_REMOVED,
            EventKind::CURVE_DROPPED
        ]
    );
    assert_eq!(chart.lock().curve_count(), 0);
    assert_eq!(chart.visible_range(), None);
}

#[test]
fn colors_are_distinct_per_curve() {
    let (store, chart) = setup();
    let a = chart.add_curve(signal(&store, DomainKind::Time)).unwrap();
    let b = chart.add_curve(signal(&store, DomainKind::Time)).unwrap();
    let c = chart.lock();
    assert_ne!(c.curve(a).unwrap().look.color, c.curve(b).unwrap().look.color);
}
