use std::sync::Arc;

use dataviewer::{
    Chart, ChartGroup, ChartHandle, ChartSettings, DomainKind, EventFilter, EventKind,
    EventController, MemoryStore, XRange,
};

fn chart_over(store: &Arc<MemoryStore>, origin: f64, n: usize) -> ChartHandle {
    let id = store.register_signal(DomainKind::Time, "s", "V", origin, 1.0, vec![1.0; n]);
    let chart = ChartHandle::new(Chart::new(store.clone(), ChartSettings::default()));
    chart.add_curve(id).unwrap();
    chart
}

#[test]
fn ungrouping_down_to_one_member_stops_propagation() {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = Arc::new(MemoryStore::new());
    let a = chart_over(&store, 0.0, 1000);
    let b = chart_over(&store, 0.0, 1000);
    let c = chart_over(&store, 0.0, 1000);
    let group = ChartGroup::group(&[a.clone(), b.clone(), c.clone()]).unwrap();

    a.set_range(100.0, 200.0);
    assert_eq!(b.visible_range(), Some(XRange::new(100.0, 200.0)));
    assert_eq!(c.visible_range(), Some(XRange::new(100.0, 200.0)));

    assert!(ChartGroup::ungroup(&b));
    assert!(!group.is_dissolved(), "two members remain");
    a.set_range(300.0, 400.0);
    assert_eq!(b.visible_range(), Some(XRange::new(100.0, 200.0)));
    assert_eq!(c.visible_range(), Some(XRange::new(300.0, 400.0)));

    assert!(ChartGroup::ungroup(&c));
    assert!(group.is_dissolved());
    assert!(!a.is_grouped(), "last member is unlinked when the group dissolves");

    a.set_range(500.0, 600.0);
    assert_eq!(c.visible_range(), Some(XRange::new(300.0, 400.0)));
    assert_eq!(b.visible_range(), Some(XRange::new(100.0, 200.0)));
}

#[test]
fn siblings_clamp_into_their_own_bound() {
    let store = Arc::new(MemoryStore::new());
    let wide = chart_over(&store, 0.0, 1000);
    let narrow = chart_over(&store, 0.0, 100);
    ChartGroup::group(&[wide.clone(), narrow.clone()]).unwrap();

    wide.set_range(50.0, 500.0);
    assert_eq!(wide.visible_range(), Some(XRange::new(50.0, 500.0)));
    assert_eq!(narrow.visible_range(), Some(XRange::new(50.0, 100.0)));

    // the narrow chart's clamped range is what it propagates
    narrow.set_range(-10.0, 80.0);
    assert_eq!(wide.visible_range(), Some(XRange::new(0.0, 80.0)));
}

#[test]
fn grouping_aligns_members_on_the_first_chart() {
    let store = Arc::new(MemoryStore::new());
    let a = chart_over(&store, 0.0, 1000);
    let b = chart_over(&store, 0.0, 1000);
    a.set_range(10.0, 20.0);
    ChartGroup::group(&[a.clone(), b.clone()]).unwrap();
    assert_eq!(b.visible_range(), Some(XRange::new(10.0, 20.0)));
}

#[test]
fn group_lifecycle_events() {
    let store = Arc::new(MemoryStore::new());
    let events = EventController::new();
    let rx = events.subscribe(EventFilter::only(
        EventKind::CHARTS_GROUPED | EventKind::CHART_UNGROUPED | EventKind::GROUP_DISSOLVED,
    ));
    let make = || {
        let id = store.register_signal(DomainKind::Time, "s", "V", 0.0, 1.0, vec![0.0; 10]);
        let chart = ChartHandle::new(
            Chart::new(store.clone(), ChartSettings::default()).with_events(events.clone()),
        );
        chart.add_curve(id).unwrap();
        chart
    };
    let a = make();
    let b = make();
    let group = ChartGroup::group(&[a.clone(), b.clone()]).unwrap();
    ChartGroup::ungroup(&a);

    let received: Vec<_> = rx.try_iter().collect();
    assert_eq!(received.len(), 3);
    assert_eq!(received[0].kinds, EventKind::CHARTS_GROUPED);
    assert_eq!(received[1].kinds, EventKind::CHART_UNGROUPED);
    assert!(received[2].kinds.contains(EventKind::GROUP_DISSOLVED));
    let meta = received[2].group.as_ref().unwrap();
    assert_eq!(meta.group_id, group.id());
    assert_eq!(meta.charts, vec![b.id()]);
}
