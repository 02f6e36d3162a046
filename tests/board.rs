use std::sync::Arc;

use dataviewer::{
    Board, ChartError, ChartGroup, DomainKind, EventFilter, EventKind, MemoryStore, ViewerConfig,
    XRange,
};

fn board() -> (Arc<MemoryStore>, Board) {
    let store = Arc::new(MemoryStore::new());
    let board = Board::new(store.clone(), ViewerConfig::default());
    (store, board)
}

#[test]
fn signals_go_to_the_first_selected_chart() {
    let (store, mut board) = board();
    let c1 = board.add_chart();
    let c2 = board.add_chart();
    board.select(c2.id());

    let time = store.register_signal(DomainKind::Time, "t", "V", 0.0, 1.0, vec![0.0; 10]);
    let freq = store.register_signal(DomainKind::Frequency, "f", "dB", 0.0, 1.0, vec![0.0; 10]);

    assert!(board.add_signal_to_selected(time).unwrap().is_some());
    assert_eq!(c2.lock().curve_count(), 1);
    assert_eq!(c1.lock().curve_count(), 0);

    let err = board.add_signal_to_selected(freq).unwrap_err();
    assert_eq!(
        err,
        ChartError::IncompatibleDomain {
            chart: DomainKind::Time,
            candidate: DomainKind::Frequency
        }
    );
}

#[test]
fn group_ungroup_and_remove_selected() {
    let (store, mut board) = board();
    let charts: Vec<_> = (0..3).map(|_| board.add_chart()).collect();
    for chart in &charts {
        let id = store.register_signal(DomainKind::Time, "s", "V", 0.0, 1.0, vec![0.0; 100]);
        chart.add_curve(id).unwrap();
        board.select(chart.id());
    }

    let group = board.group_selected().unwrap().expect("three charts selected");
    assert_eq!(group.len(), 3);
    charts[2].set_range(10.0, 20.0);
    assert_eq!(charts[0].visible_range(), Some(XRange::new(10.0, 20.0)));

    board.clear_selection();
    board.select(charts[1].id());
    assert_eq!(board.ungroup_selected(), 1);
    assert_eq!(group.len(), 2);

    board.select(charts[0].id());
    assert_eq!(board.remove_selected(), 2);
    assert_eq!(board.len(), 1);
    assert!(group.is_dissolved());
    assert!(ChartGroup::of(&charts[2]).is_none());
}

#[test]
fn board_events_carry_the_selection() {
    let (_store, mut board) = board();
    let rx = board
        .events()
        .subscribe(EventFilter::only(EventKind::SELECTION_CHANGED | EventKind::CHART_REMOVED));
    let c = board.add_chart();
    board.select(c.id());
    board.remove_chart(c.id());

    let events: Vec<_> = rx.try_iter().collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].board.as_ref().unwrap().selected, vec![c.id()]);
    assert!(events[1].kinds.contains(EventKind::CHART_REMOVED));
    assert!(events[1].board.as_ref().unwrap().selected.is_empty());
}
