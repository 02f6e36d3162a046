use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dataviewer::events::FrameMeta;
use dataviewer::{
    Board, Chart, ChartError, ChartHandle, ChartSettings, EventFilter, EventKind, EventController,
    ManualTicks, MemoryStore, PlayerStatus, SignalId, TickSource, ViewerConfig,
};

/// Five frames; frame `k` is flat at `k`.
fn sequence(store: &MemoryStore) -> SignalId {
    let frames = (0..5).map(|k| vec![k as f64; 32]).collect();
    store.register_sequence("spectra", "dB", 0.0, 25.0, frames)
}

fn shown_frame(chart: &ChartHandle) -> f64 {
    chart.drawables()[0].polyline[0][1]
}

#[test]
fn plays_once_then_stops_at_frame_zero() {
    let store = Arc::new(MemoryStore::new());
    let events = EventController::new();
    let rx = events.subscribe(EventFilter::only(EventKind::FRAME_CHANGED));
    let probe = ManualTicks::new();
    let chart = ChartHandle::new(
        Chart::new(store.clone(), ChartSettings::default())
            .with_events(events)
            .with_tick_source(Box::new(probe.clone())),
    );
    let seq = sequence(&store);
    chart.add_curve(seq).unwrap();

    chart.play().unwrap();
    assert!(probe.is_armed());
    let mut frames = vec![shown_frame(&chart)];
    for _ in 0..4 {
        chart.tick().unwrap();
        frames.push(shown_frame(&chart));
    }
    assert_eq!(frames, vec![0.0, 1.0, 2.0, 3.0, 4.0]);

    chart.tick().unwrap();
    assert_eq!(chart.lock().player_status(), Some(PlayerStatus::Stopped));
    assert_eq!(chart.lock().player().unwrap().current_frame(), 0);
    assert_eq!(shown_frame(&chart), 0.0);
    assert!(!probe.is_armed(), "tick source is disarmed at the end");

    // sixth tick: nothing happens
    chart.tick().unwrap();
    assert_eq!(chart.lock().player_status(), Some(PlayerStatus::Stopped));

    let indices: Vec<usize> = rx.try_iter().filter_map(|e| e.frame.map(|f: FrameMeta| f.index)).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4, 0]);
}

#[test]
fn seek_clamps_in_every_state() {
    let store = Arc::new(MemoryStore::new());
    let chart = ChartHandle::new(Chart::new(store.clone(), ChartSettings::default()));
    chart.add_curve(sequence(&store)).unwrap();

    for status in [PlayerStatus::Stopped, PlayerStatus::Playing, PlayerStatus::Paused] {
        match status {
            PlayerStatus::Stopped => chart.stop().unwrap(),
            PlayerStatus::Playing => chart.play().unwrap(),
            PlayerStatus::Paused => chart.pause().unwrap(),
        }
        chart.seek(-3).unwrap();
        assert_eq!(shown_frame(&chart), 0.0, "seek(-3) while {status}");
        chart.seek(99).unwrap();
        assert_eq!(shown_frame(&chart), 4.0, "seek(99) while {status}");
        assert_eq!(chart.lock().player_status(), Some(status));
    }
}

#[test]
fn frames_are_displayed_undecimated() {
    let store = Arc::new(MemoryStore::new());
    let settings = ChartSettings {
        point_budget: 4,
        ..Default::default()
    };
    let chart = ChartHandle::new(Chart::new(store.clone(), settings));
    let seq = store.register_sequence("s", "dB", 10.0, 2.0, vec![(0..100).map(f64::from).collect()]);
    chart.add_curve(seq).unwrap();
    let poly = chart.drawables()[0].polyline.clone();
    assert_eq!(poly.len(), 100);
    assert_eq!(poly[3], [16.0, 3.0]);
}

#[test]
fn charts_without_a_sequence_refuse_playback() {
    let store = Arc::new(MemoryStore::new());
    let chart = ChartHandle::new(Chart::new(store.clone(), ChartSettings::default()));
    assert_eq!(chart.play(), Err(ChartError::NoSequence));
    assert_eq!(chart.seek(2), Err(ChartError::NoSequence));
}

#[test]
fn interval_ticker_drives_a_board_chart() {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = Arc::new(MemoryStore::new());
    let (tx, rx) = mpsc::channel();
    let config = ViewerConfig {
        frame_interval_ms: 5,
        ..Default::default()
    };
    let mut board = Board::new(store.clone(), config).with_tick_channel(tx);
    let chart = board.add_chart();
    chart.add_curve(sequence(&store)).unwrap();
    chart.play().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while chart.lock().player_status() == Some(PlayerStatus::Playing) {
        assert!(Instant::now() < deadline, "playback should finish");
        if let Ok(event) = rx.recv_timeout(Duration::from_millis(100)) {
            board.tick(event.chart_id).unwrap();
        }
    }
    assert_eq!(shown_frame(&chart), 0.0);
}
