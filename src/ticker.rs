//! Tick sources driving sequence playback.
//!
//! A chart owns at most one [`TickSource`]. The player arms it on play and
//! disarms it on pause, stop and end of sequence; dropping the chart drops the
//! source, which disarms it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::data::chart::ChartId;

/// Periodic timer the player controls.
pub trait TickSource: Send {
    /// Start delivering ticks every `interval`. Arming an already armed
    /// source with the same interval keeps its schedule.
    fn arm(&mut self, interval: Duration);
    fn disarm(&mut self);
    fn is_armed(&self) -> bool;
}

/// Posted by an [`IntervalTicker`]; route it to `Board::tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    pub chart_id: ChartId,
}

#[derive(Debug, Default)]
struct ManualState {
    armed: Option<Duration>,
    arms: usize,
    disarms: usize,
}

/// Tick source that never fires on its own.
///
/// Clones share state, so a test can keep one clone while the chart owns
/// another, then deliver ticks by calling `Chart::tick` directly.
#[derive(Debug, Clone, Default)]
pub struct ManualTicks {
    state: Arc<Mutex<ManualState>>,
}

impl ManualTicks {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Interval of the current arming, if armed.
    pub fn interval(&self) -> Option<Duration> {
        self.state().armed
    }

    pub fn arm_count(&self) -> usize {
        self.state().arms
    }

    pub fn disarm_count(&self) -> usize {
        self.state().disarms
    }
}

impl TickSource for ManualTicks {
    fn arm(&mut self, interval: Duration) {
        let mut state = self.state();
        state.armed = Some(interval);
        state.arms += 1;
    }

    fn disarm(&mut self) {
        let mut state = self.state();
        if state.armed.take().is_some() {
            state.disarms += 1;
        }
    }

    fn is_armed(&self) -> bool {
        self.state().armed.is_some()
    }
}

struct Running {
    interval: Duration,
    stop: Arc<AtomicBool>,
}

/// Background-thread ticker posting [`TickEvent`]s on a channel.
pub struct IntervalTicker {
    chart_id: ChartId,
    sender: Sender<TickEvent>,
    running: Option<Running>,
}

impl IntervalTicker {
    pub fn new(chart_id: ChartId, sender: Sender<TickEvent>) -> Self {
        Self {
            chart_id,
            sender,
            running: None,
        }
    }
}

impl TickSource for IntervalTicker {
    fn arm(&mut self, interval: Duration) {
        if let Some(running) = &self.running {
            if running.interval == interval {
                return;
            }
        }
        self.disarm();

        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let sender = self.sender.clone();
        let event = TickEvent {
            chart_id: self.chart_id,
        };
        let spawned = thread::Builder::new()
            .name(format!("ticker-{}", self.chart_id))
            .spawn(move || loop {
                thread::sleep(interval);
                if flag.load(Ordering::Acquire) || sender.send(event).is_err() {
                    break;
                }
            });
        match spawned {
            Ok(_) => self.running = Some(Running { interval, stop }),
            Err(e) => log::warn!("could not start ticker for chart {}: {e}", self.chart_id),
        }
    }

    fn disarm(&mut self) {
        if let Some(running) = self.running.take() {
            running.stop.store(true, Ordering::Release);
        }
    }

    fn is_armed(&self) -> bool {
        self.running.is_some()
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn manual_ticks_track_arming() {
        let probe = ManualTicks::new();
        let mut source = probe.clone();
        source.arm(Duration::from_millis(100));
        assert!(probe.is_armed());
        assert_eq!(probe.interval(), Some(Duration::from_millis(100)));
        source.disarm();
        source.disarm();
        assert!(!probe.is_armed());
        assert_eq!((probe.arm_count(), probe.disarm_count()), (1, 1));
    }

    #[test]
    fn interval_ticker_posts_until_disarmed() {
        let (tx, rx) = mpsc::channel();
        let mut ticker = IntervalTicker::new(ChartId(4), tx);
        ticker.arm(Duration::from_millis(5));
        let event = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("armed ticker delivers a tick");
        assert_eq!(event.chart_id, ChartId(4));
        ticker.disarm();
        assert!(!ticker.is_armed());
    }

    #[test]
    fn dropping_the_ticker_stops_the_thread() {
        let (tx, rx) = mpsc::channel();
        {
            let mut ticker = IntervalTicker::new(ChartId(1), tx);
            ticker.arm(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(50));
        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(50));
        assert!(rx.try_recv().is_err());
    }
}
