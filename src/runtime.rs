use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// What the front end reacts to between redraws
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    /// Nothing arrived before the wake-up; time to poll the session
    Tick,
}

/// Source of terminal events
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Events pushed through a channel, by a reader thread or a scripted driver
pub struct ChannelEventSource {
    rx: Receiver<GameEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }

    pub fn pair() -> (Sender<GameEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx))
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Terminal input read by crossterm on a background thread
pub struct CrosstermEventSource {
    inner: ChannelEventSource,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, inner) = ChannelEventSource::pair();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => tx.send(GameEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => tx.send(GameEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { inner }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.inner.recv_timeout(timeout)
    }
}

/// Redraw cadence when no session deadline is closer
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Waits for the next input event or the next moment the session needs polling
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// How long to block: the tick interval, cut short by an earlier wake-up
    pub fn timeout(&self, now: Instant, wakeup: Option<Instant>) -> Duration {
        let interval = self.ticker.interval();
        match wakeup {
            Some(at) => at.saturating_duration_since(now).min(interval),
            None => interval,
        }
    }

    /// Next event, or `Tick` after one full interval
    pub fn step(&self) -> GameEvent {
        self.step_until(Instant::now(), None)
    }

    /// Next event, or `Tick` once `wakeup` (or the interval) has passed
    pub fn step_until(&self, now: Instant, wakeup: Option<Instant>) -> GameEvent {
        self.event_source
            .recv_timeout(self.timeout(now, wakeup))
            .unwrap_or(GameEvent::Tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn runner(interval_ms: u64) -> (Sender<GameEvent>, Runner<ChannelEventSource, FixedTicker>) {
        let (tx, source) = ChannelEventSource::pair();
        let ticker = FixedTicker::new(Duration::from_millis(interval_ms));
        (tx, Runner::new(source, ticker))
    }

    #[test]
    fn test_timeout_uses_wakeup_before_interval() {
        let (_tx, runner) = runner(100);
        let now = Instant::now();

        assert_eq!(runner.timeout(now, None), Duration::from_millis(100));
        assert_eq!(
            runner.timeout(now, Some(now + Duration::from_millis(30))),
            Duration::from_millis(30)
        );
        assert_eq!(
            runner.timeout(now, Some(now + Duration::from_secs(5))),
            Duration::from_millis(100)
        );
        // an overdue wake-up does not block at all
        assert_eq!(runner.timeout(now + Duration::from_millis(10), Some(now)), Duration::ZERO);
    }

    #[test]
    fn test_overdue_wakeup_ticks_without_waiting_for_interval() {
        let (_tx, runner) = runner(60_000);
        let now = Instant::now();

        let started = Instant::now();
        assert!(matches!(runner.step_until(now, Some(now)), GameEvent::Tick));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_queued_key_wins_over_wakeup() {
        let (tx, runner) = runner(60_000);
        tx.send(GameEvent::Key(KeyEvent::new(KeyCode::Char('7'), KeyModifiers::NONE)))
            .unwrap();
        let now = Instant::now();

        match runner.step_until(now, Some(now)) {
            GameEvent::Key(key) => assert_eq!(key.code, KeyCode::Char('7')),
            other => panic!("expected the queued key, got {other:?}"),
        }
        assert!(matches!(runner.step_until(now, Some(now)), GameEvent::Tick));
    }

    #[test]
    fn test_closed_source_keeps_ticking() {
        let (tx, runner) = runner(1);
        drop(tx);
        assert!(matches!(runner.step(), GameEvent::Tick));
        assert!(matches!(runner.step(), GameEvent::Tick));
    }
}
