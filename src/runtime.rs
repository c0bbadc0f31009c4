use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Cadence of the live stats refresh while a session is active
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Unified event type consumed by the app loop
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Wait for the next event, for at most `timeout` when one is given.
    fn next_event(&self, timeout: Option<Duration>) -> Result<AppEvent, RecvTimeoutError>;
}

fn recv_from(
    rx: &Receiver<AppEvent>,
    timeout: Option<Duration>,
) -> Result<AppEvent, RecvTimeoutError> {
    match timeout {
        Some(timeout) => rx.recv_timeout(timeout),
        None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
    }
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let event = match event::read() {
                Ok(CtEvent::Key(key)) => AppEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(%err, "terminal event reader stopped");
                    break;
                }
            };
            if tx.send(event).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn next_event(&self, timeout: Option<Duration>) -> Result<AppEvent, RecvTimeoutError> {
        recv_from(&self.rx, timeout)
    }
}

/// Channel-fed event source for tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn next_event(&self, timeout: Option<Duration>) -> Result<AppEvent, RecvTimeoutError> {
        recv_from(&self.rx, timeout)
    }
}

/// Periodic tick that only exists while started.
///
/// Ticks are produced by polling, on the same thread that handles input, so once
/// `cancel` returns no further tick can be observed.
#[derive(Clone, Copy, Debug)]
pub struct TickTimer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl TickTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm the timer. Starting a running timer keeps its current schedule.
    pub fn start(&mut self, now: Instant) {
        if self.next_due.is_none() {
            self.next_due = Some(now + self.interval);
        }
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// How long until the next tick is due, `None` when cancelled
    pub fn poll_timeout(&self, now: Instant) -> Option<Duration> {
        self.next_due
            .map(|due| due.saturating_duration_since(now))
    }

    /// Consume a due tick. Missed ticks collapse into one.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                let mut next = due + self.interval;
                while next <= now {
                    next += self.interval;
                }
                self.next_due = Some(next);
                true
            }
            _ => false,
        }
    }
}

/// Drives the app one event at a time, interleaving ticks from its timer
pub struct Runner<E: EventSource> {
    event_source: E,
    timer: TickTimer,
}

impl<E: EventSource> Runner<E> {
    pub fn new(event_source: E, timer: TickTimer) -> Self {
        Self {
            event_source,
            timer,
        }
    }

    pub fn timer(&self) -> &TickTimer {
        &self.timer
    }

    /// Arm the timer when `running`, release it otherwise
    pub fn sync_timer(&mut self, running: bool) {
        if running {
            self.timer.start(Instant::now());
        } else if self.timer.is_running() {
            self.timer.cancel();
        }
    }

    /// Block until the next event or due tick. `None` once the event source is gone.
    pub fn step(&mut self) -> Option<AppEvent> {
        loop {
            let now = Instant::now();
            if self.timer.fire(now) {
                return Some(AppEvent::Tick);
            }

            match self.event_source.next_event(self.timer.poll_timeout(now)) {
                Ok(event) => return Some(event),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}
