use super::{EventLoop, HandlerId, TimeoutHandler, TimeoutHandlers};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{self, MissedTickBehavior};

/// An event loop ticked from a tokio task.
///
/// Handlers run inside [`run_until`](Self::run_until), on whichever thread
/// polls it. On a current-thread runtime that is the runtime thread.
pub struct TokioEventLoop {
    handlers: TimeoutHandlers,
    notify: Notify,
    interval: Duration,
}

impl TokioEventLoop {
    /// Creates a loop ticking every 100 ms.
    pub fn new() -> Self {
        Self::with_interval(Duration::from_millis(100))
    }

    /// Tick at least every `interval`, more often when woken.
    pub fn with_interval(interval: Duration) -> Self {
        Self { handlers: TimeoutHandlers::new(), notify: Notify::new(), interval }
    }

    /// The idle tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of registered timeout handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Run handlers once per tick until `done` holds after a tick.
    pub async fn run_until<F>(&self, mut done: F)
    where
        F: FnMut() -> bool,
    {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            self.handlers.run_all();
            if done() {
                return;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.notify.notified() => {}
            }
        }
    }
}

impl Default for TokioEventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop for TokioEventLoop {
    fn register_timeout_handler(&self, handler: Arc<dyn TimeoutHandler>) -> HandlerId {
        self.handlers.register(handler)
    }

    fn unregister_timeout_handler(&self, id: HandlerId) {
        self.handlers.unregister(id);
    }

    fn wakeup(&self) {
        // Stores a permit when the loop is busy, so the wakeup is not lost.
        self.notify.notify_one();
    }
}

impl fmt::Debug for TokioEventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioEventLoop")
            .field("handlers", &self.handlers.len())
            .field("interval", &self.interval)
            .finish()
    }
}
