use super::{EventLoop, HandlerId, TimeoutHandler, TimeoutHandlers};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An event loop whose ticks are driven by the caller.
///
/// The thread calling [`run_once`](Self::run_once) is the loop thread.
/// [`wait`](Self::wait) blocks it until a wakeup arrives; a wakeup fired
/// while nobody waits is kept and consumed by the next wait.
#[derive(Default)]
pub struct ManualEventLoop {
    handlers: TimeoutHandlers,
    woken: Mutex<bool>,
    wake_cond: Condvar,
    wakeups: AtomicU64,
}

impl ManualEventLoop {
    /// Creates a loop with no handlers and no pending wakeup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every registered handler once on the calling thread.
    pub fn run_once(&self) {
        self.handlers.run_all();
    }

    /// Block until woken or until `timeout` elapses. Returns whether a
    /// wakeup was consumed.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut woken = self.woken.lock();
        while !*woken {
            if self.wake_cond.wait_until(&mut woken, deadline).timed_out() {
                break;
            }
        }
        std::mem::take(&mut *woken)
    }

    /// Tick, then wait, until `done` holds or `timeout` elapses. Returns
    /// whether `done` was satisfied.
    pub fn run_until<F>(&self, timeout: Duration, mut done: F) -> bool
    where
        F: FnMut() -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            self.run_once();
            if done() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.wait(deadline - now);
        }
    }

    /// Total wakeups fired so far.
    pub fn wakeup_count(&self) -> u64 {
        self.wakeups.load(Ordering::SeqCst)
    }

    /// Number of registered timeout handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl EventLoop for ManualEventLoop {
    fn register_timeout_handler(&self, handler: Arc<dyn TimeoutHandler>) -> HandlerId {
        self.handlers.register(handler)
    }

    fn unregister_timeout_handler(&self, id: HandlerId) {
        self.handlers.unregister(id);
    }

    fn wakeup(&self) {
        self.wakeups.fetch_add(1, Ordering::SeqCst);
        *self.woken.lock() = true;
        self.wake_cond.notify_one();
    }
}

impl fmt::Debug for ManualEventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualEventLoop")
            .field("handlers", &self.handlers.len())
            .field("wakeups", &self.wakeup_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_wait_times_out_without_wakeup() {
        let event_loop = ManualEventLoop::new();
        assert!(!event_loop.wait(Duration::from_millis(10)));
    }

    #[test]
    fn test_wakeup_before_wait_is_kept() {
        let event_loop = ManualEventLoop::new();
        event_loop.wakeup();
        assert!(event_loop.wait(Duration::from_secs(5)));
        // Consumed
        assert!(!event_loop.wait(Duration::from_millis(10)));
        assert_eq!(event_loop.wakeup_count(), 1);
    }

    #[test]
    fn test_wakeup_from_other_thread() {
        let event_loop = Arc::new(ManualEventLoop::new());
        let waker = Arc::clone(&event_loop);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            waker.wakeup();
        });
        assert!(event_loop.wait(Duration::from_secs(5)));
        handle.join().unwrap();
    }

    #[test]
    fn test_run_until_gives_up() {
        let event_loop = ManualEventLoop::new();
        assert!(!event_loop.run_until(Duration::from_millis(20), || false));
        assert!(event_loop.run_until(Duration::from_millis(20), || true));
    }
}
