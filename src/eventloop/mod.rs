//! Event loop collaborator contract.
//!
//! The resolver needs two things from the loop that owns its caller:
//! a periodic callback run on the loop's own thread, and a wakeup that can
//! be fired from any thread to make that callback run promptly.
//!
//! Two loops are provided:
//! - [`ManualEventLoop`]: the caller drives ticks and blocks for wakeups
//! - [`TokioEventLoop`]: ticks from a tokio task, on an interval or a wakeup

mod manual;
mod tokioloop;

pub use manual::ManualEventLoop;
pub use tokioloop::TokioEventLoop;

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A periodic callback, invoked on the event loop thread.
pub trait TimeoutHandler: Send + Sync {
    fn timeout(&self);
}

/// Identifies a registered [`TimeoutHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// What the resolver requires from the loop it delivers results on.
pub trait EventLoop: Send + Sync {
    /// Run `handler` at bounded intervals on the loop thread.
    fn register_timeout_handler(&self, handler: Arc<dyn TimeoutHandler>) -> HandlerId;

    fn unregister_timeout_handler(&self, id: HandlerId);

    /// Make the loop run its handlers soon, even if it is idle. Callable
    /// from any thread.
    fn wakeup(&self);
}

/// Registration table shared by the provided loops.
///
/// Handlers are invoked outside the table lock, so a handler may register
/// or unregister handlers while it runs.
#[derive(Default)]
pub struct TimeoutHandlers {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(HandlerId, Arc<dyn TimeoutHandler>)>>,
}

impl TimeoutHandlers {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handler` and returns its id.
    pub fn register(&self, handler: Arc<dyn TimeoutHandler>) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.lock().push((id, handler));
        id
    }

    /// Returns whether `id` was registered.
    pub fn unregister(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(registered, _)| *registered != id);
        handlers.len() != before
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }

    /// Invoke every handler once, in registration order.
    pub fn run_all(&self) {
        let snapshot: Vec<_> = self.handlers.lock().iter().map(|(_, h)| Arc::clone(h)).collect();
        for handler in snapshot {
            handler.timeout();
        }
    }
}

impl fmt::Debug for TimeoutHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeoutHandlers").field("count", &self.len()).finish()
    }
}
