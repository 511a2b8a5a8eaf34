//! The resolver service: submission, worker loop and completion dispatch.
//!
//! Requests flow through two queues guarded by one lock:
//!
//! ```text
//! enqueue ─▶ pending ─▶ worker (unlocked lookups) ─▶ completed ─▶ tick ─▶ on_done
//! ```
//!
//! The worker drains `pending` in whole batches and resolves them without
//! holding the lock. Finished batches are appended to `completed`; the
//! event loop tick splices that queue out and runs completion handlers on
//! the loop thread. An atomic counter lets an idle tick return without
//! touching the lock.

use super::config::ResolverConfig;
use super::gai::{GaiError, HostLookup, SystemLookup};
use super::queue::Queue;
use super::request::Request;
use crate::base::requeststate::RequestState;
use crate::base::resolveerror::{EnqueueError, ResolverError};
use crate::eventloop::{EventLoop, HandlerId, TimeoutHandler};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Queue state, guarded as a unit.
struct State {
    running: bool,
    pending: Queue<Request>,
    completed: Queue<Request>,
}

struct Shared {
    state: Mutex<State>,
    work_ready: Condvar,
    /// Non-zero while `completed` may hold undelivered requests. Set after
    /// the batch is appended; cleared only together with emptying `completed`.
    done_count: AtomicUsize,
}

impl Shared {
    /// Deliver completed requests on the calling thread.
    fn dispatch(&self) -> usize {
        if self.done_count.load(Ordering::Acquire) == 0 {
            return 0;
        }
        let mut batch = Queue::new();
        {
            let mut state = self.state.lock();
            batch.append(&mut state.completed);
            self.done_count.store(0, Ordering::Release);
        }
        let count = batch.len();
        if count > 0 {
            tracing::debug!(count, "dispatching resolver completions");
        }
        while let Some(request) = batch.pop_front() {
            request.complete();
        }
        count
    }
}

impl TimeoutHandler for Shared {
    fn timeout(&self) {
        self.dispatch();
    }
}

struct Worker {
    thread: JoinHandle<()>,
    handler: HandlerId,
}

/// Owned by whoever is starting or stopping the service.
struct Lifecycle {
    worker: Option<Worker>,
    /// Locked by the worker thread for its whole run. Outlives failed spawns
    /// and restarts.
    lookup: Arc<Mutex<Box<dyn HostLookup>>>,
}

/// Offloads blocking hostname lookups to a single worker thread and hands
/// results back on the event loop's timeout tick.
///
/// Completion handlers run on whichever thread ticks the loop, or on the
/// thread calling [`shutdown`](Self::shutdown). Dropping a running resolver
/// shuts it down, so drop it on the event loop thread too.
///
/// # Example
///
/// ```rust,ignore
/// use hostresolver::dns::{Request, Resolver};
/// use hostresolver::eventloop::ManualEventLoop;
/// use std::sync::Arc;
///
/// let event_loop = Arc::new(ManualEventLoop::new());
/// let resolver = Resolver::new(event_loop.clone());
/// resolver.start()?;
/// resolver.enqueue(Request::new("localhost", |request| {
///     println!("{:?}", request.ip_addresses());
/// }))?;
/// event_loop.run_until(Duration::from_secs(5), || false);
/// ```
pub struct Resolver {
    shared: Arc<Shared>,
    event_loop: Arc<dyn EventLoop>,
    config: ResolverConfig,
    lifecycle: Mutex<Lifecycle>,
}

impl Resolver {
    /// A resolver using the system `getaddrinfo`, not yet started.
    pub fn new(event_loop: Arc<dyn EventLoop>) -> Self {
        Self::with_config(event_loop, ResolverConfig::default())
    }

    /// Creates a resolver using the system `getaddrinfo` and `config`.
    pub fn with_config(event_loop: Arc<dyn EventLoop>, config: ResolverConfig) -> Self {
        Self::with_lookup(event_loop, config, SystemLookup::new())
    }

    /// A resolver whose worker fills in requests with `lookup`.
    pub fn with_lookup(
        event_loop: Arc<dyn EventLoop>,
        config: ResolverConfig,
        lookup: impl HostLookup + 'static,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    running: false,
                    pending: Queue::new(),
                    completed: Queue::new(),
                }),
                work_ready: Condvar::new(),
                done_count: AtomicUsize::new(0),
            }),
            event_loop,
            config,
            lifecycle: Mutex::new(Lifecycle {
                worker: None,
                lookup: Arc::new(Mutex::new(Box::new(lookup))),
            }),
        }
    }

    /// Settings used for the worker thread.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Replaces the worker settings. Takes effect on the next [`start`](Self::start).
    pub fn set_config(&mut self, config: ResolverConfig) {
        self.config = config;
    }

    /// Whether submissions are currently accepted.
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Register the completion tick and spawn the worker thread.
    pub fn start(&self) -> Result<(), ResolverError> {
        let mut lifecycle = self.lifecycle.lock();
        // Held across the spawn so nothing is accepted unless a worker exists.
        let mut state = self.shared.state.lock();
        if state.running {
            return Err(ResolverError::AlreadyRunning);
        }

        let lookup = Arc::clone(&lifecycle.lookup);
        let handler = self.event_loop.register_timeout_handler(self.shared.clone());
        let shared = Arc::clone(&self.shared);
        let event_loop = Arc::clone(&self.event_loop);
        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .stack_size(self.config.stack_size)
            .spawn(move || {
                let mut lookup = lookup.lock();
                run_worker(&shared, event_loop.as_ref(), lookup.as_mut());
            });

        match spawned {
            Ok(thread) => {
                state.running = true;
                lifecycle.worker = Some(Worker { thread, handler });
                tracing::debug!(
                    thread = %self.config.thread_name,
                    stack_size = self.config.stack_size,
                    "resolver started"
                );
                Ok(())
            }
            Err(e) => {
                drop(state);
                self.event_loop.unregister_timeout_handler(handler);
                tracing::warn!(error = %e, "failed to spawn resolver thread");
                Err(ResolverError::SpawnFailed(e))
            }
        }
    }

    /// Stop accepting work, wait for the worker to drain everything already
    /// submitted, and deliver the remaining completions on this thread.
    ///
    /// Call from the event loop thread. Does nothing if not running.
    pub fn shutdown(&self) {
        let mut lifecycle = self.lifecycle.lock();
        {
            let mut state = self.shared.state.lock();
            if !state.running {
                return;
            }
            state.running = false;
            self.shared.work_ready.notify_one();
        }

        let Some(worker) = lifecycle.worker.take() else {
            return;
        };
        if worker.thread.join().is_err() {
            tracing::error!("resolver worker thread panicked");
        }
        self.event_loop.unregister_timeout_handler(worker.handler);
        drop(lifecycle);

        let flushed = self.shared.dispatch();
        tracing::debug!(flushed, "resolver stopped");
    }

    /// Submit a request. Rejected requests come back untouched.
    pub fn enqueue(&self, mut request: Box<Request>) -> Result<(), EnqueueError> {
        if request.state() != RequestState::Unsubmitted {
            return Err(EnqueueError::new(ResolverError::AlreadySubmitted, request));
        }
        let mut state = self.shared.state.lock();
        if !state.running {
            return Err(EnqueueError::new(ResolverError::NotRunning, request));
        }
        request.set_state(RequestState::Pending);
        let wake = state.pending.is_empty();
        state.pending.push_back(request);
        if wake {
            self.shared.work_ready.notify_one();
        }
        Ok(())
    }

    /// Resolve `host`, completing once the event loop ticks.
    ///
    /// The event loop must keep ticking while this is awaited.
    pub async fn lookup(&self, host: impl Into<String>) -> Result<Box<Request>, ResolverError> {
        let (request, done) = Request::with_channel(host);
        self.enqueue(request).map_err(|e| e.into_parts().0)?;
        done.await.map_err(|_| ResolverError::NotRunning)
    }

    /// Run one completion tick on the calling thread. Returns how many
    /// requests were delivered.
    pub fn dispatch_completions(&self) -> usize {
        self.shared.dispatch()
    }

    /// Requests waiting for the worker.
    pub fn pending_count(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    /// Requests resolved but not yet delivered.
    pub fn completed_count(&self) -> usize {
        self.shared.state.lock().completed.len()
    }
}

impl Drop for Resolver {
    fn drop(&mut self) {
        if self.is_running() {
            tracing::debug!(thread = ?thread::current().id(), "resolver dropped while running");
        }
        self.shutdown();
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Resolver")
            .field("running", &state.running)
            .field("pending", &state.pending.len())
            .field("completed", &state.completed.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Worker thread body. Returns once stopped with nothing left pending.
fn run_worker(shared: &Shared, event_loop: &dyn EventLoop, lookup: &mut dyn HostLookup) {
    let mut state = shared.state.lock();
    loop {
        while state.running && state.pending.is_empty() {
            shared.work_ready.wait(&mut state);
        }

        let mut batch = Queue::new();
        batch.append(&mut state.pending);
        if !batch.is_empty() {
            tracing::debug!(batch = batch.len(), "resolving batch");
        }
        MutexGuard::unlocked(&mut state, || process_batch(&mut batch, lookup));

        let wake = !batch.is_empty() && state.completed.is_empty();
        state.completed.append(&mut batch);
        if wake {
            shared.done_count.fetch_add(1, Ordering::Release);
            event_loop.wakeup();
        }
        if !state.running && state.pending.is_empty() {
            break;
        }
    }
}

fn process_batch(batch: &mut Queue<Request>, lookup: &mut dyn HostLookup) {
    for request in batch.iter_mut() {
        request.set_state(RequestState::InFlight);
        if panic::catch_unwind(AssertUnwindSafe(|| lookup.process(request))).is_err() {
            tracing::error!(host = %request.host_name(), "host lookup panicked");
            request.set_failure(GaiError::from_code(libc::EAI_FAIL));
        }
        request.set_state(RequestState::Completed);
        tracing::debug!(
            host = %request.host_name(),
            status = request.status(),
            count = request.ip_addresses().len(),
            "resolved"
        );
    }
}
