//! Hostname resolution offload.
//!
//! Provides a resolver service that runs blocking `getaddrinfo` lookups on
//! a dedicated worker thread and delivers results on the event loop
//! thread:
//! - [`Resolver`]: the service (start, enqueue, shutdown, completion tick)
//! - [`Request`]: hostname in, status and addresses out
//! - [`Queue`]: the intrusive FIFO both service queues are built on
//! - [`HostLookup`]: the blocking lookup run by the worker, with
//!   [`SystemLookup`] as the `getaddrinfo` implementation
//!
//! # Example
//!
//! ```rust,ignore
//! use hostresolver::dns::Resolver;
//! use hostresolver::eventloop::TokioEventLoop;
//!
//! let event_loop = Arc::new(TokioEventLoop::new());
//! let resolver = Resolver::new(event_loop.clone());
//! resolver.start()?;
//! let request = tokio::select! {
//!     request = resolver.lookup("localhost") => request?,
//!     _ = event_loop.run_until(|| false) => unreachable!(),
//! };
//! println!("{:?}", request.ip_addresses());
//! ```

pub mod config;
mod gai;
pub mod queue;
pub mod request;
mod resolver;

pub use config::ResolverConfig;
pub use gai::{record_results, GaiError, HostLookup, SystemLookup};
pub use queue::{Link, Linked, Queue};
pub use request::{Completion, Request};
pub use resolver::Resolver;
