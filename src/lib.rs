//! # hostresolver
//!
//! Non-blocking hostname resolution for single-threaded event loops.
//!
//! `hostresolver` hands blocking `getaddrinfo` calls to one dedicated
//! worker thread and delivers the results back on the event loop thread,
//! during the loop's periodic timeout tick. The loop never blocks on a
//! lookup, and completion handlers never run on the worker.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hostresolver::dns::{Request, Resolver};
//! use hostresolver::eventloop::ManualEventLoop;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let event_loop = Arc::new(ManualEventLoop::new());
//! let resolver = Resolver::new(event_loop.clone());
//! resolver.start()?;
//!
//! resolver.enqueue(Request::new("localhost", |request| {
//!     if request.is_ok() {
//!         println!("{:?}", request.ip_addresses());
//!     } else {
//!         println!("lookup failed: {}", request.status_message());
//!     }
//! }))?;
//!
//! event_loop.run_until(Duration::from_secs(5), || resolver.pending_count() == 0);
//! resolver.shutdown();
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error types and request lifecycle states
//! - [`dns`] - The resolver service, requests and the system lookup
//! - [`eventloop`] - The event loop contract and two ready-made loops
//!
//! ## Platform
//!
//! Unix only: lookups go through libc's `getaddrinfo`/`getnameinfo`.

pub mod base;
pub mod dns;
pub mod eventloop;
