//! Base types and error handling.
//!
//! - [`ResolverError`]: lifecycle and submission errors
//! - [`EnqueueError`]: a rejected submission, carrying the request back
//! - [`RequestState`]: where a request is in its lifecycle

pub mod requeststate;
pub mod resolveerror;

pub use requeststate::RequestState;
pub use resolveerror::{EnqueueError, ResolverError};
