use crate::dns::request::Request;
use std::{fmt, io};
use thiserror::Error;

/// Lifecycle and submission errors reported synchronously by the resolver.
///
/// Lookup failures never show up here; they are recorded on the request.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Resolver is not running")]
    NotRunning,
    #[error("Resolver is already running")]
    AlreadyRunning,
    #[error("Request was already submitted")]
    AlreadySubmitted,
    #[error("Failed to spawn resolver thread: {0}")]
    SpawnFailed(#[source] io::Error),
}

impl ResolverError {
    /// Negative errno equivalent, for callers that speak status codes.
    pub fn as_errno(&self) -> i32 {
        match self {
            ResolverError::NotRunning
            | ResolverError::AlreadyRunning
            | ResolverError::AlreadySubmitted => -libc::EINVAL,
            ResolverError::SpawnFailed(e) => -e.raw_os_error().unwrap_or(libc::EAGAIN),
        }
    }
}

/// A rejected submission. Hands the untouched request back to the caller.
#[derive(Error)]
#[error("{reason}")]
pub struct EnqueueError {
    reason: ResolverError,
    request: Box<Request>,
}

impl EnqueueError {
    pub(crate) fn new(reason: ResolverError, request: Box<Request>) -> Self {
        Self { reason, request }
    }

    /// Why the request was rejected.
    pub fn reason(&self) -> &ResolverError {
        &self.reason
    }

    /// The rejected request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Take the request back.
    pub fn into_request(self) -> Box<Request> {
        self.request
    }

    /// Split into the reason and the request.
    pub fn into_parts(self) -> (ResolverError, Box<Request>) {
        (self.reason, self.request)
    }
}

impl fmt::Debug for EnqueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnqueueError")
            .field("reason", &self.reason)
            .field("host", &self.request.host_name())
            .finish_non_exhaustive()
    }
}
