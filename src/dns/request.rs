//! The unit of work handed to the resolver.

use super::gai::GaiError;
use super::queue::{Link, Linked};
use crate::base::requeststate::RequestState;
use std::fmt;
use std::net::IpAddr;
use tokio::sync::oneshot;

/// Single-shot completion handler. Receives the request back, on the event
/// loop thread, once its result is recorded.
pub type Completion = Box<dyn FnOnce(Box<Request>) + Send + 'static>;

/// A hostname lookup: hostname in, status and addresses out.
///
/// Requests are boxed and move by ownership: the caller hands one to
/// [`Resolver::enqueue`](super::Resolver::enqueue) and gets it back through
/// its completion handler.
pub struct Request {
    host_name: String,
    status: i32,
    status_message: String,
    ip_addresses: Vec<String>,
    state: RequestState,
    on_done: Option<Completion>,
    link: Link<Request>,
}

impl Request {
    /// Creates a request whose completion calls `on_done`.
    pub fn new<F>(host_name: impl Into<String>, on_done: F) -> Box<Self>
    where
        F: FnOnce(Box<Request>) + Send + 'static,
    {
        Box::new(Self {
            host_name: host_name.into(),
            status: 0,
            status_message: String::new(),
            ip_addresses: Vec::new(),
            state: RequestState::Unsubmitted,
            on_done: Some(Box::new(on_done)),
            link: Link::new(),
        })
    }

    /// Creates a request whose completion resolves the returned receiver.
    pub fn with_channel(host_name: impl Into<String>) -> (Box<Self>, oneshot::Receiver<Box<Request>>) {
        let (tx, rx) = oneshot::channel();
        let request = Self::new(host_name, move |request| {
            // Receiver gone means the caller lost interest.
            let _ = tx.send(request);
        });
        (request, rx)
    }

    /// The name to resolve.
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// 0 on success, otherwise a resolution subsystem error code.
    pub fn status(&self) -> i32 {
        self.status
    }

    /// Empty on success.
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Numeric addresses in the order the system returned them.
    pub fn ip_addresses(&self) -> &[String] {
        &self.ip_addresses
    }

    /// Whether the lookup succeeded.
    pub fn is_ok(&self) -> bool {
        self.status == 0
    }

    /// The failure, if the lookup failed.
    pub fn error(&self) -> Option<GaiError> {
        (self.status != 0).then(|| GaiError::from_code(self.status))
    }

    /// Addresses parsed into [`IpAddr`]. Scoped IPv6 forms (`fe80::1%eth0`)
    /// are skipped.
    pub fn ip_addrs(&self) -> Vec<IpAddr> {
        self.ip_addresses.iter().filter_map(|a| a.parse().ok()).collect()
    }

    /// Where the request is in its lifecycle.
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Record a failed lookup. Clears any address list.
    pub fn set_failure(&mut self, error: GaiError) {
        self.status = error.code();
        self.status_message = error.message();
        self.ip_addresses.clear();
    }

    /// Record a successful lookup.
    pub fn set_success(&mut self, addresses: Vec<String>) {
        self.status = 0;
        self.status_message.clear();
        self.ip_addresses = addresses;
    }

    pub(crate) fn set_state(&mut self, state: RequestState) {
        debug_assert!((state as u8) > (self.state as u8), "{:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Hand the request back to its owner.
    pub(crate) fn complete(mut self: Box<Self>) {
        self.set_state(RequestState::Dispatched);
        if let Some(on_done) = self.on_done.take() {
            on_done(self);
        }
    }
}

impl Linked for Request {
    fn link(&self) -> &Link<Self> {
        &self.link
    }

    fn link_mut(&mut self) -> &mut Link<Self> {
        &mut self.link
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("host_name", &self.host_name)
            .field("status", &self.status)
            .field("status_message", &self.status_message)
            .field("ip_addresses", &self.ip_addresses)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
