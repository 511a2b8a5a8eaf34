//! System hostname lookup using `getaddrinfo`.
//!
//! This is the blocking half of the resolver. It runs only on the worker
//! thread, so the hints and the name-formatting buffer are plain scratch
//! space reused across requests.

use super::request::Request;
use std::ffi::{c_char, CStr, CString};
use std::marker::PhantomData;
use std::{mem, ptr};
use thiserror::Error;

// Values from POSIX <netinet/in.h>; not exported by the libc crate on Linux.
const INET_ADDRSTRLEN: usize = 16;
const INET6_ADDRSTRLEN: usize = 46;

/// Large enough for either family's numeric form plus a terminator.
const NAME_BUF_LEN: usize =
    (if INET_ADDRSTRLEN < INET6_ADDRSTRLEN { INET6_ADDRSTRLEN } else { INET_ADDRSTRLEN }) + 1;

/// A status code from the resolution subsystem (`EAI_*`).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
#[error("{}", describe(.0))]
pub struct GaiError(i32);

impl GaiError {
    /// Wraps a raw `EAI_*` code.
    pub const fn from_code(code: i32) -> Self {
        Self(code)
    }

    /// The raw `EAI_*` code.
    pub fn code(&self) -> i32 {
        self.0
    }

    /// The subsystem's own description of the code.
    pub fn message(&self) -> String {
        describe(&self.0)
    }
}

fn describe(code: &i32) -> String {
    // SAFETY: gai_strerror returns a pointer to a static, NUL-terminated
    // string for any input.
    let msg = unsafe { libc::gai_strerror(*code) };
    if msg.is_null() {
        return format!("resolver error {code}");
    }
    unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
}

/// Fills in the result fields of a request. Runs on the worker thread.
pub trait HostLookup: Send {
    fn process(&mut self, request: &mut Request);
}

impl<F> HostLookup for F
where
    F: FnMut(&mut Request) + Send,
{
    fn process(&mut self, request: &mut Request) {
        self(request)
    }
}

/// Apply per-address outcomes to `request`.
///
/// Unusable records are skipped. The request only fails if no address was
/// usable and at least one record failed, in which case the last record
/// error becomes the request's status.
pub fn record_results<I>(request: &mut Request, records: I)
where
    I: IntoIterator<Item = Result<String, GaiError>>,
{
    let mut addresses = Vec::new();
    let mut last_error = None;
    for record in records {
        match record {
            Ok(address) => addresses.push(address),
            Err(e) => last_error = Some(e),
        }
    }
    match last_error {
        Some(e) if addresses.is_empty() => request.set_failure(e),
        _ => request.set_success(addresses),
    }
}

/// Resolves through the operating system's `getaddrinfo`.
///
/// Asks for both IPv4 and IPv6 stream addresses and no service lookup;
/// every usable record is rendered in numeric form.
pub struct SystemLookup {
    hints: libc::addrinfo,
    name_buf: [c_char; NAME_BUF_LEN],
}

// SAFETY: the pointer fields of `hints` are always null; nothing here
// refers to thread-local or shared memory.
unsafe impl Send for SystemLookup {}

impl SystemLookup {
    /// Creates a lookup with zeroed scratch space.
    pub fn new() -> Self {
        Self {
            // SAFETY: addrinfo is a plain C struct; all-zero is its "unset" value.
            hints: unsafe { mem::zeroed() },
            name_buf: [0; NAME_BUF_LEN],
        }
    }

    fn reset_hints(&mut self) {
        // SAFETY: as in `new`.
        self.hints = unsafe { mem::zeroed() };
        self.hints.ai_family = libc::AF_UNSPEC;
        self.hints.ai_socktype = libc::SOCK_STREAM;
        self.hints.ai_flags = 0;
        self.hints.ai_protocol = 0;
    }
}

impl Default for SystemLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl HostLookup for SystemLookup {
    fn process(&mut self, request: &mut Request) {
        let Ok(host) = CString::new(request.host_name()) else {
            tracing::debug!(host = %request.host_name().escape_debug(), "hostname contains NUL");
            request.set_failure(GaiError::from_code(libc::EAI_NONAME));
            return;
        };

        self.reset_hints();
        let list = match AddrInfoList::lookup(&host, &self.hints) {
            Ok(list) => list,
            Err(e) => {
                tracing::debug!(host = %request.host_name(), error = %e, "getaddrinfo failed");
                request.set_failure(e);
                return;
            }
        };

        let name_buf = &mut self.name_buf;
        let records = list
            .iter()
            .filter(|ai| ai.ai_family == libc::AF_INET || ai.ai_family == libc::AF_INET6)
            .map(|ai| numeric_host(ai, name_buf));
        record_results(request, records);
    }
}

fn numeric_host(ai: &libc::addrinfo, buf: &mut [c_char; NAME_BUF_LEN]) -> Result<String, GaiError> {
    // SAFETY: `ai_addr`/`ai_addrlen` come straight from getaddrinfo and the
    // buffer length passed leaves room for the terminator written below.
    let rc = unsafe {
        libc::getnameinfo(
            ai.ai_addr,
            ai.ai_addrlen,
            buf.as_mut_ptr(),
            (NAME_BUF_LEN - 1) as _,
            ptr::null_mut(),
            0,
            libc::NI_NUMERICHOST | libc::NI_NUMERICSERV,
        )
    };
    if rc != 0 {
        return Err(GaiError::from_code(rc));
    }
    buf[NAME_BUF_LEN - 1] = 0;
    // SAFETY: getnameinfo wrote a NUL-terminated string into `buf`.
    Ok(unsafe { CStr::from_ptr(buf.as_ptr()) }.to_string_lossy().into_owned())
}

/// Owns a `getaddrinfo` result list and frees it on every exit path.
struct AddrInfoList {
    head: *mut libc::addrinfo,
}

impl AddrInfoList {
    fn lookup(host: &CStr, hints: &libc::addrinfo) -> Result<Self, GaiError> {
        let mut head = ptr::null_mut();
        // SAFETY: `host` is NUL-terminated, `hints` is initialized and `head`
        // is a valid out-pointer.
        let rc = unsafe { libc::getaddrinfo(host.as_ptr(), ptr::null(), hints, &mut head) };
        let list = Self { head };
        if rc != 0 {
            return Err(GaiError::from_code(rc));
        }
        Ok(list)
    }

    fn iter(&self) -> AddrInfoIter<'_> {
        AddrInfoIter { next: self.head, _list: PhantomData }
    }
}

impl Drop for AddrInfoList {
    fn drop(&mut self) {
        if !self.head.is_null() {
            // SAFETY: `head` was returned by getaddrinfo and is freed once.
            unsafe { libc::freeaddrinfo(self.head) };
        }
    }
}

struct AddrInfoIter<'a> {
    next: *const libc::addrinfo,
    _list: PhantomData<&'a AddrInfoList>,
}

impl<'a> Iterator for AddrInfoIter<'a> {
    type Item = &'a libc::addrinfo;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next.is_null() {
            return None;
        }
        // SAFETY: every node stays valid until the owning list is dropped.
        let ai = unsafe { &*self.next };
        self.next = ai.ai_next;
        Some(ai)
    }
}
