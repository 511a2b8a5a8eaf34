//! System Lookup Tests
//!
//! Runs real `getaddrinfo` lookups through the resolver service:
//! - numeric literals come back in canonical numeric form
//! - unresolvable names fail on the request, not on the service
//! - `localhost` (soft, depends on the host's configuration)

use hostresolver::dns::{HostLookup, Request, Resolver, SystemLookup};
use hostresolver::eventloop::ManualEventLoop;
use parking_lot::Mutex;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

fn resolve_all(hosts: &[&str], timeout: Duration) -> Vec<Box<Request>> {
    let event_loop = Arc::new(ManualEventLoop::new());
    let resolver = Resolver::new(event_loop.clone());
    resolver.start().unwrap();

    let done = Arc::new(Mutex::new(Vec::new()));
    for host in hosts {
        let done = Arc::clone(&done);
        resolver.enqueue(Request::new(*host, move |request| done.lock().push(request))).unwrap();
    }
    assert!(
        event_loop.run_until(timeout, || done.lock().len() == hosts.len()),
        "lookups did not complete in time"
    );
    resolver.shutdown();

    let mut done = done.lock();
    std::mem::take(&mut *done)
}

#[test]
fn test_numeric_literals() {
    let results = resolve_all(&["127.0.0.1", "::1", "192.0.2.33"], Duration::from_secs(10));

    assert_eq!(results[0].status(), 0, "{}", results[0].status_message());
    assert_eq!(results[0].ip_addresses(), ["127.0.0.1".to_string()]);
    assert_eq!(results[0].ip_addrs(), vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]);

    assert_eq!(results[1].status(), 0, "{}", results[1].status_message());
    assert_eq!(results[1].ip_addrs(), vec![IpAddr::V6(Ipv6Addr::LOCALHOST)]);

    assert_eq!(results[2].ip_addresses(), ["192.0.2.33".to_string()]);
    assert!(results[2].status_message().is_empty());
}

#[test]
fn test_canonical_ipv6_form() {
    let results = resolve_all(&["0:0:0:0:0:0:0:1", "2001:db8:0:0:0:0:0:1"], Duration::from_secs(10));
    assert_eq!(results[0].ip_addresses(), ["::1".to_string()]);
    assert_eq!(results[1].ip_addresses(), ["2001:db8::1".to_string()]);
}

#[test]
fn test_unresolvable_name_fails_on_request() {
    let results = resolve_all(
        &["bad\0name", "this-domain-definitely-does-not-exist.invalid", "127.0.0.1"],
        Duration::from_secs(60),
    );

    for failed in &results[..2] {
        assert_ne!(failed.status(), 0, "{} resolved", failed.host_name());
        assert!(failed.ip_addresses().is_empty());
        assert!(!failed.status_message().is_empty());
        assert!(failed.error().is_some());
    }

    // The service kept going
    assert!(results[2].is_ok());
}

#[test]
fn test_localhost() {
    let mut request = Request::new("localhost", |_| {});
    SystemLookup::new().process(&mut request);

    // Depending on system config, this might fail in some sandboxes,
    // but localhost is normally in /etc/hosts.
    if request.is_ok() {
        assert!(!request.ip_addresses().is_empty());
        assert!(request.ip_addrs().iter().all(|ip| ip.is_loopback()));
    } else {
        println!("localhost did not resolve: {}", request.status_message());
    }
}
