//! Request identities and response snapshots.
//!
//! A snapshot is an immutable, cheaply cloneable copy of a network response.
//! This replaces the platform notion of a single-read body stream: any code
//! path that both returns a response and persists it simply clones the value.

use std::collections::HashMap;

use bytes::Bytes;

use crate::net::Method;

/// Key under which a response snapshot is cached.
///
/// Only GET identities are ever created by the proxy; non-GET requests pass
/// through before any cache is touched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIdentity {
    pub method: Method,
    pub url: String,
}

impl RequestIdentity {
    /// Identity of a GET request for the given URL.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
        }
    }
}

/// Immutable copy of a network response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSnapshot {
    /// HTTP status code.
    pub status: u16,

    /// Response headers, lowercase names.
    pub headers: HashMap<String, String>,

    /// Body bytes. `Bytes` makes clones reference-counted.
    pub body: Bytes,
}

impl ResponseSnapshot {
    pub fn new(status: u16, headers: HashMap<String, String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether this response may be written into a cache tier.
    ///
    /// Error and partial responses are returned to callers but never stored,
    /// so a transient 500 cannot displace a good cached entry.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    /// Synthesized response for a cache miss while the network is down.
    pub fn offline() -> Self {
        Self {
            status: 503,
            headers: HashMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]),
            body: Bytes::from_static(br#"{"error":"Offline"}"#),
        }
    }

    /// Synthesized response for a static asset that is neither cached nor
    /// reachable.
    pub fn not_found() -> Self {
        Self {
            status: 404,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cacheability() {
        let ok = ResponseSnapshot::new(200, HashMap::new(), "ok");
        let created = ResponseSnapshot::new(201, HashMap::new(), "");
        let error = ResponseSnapshot::new(500, HashMap::new(), "");

        assert!(ok.is_cacheable());
        assert!(created.ok() && !created.is_cacheable());
        assert!(!error.ok() && !error.is_cacheable());
    }

    #[test]
    fn test_offline_snapshot_shape() {
        let offline = ResponseSnapshot::offline();
        assert_eq!(offline.status, 503);
        assert_eq!(
            offline.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(&offline.body[..], br#"{"error":"Offline"}"#);
    }

    #[test]
    fn test_clones_are_independent_values() {
        let original = ResponseSnapshot::new(200, HashMap::new(), "payload");
        let copy = original.clone();
        assert_eq!(original, copy);
        assert_eq!(&copy.body[..], b"payload");
    }
}
