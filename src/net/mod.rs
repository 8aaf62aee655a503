//! Network access for the proxy.
//!
//! - request/method/mode types shared by the classifier and strategies
//! - [`Fetcher`]: the injected network service
//! - [`http`]: reqwest-backed fetcher used by the standalone binary

pub mod http;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::cache::snapshot::{RequestIdentity, ResponseSnapshot};

/// HTTP method of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// Parse a method name as received from the host runtime.
    pub fn parse(name: &str) -> Option<Method> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "HEAD" => Some(Method::Head),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            "OPTIONS" => Some(Method::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the request was issued by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// A full navigational page load.
    Navigate,
    SameOrigin,
    Cors,
    NoCors,
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HashMap<String, String>,
    pub mode: RequestMode,
}

impl Request {
    /// A plain GET, as issued by precache and warm-up fetches.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            headers: HashMap::new(),
            mode: RequestMode::NoCors,
        }
    }

    /// A navigational page load.
    pub fn navigate(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            headers: HashMap::new(),
            mode: RequestMode::Navigate,
        }
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Cache key for this request.
    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity {
            method: self.method,
            url: self.url.to_string(),
        }
    }

    /// Cache key of the origin's root document, the document fallback of
    /// last resort.
    pub fn root_identity(&self) -> RequestIdentity {
        let mut root = self.url.clone();
        root.set_path("/");
        root.set_query(None);
        root.set_fragment(None);
        RequestIdentity::get(root.to_string())
    }
}

/// Network failures as seen by the strategies.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("network unreachable")]
    Offline,

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}

/// The injected network service.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request and buffer the full response into a snapshot.
    async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("get"), Some(Method::Get));
        assert_eq!(Method::parse("POST"), Some(Method::Post));
        assert_eq!(Method::parse("BREW"), None);
    }

    #[test]
    fn test_root_identity_strips_path_and_query() {
        let request = Request::navigate(
            Url::parse("https://app.test/reports/monthly?range=30d#top").unwrap(),
        );
        assert_eq!(request.root_identity(), RequestIdentity::get("https://app.test/"));
    }
}
