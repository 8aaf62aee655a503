//! Request classification.
//!
//! Non-GET requests and requests for foreign origins are never handled;
//! everything else lands in exactly one resource class, which picks the
//! strategy that produces the response.

use url::Url;

use crate::config::RoutingConfig;
use crate::net::{Method, Request};

/// The resource class of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Full navigational page load.
    Document,
    /// Backend API read.
    Api,
    /// Script, style, image, font, or the web app manifest.
    StaticAsset,
    /// Same-origin GET that fits no other class.
    Default,
}

impl std::fmt::Display for RequestClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RequestClass::Document => "document",
            RequestClass::Api => "api",
            RequestClass::StaticAsset => "static-asset",
            RequestClass::Default => "default",
        };
        f.write_str(name)
    }
}

/// Assign a class to a request, or `None` when it must pass through
/// untouched.
pub fn classify(
    routing: &RoutingConfig,
    app_origin: &Url,
    api_origin: &Url,
    request: &Request,
) -> Option<RequestClass> {
    if request.method != Method::Get {
        return None;
    }
    let origin = request.url.origin();
    if origin != app_origin.origin() && origin != api_origin.origin() {
        return None;
    }

    if request.is_navigation() {
        return Some(RequestClass::Document);
    }

    let path = request.url.path();
    if is_api_path(routing, path) {
        return Some(RequestClass::Api);
    }
    if is_static_path(routing, path) {
        return Some(RequestClass::StaticAsset);
    }
    Some(RequestClass::Default)
}

fn is_api_path(routing: &RoutingConfig, path: &str) -> bool {
    routing
        .api_prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
        || routing
            .api_markers
            .iter()
            .any(|marker| path.contains(marker.as_str()))
}

fn is_static_path(routing: &RoutingConfig, path: &str) -> bool {
    if path.contains(routing.assets_segment.as_str()) {
        return true;
    }
    let segment = path.rsplit('/').next().unwrap_or(path);
    if segment == routing.manifest_file {
        return true;
    }
    match segment.rsplit_once('.') {
        Some((_, extension)) => routing
            .asset_extensions
            .iter()
            .any(|known| known == extension),
        None => false,
    }
}
