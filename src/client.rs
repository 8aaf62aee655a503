//! Client windows: the open application windows a proxy instance serves.
//!
//! The registry is a host-provided service; the proxy only ever claims
//! windows at activation and routes notification clicks to them.

use async_trait::async_trait;
use serde::Serialize;

/// Message type posted to a window when a notification click should
/// navigate in place.
pub const NAVIGATE_TO_NOTIFICATION: &str = "NAVIGATE_TO_NOTIFICATION";

/// An open application window.
#[derive(Debug, Clone)]
pub struct ClientWindow {
    /// Host-assigned window identifier.
    pub id: String,

    /// URL currently loaded in the window.
    pub url: String,
}

/// Structured message posted to a running application window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub kind: String,

    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl ClientMessage {
    pub fn navigate_to_notification(
        url: impl Into<String>,
        notification_id: Option<String>,
        action: Option<String>,
    ) -> Self {
        Self {
            kind: NAVIGATE_TO_NOTIFICATION.to_string(),
            url: url.into(),
            notification_id,
            action,
        }
    }
}

/// Host-provided window registry.
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Take control of every open window so the current instance serves it
    /// without a reload.
    async fn claim(&self);

    /// Enumerate open windows, including ones not yet controlled by this
    /// instance.
    async fn windows(&self) -> Vec<ClientWindow>;

    /// Bring a window to the foreground. Returns whether it succeeded.
    async fn focus(&self, id: &str) -> bool;

    /// Post a structured message to a window.
    async fn post_message(&self, id: &str, message: ClientMessage);

    /// Open a new window at the given URL.
    async fn open_window(&self, url: &str);
}
