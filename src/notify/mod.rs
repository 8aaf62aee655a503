//! Push notification filtering, display payloads, and click information.
//!
//! Inbound push payloads are untrusted JSON. Anything without a title is
//! suppressed, as is anything whose title or body matches the configured
//! setup-phrase denylist, which keeps internal onboarding test pushes away
//! from end users. Everything else becomes a fully populated display
//! payload with a fresh data envelope.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::NotificationConfig;

/// Action identifier of the "view" button.
pub const ACTION_VIEW: &str = "view";

/// Action identifier of the "dismiss" button.
pub const ACTION_DISMISS: &str = "dismiss";

/// Inbound push payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tag: Option<String>,
    #[serde(rename = "notificationId")]
    pub notification_id: Option<String>,
    pub data: Option<Map<String, Value>>,
}

/// Data envelope attached to a displayed notification, consumed later by
/// the click handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    pub url: Option<String>,

    /// Display time, Unix epoch milliseconds.
    pub timestamp: u64,

    #[serde(rename = "notificationId", skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,

    /// Remaining payload data fields, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One action button on a displayed notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A fully resolved notification ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    pub vibrate: Vec<u32>,
    pub actions: Vec<NotificationAction>,
    pub data: NotificationData,
}

/// Information delivered when a displayed notification is clicked.
#[derive(Debug, Clone)]
pub struct ClickInfo {
    /// Tag of the clicked notification.
    pub tag: String,

    /// Action button identifier, absent for a plain body click.
    pub action: Option<String>,

    /// The data envelope stored at display time, if any survived.
    pub data: Option<NotificationData>,
}

/// Host-provided notification display service.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Display a notification. Must be awaited as part of the push handler.
    async fn show(&self, notification: &Notification);

    /// Close the notification carrying the given tag.
    async fn close(&self, tag: &str);
}

/// Build the display payload for a push, or `None` when it must be
/// suppressed.
pub fn build_notification(
    payload: PushPayload,
    config: &NotificationConfig,
    timestamp: u64,
) -> Option<Notification> {
    let title = payload.title?;
    if config.is_denylisted(&title) {
        return None;
    }
    if let Some(body) = payload.body.as_deref() {
        if config.is_denylisted(body) {
            return None;
        }
    }

    let mut extra = payload.data.unwrap_or_default();
    let url = extra
        .remove("url")
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| config.default_url.clone());

    Some(Notification {
        title,
        body: payload.body.unwrap_or_else(|| config.default_body.clone()),
        icon: config.icon.clone(),
        badge: config.badge.clone(),
        tag: payload.tag.unwrap_or_else(|| config.default_tag.clone()),
        require_interaction: false,
        vibrate: config.vibration.clone(),
        actions: vec![
            NotificationAction {
                action: ACTION_VIEW.to_string(),
                title: config.view_label.clone(),
                icon: None,
            },
            NotificationAction {
                action: ACTION_DISMISS.to_string(),
                title: config.dismiss_label.clone(),
                icon: None,
            },
        ],
        data: NotificationData {
            url: Some(url),
            timestamp,
            notification_id: payload.notification_id,
            extra,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> PushPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_missing_title_is_suppressed() {
        let config = NotificationConfig::default();
        let result = build_notification(payload(r#"{"body":"no title"}"#), &config, 0);
        assert!(result.is_none());
    }

    #[test]
    fn test_setup_phrase_is_suppressed() {
        let config = NotificationConfig::default();
        assert!(build_notification(
            payload(r#"{"title":"Push Notifications Enabled"}"#),
            &config,
            0
        )
        .is_none());
        assert!(build_notification(
            payload(r#"{"title":"Hello","body":"Subscription successful!"}"#),
            &config,
            0
        )
        .is_none());
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = NotificationConfig::default();
        let shown =
            build_notification(payload(r#"{"title":"Nhắc nhở"}"#), &config, 1234).unwrap();

        assert_eq!(shown.title, "Nhắc nhở");
        assert_eq!(shown.body, config.default_body);
        assert_eq!(shown.tag, config.default_tag);
        assert_eq!(shown.icon, config.icon);
        assert!(!shown.require_interaction);
        assert_eq!(shown.data.url.as_deref(), Some("/"));
        assert_eq!(shown.data.timestamp, 1234);
    }

    #[test]
    fn test_data_envelope_extracts_url_and_keeps_extras() {
        let config = NotificationConfig::default();
        let shown = build_notification(
            payload(
                r#"{"title":"TS đến hạn","tag":"due","notificationId":"n-9",
                    "data":{"url":"/assets/42","assetCode":"TS-0042"}}"#,
            ),
            &config,
            0,
        )
        .unwrap();

        assert_eq!(shown.tag, "due");
        assert_eq!(shown.data.url.as_deref(), Some("/assets/42"));
        assert_eq!(shown.data.notification_id.as_deref(), Some("n-9"));
        assert_eq!(shown.data.extra["assetCode"], "TS-0042");
        assert!(shown.data.extra.get("url").is_none());
    }

    #[test]
    fn test_action_set_is_fixed() {
        let config = NotificationConfig::default();
        let shown = build_notification(payload(r#"{"title":"x"}"#), &config, 0).unwrap();
        let ids: Vec<&str> = shown.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(ids, vec![ACTION_VIEW, ACTION_DISMISS]);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let config = NotificationConfig::default();
        let shown = build_notification(
            payload(r#"{"title":"x","notificationId":"n-1"}"#),
            &config,
            7,
        )
        .unwrap();
        let json = serde_json::to_value(&shown).unwrap();
        assert_eq!(json["requireInteraction"], false);
        assert_eq!(json["data"]["notificationId"], "n-1");
        assert_eq!(json["data"]["timestamp"], 7);
    }
}
