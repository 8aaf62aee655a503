//! The proxy core: event dispatch, interception, and the control channel.
//!
//! Platform hooks are modeled as one closed event sum type handled by
//! [`Proxy::dispatch`], which makes synthetic event injection trivial.
//! Every handler is an `async fn` the host must await to completion before
//! tearing the instance down; the only deliberately detached work is the
//! stale-while-revalidate background fetch.
//!
//! - [`classify`]: resource-class assignment for intercepted requests
//! - [`lifecycle`]: install (precache + warm-up) and activate (evict + claim)
//! - [`strategy`]: the four per-class read/write/fallback policies

pub mod classify;
pub mod lifecycle;
pub mod strategy;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::snapshot::ResponseSnapshot;
use crate::cache::store::TierStore;
use crate::cache::tier::{TierClass, VersionTag};
use crate::client::{ClientMessage, ClientRegistry, ClientWindow};
use crate::config::Config;
use crate::net::{Fetcher, Request};
use crate::notify::{
    build_notification, ClickInfo, NotificationSink, PushPayload, ACTION_DISMISS,
};
use crate::proxy::classify::RequestClass;

/// Tag accepted by the background-sync trigger.
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

/// A platform event delivered to the proxy.
#[derive(Debug)]
pub enum Event {
    Install,
    Activate,
    Intercept(Request),
    Push(Bytes),
    NotificationClick(ClickInfo),
    Message(ControlMessage),
    Sync(String),
}

/// Inbound control-channel message from the hosted application.
#[derive(Debug)]
pub enum ControlMessage {
    /// Force immediate activation.
    SkipWaiting,

    /// Version query, answered synchronously over the reply channel.
    GetVersion { reply: oneshot::Sender<VersionTag> },

    /// Anything unrecognized; ignored for forward compatibility.
    Other(String),
}

/// Decision for an intercepted request.
#[derive(Debug, Clone, PartialEq)]
pub enum Intercept {
    /// Let the request go to the network untouched.
    Passthrough,

    /// Substitute this response for whatever the network would have said.
    Respond(ResponseSnapshot),
}

/// Result of dispatching an event.
#[derive(Debug)]
pub enum Outcome {
    Done,
    Response(Intercept),
}

/// One proxy generation serving all open application windows.
pub struct Proxy {
    pub(crate) version: VersionTag,
    pub(crate) config: Arc<Config>,
    pub(crate) store: Arc<dyn TierStore>,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) clients: Arc<dyn ClientRegistry>,
    pub(crate) notifier: Arc<dyn NotificationSink>,
    pub(crate) app_origin: Url,
    pub(crate) api_origin: Url,
    pub(crate) activated: AtomicBool,
}

impl Proxy {
    pub fn new(
        version: VersionTag,
        config: Arc<Config>,
        store: Arc<dyn TierStore>,
        fetcher: Arc<dyn Fetcher>,
        clients: Arc<dyn ClientRegistry>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self, url::ParseError> {
        let app_origin = Url::parse(&config.origins.app)?;
        let api_origin = Url::parse(&config.origins.api)?;
        Ok(Self {
            version,
            config,
            store,
            fetcher,
            clients,
            notifier,
            app_origin,
            api_origin,
            activated: AtomicBool::new(false),
        })
    }

    pub fn version(&self) -> &VersionTag {
        &self.version
    }

    pub fn store(&self) -> &Arc<dyn TierStore> {
        &self.store
    }

    pub fn app_origin(&self) -> &Url {
        &self.app_origin
    }

    /// Whether activation has completed for this generation.
    pub fn is_active(&self) -> bool {
        self.activated.load(Ordering::SeqCst)
    }

    /// Name of this generation's tier for a class.
    pub(crate) fn tier_name(&self, class: TierClass) -> String {
        class.tier_name(&self.version)
    }

    /// Dispatch one platform event. Install failures propagate so the host
    /// can keep the previous generation in control; every other handler
    /// resolves internally.
    pub async fn dispatch(&self, event: Event) -> anyhow::Result<Outcome> {
        match event {
            Event::Install => {
                self.install().await?;
                Ok(Outcome::Done)
            }
            Event::Activate => {
                self.activate().await;
                Ok(Outcome::Done)
            }
            Event::Intercept(request) => Ok(Outcome::Response(self.intercept(request).await)),
            Event::Push(payload) => {
                self.push(&payload).await;
                Ok(Outcome::Done)
            }
            Event::NotificationClick(click) => {
                self.notification_click(click).await;
                Ok(Outcome::Done)
            }
            Event::Message(message) => {
                self.message(message).await;
                Ok(Outcome::Done)
            }
            Event::Sync(tag) => {
                self.sync(&tag).await;
                Ok(Outcome::Done)
            }
        }
    }

    /// Handle an intercepted request. The returned response, when present,
    /// fully substitutes the network response.
    pub async fn intercept(&self, request: Request) -> Intercept {
        match self.classify_request(&request) {
            None => Intercept::Passthrough,
            Some(class) => {
                debug!(url = %request.url, %class, "handling intercepted request");
                Intercept::Respond(self.run_strategy(class, &request).await)
            }
        }
    }

    fn classify_request(&self, request: &Request) -> Option<RequestClass> {
        classify::classify(
            &self.config.routing,
            &self.app_origin,
            &self.api_origin,
            request,
        )
    }

    /// Handle an inbound push. Malformed payloads are logged and dropped;
    /// this handler never fails.
    pub async fn push(&self, payload: &[u8]) {
        if payload.is_empty() {
            debug!("ignoring push event without payload");
            return;
        }
        let parsed: PushPayload = match serde_json::from_slice(payload) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(%err, "discarding malformed push payload");
                return;
            }
        };
        match build_notification(parsed, &self.config.notifications, unix_millis()) {
            Some(notification) => {
                debug!(tag = %notification.tag, "displaying notification");
                self.notifier.show(&notification).await;
            }
            None => debug!("push suppressed"),
        }
    }

    /// Route a notification click: focus an open application window and tell
    /// it to navigate, or open a fresh window.
    pub async fn notification_click(&self, click: ClickInfo) {
        self.notifier.close(&click.tag).await;
        if click.action.as_deref() == Some(ACTION_DISMISS) {
            return;
        }

        let url = click
            .data
            .as_ref()
            .and_then(|data| data.url.clone())
            .unwrap_or_else(|| self.config.notifications.default_url.clone());
        let notification_id = click.data.as_ref().and_then(|data| data.notification_id.clone());

        let windows = self.clients.windows().await;
        if let Some(window) = windows.iter().find(|window| self.is_app_window(window)) {
            self.clients.focus(&window.id).await;
            let message = ClientMessage::navigate_to_notification(
                url,
                notification_id,
                click.action.clone(),
            );
            self.clients.post_message(&window.id, message).await;
            return;
        }

        let target = match &notification_id {
            Some(id) => append_query(&url, "notificationId", id),
            None => url,
        };
        self.clients.open_window(&target).await;
    }

    fn is_app_window(&self, window: &ClientWindow) -> bool {
        Url::parse(&window.url)
            .map(|url| url.origin() == self.app_origin.origin())
            .unwrap_or(false)
    }

    /// Handle a control-channel message.
    pub async fn message(&self, message: ControlMessage) {
        match message {
            ControlMessage::SkipWaiting => {
                if self.is_active() {
                    debug!("skip-waiting received while already active");
                } else {
                    info!(version = %self.version, "skip-waiting received, activating");
                    self.activate().await;
                }
            }
            ControlMessage::GetVersion { reply } => {
                if reply.send(self.version.clone()).is_err() {
                    debug!("version query reply channel closed");
                }
            }
            ControlMessage::Other(kind) => {
                debug!(kind, "ignoring unrecognized control message");
            }
        }
    }

    /// Background-sync trigger. Nothing is queued yet; the tag is accepted
    /// so hosts can start scheduling retryable work before it exists.
    pub async fn sync(&self, tag: &str) {
        if tag == BACKGROUND_SYNC_TAG {
            debug!("background sync triggered, no queued work");
        } else {
            debug!(tag, "ignoring unknown sync tag");
        }
    }
}

fn append_query(url: &str, key: &str, value: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{key}={value}")
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_query() {
        assert_eq!(append_query("/a", "id", "7"), "/a?id=7");
        assert_eq!(append_query("/a?x=1", "id", "7"), "/a?x=1&id=7");
    }
}
