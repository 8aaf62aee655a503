//! Runtime configuration for offline-proxy.
//!
//! Configuration can be loaded from a JSON file or constructed programmatically.
//! All routing knobs (origins, precache lists, API/asset recognition) and the
//! notification constants live here.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "offline-proxy", about = "Offline-first caching proxy")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address (overrides the config file).
    #[arg(long)]
    pub listen: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Application and backend API origins.
    pub origins: OriginConfig,

    /// Startup precache lists.
    pub precache: PrecacheConfig,

    /// Request classification rules.
    pub routing: RoutingConfig,

    /// Notification display constants and suppression rules.
    pub notifications: NotificationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            origins: OriginConfig::default(),
            precache: PrecacheConfig::default(),
            routing: RoutingConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (e.g. "127.0.0.1:8787").
    pub listen: String,

    /// Upstream request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8787".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Origins the proxy is willing to handle. Anything else passes through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginConfig {
    /// Origin the application itself is served from.
    pub app: String,

    /// Origin of the hosted backend (database/auth/functions API).
    pub api: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            app: "http://localhost:8080".to_string(),
            api: "http://localhost:54321".to_string(),
        }
    }
}

/// Resources fetched into the cache tiers during install.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecacheConfig {
    /// Mandatory app-shell resources. Install fails if any of these cannot
    /// be fetched.
    pub manifest: Vec<String>,

    /// Best-effort warm-up of application entry paths. Failures are logged
    /// and ignored.
    pub warmup: Vec<String>,
}

impl Default for PrecacheConfig {
    fn default() -> Self {
        Self {
            manifest: vec![
                "/".to_string(),
                "/manifest.json".to_string(),
                "/icons/icon-192.png".to_string(),
                "/icons/icon-512.png".to_string(),
                "/favicon.ico".to_string(),
            ],
            warmup: vec![
                "/login".to_string(),
                "/dashboard".to_string(),
                "/assets/index.js".to_string(),
                "/assets/index.css".to_string(),
            ],
        }
    }
}

/// Request classification rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Path prefixes recognized as backend API calls.
    pub api_prefixes: Vec<String>,

    /// Path substrings recognized as backend API calls.
    pub api_markers: Vec<String>,

    /// File extensions treated as static assets.
    pub asset_extensions: Vec<String>,

    /// Path segment marking bundled assets.
    pub assets_segment: String,

    /// Filename of the web app manifest.
    pub manifest_file: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_prefixes: vec![
                "/rest/".to_string(),
                "/auth/".to_string(),
                "/functions/".to_string(),
            ],
            api_markers: vec!["/rpc/".to_string(), "/storage/v1/".to_string()],
            asset_extensions: [
                "js", "css", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "woff", "woff2",
                "ttf", "otf",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            assets_segment: "/assets/".to_string(),
            manifest_file: "manifest.json".to_string(),
        }
    }
}

/// Notification display constants and suppression rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Tag used when the payload carries none. The platform collapses
    /// notifications sharing a tag.
    pub default_tag: String,

    /// Body text used when the payload carries none.
    pub default_body: String,

    /// Route opened when the payload data carries no target URL.
    pub default_url: String,

    /// Icon resource path.
    pub icon: String,

    /// Badge resource path.
    pub badge: String,

    /// Vibration pattern in milliseconds.
    pub vibration: Vec<u32>,

    /// Label of the "view" action button.
    pub view_label: String,

    /// Label of the "dismiss" action button.
    pub dismiss_label: String,

    /// Case-insensitive phrases that mark internal setup/onboarding test
    /// notifications. Matching pushes are never displayed.
    pub denylist: Vec<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_tag: "asset-reminder".to_string(),
            default_body: "You have a new reminder".to_string(),
            default_url: "/".to_string(),
            icon: "/icons/icon-192.png".to_string(),
            badge: "/icons/badge-72.png".to_string(),
            vibration: vec![200, 100, 200],
            view_label: "View".to_string(),
            dismiss_label: "Dismiss".to_string(),
            denylist: vec![
                "push notifications enabled".to_string(),
                "notifications are now enabled".to_string(),
                "subscription successful".to_string(),
            ],
        }
    }
}

impl NotificationConfig {
    /// Whether the given title or body text matches the suppression denylist.
    pub fn is_denylisted(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.denylist
            .iter()
            .any(|phrase| text.contains(&phrase.to_lowercase()))
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing files.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.precache.manifest.len(), 5);
        assert!(cfg.routing.api_prefixes.contains(&"/rest/".to_string()));
        assert_eq!(cfg.notifications.default_tag, "asset-reminder");
    }

    #[test]
    fn test_denylist_is_case_insensitive() {
        let cfg = NotificationConfig::default();
        assert!(cfg.is_denylisted("Push Notifications Enabled"));
        assert!(cfg.is_denylisted("push notifications enabled on this device"));
        assert!(!cfg.is_denylisted("Asset #42 is due"));
    }
}
