//! Tier classes and proxy generation tags.
//!
//! Every cache tier name encodes both the resource class it serves and the
//! proxy generation that owns it. Activation keeps the three tiers of the
//! current generation and deletes everything else.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// The resource class a cache tier serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TierClass {
    /// App-shell resources: scripts, styles, images, fonts, the manifest.
    Static,
    /// Documents and uncategorized same-origin resources.
    Dynamic,
    /// Backend API reads.
    Api,
}

impl TierClass {
    /// All tier classes a proxy generation provisions.
    pub const ALL: [TierClass; 3] = [TierClass::Static, TierClass::Dynamic, TierClass::Api];

    /// The class prefix used in tier names.
    pub fn as_str(&self) -> &'static str {
        match self {
            TierClass::Static => "static",
            TierClass::Dynamic => "dynamic",
            TierClass::Api => "api",
        }
    }

    /// Full tier name for a generation: `{class}-{tag}`.
    pub fn tier_name(&self, version: &VersionTag) -> String {
        format!("{}-{}", self.as_str(), version)
    }
}

impl std::fmt::Display for TierClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identifier distinguishing proxy generations.
///
/// Generated once per instance at startup and never reused; stale tiers are
/// recognized purely by carrying a different tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    /// Construct an explicit tag (tests, diagnostics).
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Derive a fresh tag from the startup wall clock.
    pub fn from_startup_time() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(format!("v{millis}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_name_encodes_class_and_tag() {
        let tag = VersionTag::new("v123");
        assert_eq!(TierClass::Static.tier_name(&tag), "static-v123");
        assert_eq!(TierClass::Dynamic.tier_name(&tag), "dynamic-v123");
        assert_eq!(TierClass::Api.tier_name(&tag), "api-v123");
    }

    #[test]
    fn test_startup_tag_is_nonempty() {
        let tag = VersionTag::from_startup_time();
        assert!(tag.as_str().starts_with('v'));
        assert!(tag.as_str().len() > 1);
    }
}
