//! The cache tier store: named, versioned key→snapshot maps.
//!
//! Modeled as an explicit injected service rather than ambient global state,
//! so tests run against the in-memory implementation and alternative hosts
//! can persist tiers however they like.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::snapshot::{RequestIdentity, ResponseSnapshot};

/// Storage service for cache tiers.
///
/// Writes are keyed overwrites with no transactional isolation; entries are
/// idempotent snapshots, so the last writer wins and concurrent writers for
/// the same identity never produce conflicting partial state.
#[async_trait]
pub trait TierStore: Send + Sync {
    /// Provision an empty tier if it does not exist yet.
    async fn create(&self, tier: &str);

    /// Look up a cached snapshot.
    async fn get(&self, tier: &str, key: &RequestIdentity) -> Option<ResponseSnapshot>;

    /// Insert or overwrite a cached snapshot, creating the tier on demand.
    async fn put(&self, tier: &str, key: RequestIdentity, snapshot: ResponseSnapshot);

    /// Delete a whole tier. Returns whether it existed.
    async fn delete(&self, tier: &str) -> bool;

    /// Names of all existing tiers.
    async fn tiers(&self) -> Vec<String>;

    /// All identities cached in a tier.
    async fn keys(&self, tier: &str) -> Vec<RequestIdentity>;
}

/// In-memory tier store shared by all concurrently running handlers.
#[derive(Debug, Default)]
pub struct MemoryTierStore {
    tiers: RwLock<HashMap<String, HashMap<RequestIdentity, ResponseSnapshot>>>,
}

impl MemoryTierStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TierStore for MemoryTierStore {
    async fn create(&self, tier: &str) {
        self.tiers
            .write()
            .await
            .entry(tier.to_string())
            .or_default();
    }

    async fn get(&self, tier: &str, key: &RequestIdentity) -> Option<ResponseSnapshot> {
        self.tiers.read().await.get(tier)?.get(key).cloned()
    }

    async fn put(&self, tier: &str, key: RequestIdentity, snapshot: ResponseSnapshot) {
        self.tiers
            .write()
            .await
            .entry(tier.to_string())
            .or_default()
            .insert(key, snapshot);
    }

    async fn delete(&self, tier: &str) -> bool {
        self.tiers.write().await.remove(tier).is_some()
    }

    async fn tiers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tiers.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    async fn keys(&self, tier: &str) -> Vec<RequestIdentity> {
        self.tiers
            .read()
            .await
            .get(tier)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryTierStore::new();
        let key = RequestIdentity::get("https://app.test/a");
        let snapshot = ResponseSnapshot::new(200, HashMap::new(), "hello");

        store.put("static-v1", key.clone(), snapshot.clone()).await;

        assert_eq!(store.get("static-v1", &key).await, Some(snapshot));
        assert_eq!(store.get("dynamic-v1", &key).await, None);
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let store = MemoryTierStore::new();
        let key = RequestIdentity::get("https://app.test/a");

        store
            .put(
                "api-v1",
                key.clone(),
                ResponseSnapshot::new(200, HashMap::new(), "old"),
            )
            .await;
        store
            .put(
                "api-v1",
                key.clone(),
                ResponseSnapshot::new(200, HashMap::new(), "new"),
            )
            .await;

        let cached = store.get("api-v1", &key).await.unwrap();
        assert_eq!(&cached.body[..], b"new");
        assert_eq!(store.keys("api-v1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_and_delete_whole_tiers() {
        let store = MemoryTierStore::new();
        store.create("static-v1").await;
        store.create("dynamic-v1").await;

        assert_eq!(store.tiers().await, vec!["dynamic-v1", "static-v1"]);
        assert!(store.delete("static-v1").await);
        assert!(!store.delete("static-v1").await);
        assert_eq!(store.tiers().await, vec!["dynamic-v1"]);
    }
}
