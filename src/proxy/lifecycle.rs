//! Install and activation phases of a proxy generation.
//!
//! Install provisions this generation's tiers and precaches the app shell;
//! activation evicts every prior generation's tiers and claims the open
//! windows. The host must not route intercepted requests to the instance
//! until activation has returned.

use futures::future;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::snapshot::{RequestIdentity, ResponseSnapshot};
use crate::cache::tier::TierClass;
use crate::net::{FetchError, Request};
use crate::proxy::Proxy;

/// Failure of the mandatory startup precache. Propagates out of install so
/// a previous, working generation stays in control.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("invalid precache path {path}: {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("mandatory precache fetch failed for {path}: {source}")]
    Precache {
        path: String,
        #[source]
        source: FetchError,
    },

    #[error("mandatory precache resource {path} returned status {status}")]
    PrecacheStatus { path: String, status: u16 },
}

impl Proxy {
    /// Startup phase: provision tiers, precache the mandatory app-shell
    /// manifest (all-or-nothing), then warm the critical entry paths
    /// best-effort. Finishes by signalling readiness immediately instead of
    /// waiting for prior generations to release control.
    pub async fn install(&self) -> Result<(), InstallError> {
        for class in TierClass::ALL {
            self.store.create(&self.tier_name(class)).await;
        }

        // All manifest resources are fetched before any is stored, so a
        // failing resource leaves the static tier empty.
        let fetched = future::try_join_all(
            self.config
                .precache
                .manifest
                .iter()
                .map(|path| self.precache_one(path)),
        )
        .await?;

        let static_tier = self.tier_name(TierClass::Static);
        for (identity, snapshot) in fetched {
            self.store.put(&static_tier, identity, snapshot).await;
        }
        info!(
            version = %self.version,
            resources = self.config.precache.manifest.len(),
            "app shell precached"
        );

        let dynamic_tier = self.tier_name(TierClass::Dynamic);
        future::join_all(
            self.config
                .precache
                .warmup
                .iter()
                .map(|path| self.warm_one(&dynamic_tier, path)),
        )
        .await;

        info!(version = %self.version, "install complete, ready to activate");
        Ok(())
    }

    /// Activation phase: evict every tier belonging to another generation,
    /// then claim all open windows. Both steps complete before requests are
    /// handled under the new version.
    pub async fn activate(&self) {
        let keep: Vec<String> = TierClass::ALL
            .iter()
            .map(|class| self.tier_name(*class))
            .collect();

        for name in self.store.tiers().await {
            if !keep.contains(&name) {
                self.store.delete(&name).await;
                info!(tier = %name, "evicted stale cache tier");
            }
        }

        self.clients.claim().await;
        self.activated
            .store(true, std::sync::atomic::Ordering::SeqCst);
        info!(version = %self.version, "proxy generation active");
    }

    async fn precache_one(
        &self,
        path: &str,
    ) -> Result<(RequestIdentity, ResponseSnapshot), InstallError> {
        let url = self
            .app_origin
            .join(path)
            .map_err(|source| InstallError::InvalidPath {
                path: path.to_string(),
                source,
            })?;
        let request = Request::get(url);
        let snapshot =
            self.fetcher
                .fetch(&request)
                .await
                .map_err(|source| InstallError::Precache {
                    path: path.to_string(),
                    source,
                })?;
        if !snapshot.ok() {
            return Err(InstallError::PrecacheStatus {
                path: path.to_string(),
                status: snapshot.status,
            });
        }
        Ok((request.identity(), snapshot))
    }

    /// Warm one entry path into the dynamic tier. Failures are logged and
    /// never block install.
    async fn warm_one(&self, tier: &str, path: &str) {
        let url = match self.app_origin.join(path) {
            Ok(url) => url,
            Err(err) => {
                warn!(path, %err, "skipping invalid warm-up path");
                return;
            }
        };
        let request = Request::get(url);
        match self.fetcher.fetch(&request).await {
            Ok(snapshot) if snapshot.is_cacheable() => {
                self.store.put(tier, request.identity(), snapshot).await;
                debug!(path, "warmed entry path");
            }
            Ok(snapshot) => {
                debug!(path, status = snapshot.status, "warm-up response not stored");
            }
            Err(err) => {
                warn!(path, %err, "warm-up fetch failed");
            }
        }
    }
}
