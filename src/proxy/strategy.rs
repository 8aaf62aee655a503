//! The four per-class consistency strategies.
//!
//! Every strategy resolves to a response: network failures become cache
//! fallbacks, and a miss on both sides becomes a synthesized error response.
//! Nothing escapes a strategy as a fault.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::snapshot::ResponseSnapshot;
use crate::cache::tier::TierClass;
use crate::net::Request;
use crate::proxy::classify::RequestClass;
use crate::proxy::Proxy;

impl Proxy {
    /// Run the strategy for an already classified request.
    pub(crate) async fn run_strategy(
        &self,
        class: RequestClass,
        request: &Request,
    ) -> ResponseSnapshot {
        match class {
            RequestClass::Document => self.network_first_document(request).await,
            RequestClass::Api => self.stale_while_revalidate(request).await,
            RequestClass::StaticAsset => self.cache_first_static(request).await,
            RequestClass::Default => self.network_first_default(request).await,
        }
    }

    /// Documents: network first, falling back to the exact cached URL, then
    /// the cached root document, then a synthesized offline response.
    async fn network_first_document(&self, request: &Request) -> ResponseSnapshot {
        let dynamic = self.tier_name(TierClass::Dynamic);
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.store
                        .put(&dynamic, request.identity(), response.clone())
                        .await;
                }
                response
            }
            Err(err) => {
                debug!(url = %request.url, %err, "document fetch failed, serving from cache");
                if let Some(cached) = self.store.get(&dynamic, &request.identity()).await {
                    return cached;
                }
                if let Some(root) = self.store.get(&dynamic, &request.root_identity()).await {
                    return root;
                }
                ResponseSnapshot::offline()
            }
        }
    }

    /// API reads: serve the cached entry immediately and revalidate in the
    /// background; only an uncached miss waits on the network.
    async fn stale_while_revalidate(&self, request: &Request) -> ResponseSnapshot {
        let api = self.tier_name(TierClass::Api);
        let identity = request.identity();

        if let Some(cached) = self.store.get(&api, &identity).await {
            self.spawn_revalidation(request.clone(), api);
            return cached;
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.store.put(&api, identity, response.clone()).await;
                }
                response
            }
            Err(err) => {
                warn!(url = %request.url, %err, "api fetch failed with no cached entry");
                ResponseSnapshot::offline()
            }
        }
    }

    /// Fire-and-forget refresh of an API cache entry. Deliberately not
    /// awaited by the caller; a failure only costs the refresh.
    fn spawn_revalidation(&self, request: Request, tier: String) {
        let store = Arc::clone(&self.store);
        let fetcher = Arc::clone(&self.fetcher);
        tokio::spawn(async move {
            match fetcher.fetch(&request).await {
                Ok(fresh) if fresh.is_cacheable() => {
                    store.put(&tier, request.identity(), fresh).await;
                    debug!(url = %request.url, "api cache entry revalidated");
                }
                Ok(fresh) => {
                    debug!(url = %request.url, status = fresh.status, "revalidation response not stored");
                }
                Err(err) => {
                    debug!(url = %request.url, %err, "background revalidation failed");
                }
            }
        });
    }

    /// Static assets: cache first; a miss goes to the network and populates
    /// the static tier, an unreachable miss synthesizes a 404.
    async fn cache_first_static(&self, request: &Request) -> ResponseSnapshot {
        let statics = self.tier_name(TierClass::Static);
        let identity = request.identity();

        if let Some(cached) = self.store.get(&statics, &identity).await {
            return cached;
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.store.put(&statics, identity, response.clone()).await;
                }
                response
            }
            Err(err) => {
                debug!(url = %request.url, %err, "static asset unreachable and uncached");
                ResponseSnapshot::not_found()
            }
        }
    }

    /// Everything else: network first with a dynamic-tier fallback.
    async fn network_first_default(&self, request: &Request) -> ResponseSnapshot {
        let dynamic = self.tier_name(TierClass::Dynamic);
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.store
                        .put(&dynamic, request.identity(), response.clone())
                        .await;
                }
                response
            }
            Err(err) => {
                debug!(url = %request.url, %err, "fetch failed, serving from cache");
                match self.store.get(&dynamic, &request.identity()).await {
                    Some(cached) => cached,
                    None => ResponseSnapshot::offline(),
                }
            }
        }
    }
}
