//! Process-wide DNS resolution cache

use moka::future::Cache;
use hyper::client::connect::dns::Name;
use reqwest::dns::{Addrs, Resolve, Resolving};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// reqwest resolver that memoizes lookups for every client sharing it
///
/// The cache is internally synchronized, so it can be shared across worker
/// threads of the runtime.
#[derive(Clone)]
pub struct CachingResolver {
    cache: Cache<String, Arc<Vec<SocketAddr>>>,
}

impl CachingResolver {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();

        Self { cache }
    }

    /// Resolve a host name, consulting the cache first
    pub async fn lookup(&self, host: &str) -> std::io::Result<Arc<Vec<SocketAddr>>> {
        if let Some(addrs) = self.cache.get(host).await {
            return Ok(addrs);
        }

        // Port is replaced by the connector
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, 0)).await?.collect();
        debug!(host, count = addrs.len(), "resolved host");

        let addrs = Arc::new(addrs);
        self.cache.insert(host.to_string(), addrs.clone()).await;
        Ok(addrs)
    }

    /// Number of cached host names
    pub fn size(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for CachingResolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(300), 1024)
    }
}

impl Resolve for CachingResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.clone();
        Box::pin(async move {
            let addrs = resolver.lookup(name.as_str()).await?;
            let addrs: Addrs = Box::new(addrs.as_ref().clone().into_iter());
            Ok(addrs)
        })
    }
}
