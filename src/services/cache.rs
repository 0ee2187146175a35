use std::time::Duration;

/// In-process cache of external identity -> internal user id.
///
/// A user's internal id never changes and users are never deleted, so a
/// cached mapping can only go stale by expiring.
#[derive(Clone)]
pub struct IdentityCache {
    ids: moka::future::Cache<String, i64>,
}

impl IdentityCache {
    /// Create a new identity cache
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let ids = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { ids }
    }

    /// Look up a cached internal id
    pub async fn get(&self, external_id: &str) -> Option<i64> {
        let hit = self.ids.get(&CacheKey::identity(external_id)).await;
        if hit.is_some() {
            tracing::trace!("Identity cache hit: {}", external_id);
        }
        hit
    }

    /// Remember the internal id of an external identity
    pub async fn insert(&self, external_id: &str, id: i64) {
        self.ids.insert(CacheKey::identity(external_id), id).await;
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for an external identity
    pub fn identity(external_id: &str) -> String {
        format!("ext:{}", external_id)
    }
}
