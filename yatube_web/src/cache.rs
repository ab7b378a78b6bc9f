use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

const MAX_CACHED_PAGES: u64 = 1_000;

/// Rendered global-feed fragments keyed by the requested page number.
///
/// Entries live for a fixed window after insertion; nothing invalidates
/// them early, so a new post shows up only once its page expires.
#[derive(Clone)]
pub struct PageCache {
    fragments: Option<Cache<i64, String>>,
}

impl PageCache {
    /// A zero `ttl` turns the cache off.
    pub fn new(ttl: Duration) -> Self {
        let fragments = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHED_PAGES)
                .time_to_live(ttl)
                .build()
        });

        Self { fragments }
    }

    pub async fn get(&self, page: i64) -> Option<String> {
        let fragment = self.fragments.as_ref()?.get(&page).await;
        if fragment.is_some() {
            debug!(page, "page cache hit");
        }
        fragment
    }

    pub async fn insert(&self, page: i64, fragment: String) {
        if let Some(fragments) = &self.fragments {
            fragments.insert(page, fragment).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_stored_fragment_within_window() {
        let cache = PageCache::new(Duration::from_secs(20));

        assert!(cache.get(1).await.is_none());
        cache.insert(1, "<p>first</p>".to_string()).await;

        assert_eq!(cache.get(1).await.as_deref(), Some("<p>first</p>"));
        assert!(cache.get(2).await.is_none());
    }

    #[tokio::test]
    async fn expires_after_window() {
        let cache = PageCache::new(Duration::from_millis(50));
        cache.insert(1, "old".to_string()).await;

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get(1).await.is_none());
    }

    #[tokio::test]
    async fn zero_ttl_disables_caching() {
        let cache = PageCache::new(Duration::ZERO);
        cache.insert(1, "never".to_string()).await;

        assert!(cache.get(1).await.is_none());
    }
}
