//! Side cache for API key lookups.
//!
//! Entries are keyed by the SHA-256 fingerprint of the API key, never the key itself, and expire
//! after a fixed TTL. The store stays the source of truth: every write that can change the outcome
//! of a lookup (rotation, deactivation) invalidates the merchant's entries before it returns.
//! Only active merchants are ever cached.
//!
//! A lookup that races with an invalidation must not resurrect a superseded key. Callers take an
//! epoch with [`ApiKeyCache::epoch`] before reading the store and pass it to
//! [`ApiKeyCache::insert`]; any invalidation in between bumps the epoch and the insert is discarded.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use dashmap::DashMap;

use crate::models::{api_key::ApiKey, merchant::Merchant};

struct CachedMerchant {
    merchant: Merchant,
    cached_at: Instant,
}

/// TTL-bounded cache of active merchants by API key fingerprint.
pub struct ApiKeyCache {
    entries: DashMap<String, CachedMerchant>,
    ttl: Duration,
    epoch: AtomicU64,
}

impl ApiKeyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            epoch: AtomicU64::new(0),
        }
    }

    /// Current invalidation epoch. Read this before the store lookup whose result gets cached.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Return the cached merchant for `api_key` if present, fresh, and active.
    pub fn get(&self, api_key: &str) -> Option<Merchant> {
        let fingerprint = ApiKey::fingerprint(api_key);

        let hit = self.entries.get(&fingerprint).and_then(|entry| {
            (entry.cached_at.elapsed() < self.ttl && entry.merchant.active)
                .then(|| entry.merchant.clone())
        });

        if hit.is_none() {
            self.entries.remove(&fingerprint);
        }

        hit
    }

    /// Cache a merchant under its current API key.
    ///
    /// Ignored if the merchant is inactive or if any invalidation happened since `epoch` was read.
    pub fn insert(&self, merchant: &Merchant, epoch: u64) {
        if !merchant.active || self.epoch() != epoch {
            return;
        }

        let fingerprint = ApiKey::fingerprint(&merchant.api_key);
        self.entries.insert(
            fingerprint.clone(),
            CachedMerchant {
                merchant: merchant.clone(),
                cached_at: Instant::now(),
            },
        );

        // An invalidation that slipped in after the first check may have run its sweep before
        // this entry landed.
        if self.epoch() != epoch {
            self.entries.remove(&fingerprint);
        }
    }

    /// Drop every entry belonging to `merchant_id`.
    pub fn invalidate_merchant(&self, merchant_id: i64) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.entries
            .retain(|_, entry| entry.merchant.id != merchant_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn merchant(id: i64, api_key: &str, active: bool) -> Merchant {
        Merchant {
            id,
            company_name: format!("Company {}", id),
            email: format!("m{}@example.com", id),
            password_hash: "hash".to_string(),
            api_key: api_key.to_string(),
            active,
            settings: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let cache = ApiKeyCache::new(Duration::from_secs(60));
        cache.insert(&merchant(1, "pk_one", true), cache.epoch());

        assert_eq!(cache.get("pk_one").unwrap().id, 1);
        assert!(cache.get("pk_two").is_none());
    }

    #[test]
    fn test_inactive_merchants_are_not_cached() {
        let cache = ApiKeyCache::new(Duration::from_secs(60));
        cache.insert(&merchant(1, "pk_one", false), cache.epoch());

        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let cache = ApiKeyCache::new(Duration::ZERO);
        cache.insert(&merchant(1, "pk_one", true), cache.epoch());

        assert!(cache.get("pk_one").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_merchant() {
        let cache = ApiKeyCache::new(Duration::from_secs(60));
        cache.insert(&merchant(1, "pk_one", true), cache.epoch());
        cache.insert(&merchant(2, "pk_two", true), cache.epoch());

        cache.invalidate_merchant(1);

        assert!(cache.get("pk_one").is_none());
        assert_eq!(cache.get("pk_two").unwrap().id, 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_after_invalidation_is_discarded() {
        let cache = ApiKeyCache::new(Duration::from_secs(60));
        let epoch = cache.epoch();

        // Rotation lands between the store read and the cache fill.
        cache.invalidate_merchant(1);
        cache.insert(&merchant(1, "pk_superseded", true), epoch);

        assert!(cache.get("pk_superseded").is_none());
    }
}
