use crate::geocoding::error::GeocodeError;
use crate::geocoding::geocoder::Geocoder;
use crate::types::location::GeocodedLocation;
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const DEFAULT_CACHE_CAPACITY: usize = 1024;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct CachedLocation {
    location: GeocodedLocation,
    inserted_at: Instant,
    /// Insertion order, used to pick the eviction victim.
    sequence: u64,
}

/// Wraps a [`Geocoder`] with a bounded in-memory cache of successful lookups.
///
/// Addresses are matched after trimming and lowercasing. Failures are not cached.
/// Entries expire after a time-to-live, and once the cache is full the oldest
/// entry makes room for the new one.
pub struct CachedGeocoder {
    inner: Arc<dyn Geocoder>,
    capacity: usize,
    ttl: Duration,
    next_sequence: AtomicU64,
    cache: Mutex<HashMap<String, CachedLocation>>,
}

impl CachedGeocoder {
    /// Caches up to [`DEFAULT_CACHE_CAPACITY`] addresses for [`DEFAULT_CACHE_TTL`].
    pub fn new(inner: Arc<dyn Geocoder>) -> Self {
        Self::with_limits(inner, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }

    /// A `capacity` of 0 disables caching.
    pub fn with_limits(inner: Arc<dyn Geocoder>, capacity: usize, ttl: Duration) -> Self {
        Self {
            inner,
            capacity,
            ttl,
            next_sequence: AtomicU64::new(0),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache_key(address: &str) -> String {
        address.trim().to_lowercase()
    }

    fn is_fresh(&self, entry: &CachedLocation, now: Instant) -> bool {
        now.duration_since(entry.inserted_at) < self.ttl
    }

    /// Drops expired entries, then the oldest ones until there is room for one more.
    fn make_room(&self, cache: &mut HashMap<String, CachedLocation>, now: Instant) {
        cache.retain(|_, entry| self.is_fresh(entry, now));
        while cache.len() >= self.capacity {
            let oldest = cache
                .iter()
                .min_by_key(|(_, entry)| entry.sequence)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    debug!("Evicting '{}' from the geocode cache", key);
                    cache.remove(&key);
                }
                None => break,
            }
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }
}

#[async_trait]
impl Geocoder for CachedGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedLocation, GeocodeError> {
        let key = Self::cache_key(address);

        {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.get(&key) {
                if self.is_fresh(cached, Instant::now()) {
                    debug!("Geocode cache hit for '{}'", key);
                    return Ok(cached.location.clone());
                }
            }
        }

        // Lookup happens outside the lock
        let resolved = self.inner.geocode(address).await?;
        if self.capacity == 0 {
            return Ok(resolved);
        }

        let now = Instant::now();
        let mut cache = self.cache.lock().await;
        if let Some(existing) = cache.get(&key) {
            // A concurrent lookup for the same address finished first.
            if self.is_fresh(existing, now) {
                return Ok(existing.location.clone());
            }
        }
        if !cache.contains_key(&key) {
            self.make_room(&mut cache, now);
        }
        cache.insert(
            key,
            CachedLocation {
                location: resolved.clone(),
                inserted_at: now,
                sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
            },
        );
        Ok(resolved)
    }
}
