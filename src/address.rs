use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::record::{Position, TrackerRecord};

/// Failure modes of a reverse-geocoding lookup
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("no address known for {lat:.4}, {lon:.4}")]
    NotFound { lat: f64, lon: f64 },
    #[error("reverse geocoding backend error: {0}")]
    Backend(String),
}

/// Resolves a human-readable place description for a coordinate.
///
/// Network-backed implementations live with the consumer; this crate ships
/// the table-backed [`StaticGeocoder`] and the [`CachingGeocoder`] wrapper.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn get_address(&self, position: &Position) -> Result<String, GeocodeError>;
}

/// Read-mostly address store consulted before the geocoding backend.
/// Injected once at startup and kept for the process lifetime.
#[async_trait]
pub trait AddressCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: &str, value: &str);
}

/// Process-local address cache
pub struct InMemoryAddressCache {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryAddressCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryAddressCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressCache for InMemoryAddressCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }

    async fn put(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
    }
}

/// Cache key: coordinates rounded to four decimals (about an 11 m grid),
/// so nearby fixes share one lookup
pub fn cache_key(position: &Position) -> String {
    format!("{:.4},{:.4}", position.lat, position.lon)
}

/// Geocoder wrapper that consults an injected cache store before the
/// backend and stores successful lookups
pub struct CachingGeocoder {
    inner: Arc<dyn Geocoder>,
    cache: Arc<dyn AddressCache>,
}

impl CachingGeocoder {
    pub fn new(inner: Arc<dyn Geocoder>, cache: Arc<dyn AddressCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl Geocoder for CachingGeocoder {
    async fn get_address(&self, position: &Position) -> Result<String, GeocodeError> {
        let key = cache_key(position);
        if let Some(address) = self.cache.get(&key).await {
            debug!("address cache hit for {}", key);
            return Ok(address);
        }
        let address = self.inner.get_address(position).await?;
        self.cache.put(&key, &address).await;
        Ok(address)
    }
}

/// Geocoder backed by a fixed place table keyed like [`cache_key`].
/// With `coordinate_fallback` set, unknown coordinates resolve to a plain
/// coordinate rendering instead of failing, which suits offline routers.
pub struct StaticGeocoder {
    places: HashMap<String, String>,
    coordinate_fallback: bool,
}

impl StaticGeocoder {
    pub fn from_table(places: &HashMap<String, String>, coordinate_fallback: bool) -> Self {
        Self {
            places: places.clone(),
            coordinate_fallback,
        }
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn get_address(&self, position: &Position) -> Result<String, GeocodeError> {
        if let Some(address) = self.places.get(&cache_key(position)) {
            return Ok(address.clone());
        }
        if self.coordinate_fallback {
            return Ok(format!("near {:.5}, {:.5}", position.lat, position.lon));
        }
        Err(GeocodeError::NotFound {
            lat: position.lat,
            lon: position.lon,
        })
    }
}

/// Address stage of the pipeline.
///
/// A no-op for records without a location. Unlike the location stage, a
/// lookup failure here PROPAGATES to the caller. That asymmetry is a
/// documented contract of the pipeline, not an accident.
pub struct AddressEnricher {
    geocoder: Arc<dyn Geocoder>,
}

impl AddressEnricher {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    pub async fn enrich(&self, record: &mut TrackerRecord) -> Result<(), GeocodeError> {
        let Some(position) = record.location else {
            return Ok(());
        };
        record.address = Some(self.geocoder.get_address(&position).await?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RawFrame, RecordKind};
    use crate::registry::ProtocolTag;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGeocoder {
        calls: AtomicUsize,
    }

    impl CountingGeocoder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Geocoder for CountingGeocoder {
        async fn get_address(&self, _position: &Position) -> Result<String, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("Av. Providencia 111, Santiago".to_string())
        }
    }

    struct FailingGeocoder;

    #[async_trait]
    impl Geocoder for FailingGeocoder {
        async fn get_address(&self, _position: &Position) -> Result<String, GeocodeError> {
            Err(GeocodeError::Backend("forced failure".to_string()))
        }
    }

    fn record_at(lat: f64, lon: f64) -> TrackerRecord {
        let frame = RawFrame::new(b"frame");
        let mut record = TrackerRecord::with_kind(&frame, ProtocolTag::TzAvl05, RecordKind::Data);
        record.location = Some(Position { lat, lon });
        record
    }

    #[tokio::test]
    async fn test_noop_without_location() {
        let enricher = AddressEnricher::new(Arc::new(FailingGeocoder));
        let frame = RawFrame::new(b"frame");
        let mut record = TrackerRecord::with_kind(&frame, ProtocolTag::TzAvl05, RecordKind::Data);
        enricher
            .enrich(&mut record)
            .await
            .expect("no lookup, no failure");
        assert!(record.address.is_none());
    }

    #[tokio::test]
    async fn test_sets_address_from_geocoder() {
        let enricher = AddressEnricher::new(Arc::new(CountingGeocoder::new()));
        let mut record = record_at(-33.361225, -70.512733);
        enricher.enrich(&mut record).await.unwrap();
        assert_eq!(
            record.address.as_deref(),
            Some("Av. Providencia 111, Santiago")
        );
    }

    #[tokio::test]
    async fn test_failure_propagates() {
        let enricher = AddressEnricher::new(Arc::new(FailingGeocoder));
        let mut record = record_at(-33.361225, -70.512733);
        let err = enricher.enrich(&mut record).await.unwrap_err();
        assert!(err.to_string().contains("forced failure"));
        assert!(record.address.is_none());
    }

    #[tokio::test]
    async fn test_caching_geocoder_hits_cache_on_second_lookup() {
        let backend = Arc::new(CountingGeocoder::new());
        let geocoder = CachingGeocoder::new(backend.clone(), Arc::new(InMemoryAddressCache::new()));
        let position = Position {
            lat: -33.361225,
            lon: -70.512733,
        };
        let first = geocoder.get_address(&position).await.unwrap();
        // A fix a few meters away lands on the same grid cell
        let nearby = Position {
            lat: -33.361249,
            lon: -70.512711,
        };
        let second = geocoder.get_address(&nearby).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_caching_geocoder_does_not_cache_failures() {
        let geocoder = CachingGeocoder::new(
            Arc::new(FailingGeocoder),
            Arc::new(InMemoryAddressCache::new()),
        );
        let position = Position { lat: 0.0, lon: 0.0 };
        assert!(geocoder.get_address(&position).await.is_err());
    }

    #[tokio::test]
    async fn test_static_geocoder_fallback_modes() {
        let mut places = HashMap::new();
        places.insert(
            "-33.3612,-70.5127".to_string(),
            "Camino a Melipilla, Maipú".to_string(),
        );
        let position = Position {
            lat: -33.36122,
            lon: -70.51272,
        };

        let strict = StaticGeocoder::from_table(&places, false);
        assert_eq!(
            strict.get_address(&position).await.unwrap(),
            "Camino a Melipilla, Maipú"
        );
        let missing = Position { lat: 1.0, lon: 2.0 };
        assert!(strict.get_address(&missing).await.is_err());

        let lenient = StaticGeocoder::from_table(&places, true);
        assert_eq!(
            lenient.get_address(&missing).await.unwrap(),
            "near 1.00000, 2.00000"
        );
    }
}
