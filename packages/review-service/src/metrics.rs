//! Prometheus metrics for the listing cache

use prometheus::{register_int_counter_with_registry, IntCounter, Opts, Registry};

#[derive(Clone)]
pub struct ListingCacheMetrics {
    pub hits: IntCounter,
    pub misses: IntCounter,
    pub origin_fetches: IntCounter,
    pub coalesced: IntCounter,
    pub dropped_records: IntCounter,
}

impl ListingCacheMetrics {
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        Ok(Self {
            hits: register_int_counter_with_registry!(
                Opts::new("review_listing_cache_hits_total", "Listing cache hits"),
                registry
            )?,
            misses: register_int_counter_with_registry!(
                Opts::new("review_listing_cache_misses_total", "Listing cache misses"),
                registry
            )?,
            origin_fetches: register_int_counter_with_registry!(
                Opts::new(
                    "review_listing_origin_fetches_total",
                    "Search index queries issued on a miss"
                ),
                registry
            )?,
            coalesced: register_int_counter_with_registry!(
                Opts::new(
                    "review_listing_coalesced_total",
                    "Misses that joined an in-flight fetch"
                ),
                registry
            )?,
            dropped_records: register_int_counter_with_registry!(
                Opts::new(
                    "review_listing_dropped_records_total",
                    "Hits skipped because they did not decode"
                ),
                registry
            )?,
        })
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.get() as f64;
        let total = hits + self.misses.get() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_hit_rate() {
        let registry = Registry::new();
        let metrics = ListingCacheMetrics::new(&registry).unwrap();
        metrics.hits.inc_by(3);
        metrics.misses.inc();
        assert!((metrics.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(registry.gather().len(), 5);
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        ListingCacheMetrics::new(&registry).unwrap();
        assert!(ListingCacheMetrics::new(&registry).is_err());
    }
}
