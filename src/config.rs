//! Environment-driven configuration.

use std::time::Duration;

/// Connection settings for the search backend.
#[derive(Debug, Clone)]
pub struct SkgConfig {
    /// Base URL of the backend, e.g. `http://solr:8983/solr`.
    pub base_url: String,
    /// Collection used when a caller supplies an empty collection name.
    pub default_collection: String,
    /// Upper bound on one outbound query.
    pub timeout: Duration,
}

impl Default for SkgConfig {
    fn default() -> Self {
        Self {
            base_url: "http://solr:8983/solr".into(),
            default_collection: "products".into(),
            timeout: Duration::from_millis(1000),
        }
    }
}

impl SkgConfig {
    /// Read `SOLR_URL`, `SKG_DEFAULT_COLLECTION`, and `SKG_TIMEOUT_MS`,
    /// falling back to the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("SOLR_URL").unwrap_or(defaults.base_url),
            default_collection: std::env::var("SKG_DEFAULT_COLLECTION")
                .unwrap_or(defaults.default_collection),
            timeout: std::env::var("SKG_TIMEOUT_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SkgConfig::default();
        assert_eq!(config.base_url, "http://solr:8983/solr");
        assert_eq!(config.default_collection, "products");
        assert_eq!(config.timeout, Duration::from_millis(1000));
    }
}
