use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Default sampling interval of the snapshot metrics publisher.
const DEFAULT_PUBLISH_INTERVAL_MS: u64 = 1_000;

/// Configuration of the task which periodically samples a snapshot tracker and
/// exports its attributes as gauges.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublisherConfig {
    /// Number of ms between two samples of the tracker.
    #[serde(default = "default_publish_interval_ms")]
    pub interval_ms: u64,
}

impl PublisherConfig {
    /// Validates the publisher configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_ms == 0 {
            return Err(ValidationError::PublishIntervalZero);
        }

        Ok(())
    }

    /// Returns the sampling interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_PUBLISH_INTERVAL_MS,
        }
    }
}

fn default_publish_interval_ms() -> u64 {
    DEFAULT_PUBLISH_INTERVAL_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_is_rejected() {
        let config = PublisherConfig { interval_ms: 0 };
        assert_eq!(config.validate(), Err(ValidationError::PublishIntervalZero));
    }

    #[test]
    fn test_interval_defaults_when_missing() {
        let config: PublisherConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PublisherConfig::default());
        assert_eq!(config.interval(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }
}
