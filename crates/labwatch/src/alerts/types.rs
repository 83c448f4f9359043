//! Detector trait and the context each detector runs with.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::entities::{Alert, AlertConfiguration, AlertType};
use crate::errors::{MonitorError, MonitorResult};
use crate::storage::Store;

/// Everything a detector may read during one evaluation
pub struct DetectorContext {
    pub store: Arc<dyn Store>,
    /// Active policy for the detector's alert type
    pub config: AlertConfiguration,
    pub now: DateTime<Utc>,
}

impl DetectorContext {
    pub fn new(store: Arc<dyn Store>, config: AlertConfiguration, now: DateTime<Utc>) -> Self {
        Self { store, config, now }
    }

    pub fn threshold(&self, key: &str) -> f64 {
        self.config.threshold(key)
    }

    /// A threshold expressed in days, as a duration
    pub fn days(&self, key: &str) -> MonitorResult<Duration> {
        self.duration(key, 86_400.0)
    }

    /// A threshold expressed in hours, as a duration
    pub fn hours(&self, key: &str) -> MonitorResult<Duration> {
        self.duration(key, 3_600.0)
    }

    /// `now` moved back by `window`
    pub fn before_now(&self, window: Duration) -> MonitorResult<DateTime<Utc>> {
        self.now
            .checked_sub_signed(window)
            .ok_or_else(|| MonitorError::Config {
                reason: format!(
                    "window of {} days before {} is out of range for {}",
                    window.num_days(),
                    self.now,
                    self.config.alert_type
                ),
            })
    }

    fn duration(&self, key: &str, unit_secs: f64) -> MonitorResult<Duration> {
        let value = self.threshold(key);
        let secs = (value * unit_secs).round();
        // `as i64` saturates, so anything chrono cannot hold fails below
        Some(secs)
            .filter(|s| s.is_finite())
            .and_then(|s| Duration::try_seconds(s as i64))
            .ok_or_else(|| MonitorError::Config {
                reason: format!(
                    "threshold '{key}' for {} is out of range: {value}",
                    self.config.alert_type
                ),
            })
    }
}

/// Trait for risk detectors.
///
/// A detector only proposes alerts. Deduplication against unresolved
/// alerts and persistence happen in [`emit`](super::emit::emit), so
/// proposing an alert that is already open is harmless.
#[async_trait]
pub trait AlertDetector: Send + Sync {
    /// Alert type this detector raises
    fn alert_type(&self) -> AlertType;

    /// Human-readable name
    fn name(&self) -> &'static str {
        self.alert_type().name()
    }

    /// Inspect current state and propose alerts
    async fn detect(&self, ctx: &DetectorContext) -> MonitorResult<Vec<Alert>>;
}
