//! Alert lifecycle: sweeps, fan-out, resolution and queries.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use notify::{AlertNotification, Notifier};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::alerts::{emit, is_open, AlertDetector, DetectorContext, DetectorRegistry, Emission};
use crate::delivery::deliver;
use crate::entities::{Alert, AlertConfiguration, AlertSeverity, AlertType, Person, Role};
use crate::errors::{MonitorError, MonitorResult};
use crate::storage::{AlertFilter, Store};

/// Largest accepted threshold value: 100 years in hours
const MAX_THRESHOLD: f64 = 876_000.0;

/// Time bounds for one sweep
#[derive(Debug, Clone, Copy)]
pub struct ManagerSettings {
    /// Bound on one detector's detect-and-persist run
    pub detector_timeout: Duration,
    /// Bound on one notification hand-off
    pub notify_timeout: Duration,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            detector_timeout: Duration::from_secs(30),
            notify_timeout: Duration::from_secs(10),
        }
    }
}

/// A detector run that failed and was skipped for this pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorFailure {
    pub alert_type: AlertType,
    pub error: String,
}

/// Outcome of one sweep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepReport {
    pub created: Vec<Alert>,
    pub failures: Vec<DetectorFailure>,
    /// Detectors skipped because their configuration is disabled
    pub disabled: Vec<AlertType>,
    /// Proposed alerts dropped by the daily quota
    pub over_quota: usize,
    pub notifications_sent: usize,
    /// New alerts whose fan-out was held back by the cooldown
    pub cooled_down: usize,
}

/// Active-alert counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertStatistics {
    pub total_active: usize,
    pub by_severity: BTreeMap<AlertSeverity, usize>,
    pub by_type: BTreeMap<AlertType, usize>,
}

#[derive(Debug, Default)]
struct DetectorRun {
    created: Vec<Alert>,
    over_quota: usize,
}

/// Clears the in-flight flag when a sweep ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Coordinates detectors, persistence and notification fan-out
pub struct AlertManager {
    store: Arc<dyn Store>,
    notifier: Arc<Notifier>,
    registry: DetectorRegistry,
    settings: ManagerSettings,
    sweep_in_flight: AtomicBool,
}

impl AlertManager {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<Notifier>, settings: ManagerSettings) -> Self {
        Self::with_registry(store, notifier, settings, DetectorRegistry::new())
    }

    pub fn with_registry(
        store: Arc<dyn Store>,
        notifier: Arc<Notifier>,
        settings: ManagerSettings,
        registry: DetectorRegistry,
    ) -> Self {
        Self {
            store,
            notifier,
            registry,
            settings,
            sweep_in_flight: AtomicBool::new(false),
        }
    }

    /// Run every detector once.
    ///
    /// Returns `None` without doing anything when another sweep is still in
    /// flight. A failing or slow detector is logged and reported; the rest
    /// still run.
    pub async fn run_all_detectors(&self, now: DateTime<Utc>) -> Option<SweepReport> {
        let _guard = self.try_begin()?;
        let detectors: Vec<Arc<dyn AlertDetector>> = self.registry.iter().cloned().collect();
        let report = self.sweep(&detectors, now).await;

        info!(
            created = report.created.len(),
            failures = report.failures.len(),
            disabled = report.disabled.len(),
            over_quota = report.over_quota,
            notifications = report.notifications_sent,
            "Alert sweep complete"
        );
        Some(report)
    }

    /// Run one detector on demand; shares the in-flight guard with sweeps.
    pub async fn run_detector(
        &self,
        alert_type: AlertType,
        now: DateTime<Utc>,
    ) -> MonitorResult<Option<SweepReport>> {
        let detector = self
            .registry
            .get(alert_type)
            .cloned()
            .ok_or_else(|| MonitorError::not_found("Detector", alert_type.as_str()))?;

        let Some(_guard) = self.try_begin() else {
            return Ok(None);
        };
        Ok(Some(self.sweep(&[detector], now).await))
    }

    /// Resolve an alert. Resolving twice keeps the first resolution.
    pub async fn resolve(
        &self,
        alert_id: Uuid,
        resolver_id: &str,
        reason: Option<&str>,
    ) -> MonitorResult<Alert> {
        let alert = self
            .store
            .get_alert(alert_id)
            .await?
            .ok_or_else(|| MonitorError::not_found("Alert", alert_id.to_string()))?;
        if alert.resolved {
            debug!(alert_id = %alert_id, "Alert already resolved");
            return Ok(alert);
        }

        let resolved = self
            .store
            .mark_resolved(alert_id, resolver_id, Utc::now(), reason)
            .await?;
        info!(
            alert_id = %alert_id,
            alert_type = %resolved.alert_type,
            resolver = resolver_id,
            "Alert resolved"
        );
        Ok(resolved)
    }

    /// Unresolved alerts, most severe and then newest first.
    pub async fn get_active(&self, person_id: Option<&str>) -> MonitorResult<Vec<Alert>> {
        let filter = person_id.map(AlertFilter::for_user).unwrap_or_default();
        let mut alerts = self.store.unresolved_alerts(&filter).await?;
        alerts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(alerts)
    }

    pub async fn get_statistics(&self) -> MonitorResult<AlertStatistics> {
        let active = self.store.unresolved_alerts(&AlertFilter::default()).await?;

        let mut stats = AlertStatistics {
            total_active: active.len(),
            by_severity: [
                AlertSeverity::Low,
                AlertSeverity::Medium,
                AlertSeverity::High,
                AlertSeverity::Critical,
            ]
            .into_iter()
            .map(|s| (s, 0))
            .collect(),
            by_type: AlertType::ALL.into_iter().map(|t| (t, 0)).collect(),
        };
        for alert in &active {
            *stats.by_severity.entry(alert.severity).or_insert(0) += 1;
            *stats.by_type.entry(alert.alert_type).or_insert(0) += 1;
        }
        Ok(stats)
    }

    /// Seed a default configuration for each type that has none.
    ///
    /// Existing rows are left as they are. Returns how many were inserted.
    pub async fn ensure_default_configurations(&self) -> MonitorResult<usize> {
        let mut inserted = 0;
        for alert_type in AlertType::ALL {
            if self
                .store
                .insert_configuration_if_absent(AlertConfiguration::default_for(alert_type))
                .await?
            {
                inserted += 1;
            }
        }
        if inserted > 0 {
            info!(inserted, "Seeded default alert configurations");
        }
        Ok(inserted)
    }

    /// Replace the stored policy for one alert type.
    pub async fn update_configuration(&self, config: AlertConfiguration) -> MonitorResult<()> {
        if let Some((key, value)) = config
            .thresholds
            .iter()
            .find(|(_, v)| !(0.0..=MAX_THRESHOLD).contains(*v))
        {
            return Err(MonitorError::Config {
                reason: format!(
                    "threshold '{key}' for {} must be between 0 and {MAX_THRESHOLD}, got {value}",
                    config.alert_type
                ),
            });
        }

        if self.store.get_configuration(config.alert_type).await?.is_none() {
            self.store.insert_configuration_if_absent(config.clone()).await?;
        } else {
            self.store.update_configuration(&config).await?;
        }
        info!(alert_type = %config.alert_type, enabled = config.enabled, "Alert configuration updated");
        Ok(())
    }

    pub async fn configuration(&self, alert_type: AlertType) -> MonitorResult<AlertConfiguration> {
        Ok(self
            .store
            .get_configuration(alert_type)
            .await?
            .unwrap_or_else(|| AlertConfiguration::default_for(alert_type)))
    }

    fn try_begin(&self) -> Option<InFlight<'_>> {
        if self
            .sweep_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Alert sweep already in flight, ignoring trigger");
            return None;
        }
        Some(InFlight(&self.sweep_in_flight))
    }

    async fn sweep(&self, detectors: &[Arc<dyn AlertDetector>], now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        for detector in detectors {
            let alert_type = detector.alert_type();
            let config = match self.configuration(alert_type).await {
                Ok(config) => config,
                Err(e) => {
                    error!(alert_type = %alert_type, error = %e, "Failed to load alert configuration");
                    report.failures.push(DetectorFailure {
                        alert_type,
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            if !config.enabled {
                debug!(alert_type = %alert_type, "Detector disabled, skipping");
                report.disabled.push(alert_type);
                continue;
            }

            let limit = self.settings.detector_timeout;
            let outcome = tokio::time::timeout(limit, self.run_one(detector.as_ref(), &config, now))
                .await
                .unwrap_or_else(|_| {
                    Err(MonitorError::Timeout {
                        operation: format!("{} detector", detector.name()),
                        secs: limit.as_secs(),
                    })
                });

            match outcome {
                Ok(run) => {
                    report.over_quota += run.over_quota;
                    for alert in run.created {
                        if self.in_cooldown(&alert, &config, now).await {
                            report.cooled_down += 1;
                        } else {
                            report.notifications_sent += self.fan_out(&alert, &config).await;
                        }
                        report.created.push(alert);
                    }
                }
                Err(e) => {
                    error!(
                        alert_type = %alert_type,
                        transient = e.is_transient(),
                        error = %e,
                        "Detector failed, continuing with the rest"
                    );
                    report.failures.push(DetectorFailure {
                        alert_type,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    async fn run_one(
        &self,
        detector: &dyn AlertDetector,
        config: &AlertConfiguration,
        now: DateTime<Utc>,
    ) -> MonitorResult<DetectorRun> {
        let ctx = DetectorContext::new(self.store.clone(), config.clone(), now);
        let proposed = detector.detect(&ctx).await?;

        let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let created_today = self
            .store
            .alerts_created_since(config.alert_type, midnight)
            .await?
            .len();
        let mut remaining = (config.max_alerts_per_day as usize).saturating_sub(created_today);

        let mut run = DetectorRun::default();
        for alert in proposed {
            if remaining == 0 {
                if !is_open(self.store.as_ref(), &alert).await? {
                    run.over_quota += 1;
                }
                continue;
            }
            if let Emission::Created(alert) = emit(self.store.as_ref(), alert).await? {
                info!(
                    alert_id = %alert.id,
                    alert_type = %alert.alert_type,
                    severity = ?alert.severity,
                    subject = alert.subject(),
                    "Alert created"
                );
                remaining -= 1;
                run.created.push(alert);
            }
        }

        if run.over_quota > 0 {
            warn!(
                alert_type = %config.alert_type,
                dropped = run.over_quota,
                max_per_day = config.max_alerts_per_day,
                "Daily alert quota reached"
            );
        }
        Ok(run)
    }

    /// Whether an earlier alert for the same type and subject was created
    /// inside the cooldown window.
    async fn in_cooldown(&self, alert: &Alert, config: &AlertConfiguration, now: DateTime<Utc>) -> bool {
        if config.cooldown_hours == 0 {
            return false;
        }
        let since = now - chrono::Duration::hours(i64::from(config.cooldown_hours));
        match self.store.alerts_created_since(alert.alert_type, since).await {
            Ok(recent) => {
                let cooled = recent
                    .iter()
                    .any(|a| a.id != alert.id && a.subject() == alert.subject());
                if cooled {
                    debug!(alert_id = %alert.id, "Within cooldown, not notifying");
                }
                cooled
            }
            Err(e) => {
                warn!(alert_id = %alert.id, error = %e, "Cooldown lookup failed, notifying anyway");
                false
            }
        }
    }

    /// Notify every supervisor and admin. Returns deliveries that succeeded.
    async fn fan_out(&self, alert: &Alert, config: &AlertConfiguration) -> usize {
        let recipients = match self.supervisory_recipients().await {
            Ok(recipients) => recipients,
            Err(e) => {
                warn!(alert_id = %alert.id, error = %e, "Failed to load notification recipients");
                return 0;
            }
        };
        if recipients.is_empty() {
            debug!(alert_id = %alert.id, "No supervisory recipients");
        }

        let data = serde_json::to_value(&alert.data).unwrap_or_default();
        let mut sent = 0;
        for recipient in recipients {
            let notification = AlertNotification::new(
                &recipient.id,
                &alert.title,
                &alert.message,
                "alert",
                alert.id.to_string(),
            )
            .with_severity(alert.severity.into())
            .with_metadata("alertType", alert.alert_type.as_str())
            .with_metadata("subject", alert.subject())
            .with_metadata("inApp", config.channels.in_app)
            .with_metadata("email", config.channels.email)
            .with_metadata("push", config.channels.push)
            .with_metadata("data", data.clone());

            if deliver(&self.notifier, notification, self.settings.notify_timeout).await {
                sent += 1;
            }
        }
        sent
    }

    async fn supervisory_recipients(&self) -> MonitorResult<Vec<Person>> {
        let mut seen = BTreeSet::new();
        let mut recipients = Vec::new();
        for role in Role::SUPERVISORY {
            for person in self.store.persons_by_role(role).await? {
                if seen.insert(person.id.clone()) {
                    recipients.push(person);
                }
            }
        }
        Ok(recipients)
    }
}
