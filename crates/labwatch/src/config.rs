//! Process configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::domain::SchedulePolicy;
use crate::manager::ManagerSettings;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// JSON snapshot backing the in-memory store
    pub store_path: PathBuf,
    pub sweep_interval: Duration,
    pub reminder_interval: Duration,
    pub detector_timeout: Duration,
    pub notify_timeout: Duration,
    pub min_weekly_hours: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("labwatch.json"),
            sweep_interval: Duration::from_secs(1800),
            reminder_interval: Duration::from_secs(120),
            detector_timeout: Duration::from_secs(30),
            notify_timeout: Duration::from_secs(10),
            min_weekly_hours: 20.0,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            store_path: std::env::var("LABWATCH_STORE_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map_or(defaults.store_path, PathBuf::from),
            sweep_interval: Duration::from_secs(env_or(
                "LABWATCH_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval.as_secs(),
            )),
            reminder_interval: Duration::from_secs(env_or(
                "LABWATCH_REMINDER_INTERVAL_SECS",
                defaults.reminder_interval.as_secs(),
            )),
            detector_timeout: Duration::from_secs(env_or(
                "LABWATCH_DETECTOR_TIMEOUT_SECS",
                defaults.detector_timeout.as_secs(),
            )),
            notify_timeout: Duration::from_secs(env_or(
                "LABWATCH_NOTIFY_TIMEOUT_SECS",
                defaults.notify_timeout.as_secs(),
            )),
            min_weekly_hours: env_or("LABWATCH_MIN_WEEKLY_HOURS", defaults.min_weekly_hours),
        }
    }

    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            detector_timeout: self.detector_timeout,
            notify_timeout: self.notify_timeout,
        }
    }

    pub fn schedule_policy(&self) -> SchedulePolicy {
        SchedulePolicy {
            min_weekly_hours: self.min_weekly_hours,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default = %default, "Ignoring unparsable setting");
            default
        }),
        Err(_) => default,
    }
}
