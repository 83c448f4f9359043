//! Lab monitoring and alerting engine.
//!
//! Evaluates task, schedule and activity state to:
//! - validate weekly work schedules (overlaps, minimum hours)
//! - drive task status and progress with an activity trail
//! - compute per-person activity velocity and trend
//! - detect at-risk conditions and raise deduplicated alerts
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use labwatch::{Engine, EngineConfig, MemoryStore};
//! use notify::Notifier;
//!
//! # async fn run() -> labwatch::MonitorResult<()> {
//! let config = EngineConfig::from_env();
//! let store = Arc::new(MemoryStore::load(&config.store_path).await?);
//! let engine = Engine::new(store, Arc::new(Notifier::from_env()), &config);
//!
//! engine.alerts.ensure_default_configurations().await?;
//! if let Some(report) = engine.alerts.run_all_detectors(chrono::Utc::now()).await {
//!     println!("{} new alerts", report.created.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod config;
mod delivery;
pub mod domain;
pub mod engine;
pub mod entities;
pub mod errors;
pub mod manager;
pub mod storage;

pub use config::EngineConfig;
pub use engine::Engine;
pub use errors::{MonitorError, MonitorResult};
pub use manager::{AlertManager, AlertStatistics, ManagerSettings, SweepReport};
pub use storage::{AlertFilter, MemoryStore, Store};
