//! Idempotent alert emission.

use tracing::debug;

use crate::entities::Alert;
use crate::errors::{MonitorError, MonitorResult};
use crate::storage::{AlertFilter, Store};

/// Result of trying to persist a proposed alert
#[derive(Debug, Clone)]
pub enum Emission {
    Created(Alert),
    /// An unresolved alert already covers this `(type, subject)`
    AlreadyOpen,
}

/// Whether an unresolved alert already covers `alert`'s type and subject
pub async fn is_open(store: &dyn Store, alert: &Alert) -> MonitorResult<bool> {
    let key = AlertFilter::dedup_key(alert.alert_type, alert.subject());
    Ok(!store.unresolved_alerts(&key).await?.is_empty())
}

/// Persist `alert` unless an unresolved alert with the same type and subject
/// exists.
///
/// The lookup comes first; the store's uniqueness rule catches a concurrent
/// writer that slips in between, and that rejection counts as already open.
pub async fn emit(store: &dyn Store, alert: Alert) -> MonitorResult<Emission> {
    if is_open(store, &alert).await? {
        debug!(
            alert_type = %alert.alert_type,
            subject = alert.subject(),
            "Unresolved alert already open, skipping"
        );
        return Ok(Emission::AlreadyOpen);
    }

    match store.insert_alert(alert.clone()).await {
        Ok(()) => Ok(Emission::Created(alert)),
        Err(MonitorError::DuplicateAlert { alert_type, subject }) => {
            debug!(%alert_type, %subject, "Concurrent insert won, skipping");
            Ok(Emission::AlreadyOpen)
        }
        Err(e) => Err(e),
    }
}
