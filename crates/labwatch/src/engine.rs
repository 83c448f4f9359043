//! Wiring of the engine services over one store and notifier.

use std::sync::Arc;

use notify::Notifier;

use crate::config::EngineConfig;
use crate::domain::{ReminderDispatcher, ScheduleValidator, TaskLifecycle, VelocityAnalyzer};
use crate::manager::AlertManager;
use crate::storage::Store;

/// All engine services sharing one store
pub struct Engine {
    pub store: Arc<dyn Store>,
    pub alerts: AlertManager,
    pub schedules: ScheduleValidator,
    pub tasks: TaskLifecycle,
    pub velocity: VelocityAnalyzer,
    pub reminders: ReminderDispatcher,
}

impl Engine {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<Notifier>, config: &EngineConfig) -> Self {
        Self {
            alerts: AlertManager::new(store.clone(), notifier.clone(), config.manager_settings()),
            schedules: ScheduleValidator::new(store.clone(), config.schedule_policy()),
            tasks: TaskLifecycle::new(store.clone()),
            velocity: VelocityAnalyzer::new(store.clone()),
            reminders: ReminderDispatcher::new(store.clone(), notifier, config.notify_timeout),
            store,
        }
    }
}
