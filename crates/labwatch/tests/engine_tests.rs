//! Integration tests for the monitoring engine.
//!
//! These drive the engine end to end over a `MemoryStore`, with a recording
//! notification channel standing in for delivery.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};

use labwatch::alerts::{AlertDetector, DetectorContext, DetectorRegistry};
use labwatch::entities::{
    ActivityKind, Alert, AlertConfiguration, AlertEvidence, AlertSeverity, AlertType, Person,
    Role, ScheduleBlock, Task, TaskActivity, TaskStatus, VelocityTrend, WorkSchedule,
};
use labwatch::{
    AlertFilter, AlertManager, Engine, EngineConfig, ManagerSettings, MemoryStore, MonitorError,
    MonitorResult, Store,
};
use notify::{AlertNotification, ChannelError, Notifier, NotifyChannel};

#[derive(Default)]
struct RecordingChannel {
    sent: Mutex<Vec<AlertNotification>>,
}

impl RecordingChannel {
    fn sent(&self) -> Vec<AlertNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifyChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn send(&self, notification: &AlertNotification) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

fn engine(store: &Arc<MemoryStore>) -> Engine {
    Engine::new(
        store.clone(),
        Arc::new(Notifier::disabled()),
        &EngineConfig::default(),
    )
}

fn recording_engine(store: &Arc<MemoryStore>) -> (Engine, Arc<RecordingChannel>) {
    let channel = Arc::new(RecordingChannel::default());
    let notifier = Notifier::with_channels(vec![channel.clone()]);
    let engine = Engine::new(store.clone(), Arc::new(notifier), &EngineConfig::default());
    (engine, channel)
}

fn task(id: &str, project: &str, now: DateTime<Utc>) -> Task {
    let mut task = Task::new(id, project, format!("Task {id}"));
    task.created_at = now - Duration::days(30);
    task.updated_at = now;
    task
}

fn overdue_task(id: &str, days: i64, now: DateTime<Utc>) -> Task {
    let mut task = task(id, "p-1", now);
    task.due_at = Some(now - Duration::days(days));
    task.assignees = vec!["stu-1".to_string()];
    task
}

async fn activity(store: &MemoryStore, actor: &str, task: &str, at: DateTime<Utc>) {
    store
        .append_activity(TaskActivity::new(task, actor, ActivityKind::Progress, "progress", at))
        .await
        .unwrap();
}

async fn unresolved(store: &MemoryStore, alert_type: AlertType) -> Vec<Alert> {
    store
        .unresolved_alerts(&AlertFilter {
            alert_type: Some(alert_type),
            ..AlertFilter::default()
        })
        .await
        .unwrap()
}

mod detector_tests {
    use super::*;

    #[tokio::test]
    async fn test_overdue_detection_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store.insert_task(overdue_task("t-1", 10, now)).await.unwrap();
        let engine = engine(&store);

        let first = engine
            .alerts
            .run_detector(AlertType::OverdueTask, now)
            .await
            .unwrap()
            .unwrap();
        let second = engine
            .alerts
            .run_detector(AlertType::OverdueTask, now)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.created.len(), 1);
        assert!(second.created.is_empty());
        assert_eq!(unresolved(&store, AlertType::OverdueTask).await.len(), 1);
    }

    #[tokio::test]
    async fn test_ten_days_overdue_is_critical() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store.insert_task(overdue_task("t-1", 10, now)).await.unwrap();

        let report = engine(&store)
            .alerts
            .run_detector(AlertType::OverdueTask, now)
            .await
            .unwrap()
            .unwrap();

        let alert = &report.created[0];
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(alert.task_id.as_deref(), Some("t-1"));
        assert_eq!(alert.project_id.as_deref(), Some("p-1"));
        assert_eq!(alert.user_id.as_deref(), Some("stu-1"));

        let data = serde_json::to_value(&alert.data).unwrap();
        assert_eq!(data["type"], "overdue_task");
        assert_eq!(data["daysOverdue"], 10);
    }

    #[tokio::test]
    async fn test_grace_period_and_completed_tasks() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let mut within_grace = overdue_task("t-1", 0, now);
        within_grace.due_at = Some(now - Duration::hours(20));
        store.insert_task(within_grace).await.unwrap();

        let mut done = overdue_task("t-2", 5, now);
        done.status = TaskStatus::Completed;
        done.progress = 100;
        store.insert_task(done).await.unwrap();

        store.insert_task(overdue_task("t-3", 4, now)).await.unwrap();

        let report = engine(&store)
            .alerts
            .run_detector(AlertType::OverdueTask, now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].task_id.as_deref(), Some("t-3"));
        assert_eq!(report.created[0].severity, AlertSeverity::High);
    }

    #[tokio::test]
    async fn test_project_with_two_of_three_high_risk_tasks() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();

        let mut late = task("t-a", "p-1", now);
        late.due_at = Some(now - Duration::days(2));
        late.updated_at = now - Duration::days(10);
        store.insert_task(late).await.unwrap();

        let mut stuck = task("t-b", "p-1", now);
        stuck.status = TaskStatus::Blocked;
        stuck.updated_at = now - Duration::days(10);
        store.insert_task(stuck).await.unwrap();

        store.insert_task(task("t-c", "p-1", now)).await.unwrap();
        store.insert_task(task("t-d", "p-2", now)).await.unwrap();

        let report = engine(&store)
            .alerts
            .run_detector(AlertType::ProjectRisk, now)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.created.len(), 1);
        let alert = &report.created[0];
        assert_eq!(alert.severity, AlertSeverity::High);
        assert_eq!(alert.project_id.as_deref(), Some("p-1"));
        match &alert.data {
            AlertEvidence::ProjectRisk {
                total_tasks,
                high_risk_tasks,
                risk_percent,
                ..
            } => {
                assert_eq!(*total_tasks, 3);
                assert_eq!(*high_risk_tasks, 2);
                assert_eq!(*risk_percent, 66);
            }
            other => panic!("unexpected evidence: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_inactive_students() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        for (id, role) in [
            ("stu-1", Role::Student),
            ("stu-2", Role::Student),
            ("stu-3", Role::Student),
            ("sup-1", Role::Supervisor),
        ] {
            store.insert_person(Person::new(id, id, role)).await.unwrap();
        }
        store.insert_task(task("t-1", "p-1", now)).await.unwrap();
        activity(&store, "stu-1", "t-1", now - Duration::days(10)).await;
        activity(&store, "stu-2", "t-1", now - Duration::days(1)).await;

        let report = engine(&store)
            .alerts
            .run_detector(AlertType::InactiveStudent, now)
            .await
            .unwrap()
            .unwrap();

        let mut flagged: Vec<&str> = report
            .created
            .iter()
            .filter_map(|a| a.user_id.as_deref())
            .collect();
        flagged.sort_unstable();
        assert_eq!(flagged, vec!["stu-1", "stu-3"]);
        assert!(report
            .created
            .iter()
            .all(|a| a.severity == AlertSeverity::Medium));
    }

    #[tokio::test]
    async fn test_velocity_drop_only_for_declining_students() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store
            .insert_person(Person::new("stu-1", "Ada", Role::Student))
            .await
            .unwrap();
        store
            .insert_person(Person::new("stu-2", "Ben", Role::Student))
            .await
            .unwrap();
        store
            .insert_person(Person::new("sup-1", "Cy", Role::Supervisor))
            .await
            .unwrap();
        store.insert_task(task("t-1", "p-1", now)).await.unwrap();

        for days_ago in 8..13 {
            activity(&store, "stu-1", "t-1", now - Duration::days(days_ago)).await;
            activity(&store, "sup-1", "t-1", now - Duration::days(days_ago)).await;
        }
        for days_ago in 1..4 {
            activity(&store, "stu-2", "t-1", now - Duration::days(days_ago)).await;
        }

        let report = engine(&store)
            .alerts
            .run_detector(AlertType::VelocityDrop, now)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.created.len(), 1);
        let alert = &report.created[0];
        assert_eq!(alert.user_id.as_deref(), Some("stu-1"));
        assert!(matches!(
            alert.data,
            AlertEvidence::VelocityDrop {
                trend: VelocityTrend::Decreasing,
                first_half: 5,
                second_half: 0,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_velocity_drop_with_huge_window() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store
            .insert_person(Person::new("stu-1", "Ada", Role::Student))
            .await
            .unwrap();
        store.insert_task(task("t-1", "p-1", now)).await.unwrap();
        activity(&store, "stu-1", "t-1", now - Duration::days(3)).await;

        let mut config = AlertConfiguration::default_for(AlertType::VelocityDrop);
        config.thresholds.insert("window_days".to_string(), 1e12);
        store.insert_configuration_if_absent(config).await.unwrap();

        let report = engine(&store)
            .alerts
            .run_detector(AlertType::VelocityDrop, now)
            .await
            .unwrap()
            .unwrap();
        assert!(report.failures.is_empty());
        assert!(report.created.is_empty());
    }

    #[tokio::test]
    async fn test_blocked_task_needs_two_days() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();

        let mut long_blocked = task("t-1", "p-1", now);
        long_blocked.status = TaskStatus::Blocked;
        long_blocked.updated_at = now - Duration::hours(49);
        store.insert_task(long_blocked).await.unwrap();

        let mut just_blocked = task("t-2", "p-1", now);
        just_blocked.status = TaskStatus::Blocked;
        just_blocked.updated_at = now - Duration::hours(5);
        store.insert_task(just_blocked).await.unwrap();

        let report = engine(&store)
            .alerts
            .run_detector(AlertType::BlockedTask, now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].task_id.as_deref(), Some("t-1"));
        assert_eq!(report.created[0].severity, AlertSeverity::High);
    }
}

mod sweep_tests {
    use super::*;

    struct FailingDetector;

    #[async_trait]
    impl AlertDetector for FailingDetector {
        fn alert_type(&self) -> AlertType {
            AlertType::InactiveStudent
        }

        async fn detect(&self, _ctx: &DetectorContext) -> MonitorResult<Vec<Alert>> {
            Err(MonitorError::StoreUnavailable {
                reason: "connection reset".to_string(),
            })
        }
    }

    struct SlowDetector;

    #[async_trait]
    impl AlertDetector for SlowDetector {
        fn alert_type(&self) -> AlertType {
            AlertType::VelocityDrop
        }

        async fn detect(&self, _ctx: &DetectorContext) -> MonitorResult<Vec<Alert>> {
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            Ok(vec![])
        }
    }

    fn manager_with(store: &Arc<MemoryStore>, detectors: Vec<Arc<dyn AlertDetector>>) -> AlertManager {
        AlertManager::with_registry(
            store.clone(),
            Arc::new(Notifier::disabled()),
            ManagerSettings::default(),
            DetectorRegistry::with_detectors(detectors),
        )
    }

    #[tokio::test]
    async fn test_failing_detector_does_not_stop_others() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store.insert_task(overdue_task("t-1", 4, now)).await.unwrap();

        let manager = manager_with(
            &store,
            vec![
                Arc::new(FailingDetector),
                Arc::new(labwatch::alerts::overdue_tasks::Detector::new()),
            ],
        );

        let report = manager.run_all_detectors(now).await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].alert_type, AlertType::InactiveStudent);
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].alert_type, AlertType::OverdueTask);
    }

    #[tokio::test]
    async fn test_out_of_range_threshold_fails_only_its_detector() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store.insert_task(overdue_task("t-1", 10, now)).await.unwrap();
        let mut blocked = task("t-2", "p-2", now);
        blocked.status = TaskStatus::Blocked;
        blocked.updated_at = now - Duration::hours(72);
        store.insert_task(blocked).await.unwrap();

        // Written straight to the store, as an older snapshot could hold it
        let mut config = AlertConfiguration::default_for(AlertType::OverdueTask);
        config.thresholds.insert("grace_days".to_string(), 1e12);
        store.insert_configuration_if_absent(config).await.unwrap();

        let report = engine(&store).alerts.run_all_detectors(now).await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].alert_type, AlertType::OverdueTask);
        assert!(report.failures[0].error.contains("out of range"));
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].alert_type, AlertType::BlockedTask);
        assert_eq!(report.created[0].task_id.as_deref(), Some("t-2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_sweep_is_a_noop() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_with(&store, vec![Arc::new(SlowDetector)]);
        let now = Utc::now();

        let (first, second) = tokio::join!(
            manager.run_all_detectors(now),
            manager.run_all_detectors(now)
        );
        assert_eq!(
            [first.is_some(), second.is_some()]
                .iter()
                .filter(|ran| **ran)
                .count(),
            1
        );

        // The guard is released once the pass ends
        assert!(manager.run_all_detectors(now).await.is_some());
    }

    #[tokio::test]
    async fn test_resolve_then_redetect_creates_new_alert() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store.insert_task(overdue_task("t-1", 10, now)).await.unwrap();
        let engine = engine(&store);

        let first = engine.alerts.run_all_detectors(now).await.unwrap();
        assert_eq!(first.created.len(), 1);
        let earlier = first.created[0].clone();

        let resolved = engine
            .alerts
            .resolve(earlier.id, "sup-1", Some("extension granted"))
            .await
            .unwrap();
        assert!(resolved.resolved);
        assert_eq!(resolved.resolved_by.as_deref(), Some("sup-1"));

        let second = engine.alerts.run_all_detectors(now).await.unwrap();
        assert_eq!(second.created.len(), 1);
        assert_ne!(second.created[0].id, earlier.id);

        let open = unresolved(&store, AlertType::OverdueTask).await;
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, second.created[0].id);

        // A resolved alert stays resolved
        let again = engine.alerts.resolve(earlier.id, "sup-2", None).await.unwrap();
        assert_eq!(again.resolved_by.as_deref(), Some("sup-1"));
        assert_eq!(again.resolved_at, resolved.resolved_at);
    }

    #[tokio::test]
    async fn test_fan_out_to_supervisory_roles() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        for (id, role) in [
            ("sup-1", Role::Supervisor),
            ("adm-1", Role::Admin),
            ("stu-1", Role::Student),
        ] {
            store.insert_person(Person::new(id, id, role)).await.unwrap();
        }
        activity(&store, "stu-1", "t-1", now).await;

        let mut stuck = task("t-1", "p-1", now);
        stuck.status = TaskStatus::Blocked;
        stuck.updated_at = now - Duration::hours(60);
        store.insert_task(stuck).await.unwrap();

        let (engine, channel) = recording_engine(&store);
        let report = engine
            .alerts
            .run_detector(AlertType::BlockedTask, now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.notifications_sent, 2);

        let sent = channel.sent();
        let mut recipients: Vec<&str> = sent.iter().map(|n| n.recipient_id.as_str()).collect();
        recipients.sort_unstable();
        assert_eq!(recipients, vec!["adm-1", "sup-1"]);
        assert!(sent.iter().all(|n| n.related_type == "alert"));
        assert_eq!(sent[0].metadata["alertType"], "blocked_task");
        assert_eq!(sent[0].metadata["push"], true);
        assert_eq!(sent[0].metadata["email"], false);
    }

    #[tokio::test]
    async fn test_cooldown_holds_back_repeat_notifications() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store
            .insert_person(Person::new("sup-1", "Sam", Role::Supervisor))
            .await
            .unwrap();
        store.insert_task(overdue_task("t-1", 5, now)).await.unwrap();

        let (engine, channel) = recording_engine(&store);
        let first = engine
            .alerts
            .run_detector(AlertType::OverdueTask, now)
            .await
            .unwrap()
            .unwrap();
        engine
            .alerts
            .resolve(first.created[0].id, "sup-1", None)
            .await
            .unwrap();

        let second = engine
            .alerts
            .run_detector(AlertType::OverdueTask, now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.created.len(), 1);
        assert_eq!(second.cooled_down, 1);
        assert_eq!(channel.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_active_alerts_and_statistics() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store.insert_task(overdue_task("t-1", 1, now - Duration::hours(12))).await.unwrap();
        store.insert_task(overdue_task("t-2", 10, now)).await.unwrap();

        let mut stuck = task("t-3", "p-2", now);
        stuck.status = TaskStatus::Blocked;
        stuck.updated_at = now - Duration::hours(50);
        stuck.assignees = vec!["stu-2".to_string()];
        store.insert_task(stuck).await.unwrap();

        let engine = engine(&store);
        engine.alerts.run_all_detectors(now).await.unwrap();

        let active = engine.alerts.get_active(None).await.unwrap();
        let severities: Vec<AlertSeverity> = active.iter().map(|a| a.severity).collect();
        assert_eq!(
            severities,
            vec![AlertSeverity::Critical, AlertSeverity::High, AlertSeverity::Medium]
        );

        let for_stu2 = engine.alerts.get_active(Some("stu-2")).await.unwrap();
        assert_eq!(for_stu2.len(), 1);
        assert_eq!(for_stu2[0].alert_type, AlertType::BlockedTask);

        let stats = engine.alerts.get_statistics().await.unwrap();
        assert_eq!(stats.total_active, 3);
        assert_eq!(stats.by_type[&AlertType::OverdueTask], 2);
        assert_eq!(stats.by_type[&AlertType::BlockedTask], 1);
        assert_eq!(stats.by_type[&AlertType::ProjectRisk], 0);
        assert_eq!(stats.by_severity[&AlertSeverity::Critical], 1);
        assert_eq!(stats.by_severity[&AlertSeverity::Low], 0);
    }

    #[tokio::test]
    async fn test_snapshot_keeps_dedup_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labwatch.json");
        let now = Utc::now();

        let store = Arc::new(MemoryStore::new());
        store.insert_task(overdue_task("t-1", 10, now)).await.unwrap();
        engine(&store).alerts.run_all_detectors(now).await.unwrap();
        store.save(&path).await.unwrap();

        let restored = Arc::new(MemoryStore::load(&path).await.unwrap());
        let report = engine(&restored).alerts.run_all_detectors(now).await.unwrap();
        assert!(report.created.is_empty());
        assert_eq!(unresolved(&restored, AlertType::OverdueTask).await.len(), 1);
    }
}

mod schedule_tests {
    use super::*;

    fn week() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 12).unwrap()
    }

    async fn schedule(store: &MemoryStore, id: &str, owner: &str, blocks: &[(Weekday, &str, &str)]) {
        store
            .insert_schedule(WorkSchedule::new(id, owner, week()))
            .await
            .unwrap();
        for (i, (day, start, end)) in blocks.iter().enumerate() {
            store
                .insert_block(ScheduleBlock::new(format!("{id}-{i}"), id, *day, *start, *end))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_minimum_hours_boundary() {
        let store = Arc::new(MemoryStore::new());
        schedule(
            &store,
            "s-1",
            "stu-1",
            &[
                (Weekday::Mon, "08:00", "16:00"),
                (Weekday::Tue, "08:00", "16:00"),
                (Weekday::Wed, "09:00", "10:00"),
                (Weekday::Wed, "10:00", "13:00"),
            ],
        )
        .await;
        schedule(
            &store,
            "s-2",
            "stu-2",
            &[
                (Weekday::Mon, "08:00", "16:00"),
                (Weekday::Tue, "08:00", "16:00"),
                (Weekday::Thu, "22:00", "01:00"),
            ],
        )
        .await;
        let engine = engine(&store);

        let valid = engine.schedules.validate("stu-1", week()).await.unwrap();
        assert!(valid.is_valid, "{:?}", valid.violations);
        assert!((valid.total_hours - 20.0).abs() < f64::EPSILON);

        let short = engine.schedules.validate("stu-2", week()).await.unwrap();
        assert!(!short.is_valid);
        assert!((short.total_hours - 19.0).abs() < f64::EPSILON);
        assert_eq!(short.violations.len(), 1);

        let rows = engine.schedules.compliance_report(week()).await.unwrap();
        let compliant: Vec<(&str, bool)> = rows
            .iter()
            .map(|r| (r.person_id.as_str(), r.compliant))
            .collect();
        assert_eq!(compliant, vec![("stu-1", true), ("stu-2", false)]);
    }

    #[tokio::test]
    async fn test_person_without_schedule_is_short() {
        let store = Arc::new(MemoryStore::new());
        let result = engine(&store)
            .schedules
            .validate("nobody", week())
            .await
            .unwrap();
        assert!(!result.is_valid);
        assert!(result.total_hours.abs() < f64::EPSILON);
    }
}

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_progress_boundaries() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        for id in ["t-1", "t-2", "t-3"] {
            store.insert_task(task(id, "p-1", now)).await.unwrap();
        }
        let engine = engine(&store);

        let full = engine.tasks.set_progress("t-1", 100, "stu-1", None).await.unwrap();
        assert_eq!(full.status, TaskStatus::Completed);

        let over = engine.tasks.set_progress("t-2", 150, "stu-1", None).await.unwrap();
        assert_eq!(over.progress, 100);
        assert_eq!(over.status, TaskStatus::Completed);

        let under = engine.tasks.set_progress("t-3", -5, "stu-1", None).await.unwrap();
        assert_eq!(under.progress, 0);

        for id in ["t-1", "t-2", "t-3"] {
            assert_eq!(engine.tasks.activity(id).await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_lifecycle_activity_feeds_velocity() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store.insert_task(task("t-1", "p-1", now)).await.unwrap();
        store.insert_task(task("t-2", "p-2", now)).await.unwrap();
        let engine = engine(&store);

        engine
            .tasks
            .set_status("t-1", TaskStatus::InProgress, "stu-1", None)
            .await
            .unwrap();
        engine.tasks.add_comment("t-2", "stu-1", "started").await.unwrap();

        let metrics = engine
            .velocity
            .analyze(Some("stu-1"), 14, Utc::now())
            .await
            .unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].total_activities, 2);
        assert_eq!(metrics[0].distinct_projects, 2);
        assert_eq!(metrics[0].trend, VelocityTrend::New);
    }
}

mod velocity_tests {
    use super::*;

    #[tokio::test]
    async fn test_trend_over_fourteen_days() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store.insert_task(task("t-1", "p-1", now)).await.unwrap();
        for days_ago in [8, 9, 10, 13] {
            activity(&store, "early", "t-1", now - Duration::days(days_ago)).await;
        }
        for days_ago in [1, 2, 6] {
            activity(&store, "late", "t-1", now - Duration::days(days_ago)).await;
        }
        activity(&store, "early", "t-1", now - Duration::days(20)).await;

        let metrics = engine(&store).velocity.analyze(None, 14, now).await.unwrap();
        let trend_of = |person: &str| {
            metrics
                .iter()
                .find(|m| m.person_id == person)
                .map(|m| (m.trend, m.total_activities))
        };
        assert_eq!(trend_of("early"), Some((VelocityTrend::Decreasing, 4)));
        assert_eq!(trend_of("late"), Some((VelocityTrend::New, 3)));
    }

    #[tokio::test]
    async fn test_named_person_without_activity_is_inactive() {
        let store = Arc::new(MemoryStore::new());
        let metrics = engine(&store)
            .velocity
            .analyze(Some("stu-9"), 14, Utc::now())
            .await
            .unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].trend, VelocityTrend::Inactive);
    }
}
