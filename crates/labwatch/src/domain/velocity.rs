//! Rolling activity velocity per person.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::entities::{TaskActivity, VelocityMetric, VelocityTrend};
use crate::errors::{MonitorError, MonitorResult};
use crate::storage::Store;

/// Cap on the task-diversity part of the score
const DIVERSITY_CAP: usize = 20;

/// Longest analysis window; larger requests are clamped to it
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Aggregate one person's events over a window ending at `now`.
///
/// `events` must already be limited to the window; `project_of` maps task
/// ids to their project so distinct projects can be counted. Events for
/// tasks missing from the map still count toward every other figure.
pub fn compute_metric(
    person_id: &str,
    events: &[&TaskActivity],
    project_of: &HashMap<String, String>,
    window_days: u32,
    now: DateTime<Utc>,
) -> VelocityMetric {
    let window_days = window_days.clamp(1, MAX_WINDOW_DAYS);
    let midpoint = now
        .checked_sub_signed(Duration::hours(i64::from(window_days) * 12))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut by_kind = BTreeMap::new();
    let mut daily = BTreeMap::new();
    let mut tasks = BTreeSet::new();
    let mut projects = BTreeSet::new();
    let (mut first_half, mut second_half) = (0, 0);

    for event in events {
        *by_kind.entry(event.kind).or_insert(0) += 1;
        *daily.entry(event.created_at.date_naive()).or_insert(0) += 1;
        tasks.insert(event.task_id.as_str());
        if let Some(project) = project_of.get(&event.task_id) {
            projects.insert(project.as_str());
        }
        if event.created_at < midpoint {
            first_half += 1;
        } else {
            second_half += 1;
        }
    }

    let total = events.len();
    let avg_daily = total as f64 / f64::from(window_days);
    let diversity = (tasks.len() * 2).min(DIVERSITY_CAP) as f64;
    let velocity_score = (avg_daily * 10.0 + diversity).round() as u32;

    VelocityMetric {
        person_id: person_id.to_string(),
        window_days,
        total_activities: total,
        by_kind,
        distinct_tasks: tasks.len(),
        distinct_projects: projects.len(),
        daily,
        first_half,
        second_half,
        velocity_score,
        trend: VelocityTrend::classify(first_half, second_half),
    }
}

/// Velocity analyzer backed by the activity trail
pub struct VelocityAnalyzer {
    store: Arc<dyn Store>,
}

impl VelocityAnalyzer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Metrics for one person, or for every actor with activity in the window.
    ///
    /// A named person with no events still gets an `inactive` metric.
    /// Windows longer than [`MAX_WINDOW_DAYS`] are clamped.
    pub async fn analyze(
        &self,
        person_id: Option<&str>,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> MonitorResult<Vec<VelocityMetric>> {
        let window_days = window_days.clamp(1, MAX_WINDOW_DAYS);
        let since = now
            .checked_sub_signed(Duration::days(i64::from(window_days)))
            .ok_or_else(|| MonitorError::Config {
                reason: format!("a {window_days}-day window before {now} is out of range"),
            })?;
        let events = self.store.activity_since(person_id, since).await?;
        let project_of: HashMap<String, String> = self
            .store
            .list_tasks()
            .await?
            .into_iter()
            .map(|t| (t.id, t.project_id))
            .collect();

        let mut grouped: BTreeMap<&str, Vec<&TaskActivity>> = BTreeMap::new();
        if let Some(person) = person_id {
            grouped.entry(person).or_default();
        }
        for event in events.iter().filter(|e| e.created_at <= now) {
            grouped.entry(event.actor_id.as_str()).or_default().push(event);
        }

        Ok(grouped
            .into_iter()
            .map(|(person, events)| compute_metric(person, &events, &project_of, window_days, now))
            .collect())
    }
}
