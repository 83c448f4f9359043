//! Weekly schedule validation, block maintenance and approval.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::time::{block_duration_hours, blocks_overlap};
use crate::entities::{day_name, ApprovalState, ScheduleBlock, WorkSchedule};
use crate::errors::{MonitorError, MonitorResult};
use crate::storage::Store;

/// Schedule policy knobs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SchedulePolicy {
    pub min_weekly_hours: f64,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            min_weekly_hours: 20.0,
        }
    }
}

/// Outcome of validating one person's week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleValidation {
    pub is_valid: bool,
    pub total_hours: f64,
    pub violations: Vec<String>,
}

/// One row of the weekly compliance report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceRow {
    pub person_id: String,
    pub week_start: NaiveDate,
    pub total_hours: f64,
    pub compliant: bool,
    pub violations: Vec<String>,
}

/// Structural check of a set of blocks, without the weekly-hours policy.
#[derive(Debug, Clone, Default)]
pub struct BlockCheck {
    pub total_hours: f64,
    pub violations: Vec<String>,
}

/// Sum durations and find same-day overlaps.
///
/// A block with a malformed time is reported and left out of both the total
/// and the overlap comparison; the remaining blocks are still checked.
pub fn check_blocks(blocks: &[ScheduleBlock]) -> BlockCheck {
    let mut check = BlockCheck::default();
    let mut parsed: Vec<&ScheduleBlock> = Vec::with_capacity(blocks.len());

    for block in blocks {
        match block_duration_hours(&block.start, &block.end) {
            Ok(hours) => {
                check.total_hours += hours;
                parsed.push(block);
            }
            Err(e) => check.violations.push(format!(
                "Invalid time in block {} on {}: {e}",
                block.id,
                day_name(block.day)
            )),
        }
    }

    parsed.sort_by_key(|b| b.day.num_days_from_monday());
    for (i, a) in parsed.iter().enumerate() {
        for b in parsed.iter().skip(i + 1).take_while(|b| b.day == a.day) {
            let overlap = blocks_overlap(
                (a.start.as_str(), a.end.as_str()),
                (b.start.as_str(), b.end.as_str()),
            );
            if overlap.unwrap_or(false) {
                check
                    .violations
                    .push(format!("Overlapping time blocks on {}", day_name(a.day)));
            }
        }
    }

    check.total_hours = round_hours(check.total_hours);
    check
}

fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// Schedule validator and block maintenance facade
pub struct ScheduleValidator {
    store: Arc<dyn Store>,
    policy: SchedulePolicy,
}

impl ScheduleValidator {
    pub fn new(store: Arc<dyn Store>, policy: SchedulePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> SchedulePolicy {
        self.policy
    }

    /// Validate a person's declared blocks for the week starting `week_start`.
    pub async fn validate(
        &self,
        person_id: &str,
        week_start: NaiveDate,
    ) -> MonitorResult<ScheduleValidation> {
        let schedules = self.store.schedules_for_week(person_id, week_start).await?;

        let mut total_hours = 0.0;
        let mut violations = Vec::new();
        for schedule in &schedules {
            let blocks = self.store.blocks_for_schedule(&schedule.id).await?;
            let check = check_blocks(&blocks);
            total_hours += check.total_hours;
            violations.extend(check.violations);
        }
        let total_hours = round_hours(total_hours);

        let minimum = self.policy.min_weekly_hours;
        if total_hours < minimum {
            violations.push(format!(
                "Total scheduled hours ({total_hours:.1}) is below the minimum of {minimum:.1} hours ({:.1} short)",
                minimum - total_hours
            ));
        }

        debug!(
            person = person_id,
            week = %week_start,
            total_hours,
            violations = violations.len(),
            "Validated schedule"
        );

        Ok(ScheduleValidation {
            is_valid: violations.is_empty(),
            total_hours,
            violations,
        })
    }

    /// Recompute and persist the cached total for one schedule.
    pub async fn recompute_hours(&self, schedule_id: &str) -> MonitorResult<f64> {
        let blocks = self.store.blocks_for_schedule(schedule_id).await?;
        let total = check_blocks(&blocks).total_hours;
        self.store.set_schedule_hours(schedule_id, total).await?;
        Ok(total)
    }

    pub async fn add_block(&self, block: ScheduleBlock) -> MonitorResult<f64> {
        let schedule_id = block.schedule_id.clone();
        self.store.insert_block(block).await?;
        self.recompute_hours(&schedule_id).await
    }

    pub async fn update_block(&self, block: ScheduleBlock) -> MonitorResult<f64> {
        let previous = self
            .store
            .get_block(&block.id)
            .await?
            .ok_or_else(|| MonitorError::not_found("Schedule block", &block.id))?;

        self.store.update_block(&block).await?;
        if previous.schedule_id != block.schedule_id {
            self.recompute_hours(&previous.schedule_id).await?;
        }
        self.recompute_hours(&block.schedule_id).await
    }

    pub async fn remove_block(&self, block_id: &str) -> MonitorResult<f64> {
        let block = self
            .store
            .get_block(block_id)
            .await?
            .ok_or_else(|| MonitorError::not_found("Schedule block", block_id))?;

        self.store.delete_block(block_id).await?;
        self.recompute_hours(&block.schedule_id).await
    }

    /// Submit a schedule for approval; refused while validation fails.
    pub async fn submit(&self, schedule_id: &str) -> MonitorResult<WorkSchedule> {
        let mut schedule = self.load(schedule_id).await?;
        let validation = self.validate(&schedule.owner_id, schedule.week_start).await?;
        if !validation.is_valid {
            return Err(MonitorError::ScheduleRejected {
                violations: validation.violations,
            });
        }

        schedule.total_hours = validation.total_hours;
        schedule.approval = ApprovalState::Submitted;
        schedule.approver_id = None;
        schedule.approved_at = None;
        self.store.update_schedule(&schedule).await?;

        info!(schedule = schedule_id, owner = %schedule.owner_id, "Schedule submitted");
        Ok(schedule)
    }

    pub async fn approve(&self, schedule_id: &str, approver_id: &str) -> MonitorResult<WorkSchedule> {
        self.decide(schedule_id, approver_id, ApprovalState::Approved)
            .await
    }

    pub async fn reject(&self, schedule_id: &str, approver_id: &str) -> MonitorResult<WorkSchedule> {
        self.decide(schedule_id, approver_id, ApprovalState::Rejected)
            .await
    }

    /// Compliance rows for every person with a schedule in the given week.
    pub async fn compliance_report(&self, week_start: NaiveDate) -> MonitorResult<Vec<ComplianceRow>> {
        let owners: BTreeSet<String> = self
            .store
            .all_schedules_for_week(week_start)
            .await?
            .into_iter()
            .map(|s| s.owner_id)
            .collect();

        let mut rows = Vec::with_capacity(owners.len());
        for person_id in owners {
            let validation = self.validate(&person_id, week_start).await?;
            rows.push(ComplianceRow {
                person_id,
                week_start,
                total_hours: validation.total_hours,
                compliant: validation.is_valid,
                violations: validation.violations,
            });
        }
        Ok(rows)
    }

    async fn decide(
        &self,
        schedule_id: &str,
        approver_id: &str,
        outcome: ApprovalState,
    ) -> MonitorResult<WorkSchedule> {
        let mut schedule = self.load(schedule_id).await?;
        schedule.approval = outcome;
        schedule.approver_id = Some(approver_id.to_string());
        schedule.approved_at = Some(Utc::now());
        self.store.update_schedule(&schedule).await?;

        info!(schedule = schedule_id, approver = approver_id, outcome = %outcome, "Schedule reviewed");
        Ok(schedule)
    }

    async fn load(&self, schedule_id: &str) -> MonitorResult<WorkSchedule> {
        self.store
            .get_schedule(schedule_id)
            .await?
            .ok_or_else(|| MonitorError::not_found("Schedule", schedule_id))
    }
}
