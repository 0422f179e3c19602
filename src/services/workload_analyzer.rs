use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::availability::{BusyKind, SearchWindow};
use crate::models::settings::EngineSettings;
use crate::models::workload::{
    TeamLoad, UserWorkload, WorkloadPeriod, WorkloadRecommendation, WorkloadReport, WorkloadStatus,
};
use crate::services::availability_analyzer::{fetch_commitments, Commitments};
use crate::services::calendar_source::CalendarSource;
use crate::services::schedule_utils;

const MEETINGS_PER_DAY_NORM: f64 = 5.0;
const MEETING_HOURS_PER_DAY_NORM: f64 = 4.0;
const UNDERLOADED_THRESHOLD: f64 = 0.3;
const MEETING_HEAVY_PER_DAY: f64 = 4.0;

/// Aggregates meeting and task load over a trailing period.
pub struct WorkloadAnalyzer {
    source: Arc<dyn CalendarSource>,
    fetch_timeout: StdDuration,
}

impl WorkloadAnalyzer {
    pub fn new(source: Arc<dyn CalendarSource>, settings: &EngineSettings) -> Self {
        Self {
            source,
            fetch_timeout: StdDuration::from_millis(settings.fetch_timeout_ms),
        }
    }

    pub async fn analyze_team_workload(
        &self,
        team_members: &[String],
        period: WorkloadPeriod,
    ) -> AppResult<WorkloadReport> {
        self.analyze_team_workload_at(team_members, period, Utc::now())
            .await
    }

    /// Same as [`Self::analyze_team_workload`] with an explicit analysis instant.
    pub async fn analyze_team_workload_at(
        &self,
        team_members: &[String],
        period: WorkloadPeriod,
        now: DateTime<Utc>,
    ) -> AppResult<WorkloadReport> {
        validate_team(team_members)?;
        let days = period.days();

        let fetched: Vec<AppResult<Commitments>> = if days > 0 {
            let window = SearchWindow::new(schedule_utils::add_days(now, -days)?, now)?;
            let fetches = team_members.iter().map(|member| {
                fetch_commitments(self.source.as_ref(), member, &window, self.fetch_timeout)
            });
            join_all(fetches).await
        } else {
            team_members.iter().map(|_| Ok(Commitments::default())).collect()
        };

        let mut team_workload = Vec::with_capacity(team_members.len());
        let mut unavailable_users = Vec::new();
        for (member, commitments) in team_members.iter().zip(fetched) {
            match commitments {
                Ok(commitments) => team_workload.push(user_workload(member, &commitments, days)),
                Err(err) => {
                    warn!(target: "app::workload", user = %member, error = %err, "workload data unavailable");
                    unavailable_users.push(member.clone());
                }
            }
        }

        let team_average_score = if team_workload.is_empty() {
            0.0
        } else {
            team_workload.iter().map(|entry| entry.workload_score).sum::<f64>()
                / team_workload.len() as f64
        };

        let report = WorkloadReport {
            period,
            analysis_date: now,
            recommendations: recommendations(&team_workload),
            team_load: TeamLoad::from_average(team_average_score),
            team_average_score,
            team_workload,
            unavailable_users,
        };

        info!(
            target: "app::workload",
            period = %period,
            members = team_members.len(),
            unavailable = report.unavailable_users.len(),
            average = report.team_average_score,
            load = report.team_load.as_str(),
            "team workload analyzed"
        );
        Ok(report)
    }
}

fn validate_team(team_members: &[String]) -> AppResult<()> {
    if team_members.is_empty() {
        return Err(AppError::invalid_input("team must have at least one member"));
    }
    if team_members.iter().any(|member| member.trim().is_empty()) {
        return Err(AppError::invalid_input("team member id must not be blank"));
    }
    Ok(())
}

/// Per-user load over a period of `days` days.
pub fn user_workload(user_id: &str, commitments: &Commitments, days: i64) -> UserWorkload {
    let meetings = commitments
        .busy
        .iter()
        .filter(|interval| interval.kind == BusyKind::Meeting);
    let meeting_count = meetings.clone().count();
    let total_meeting_minutes: i64 = meetings.map(|interval| interval.duration_minutes()).sum();

    let (avg_meetings_per_day, avg_meeting_hours_per_day) = if days > 0 {
        (
            meeting_count as f64 / days as f64,
            (total_meeting_minutes as f64 / 60.0) / days as f64,
        )
    } else {
        (0.0, 0.0)
    };

    let workload_score = (avg_meetings_per_day / MEETINGS_PER_DAY_NORM
        + avg_meeting_hours_per_day / MEETING_HOURS_PER_DAY_NORM)
        .min(1.0);

    UserWorkload {
        user_id: user_id.to_string(),
        meeting_count,
        total_meeting_minutes,
        task_count: commitments.tasks.len(),
        workload_score,
        avg_meetings_per_day,
        avg_meeting_hours_per_day,
        status: WorkloadStatus::from_score(workload_score),
    }
}

fn ids_where(team: &[UserWorkload], predicate: impl Fn(&UserWorkload) -> bool) -> Vec<String> {
    team.iter()
        .filter(|entry| predicate(entry))
        .map(|entry| entry.user_id.clone())
        .collect()
}

pub fn recommendations(team: &[UserWorkload]) -> Vec<WorkloadRecommendation> {
    let mut recommendations = Vec::new();

    let overloaded = ids_where(team, |entry| entry.status == WorkloadStatus::Overloaded);
    if !overloaded.is_empty() {
        recommendations.push(WorkloadRecommendation::RedistributeOverloaded { users: overloaded });
    }

    let underloaded = ids_where(team, |entry| entry.workload_score < UNDERLOADED_THRESHOLD);
    if !underloaded.is_empty() {
        recommendations.push(WorkloadRecommendation::AssignMoreWork { users: underloaded });
    }

    let meeting_heavy = ids_where(team, |entry| entry.avg_meetings_per_day > MEETING_HEAVY_PER_DAY);
    if !meeting_heavy.is_empty() {
        recommendations.push(WorkloadRecommendation::ConsolidateMeetings { users: meeting_heavy });
    }

    recommendations.push(WorkloadRecommendation::ProtectFocusTime);
    recommendations
}
