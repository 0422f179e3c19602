use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use teamsync_core::error::{AppError, AppResult};
use teamsync_core::models::availability::{BusyInterval, BusyKind, SearchWindow, TaskDeadline};
use teamsync_core::models::settings::EngineSettings;
use teamsync_core::models::workload::{
    TeamLoad, WorkloadPeriod, WorkloadRecommendation, WorkloadStatus,
};
use teamsync_core::services::calendar_source::{CalendarSource, InMemoryCalendarSource};
use teamsync_core::services::smart_scheduler::SmartScheduler;
use teamsync_core::services::workload_analyzer::WorkloadAnalyzer;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).single().unwrap()
}

fn add_meetings(source: &InMemoryCalendarSource, user: &str, count: i64, minutes: i64) {
    for i in 0..count {
        let start = now() - Duration::days(6) + Duration::hours(i * 2);
        source
            .add_busy(
                user,
                BusyInterval::new(start, start + Duration::minutes(minutes), BusyKind::Meeting),
            )
            .unwrap();
    }
}

#[tokio::test]
async fn five_meetings_in_a_week_is_optimal() {
    let source = InMemoryCalendarSource::new();
    add_meetings(&source, "dana", 5, 60);
    source
        .add_task("dana", TaskDeadline { due_at: now() - Duration::days(2) })
        .unwrap();
    let scheduler =
        SmartScheduler::new(EngineSettings::default(), Arc::new(source), None).unwrap();

    let report = scheduler
        .analyze_team_workload_at(&["dana".to_string()], WorkloadPeriod::Week, now())
        .await
        .unwrap();

    let dana = report.user("dana").unwrap();
    assert_eq!(dana.meeting_count, 5);
    assert_eq!(dana.total_meeting_minutes, 300);
    assert_eq!(dana.task_count, 1);
    assert!((dana.avg_meetings_per_day - 0.714).abs() < 0.001);
    assert!((dana.avg_meeting_hours_per_day - 0.714).abs() < 0.001);
    assert!((dana.workload_score - 0.321).abs() < 0.001);
    assert_eq!(dana.status, WorkloadStatus::Optimal);

    assert_eq!(report.period, WorkloadPeriod::Week);
    assert_eq!(report.analysis_date, now());
    assert_eq!(report.team_load, TeamLoad::Low);
    assert_eq!(report.recommendations, vec![WorkloadRecommendation::ProtectFocusTime]);
    assert!(report.unavailable_users.is_empty());
}

#[tokio::test]
async fn more_meetings_never_lower_the_score() {
    let settings = EngineSettings::default();
    let mut previous = 0.0;

    for count in 0..15 {
        let source = InMemoryCalendarSource::new();
        add_meetings(&source, "erin", count, 45);
        let analyzer = WorkloadAnalyzer::new(Arc::new(source), &settings);

        let report = analyzer
            .analyze_team_workload_at(&["erin".to_string()], WorkloadPeriod::Week, now())
            .await
            .unwrap();
        let score = report.user("erin").unwrap().workload_score;

        assert!(score >= previous, "score dropped at {count} meetings");
        assert!((0.0..=1.0).contains(&score));
        previous = score;
    }
}

#[tokio::test]
async fn meetings_outside_period_are_ignored() {
    let source = InMemoryCalendarSource::new();
    let old = now() - Duration::days(20);
    source
        .add_busy("finn", BusyInterval::new(old, old + Duration::hours(1), BusyKind::Meeting))
        .unwrap();
    let analyzer = WorkloadAnalyzer::new(Arc::new(source), &EngineSettings::default());

    let week = analyzer
        .analyze_team_workload_at(&["finn".to_string()], WorkloadPeriod::Week, now())
        .await
        .unwrap();
    assert_eq!(week.user("finn").unwrap().meeting_count, 0);

    let month = analyzer
        .analyze_team_workload_at(&["finn".to_string()], WorkloadPeriod::Month, now())
        .await
        .unwrap();
    assert_eq!(month.user("finn").unwrap().meeting_count, 1);
}

#[tokio::test]
async fn zero_day_period_reports_zero_rates() {
    let source = InMemoryCalendarSource::new();
    add_meetings(&source, "gail", 5, 60);
    let analyzer = WorkloadAnalyzer::new(Arc::new(source), &EngineSettings::default());

    let report = analyzer
        .analyze_team_workload_at(&["gail".to_string()], WorkloadPeriod::Days(0), now())
        .await
        .unwrap();

    let gail = report.user("gail").unwrap();
    assert_eq!(gail.avg_meetings_per_day, 0.0);
    assert_eq!(gail.avg_meeting_hours_per_day, 0.0);
    assert_eq!(gail.status, WorkloadStatus::Low);
}

struct PartialSource {
    inner: InMemoryCalendarSource,
    broken_user: &'static str,
}

#[async_trait]
impl CalendarSource for PartialSource {
    async fn get_busy_intervals(
        &self,
        participant_id: &str,
        window: &SearchWindow,
    ) -> AppResult<Vec<BusyInterval>> {
        if participant_id == self.broken_user {
            return Err(AppError::other("calendar backend offline"));
        }
        self.inner.get_busy_intervals(participant_id, window).await
    }

    async fn get_tasks_with_deadlines(
        &self,
        participant_id: &str,
        window: &SearchWindow,
    ) -> AppResult<Vec<TaskDeadline>> {
        self.inner.get_tasks_with_deadlines(participant_id, window).await
    }
}

#[tokio::test]
async fn team_summary_skips_unreadable_members() {
    let inner = InMemoryCalendarSource::new();
    add_meetings(&inner, "hana", 40, 60);
    let source = PartialSource {
        inner,
        broken_user: "ivan",
    };
    let analyzer = WorkloadAnalyzer::new(Arc::new(source), &EngineSettings::default());

    let team = vec!["hana".to_string(), "ivan".to_string(), "jo".to_string()];
    let report = analyzer
        .analyze_team_workload_at(&team, WorkloadPeriod::Week, now())
        .await
        .unwrap();

    assert_eq!(report.unavailable_users, vec!["ivan".to_string()]);
    assert_eq!(report.team_workload.len(), 2);
    assert!(report.user("ivan").is_none());
    // hana is saturated at 1.0 and jo has nothing scheduled.
    assert!((report.team_average_score - 0.5).abs() < 1e-9);
    assert_eq!(report.team_load, TeamLoad::Optimal);
    assert_eq!(
        report.recommendations,
        vec![
            WorkloadRecommendation::RedistributeOverloaded { users: vec!["hana".to_string()] },
            WorkloadRecommendation::AssignMoreWork { users: vec!["jo".to_string()] },
            WorkloadRecommendation::ConsolidateMeetings { users: vec!["hana".to_string()] },
            WorkloadRecommendation::ProtectFocusTime,
        ]
    );
}

#[tokio::test]
async fn empty_team_is_rejected() {
    let analyzer =
        WorkloadAnalyzer::new(Arc::new(InMemoryCalendarSource::new()), &EngineSettings::default());

    let err = analyzer
        .analyze_team_workload(&[], WorkloadPeriod::Month)
        .await
        .unwrap_err();
    assert!(err.is_invalid_input());
}
