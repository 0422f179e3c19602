//! English prose for structured results. Nothing here feeds back into scoring.

use chrono_tz::Tz;

use crate::models::scheduling::{ConflictWarning, OptimizationResult, ProductivityImpact, ReasonCode};
use crate::models::workload::{TeamLoad, WorkloadRecommendation, WorkloadReport};

pub fn reason_text(reason: ReasonCode) -> &'static str {
    match reason {
        ReasonCode::MeetingTypeWindow => "the time suits this kind of meeting",
        ReasonCode::MorningProductivity => "a morning slot is ideal for productivity",
        ReasonCode::PreLunchFocus => "a midday slot keeps the morning free for focus",
        ReasonCode::AfternoonCollaboration => "an afternoon slot works well for collaboration",
        ReasonCode::BestAvailable => "it is the best available slot",
        ReasonCode::NoSlotFound => "no slot fits every participant in the search window",
        ReasonCode::DataSourceUnavailable => "no participant calendar could be read",
    }
}

pub fn warning_text(warning: ConflictWarning) -> &'static str {
    match warning {
        ConflictWarning::LunchOverlap => "overlaps the usual lunch break",
        ConflictWarning::LateDay => "falls late in the working day",
        ConflictWarning::FridayAfternoon => "falls on a Friday afternoon",
        ConflictWarning::DataSourceDegraded => "some calendars could not be read",
        ConflictWarning::DataSourceUnavailable => "no calendars could be read",
    }
}

pub fn impact_text(impact: ProductivityImpact) -> &'static str {
    match impact {
        ProductivityImpact::HighPositive => "high positive impact on team productivity",
        ProductivityImpact::ModeratePositive => "moderate positive impact on productivity",
        ProductivityImpact::Neutral => "neutral impact on productivity",
        ProductivityImpact::PossibleNegative => "possible negative impact on productivity",
        ProductivityImpact::Unknown => "productivity impact unknown",
    }
}

/// One-paragraph summary of an optimization result, rendered in `tz`.
pub fn describe_result(result: &OptimizationResult, tz: Tz) -> String {
    let mut text = if result.is_degraded() {
        format!("No meeting time recommended: {}.", reason_text(result.reason))
    } else {
        let local = result.recommended_time.with_timezone(&tz);
        format!(
            "Recommended {} because {} (score {:.2}, {}).",
            local.format("%A %Y-%m-%d at %H:%M"),
            reason_text(result.reason),
            result.confidence_score,
            impact_text(result.productivity_impact),
        )
    };

    if !result.conflict_warnings.is_empty() {
        let warnings: Vec<&str> = result.conflict_warnings.iter().copied().map(warning_text).collect();
        text.push_str(" Note: ");
        text.push_str(&warnings.join("; "));
        text.push('.');
    }
    if !result.alternative_times.is_empty() {
        text.push_str(&format!(" {} alternatives available.", result.alternative_times.len()));
    }
    text
}

pub fn recommendation_text(recommendation: &WorkloadRecommendation) -> String {
    match recommendation {
        WorkloadRecommendation::RedistributeOverloaded { users } => {
            format!("{} overloaded team members: redistribute their tasks", users.len())
        }
        WorkloadRecommendation::AssignMoreWork { users } => {
            format!("{} team members with low load can take on more work", users.len())
        }
        WorkloadRecommendation::ConsolidateMeetings { users } => format!(
            "{} team members average more than 4 meetings a day: consolidate or cancel some",
            users.len()
        ),
        WorkloadRecommendation::ProtectFocusTime => {
            "Plan meeting-free blocks for focused work".to_string()
        }
    }
}

pub fn describe_workload(report: &WorkloadReport) -> String {
    let members = report.team_workload.len();
    let load = match report.team_load {
        TeamLoad::Low => "has a low workload",
        TeamLoad::Optimal => "has an optimal workload",
        TeamLoad::Overloaded => "is overloaded",
    };
    let mut text = format!(
        "Team of {members} {load} (average {:.1}) over the last {}.",
        report.team_average_score, report.period
    );
    if !report.unavailable_users.is_empty() {
        text.push_str(&format!(
            " Data missing for {} member(s).",
            report.unavailable_users.len()
        ));
    }
    text
}
