use serde::{Deserialize, Serialize};
use std::fmt;

use chrono::{DateTime, Utc};

/// Reporting period measured back from the analysis instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadPeriod {
    Week,
    Month,
    Quarter,
    Days(u32),
}

impl WorkloadPeriod {
    pub fn days(&self) -> i64 {
        match self {
            WorkloadPeriod::Week => 7,
            WorkloadPeriod::Month => 30,
            WorkloadPeriod::Quarter => 90,
            WorkloadPeriod::Days(days) => i64::from(*days),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadPeriod::Week => "week",
            WorkloadPeriod::Month => "month",
            WorkloadPeriod::Quarter => "quarter",
            WorkloadPeriod::Days(_) => "days",
        }
    }
}

impl fmt::Display for WorkloadPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadPeriod::Days(days) => write!(f, "{days}d"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl TryFrom<&str> for WorkloadPeriod {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "week" => Ok(WorkloadPeriod::Week),
            "month" => Ok(WorkloadPeriod::Month),
            "quarter" => Ok(WorkloadPeriod::Quarter),
            other => other
                .strip_suffix('d')
                .and_then(|days| days.parse::<u32>().ok())
                .map(WorkloadPeriod::Days)
                .ok_or_else(|| format!("unsupported workload period: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadStatus {
    Low,
    Optimal,
    High,
    Overloaded,
}

impl WorkloadStatus {
    pub fn from_score(score: f64) -> Self {
        if score < 0.3 {
            WorkloadStatus::Low
        } else if score < 0.6 {
            WorkloadStatus::Optimal
        } else if score < 0.8 {
            WorkloadStatus::High
        } else {
            WorkloadStatus::Overloaded
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadStatus::Low => "low",
            WorkloadStatus::Optimal => "optimal",
            WorkloadStatus::High => "high",
            WorkloadStatus::Overloaded => "overloaded",
        }
    }
}

impl fmt::Display for WorkloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Team-level summary tier derived from the team average score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TeamLoad {
    Low,
    Optimal,
    Overloaded,
}

impl TeamLoad {
    pub fn from_average(average: f64) -> Self {
        if average < 0.4 {
            TeamLoad::Low
        } else if average < 0.7 {
            TeamLoad::Optimal
        } else {
            TeamLoad::Overloaded
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TeamLoad::Low => "low",
            TeamLoad::Optimal => "optimal",
            TeamLoad::Overloaded => "overloaded",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserWorkload {
    pub user_id: String,
    pub meeting_count: usize,
    pub total_meeting_minutes: i64,
    pub task_count: usize,
    pub workload_score: f64,
    pub avg_meetings_per_day: f64,
    pub avg_meeting_hours_per_day: f64,
    pub status: WorkloadStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkloadRecommendation {
    RedistributeOverloaded { users: Vec<String> },
    AssignMoreWork { users: Vec<String> },
    ConsolidateMeetings { users: Vec<String> },
    ProtectFocusTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadReport {
    pub period: WorkloadPeriod,
    pub analysis_date: DateTime<Utc>,
    pub team_workload: Vec<UserWorkload>,
    pub team_average_score: f64,
    pub team_load: TeamLoad,
    pub recommendations: Vec<WorkloadRecommendation>,
    #[serde(default)]
    pub unavailable_users: Vec<String>,
}

impl WorkloadReport {
    pub fn user(&self, user_id: &str) -> Option<&UserWorkload> {
        self.team_workload.iter().find(|entry| entry.user_id == user_id)
    }
}
