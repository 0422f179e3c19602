use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::availability::SearchWindow;
use crate::services::schedule_utils;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MeetingType {
    Standup,
    Brainstorming,
    Presentation,
    DecisionMaking,
    OneOnOne,
    #[default]
    TeamMeeting,
    ClientCall,
}

impl MeetingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingType::Standup => "standup",
            MeetingType::Brainstorming => "brainstorming",
            MeetingType::Presentation => "presentation",
            MeetingType::DecisionMaking => "decision_making",
            MeetingType::OneOnOne => "one_on_one",
            MeetingType::TeamMeeting => "team_meeting",
            MeetingType::ClientCall => "client_call",
        }
    }
}

impl fmt::Display for MeetingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MeetingType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "standup" => Ok(MeetingType::Standup),
            "brainstorming" => Ok(MeetingType::Brainstorming),
            "presentation" => Ok(MeetingType::Presentation),
            "decision_making" => Ok(MeetingType::DecisionMaking),
            "one_on_one" => Ok(MeetingType::OneOnOne),
            "team_meeting" => Ok(MeetingType::TeamMeeting),
            "client_call" => Ok(MeetingType::ClientCall),
            other => Err(format!("unsupported meeting type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl SchedulingPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulingPriority::Low => "low",
            SchedulingPriority::Medium => "medium",
            SchedulingPriority::High => "high",
            SchedulingPriority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationGoal {
    #[default]
    Productivity,
    WorkLifeBalance,
    Creativity,
    FocusTime,
    Collaboration,
}

impl OptimizationGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationGoal::Productivity => "productivity",
            OptimizationGoal::WorkLifeBalance => "work_life_balance",
            OptimizationGoal::Creativity => "creativity",
            OptimizationGoal::FocusTime => "focus_time",
            OptimizationGoal::Collaboration => "collaboration",
        }
    }
}

/// Local wall-clock range `[start, end)` within a day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingConstraint {
    pub working_hours: TimeRange,
    #[serde(default)]
    pub break_times: Vec<TimeRange>,
    #[serde(default)]
    pub max_meetings_per_day: Option<u32>,
    #[serde(default)]
    pub focus_time_blocks: Vec<TimeRange>,
    #[serde(default)]
    pub preferred_duration_minutes: Option<u32>,
    #[serde(default)]
    pub avoid_back_to_back: bool,
}

impl SchedulingConstraint {
    pub fn with_working_hours(working_hours: TimeRange) -> Self {
        Self {
            working_hours,
            break_times: Vec::new(),
            max_meetings_per_day: None,
            focus_time_blocks: Vec::new(),
            preferred_duration_minutes: None,
            avoid_back_to_back: false,
        }
    }

    /// Local ranges during which a meeting may not be placed.
    pub fn blocked_ranges(&self) -> impl Iterator<Item = &TimeRange> {
        self.break_times.iter().chain(self.focus_time_blocks.iter())
    }
}

/// Input of a meeting-time search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRequest {
    pub participants: Vec<String>,
    pub duration_minutes: i64,
    #[serde(default)]
    pub meeting_type: MeetingType,
    #[serde(default)]
    pub priority: SchedulingPriority,
    #[serde(default)]
    pub preferred_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub constraints: HashMap<String, SchedulingConstraint>,
    #[serde(default)]
    pub optimization_goal: OptimizationGoal,
    /// Overrides the `preferred_date + horizon` window when set.
    #[serde(default)]
    pub search_window: Option<SearchWindow>,
}

impl MeetingRequest {
    pub fn new(participants: Vec<String>, duration_minutes: i64) -> Self {
        Self {
            participants,
            duration_minutes,
            meeting_type: MeetingType::default(),
            priority: SchedulingPriority::default(),
            preferred_date: None,
            constraints: HashMap::new(),
            optimization_goal: OptimizationGoal::default(),
            search_window: None,
        }
    }

    pub fn meeting_type(mut self, meeting_type: MeetingType) -> Self {
        self.meeting_type = meeting_type;
        self
    }

    pub fn priority(mut self, priority: SchedulingPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn preferred_date(mut self, preferred_date: DateTime<Utc>) -> Self {
        self.preferred_date = Some(preferred_date);
        self
    }

    pub fn constraint(mut self, participant: impl Into<String>, constraint: SchedulingConstraint) -> Self {
        self.constraints.insert(participant.into(), constraint);
        self
    }

    pub fn optimization_goal(mut self, goal: OptimizationGoal) -> Self {
        self.optimization_goal = goal;
        self
    }

    pub fn search_window(mut self, window: SearchWindow) -> Self {
        self.search_window = Some(window);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available_users: Vec<String>,
    pub productivity_score: Option<f64>,
    /// Reserved; not consumed by ranking.
    pub conflict_score: f64,
}

impl TimeSlot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, available_users: Vec<String>) -> Self {
        Self {
            start,
            end,
            available_users,
            productivity_score: None,
            conflict_score: 0.0,
        }
    }

    pub fn score(&self) -> f64 {
        self.productivity_score.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    MeetingTypeWindow,
    MorningProductivity,
    PreLunchFocus,
    AfternoonCollaboration,
    BestAvailable,
    NoSlotFound,
    DataSourceUnavailable,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::MeetingTypeWindow => "MEETING_TYPE_WINDOW",
            ReasonCode::MorningProductivity => "MORNING_PRODUCTIVITY",
            ReasonCode::PreLunchFocus => "PRE_LUNCH_FOCUS",
            ReasonCode::AfternoonCollaboration => "AFTERNOON_COLLABORATION",
            ReasonCode::BestAvailable => "BEST_AVAILABLE",
            ReasonCode::NoSlotFound => "NO_SLOT_FOUND",
            ReasonCode::DataSourceUnavailable => "DATA_SOURCE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProductivityImpact {
    HighPositive,
    ModeratePositive,
    Neutral,
    PossibleNegative,
    Unknown,
}

impl ProductivityImpact {
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            ProductivityImpact::HighPositive
        } else if score > 0.6 {
            ProductivityImpact::ModeratePositive
        } else if score > 0.4 {
            ProductivityImpact::Neutral
        } else {
            ProductivityImpact::PossibleNegative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductivityImpact::HighPositive => "high_positive",
            ProductivityImpact::ModeratePositive => "moderate_positive",
            ProductivityImpact::Neutral => "neutral",
            ProductivityImpact::PossibleNegative => "possible_negative",
            ProductivityImpact::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProductivityImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictWarning {
    LunchOverlap,
    LateDay,
    FridayAfternoon,
    DataSourceDegraded,
    DataSourceUnavailable,
}

impl ConflictWarning {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictWarning::LunchOverlap => "LUNCH_OVERLAP",
            ConflictWarning::LateDay => "LATE_DAY",
            ConflictWarning::FridayAfternoon => "FRIDAY_AFTERNOON",
            ConflictWarning::DataSourceDegraded => "DATA_SOURCE_DEGRADED",
            ConflictWarning::DataSourceUnavailable => "DATA_SOURCE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for ConflictWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub recommended_time: DateTime<Utc>,
    pub confidence_score: f64,
    pub alternative_times: Vec<DateTime<Utc>>,
    pub reason: ReasonCode,
    pub productivity_impact: ProductivityImpact,
    pub conflict_warnings: Vec<ConflictWarning>,
}

/// Placeholder recommendation for results without a slot: one day into the
/// window, or its start when that is not representable.
fn fallback_time(window: &SearchWindow) -> DateTime<Utc> {
    schedule_utils::add_days(window.start, 1).unwrap_or(window.start)
}

impl OptimizationResult {
    /// Zero-confidence result used when no candidate survives filtering.
    pub fn no_slot(window: &SearchWindow, warnings: Vec<ConflictWarning>) -> Self {
        Self {
            recommended_time: fallback_time(window),
            confidence_score: 0.0,
            alternative_times: Vec::new(),
            reason: ReasonCode::NoSlotFound,
            productivity_impact: ProductivityImpact::Unknown,
            conflict_warnings: warnings,
        }
    }

    pub fn data_unavailable(window: &SearchWindow) -> Self {
        Self {
            recommended_time: fallback_time(window),
            confidence_score: 0.0,
            alternative_times: Vec::new(),
            reason: ReasonCode::DataSourceUnavailable,
            productivity_impact: ProductivityImpact::Unknown,
            conflict_warnings: vec![ConflictWarning::DataSourceUnavailable],
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.confidence_score <= 0.0
    }
}

/// Cache envelope for a stored optimization result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CachedSchedulingResult {
    pub participants: Vec<String>,
    pub result: OptimizationResult,
    pub cached_at: DateTime<Utc>,
}
