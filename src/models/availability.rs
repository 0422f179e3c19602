use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::services::schedule_utils;

/// Half-open search window `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SearchWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if end <= start {
            return Err(AppError::invalid_input_with_details(
                "search window end must be after its start",
                json!({"start": start.to_rfc3339(), "end": end.to_rfc3339()}),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn days_from(start: DateTime<Utc>, days: i64) -> AppResult<Self> {
        Self::new(start, schedule_utils::add_days(start, days)?)
    }

    /// Same start, with the end pushed to the close of its local calendar day
    /// so the last day of the range is searched in full.
    pub fn through_local_day_end(&self, tz: Tz) -> Self {
        let end = schedule_utils::local_date(self.end, tz)
            .succ_opt()
            .and_then(|next_day| schedule_utils::local_instant(next_day, NaiveTime::MIN, tz))
            .map_or(self.end, |midnight| midnight.max(self.end));
        Self {
            start: self.start,
            end,
        }
    }

    pub fn contains(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start >= self.start && end <= self.end
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BusyKind {
    Meeting,
    Deadline,
    /// Placeholder block covering a whole window whose data could not be fetched.
    Unavailable,
}

impl BusyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusyKind::Meeting => "meeting",
            BusyKind::Deadline => "deadline",
            BusyKind::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for BusyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BusyKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "meeting" => Ok(BusyKind::Meeting),
            "deadline" => Ok(BusyKind::Deadline),
            "unavailable" => Ok(BusyKind::Unavailable),
            other => Err(format!("unsupported busy kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: BusyKind,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, kind: BusyKind) -> Self {
        Self { start, end, kind }
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes().max(0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDeadline {
    pub due_at: DateTime<Utc>,
}

/// Hour-of-day buckets used by productivity profiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HourBucket {
    EarlyMorning,
    LateMorning,
    EarlyAfternoon,
    LateAfternoon,
    Evening,
    Late,
}

impl HourBucket {
    /// Bucket ranges are inclusive on both ends and checked in order, so a
    /// shared boundary hour belongs to the earlier bucket.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            8..=10 => HourBucket::EarlyMorning,
            11..=12 => HourBucket::LateMorning,
            13..=14 => HourBucket::EarlyAfternoon,
            15..=16 => HourBucket::LateAfternoon,
            17..=18 => HourBucket::Evening,
            _ => HourBucket::Late,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HourBucket::EarlyMorning => "early_morning",
            HourBucket::LateMorning => "late_morning",
            HourBucket::EarlyAfternoon => "early_afternoon",
            HourBucket::LateAfternoon => "late_afternoon",
            HourBucket::Evening => "evening",
            HourBucket::Late => "late",
        }
    }
}

impl fmt::Display for HourBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Productivity weight per hour bucket, each in `[0, 1]`.
///
/// Learned profiles are read back from the result cache as JSON; missing
/// buckets fall back to the default table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "snake_case")]
pub struct ProductivityProfile {
    pub early_morning: f64,
    pub late_morning: f64,
    pub early_afternoon: f64,
    pub late_afternoon: f64,
    pub evening: f64,
    pub late: f64,
}

impl Default for ProductivityProfile {
    fn default() -> Self {
        Self {
            early_morning: 0.9,
            late_morning: 0.8,
            early_afternoon: 0.6,
            late_afternoon: 0.7,
            evening: 0.5,
            late: 0.3,
        }
    }
}

impl ProductivityProfile {
    pub fn weight(&self, bucket: HourBucket) -> f64 {
        let raw = match bucket {
            HourBucket::EarlyMorning => self.early_morning,
            HourBucket::LateMorning => self.late_morning,
            HourBucket::EarlyAfternoon => self.early_afternoon,
            HourBucket::LateAfternoon => self.late_afternoon,
            HourBucket::Evening => self.evening,
            HourBucket::Late => self.late,
        };
        if raw.is_finite() {
            raw.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn weight_at_hour(&self, hour: u32) -> f64 {
        self.weight(HourBucket::from_hour(hour))
    }
}

/// Per-participant availability built fresh for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityProfile {
    participant_id: String,
    busy: Vec<BusyInterval>,
    workload_score: f64,
    meeting_count: usize,
    task_count: usize,
    productivity: ProductivityProfile,
    degraded: bool,
}

impl AvailabilityProfile {
    pub fn new(
        participant_id: impl Into<String>,
        mut busy: Vec<BusyInterval>,
        task_count: usize,
        workload_norm: f64,
        productivity: ProductivityProfile,
    ) -> Self {
        busy.sort_by_key(|interval| (interval.start, interval.end));
        let meeting_count = busy
            .iter()
            .filter(|interval| interval.kind == BusyKind::Meeting)
            .count();
        let workload_score = if workload_norm > 0.0 {
            (meeting_count as f64 / workload_norm).min(1.0)
        } else {
            1.0
        };

        Self {
            participant_id: participant_id.into(),
            busy,
            workload_score,
            meeting_count,
            task_count,
            productivity,
            degraded: false,
        }
    }

    /// Conservative profile for a participant whose data could not be read:
    /// busy for the entire window.
    pub fn unavailable(participant_id: impl Into<String>, window: &SearchWindow) -> Self {
        Self {
            participant_id: participant_id.into(),
            busy: vec![BusyInterval::new(
                window.start,
                window.end,
                BusyKind::Unavailable,
            )],
            workload_score: 1.0,
            meeting_count: 0,
            task_count: 0,
            productivity: ProductivityProfile::default(),
            degraded: true,
        }
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn busy_intervals(&self) -> &[BusyInterval] {
        &self.busy
    }

    pub fn workload_score(&self) -> f64 {
        self.workload_score
    }

    pub fn meeting_count(&self) -> usize {
        self.meeting_count
    }

    pub fn task_count(&self) -> usize {
        self.task_count
    }

    pub fn productivity(&self) -> &ProductivityProfile {
        &self.productivity
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn is_free(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        !self.busy.iter().any(|interval| interval.overlaps(start, end))
    }

    /// True when a meeting ends exactly at `start` or begins exactly at `end`.
    pub fn touches_meeting(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.busy.iter().any(|interval| {
            interval.kind == BusyKind::Meeting && (interval.end == start || interval.start == end)
        })
    }

    pub fn meetings_on(&self, day: NaiveDate, tz: Tz) -> usize {
        self.busy
            .iter()
            .filter(|interval| {
                interval.kind == BusyKind::Meeting
                    && interval.start.with_timezone(&tz).date_naive() == day
            })
            .count()
    }
}
