use chrono::Weekday;
use chrono_tz::Tz;

use crate::models::scheduling::{ConflictWarning, TimeSlot};
use crate::services::schedule_utils;

/// Advisory warnings for the chosen slot; they never change the ranking.
#[derive(Debug, Clone, Copy)]
pub struct ConflictChecker {
    tz: Tz,
}

impl ConflictChecker {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn check(&self, slot: &TimeSlot) -> Vec<ConflictWarning> {
        let hour = schedule_utils::local_hour(slot.start, self.tz);
        let weekday = schedule_utils::local_weekday(slot.start, self.tz);

        let mut warnings = Vec::new();
        if hour == 12 {
            warnings.push(ConflictWarning::LunchOverlap);
        }
        if hour >= 16 {
            warnings.push(ConflictWarning::LateDay);
        }
        if weekday == Weekday::Fri && hour >= 15 {
            warnings.push(ConflictWarning::FridayAfternoon);
        }
        warnings
    }

    /// Degradation warning for a request where `failed` of `total` fetches failed.
    pub fn data_source_warning(failed: usize, total: usize) -> Option<ConflictWarning> {
        match failed {
            0 => None,
            n if n >= total => Some(ConflictWarning::DataSourceUnavailable),
            _ => Some(ConflictWarning::DataSourceDegraded),
        }
    }
}
