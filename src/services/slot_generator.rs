use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::availability::{AvailabilityProfile, SearchWindow};
use crate::models::scheduling::{MeetingRequest, SchedulingConstraint, TimeSlot};
use crate::services::schedule_utils;

/// Enumerates fixed-step candidate slots where every participant is free.
#[derive(Debug, Clone)]
pub struct SlotGenerator {
    tz: Tz,
    step_minutes: i64,
    skip_weekends: bool,
    default_constraint: SchedulingConstraint,
}

impl SlotGenerator {
    pub fn new(
        tz: Tz,
        step_minutes: i64,
        skip_weekends: bool,
        default_constraint: SchedulingConstraint,
    ) -> Self {
        Self {
            tz,
            step_minutes,
            skip_weekends,
            default_constraint,
        }
    }

    pub fn generate(
        &self,
        request: &MeetingRequest,
        profiles: &[AvailabilityProfile],
        window: &SearchWindow,
    ) -> AppResult<Vec<TimeSlot>> {
        if self.step_minutes <= 0 {
            return Err(AppError::invalid_input("slot step must be positive"));
        }
        if request.duration_minutes <= 0 {
            return Err(AppError::invalid_input("meeting duration must be positive"));
        }

        let participants = participant_set(&request.participants);
        let by_id: HashMap<&str, &AvailabilityProfile> = profiles
            .iter()
            .map(|profile| (profile.participant_id(), profile))
            .collect();
        let constraints: Vec<&SchedulingConstraint> = participants
            .iter()
            .map(|id| request.constraints.get(id).unwrap_or(&self.default_constraint))
            .collect();

        let Some((union_start, union_end)) = working_hours_union(&constraints) else {
            return Ok(Vec::new());
        };

        let first_day = schedule_utils::local_date(window.start, self.tz);
        let last_day = schedule_utils::local_date(window.end, self.tz);
        let mut slots = Vec::new();

        for day in schedule_utils::days_inclusive(first_day, last_day) {
            if self.skip_weekends && schedule_utils::is_weekend(day) {
                continue;
            }
            let (Some(day_start), Some(day_end)) = (
                schedule_utils::local_instant(day, union_start, self.tz),
                schedule_utils::local_instant(day, union_end, self.tz),
            ) else {
                continue;
            };

            let mut cursor = day_start;
            loop {
                let end = schedule_utils::add_minutes(cursor, request.duration_minutes)?;
                if end > day_end {
                    break;
                }
                if window.contains(cursor, end)
                    && participants.iter().zip(&constraints).all(|(id, constraint)| {
                        by_id.get(id.as_str()).is_some_and(|profile| {
                            self.participant_free(profile, constraint, day, cursor, end)
                        })
                    })
                {
                    slots.push(TimeSlot::new(cursor, end, participants.clone()));
                }
                cursor = schedule_utils::add_minutes(cursor, self.step_minutes)?;
            }
        }

        debug!(
            target: "app::slots",
            participants = participants.len(),
            duration = request.duration_minutes,
            candidates = slots.len(),
            "candidate slots generated"
        );
        Ok(slots)
    }

    fn participant_free(
        &self,
        profile: &AvailabilityProfile,
        constraint: &SchedulingConstraint,
        day: NaiveDate,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> bool {
        let Some((work_start, work_end)) =
            schedule_utils::local_range(day, &constraint.working_hours, self.tz)
        else {
            return false;
        };
        if start < work_start || end > work_end {
            return false;
        }

        let blocked = constraint.blocked_ranges().any(|range| {
            schedule_utils::local_range(day, range, self.tz)
                .is_some_and(|(from, to)| schedule_utils::overlaps(start, end, from, to))
        });
        if blocked || !profile.is_free(start, end) {
            return false;
        }

        if let Some(max) = constraint.max_meetings_per_day {
            if profile.meetings_on(day, self.tz) >= max as usize {
                return false;
            }
        }

        !(constraint.avoid_back_to_back && profile.touches_meeting(start, end))
    }
}

/// Sorted, de-duplicated participant ids.
pub fn participant_set(participants: &[String]) -> Vec<String> {
    let mut ids = participants.to_vec();
    ids.sort();
    ids.dedup();
    ids
}

fn working_hours_union(constraints: &[&SchedulingConstraint]) -> Option<(NaiveTime, NaiveTime)> {
    let start = constraints.iter().map(|c| c.working_hours.start).min()?;
    let end = constraints.iter().map(|c| c.working_hours.end).max()?;
    (end > start).then_some((start, end))
}
