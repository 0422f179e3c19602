use std::cmp::Ordering;

use chrono::Weekday;
use chrono_tz::Tz;
use tracing::debug;

use crate::models::availability::AvailabilityProfile;
use crate::models::scheduling::{MeetingType, ReasonCode, TimeSlot};
use crate::services::schedule_utils;

const BASE_SCORE: f64 = 0.3;
const PRODUCTIVITY_WEIGHT: f64 = 0.1;
const WORKLOAD_WEIGHT: f64 = 0.2;
const WEEKDAY_BONUS: f64 = 0.1;
const FRIDAY_BONUS: f64 = 0.05;

/// Bonus for holding `meeting_type` at local start hour `hour`.
pub fn meeting_type_bonus(meeting_type: MeetingType, hour: u32) -> f64 {
    match (meeting_type, hour) {
        (MeetingType::Brainstorming, 9..=11) => 0.4,
        (MeetingType::Brainstorming, 14..=16) => 0.2,
        (MeetingType::Standup, 9..=10) => 0.5,
        (MeetingType::Standup, 11) => 0.3,
        (MeetingType::DecisionMaking, 10..=14) => 0.4,
        _ => 0.0,
    }
}

fn weekday_bonus(weekday: Weekday) -> f64 {
    match weekday {
        Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu => WEEKDAY_BONUS,
        Weekday::Fri => FRIDAY_BONUS,
        Weekday::Sat | Weekday::Sun => 0.0,
    }
}

/// Deterministic slot scoring in a fixed timezone.
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine {
    tz: Tz,
}

impl ScoringEngine {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn score(
        &self,
        slot: &TimeSlot,
        profiles: &[AvailabilityProfile],
        meeting_type: MeetingType,
    ) -> f64 {
        let hour = schedule_utils::local_hour(slot.start, self.tz);
        let mut score = BASE_SCORE + meeting_type_bonus(meeting_type, hour);

        if !profiles.is_empty() {
            let count = profiles.len() as f64;
            let productivity = profiles
                .iter()
                .map(|profile| profile.productivity().weight_at_hour(hour))
                .sum::<f64>()
                / count;
            let workload = profiles.iter().map(AvailabilityProfile::workload_score).sum::<f64>() / count;

            score += productivity * PRODUCTIVITY_WEIGHT;
            score += (1.0 - workload.clamp(0.0, 1.0)) * WORKLOAD_WEIGHT;
        }

        score += weekday_bonus(schedule_utils::local_weekday(slot.start, self.tz));
        score.clamp(0.0, 1.0)
    }

    /// Scores every slot and orders them best first; ties go to the earlier start.
    pub fn rank(
        &self,
        mut slots: Vec<TimeSlot>,
        profiles: &[AvailabilityProfile],
        meeting_type: MeetingType,
    ) -> Vec<TimeSlot> {
        for slot in &mut slots {
            slot.productivity_score = Some(self.score(slot, profiles, meeting_type));
        }
        slots.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.start.cmp(&b.start))
        });

        if let Some(best) = slots.first() {
            debug!(
                target: "app::scoring",
                candidates = slots.len(),
                best_start = %best.start,
                best_score = best.score(),
                "slots ranked"
            );
        }
        slots
    }

    pub fn reason_for(&self, slot: &TimeSlot, meeting_type: MeetingType) -> ReasonCode {
        let hour = schedule_utils::local_hour(slot.start, self.tz);
        if meeting_type_bonus(meeting_type, hour) > 0.0 {
            return ReasonCode::MeetingTypeWindow;
        }
        match hour {
            9..=11 => ReasonCode::MorningProductivity,
            12..=13 => ReasonCode::PreLunchFocus,
            14..=16 => ReasonCode::AfternoonCollaboration,
            _ => ReasonCode::BestAvailable,
        }
    }
}
