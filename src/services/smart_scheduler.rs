use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::availability::{AvailabilityProfile, SearchWindow};
use crate::models::scheduling::{
    CachedSchedulingResult, MeetingRequest, OptimizationResult, ProductivityImpact,
    SchedulingConstraint,
};
use crate::models::settings::EngineSettings;
use crate::models::workload::{WorkloadPeriod, WorkloadReport};
use crate::services::availability_analyzer::AvailabilityAnalyzer;
use crate::services::calendar_source::CalendarSource;
use crate::services::conflict_checker::ConflictChecker;
use crate::services::result_cache::{bounded, CacheKey, ResultCache};
use crate::services::scoring_engine::ScoringEngine;
use crate::services::settings_service::{parse_timezone, SettingsService};
use crate::services::slot_generator::{participant_set, SlotGenerator};
use crate::services::workload_analyzer::WorkloadAnalyzer;

/// Meeting-time optimizer and team workload analyzer.
///
/// Collaborators are injected at construction; the cache is optional and
/// every operation behaves the same without it, minus read-back.
pub struct SmartScheduler {
    settings: EngineSettings,
    tz: Tz,
    cache: Option<Arc<dyn ResultCache>>,
    availability: AvailabilityAnalyzer,
    slots: SlotGenerator,
    scoring: ScoringEngine,
    conflicts: ConflictChecker,
    workload: WorkloadAnalyzer,
}

impl SmartScheduler {
    pub fn new(
        settings: EngineSettings,
        source: Arc<dyn CalendarSource>,
        cache: Option<Arc<dyn ResultCache>>,
    ) -> AppResult<Self> {
        SettingsService::validate(&settings)?;
        let tz: Tz = parse_timezone(&settings.timezone)?;

        let default_constraint =
            SchedulingConstraint::with_working_hours(settings.default_working_hours);

        Ok(Self {
            availability: AvailabilityAnalyzer::new(Arc::clone(&source), cache.clone(), &settings),
            slots: SlotGenerator::new(
                tz,
                settings.slot_step_minutes,
                settings.skip_weekends,
                default_constraint,
            ),
            scoring: ScoringEngine::new(tz),
            conflicts: ConflictChecker::new(tz),
            workload: WorkloadAnalyzer::new(source, &settings),
            cache,
            settings,
            tz,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub async fn find_optimal_meeting_time(
        &self,
        request: &MeetingRequest,
    ) -> AppResult<OptimizationResult> {
        self.find_optimal_meeting_time_at(request, Utc::now()).await
    }

    /// Same as [`Self::find_optimal_meeting_time`]; `now` anchors the default
    /// search window when the request has neither a window nor a preferred date.
    pub async fn find_optimal_meeting_time_at(
        &self,
        request: &MeetingRequest,
        now: DateTime<Utc>,
    ) -> AppResult<OptimizationResult> {
        validate_request(request)?;
        let window = self.resolve_window(request, now)?.through_local_day_end(self.tz);
        let participants = participant_set(&request.participants);

        info!(
            target: "app::scheduler",
            participants = participants.len(),
            duration = request.duration_minutes,
            meeting_type = request.meeting_type.as_str(),
            priority = request.priority.as_str(),
            goal = request.optimization_goal.as_str(),
            window_start = %window.start,
            window_end = %window.end,
            "searching for meeting time"
        );

        let profiles = self.availability.analyze(&participants, &window).await;
        let degraded = degraded_participants(&profiles);
        let failed = degraded.len();
        if failed > 0 {
            warn!(target: "app::scheduler", degraded = ?degraded, "scheduling with degraded participants");
        }
        if failed == participants.len() {
            warn!(target: "app::scheduler", participants = participants.len(), "no participant data available");
            return Ok(OptimizationResult::data_unavailable(&window));
        }
        let degraded_warning = ConflictChecker::data_source_warning(failed, participants.len());

        let candidates = self.slots.generate(request, &profiles, &window)?;
        let ranked = self.scoring.rank(candidates, &profiles, request.meeting_type);

        let Some(best) = ranked.first() else {
            info!(target: "app::scheduler", degraded = failed, "no viable slot in window");
            return Ok(OptimizationResult::no_slot(
                &window,
                degraded_warning.into_iter().collect(),
            ));
        };

        let confidence = best.score();
        let mut conflict_warnings = self.conflicts.check(best);
        conflict_warnings.extend(degraded_warning);

        let result = OptimizationResult {
            recommended_time: best.start,
            confidence_score: confidence,
            alternative_times: ranked
                .iter()
                .skip(1)
                .take(self.settings.max_alternatives)
                .map(|slot| slot.start)
                .collect(),
            reason: self.scoring.reason_for(best, request.meeting_type),
            productivity_impact: ProductivityImpact::from_score(confidence),
            conflict_warnings,
        };

        info!(
            target: "app::scheduler",
            recommended = %result.recommended_time,
            confidence = result.confidence_score,
            reason = result.reason.as_str(),
            alternatives = result.alternative_times.len(),
            "meeting time selected"
        );

        self.store_result(&participants, &result).await;
        Ok(result)
    }

    pub async fn analyze_team_workload(
        &self,
        team_members: &[String],
        period: WorkloadPeriod,
    ) -> AppResult<WorkloadReport> {
        self.workload.analyze_team_workload(team_members, period).await
    }

    pub async fn analyze_team_workload_at(
        &self,
        team_members: &[String],
        period: WorkloadPeriod,
        now: DateTime<Utc>,
    ) -> AppResult<WorkloadReport> {
        self.workload
            .analyze_team_workload_at(team_members, period, now)
            .await
    }

    /// Last cached result for this participant set, if any.
    pub async fn recent_result(&self, participants: &[String]) -> Option<CachedSchedulingResult> {
        let cache = self.cache.as_ref()?;
        let key = CacheKey::scheduling_result(participants).cache_key();

        match bounded(self.cache_timeout(), cache.get(&key)).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(cached) => Some(cached),
                Err(err) => {
                    warn!(target: "app::cache", cache_key = %key, error = %err, "unreadable cached result");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(target: "app::cache", cache_key = %key, error = %err, "cached result lookup failed");
                None
            }
        }
    }

    fn cache_timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.settings.cache_timeout_ms)
    }

    fn resolve_window(&self, request: &MeetingRequest, now: DateTime<Utc>) -> AppResult<SearchWindow> {
        match request.search_window {
            Some(window) => SearchWindow::new(window.start, window.end),
            None => SearchWindow::days_from(
                request.preferred_date.unwrap_or(now),
                self.settings.search_horizon_days,
            ),
        }
    }

    /// Failures and timeouts are logged and dropped; the caller already has
    /// its result.
    async fn store_result(&self, participants: &[String], result: &OptimizationResult) {
        let Some(cache) = &self.cache else {
            return;
        };

        let key = CacheKey::scheduling_result(participants).cache_key();
        let envelope = CachedSchedulingResult {
            participants: participants.to_vec(),
            result: result.clone(),
            cached_at: Utc::now(),
        };
        let payload = match serde_json::to_vec(&envelope) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(target: "app::cache", cache_key = %key, error = %err, "failed to encode result");
                return;
            }
        };

        let ttl = StdDuration::from_secs(self.settings.result_cache_ttl_secs);
        match bounded(self.cache_timeout(), cache.set(&key, payload, ttl)).await {
            Ok(()) => debug!(target: "app::cache", cache_key = %key, "scheduling result cached"),
            Err(err) => warn!(target: "app::cache", cache_key = %key, error = %err, "failed to cache result"),
        }
    }
}

fn validate_request(request: &MeetingRequest) -> AppResult<()> {
    if request.participants.is_empty() {
        return Err(AppError::invalid_input("at least one participant is required"));
    }
    if request.participants.iter().any(|id| id.trim().is_empty()) {
        return Err(AppError::invalid_input("participant id must not be blank"));
    }
    if request.duration_minutes <= 0 {
        return Err(AppError::invalid_input_with_details(
            "meeting duration must be positive",
            json!({"durationMinutes": request.duration_minutes}),
        ));
    }
    if let Some((participant, _)) = request
        .constraints
        .iter()
        .find(|(_, constraint)| constraint.working_hours.end <= constraint.working_hours.start)
    {
        return Err(AppError::invalid_input_with_details(
            "working hours must end after they start",
            json!({"participant": participant}),
        ));
    }
    Ok(())
}

/// Profiles that could not be fetched.
pub fn degraded_participants(profiles: &[AvailabilityProfile]) -> Vec<&str> {
    profiles
        .iter()
        .filter(|profile| profile.is_degraded())
        .map(AvailabilityProfile::participant_id)
        .collect()
}
