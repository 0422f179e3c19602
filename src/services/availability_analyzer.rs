use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::models::availability::{
    AvailabilityProfile, BusyInterval, BusyKind, ProductivityProfile, SearchWindow, TaskDeadline,
};
use crate::models::settings::EngineSettings;
use crate::services::calendar_source::CalendarSource;
use crate::services::result_cache::{bounded, CacheKey, ResultCache};
use crate::services::schedule_utils;

/// Raw commitments of one participant inside a window.
#[derive(Debug, Clone, Default)]
pub struct Commitments {
    pub busy: Vec<BusyInterval>,
    pub tasks: Vec<TaskDeadline>,
}

/// Fetches busy intervals and deadlines concurrently, bounded by `limit`.
pub async fn fetch_commitments(
    source: &dyn CalendarSource,
    participant_id: &str,
    window: &SearchWindow,
    limit: StdDuration,
) -> AppResult<Commitments> {
    let fetch = async {
        futures::try_join!(
            source.get_busy_intervals(participant_id, window),
            source.get_tasks_with_deadlines(participant_id, window),
        )
    };

    match timeout(limit, fetch).await {
        Ok(Ok((busy, tasks))) => Ok(Commitments { busy, tasks }),
        Ok(Err(err @ AppError::DataSourceUnavailable { .. })) => Err(err),
        Ok(Err(err)) => Err(AppError::data_source_unavailable(participant_id, err.to_string())),
        Err(_) => Err(AppError::data_source_unavailable(
            participant_id,
            format!("fetch timed out after {} ms", limit.as_millis()),
        )),
    }
}

/// Builds per-participant availability profiles for one request.
pub struct AvailabilityAnalyzer {
    source: Arc<dyn CalendarSource>,
    cache: Option<Arc<dyn ResultCache>>,
    fetch_timeout: StdDuration,
    cache_timeout: StdDuration,
    deadline_block_minutes: i64,
    workload_norm: f64,
}

impl AvailabilityAnalyzer {
    pub fn new(
        source: Arc<dyn CalendarSource>,
        cache: Option<Arc<dyn ResultCache>>,
        settings: &EngineSettings,
    ) -> Self {
        Self {
            source,
            cache,
            fetch_timeout: StdDuration::from_millis(settings.fetch_timeout_ms),
            cache_timeout: StdDuration::from_millis(settings.cache_timeout_ms),
            deadline_block_minutes: settings.deadline_block_minutes,
            workload_norm: settings.workload_meeting_norm,
        }
    }

    /// One profile per participant, in input order. Failed fetches yield
    /// degraded profiles instead of errors.
    pub async fn analyze(
        &self,
        participants: &[String],
        window: &SearchWindow,
    ) -> Vec<AvailabilityProfile> {
        let fetches = participants
            .iter()
            .map(|participant| self.profile_for(participant, window));
        join_all(fetches).await
    }

    pub async fn profile_for(&self, participant_id: &str, window: &SearchWindow) -> AvailabilityProfile {
        let commitments =
            match fetch_commitments(self.source.as_ref(), participant_id, window, self.fetch_timeout)
                .await
            {
                Ok(commitments) => commitments,
                Err(err) => {
                    warn!(
                        target: "app::availability",
                        participant = %participant_id,
                        error = %err,
                        "participant degraded to fully busy"
                    );
                    return AvailabilityProfile::unavailable(participant_id, window);
                }
            };

        let task_count = commitments.tasks.len();
        let mut busy = commitments.busy;
        busy.extend(commitments.tasks.iter().map(|task| self.deadline_block(task)));

        let productivity = self.productivity_profile(participant_id).await;
        let profile =
            AvailabilityProfile::new(participant_id, busy, task_count, self.workload_norm, productivity);

        debug!(
            target: "app::availability",
            participant = %participant_id,
            busy = profile.busy_intervals().len(),
            meetings = profile.meeting_count(),
            tasks = task_count,
            workload = profile.workload_score(),
            "availability profile built"
        );
        profile
    }

    fn deadline_block(&self, task: &TaskDeadline) -> BusyInterval {
        let start = schedule_utils::add_minutes(task.due_at, -self.deadline_block_minutes)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        BusyInterval::new(start, task.due_at, BusyKind::Deadline)
    }

    /// Learned profile from the cache, or the default table on a miss, an
    /// error or a slow cache.
    async fn productivity_profile(&self, participant_id: &str) -> ProductivityProfile {
        let Some(cache) = &self.cache else {
            return ProductivityProfile::default();
        };

        let key = CacheKey::productivity_patterns(participant_id).cache_key();
        match bounded(self.cache_timeout, cache.get(&key)).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<ProductivityProfile>(&bytes) {
                Ok(profile) => profile,
                Err(err) => {
                    warn!(target: "app::cache", cache_key = %key, error = %err, "unreadable productivity profile");
                    ProductivityProfile::default()
                }
            },
            Ok(None) => ProductivityProfile::default(),
            Err(err) => {
                warn!(target: "app::cache", cache_key = %key, error = %err, "productivity profile lookup failed");
                ProductivityProfile::default()
            }
        }
    }
}
