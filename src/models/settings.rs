use std::path::PathBuf;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::scheduling::TimeRange;

pub const DEFAULT_LOG_DIRECTIVES: &str = "info,app::scheduler=debug,app::cache=debug,app::db=info";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineSettings {
    /// IANA zone used for working hours, weekdays and hour buckets.
    pub timezone: String,
    pub search_horizon_days: i64,
    pub slot_step_minutes: i64,
    pub default_working_hours: TimeRange,
    pub skip_weekends: bool,
    pub deadline_block_minutes: i64,
    /// Meeting count at which an availability workload score saturates.
    pub workload_meeting_norm: f64,
    pub fetch_timeout_ms: u64,
    /// Upper bound on a single cache read or write.
    pub cache_timeout_ms: u64,
    pub result_cache_ttl_secs: u64,
    pub max_alternatives: usize,
    pub memory_cache_capacity: usize,
    pub log: LogSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            search_horizon_days: 14,
            slot_step_minutes: 30,
            default_working_hours: TimeRange::new(
                NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            ),
            skip_weekends: true,
            deadline_block_minutes: 120,
            workload_meeting_norm: 10.0,
            fetch_timeout_ms: 10_000,
            cache_timeout_ms: 1_000,
            result_cache_ttl_secs: 3_600,
            max_alternatives: 5,
            memory_cache_capacity: 256,
            log: LogSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LogSettings {
    pub directives: String,
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            directives: DEFAULT_LOG_DIRECTIVES.to_string(),
            directory: None,
            file_prefix: "teamsync.log".to_string(),
        }
    }
}
