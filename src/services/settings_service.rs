use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::settings::EngineSettings;

const ENV_TIMEZONE: &str = "SCHEDULER_TIMEZONE";
const ENV_SKIP_WEEKENDS: &str = "SCHEDULER_SKIP_WEEKENDS";
const ENV_FETCH_TIMEOUT_MS: &str = "SCHEDULER_FETCH_TIMEOUT_MS";
const ENV_SEARCH_HORIZON_DAYS: &str = "SCHEDULER_SEARCH_HORIZON_DAYS";
const ENV_CACHE_TTL_SECS: &str = "SCHEDULER_CACHE_TTL_SECS";
const ENV_CACHE_TIMEOUT_MS: &str = "SCHEDULER_CACHE_TIMEOUT_MS";
const ENV_LOG_DIR: &str = "SCHEDULER_LOG_DIR";

const MAX_SEARCH_HORIZON_DAYS: i64 = 366;
const MAX_SLOT_STEP_MINUTES: i64 = 24 * 60;
const MAX_DEADLINE_BLOCK_MINUTES: i64 = 7 * 24 * 60;
const MAX_RESULT_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Loads engine settings: YAML file, then `SCHEDULER_*` environment
/// overrides, then validation.
pub struct SettingsService;

impl SettingsService {
    pub fn load(path: Option<&Path>) -> AppResult<EngineSettings> {
        let base = match path {
            Some(path) if path.exists() => {
                let raw = fs::read_to_string(path)?;
                info!(target: "app::settings", path = %path.display(), "loading settings file");
                Self::from_yaml_str(&raw)?
            }
            Some(path) => {
                warn!(target: "app::settings", path = %path.display(), "settings file missing, using defaults");
                EngineSettings::default()
            }
            None => EngineSettings::default(),
        };

        let settings = Self::apply_overrides(base, |key| std::env::var(key).ok())?;
        Self::validate(&settings)?;
        Ok(settings)
    }

    pub fn from_yaml_str(raw: &str) -> AppResult<EngineSettings> {
        if raw.trim().is_empty() {
            return Ok(EngineSettings::default());
        }
        let settings: EngineSettings = serde_yaml::from_str(raw)?;
        Ok(settings)
    }

    pub fn apply_overrides<F>(mut settings: EngineSettings, lookup: F) -> AppResult<EngineSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_TIMEZONE) {
            settings.timezone = value;
        }
        if let Some(value) = lookup(ENV_SKIP_WEEKENDS) {
            settings.skip_weekends = parse_bool(ENV_SKIP_WEEKENDS, &value)?;
        }
        if let Some(value) = lookup(ENV_FETCH_TIMEOUT_MS) {
            settings.fetch_timeout_ms = parse_number(ENV_FETCH_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_SEARCH_HORIZON_DAYS) {
            settings.search_horizon_days = parse_number(ENV_SEARCH_HORIZON_DAYS, &value)?;
        }
        if let Some(value) = lookup(ENV_CACHE_TTL_SECS) {
            settings.result_cache_ttl_secs = parse_number(ENV_CACHE_TTL_SECS, &value)?;
        }
        if let Some(value) = lookup(ENV_CACHE_TIMEOUT_MS) {
            settings.cache_timeout_ms = parse_number(ENV_CACHE_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            settings.log.directory = Some(PathBuf::from(value));
        }
        Ok(settings)
    }

    pub fn validate(settings: &EngineSettings) -> AppResult<()> {
        parse_timezone(&settings.timezone)?;

        if !(1..=MAX_SEARCH_HORIZON_DAYS).contains(&settings.search_horizon_days) {
            return Err(AppError::settings(format!(
                "searchHorizonDays must be between 1 and {MAX_SEARCH_HORIZON_DAYS}"
            )));
        }
        if !(1..=MAX_SLOT_STEP_MINUTES).contains(&settings.slot_step_minutes) {
            return Err(AppError::settings(format!(
                "slotStepMinutes must be between 1 and {MAX_SLOT_STEP_MINUTES}"
            )));
        }
        if settings.default_working_hours.start >= settings.default_working_hours.end {
            return Err(AppError::settings(
                "defaultWorkingHours start must be before its end",
            ));
        }
        if !(0..=MAX_DEADLINE_BLOCK_MINUTES).contains(&settings.deadline_block_minutes) {
            return Err(AppError::settings(format!(
                "deadlineBlockMinutes must be between 0 and {MAX_DEADLINE_BLOCK_MINUTES}"
            )));
        }
        if settings.workload_meeting_norm.is_nan() || settings.workload_meeting_norm <= 0.0 {
            return Err(AppError::settings("workloadMeetingNorm must be positive"));
        }
        if settings.fetch_timeout_ms == 0 {
            return Err(AppError::settings("fetchTimeoutMs must be positive"));
        }
        if settings.cache_timeout_ms == 0 {
            return Err(AppError::settings("cacheTimeoutMs must be positive"));
        }
        if settings.result_cache_ttl_secs > MAX_RESULT_CACHE_TTL_SECS {
            return Err(AppError::settings(format!(
                "resultCacheTtlSecs must not exceed {MAX_RESULT_CACHE_TTL_SECS}"
            )));
        }
        if settings.memory_cache_capacity == 0 {
            return Err(AppError::settings("memoryCacheCapacity must be positive"));
        }
        Ok(())
    }
}

pub fn parse_timezone(value: &str) -> AppResult<Tz> {
    value
        .parse::<Tz>()
        .map_err(|err| AppError::settings(format!("unknown timezone '{value}': {err}")))
}

fn parse_bool(key: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::settings(format!("{key}: expected a boolean, got '{other}'"))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| AppError::settings(format!("{key}: expected a number, got '{value}'")))
}
