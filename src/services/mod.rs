pub mod availability_analyzer;
pub mod cache_service;
pub mod calendar_source;
pub mod conflict_checker;
pub mod explanation;
pub mod result_cache;
pub mod schedule_utils;
pub mod scoring_engine;
pub mod settings_service;
pub mod slot_generator;
pub mod smart_scheduler;
pub mod sqlite_source;
pub mod workload_analyzer;
