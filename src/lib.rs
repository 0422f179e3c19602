//! Meeting-time optimization and team workload analysis.
//!
//! [`services::smart_scheduler::SmartScheduler`] is the entry point; it reads
//! participants' commitments through a [`services::calendar_source::CalendarSource`]
//! and optionally records results in a [`services::result_cache::ResultCache`].

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{AppError, AppResult};
pub use services::smart_scheduler::SmartScheduler;
