pub mod availability;
pub mod calendar;
pub mod scheduling;
pub mod settings;
pub mod workload;
