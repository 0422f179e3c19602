pub mod cache_repository;
pub mod calendar_repository;
