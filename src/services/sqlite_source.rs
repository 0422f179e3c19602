use std::sync::Arc;

use async_trait::async_trait;
use tokio::task;

use crate::db::repositories::calendar_repository::CalendarRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::availability::{BusyInterval, SearchWindow, TaskDeadline};
use crate::services::calendar_source::CalendarSource;

/// Calendar source reading `calendar_events` and `tasks` from SQLite.
#[derive(Debug, Clone)]
pub struct SqliteCalendarSource {
    db: Arc<DbPool>,
}

impl SqliteCalendarSource {
    pub fn new(db: DbPool) -> Self {
        Self { db: Arc::new(db) }
    }
}

#[async_trait]
impl CalendarSource for SqliteCalendarSource {
    async fn get_busy_intervals(
        &self,
        participant_id: &str,
        window: &SearchWindow,
    ) -> AppResult<Vec<BusyInterval>> {
        let db = Arc::clone(&self.db);
        let participant = participant_id.to_string();
        let window = *window;

        task::spawn_blocking(move || {
            db.with_connection(|conn| {
                let events = CalendarRepository::events_in_window(conn, &participant, &window)?;
                Ok(events
                    .into_iter()
                    .map(|event| {
                        BusyInterval::new(event.start_at, event.end_at, event.event_type.busy_kind())
                    })
                    .collect())
            })
        })
        .await
        .map_err(|err| {
            AppError::data_source_unavailable(participant_id, format!("calendar query task failed: {err}"))
        })?
    }

    async fn get_tasks_with_deadlines(
        &self,
        participant_id: &str,
        window: &SearchWindow,
    ) -> AppResult<Vec<TaskDeadline>> {
        let db = Arc::clone(&self.db);
        let participant = participant_id.to_string();
        let window = *window;

        task::spawn_blocking(move || {
            db.with_connection(|conn| {
                let tasks = CalendarRepository::open_tasks_due_in_window(conn, &participant, &window)?;
                Ok(tasks
                    .into_iter()
                    .filter_map(|task| task.due_at)
                    .map(|due_at| TaskDeadline { due_at })
                    .collect())
            })
        })
        .await
        .map_err(|err| {
            AppError::data_source_unavailable(participant_id, format!("task query task failed: {err}"))
        })?
    }
}
