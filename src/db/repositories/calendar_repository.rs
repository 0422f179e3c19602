use std::convert::TryFrom;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{named_params, Connection, Row};

use crate::error::{AppError, AppResult};
use crate::models::availability::SearchWindow;
use crate::models::calendar::{
    CalendarEventRecord, EventStatus, EventType, TaskRecord, TaskStatus,
};

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::database(format!("invalid stored timestamp: {value}")))
}

#[derive(Debug, Clone)]
pub struct CalendarEventRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub start_at: String,
    pub end_at: String,
    pub event_type: String,
    pub status: String,
    pub created_at: String,
}

impl CalendarEventRow {
    pub fn into_record(self) -> AppResult<CalendarEventRecord> {
        Ok(CalendarEventRecord {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            start_at: parse_timestamp(&self.start_at)?,
            end_at: parse_timestamp(&self.end_at)?,
            event_type: EventType::try_from(self.event_type.as_str())
                .map_err(AppError::database)?,
            status: EventStatus::try_from(self.status.as_str()).map_err(AppError::database)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

impl TryFrom<&Row<'_>> for CalendarEventRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            start_at: row.get("start_at")?,
            end_at: row.get("end_at")?,
            event_type: row.get("event_type")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TaskRow {
    pub id: String,
    pub assigned_to: String,
    pub title: String,
    pub due_at: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl TaskRow {
    pub fn into_record(self) -> AppResult<TaskRecord> {
        Ok(TaskRecord {
            id: self.id,
            assigned_to: self.assigned_to,
            title: self.title,
            due_at: self.due_at.as_deref().map(parse_timestamp).transpose()?,
            status: TaskStatus::try_from(self.status.as_str()).map_err(AppError::database)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

impl TryFrom<&Row<'_>> for TaskRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            assigned_to: row.get("assigned_to")?,
            title: row.get("title")?,
            due_at: row.get("due_at")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct CalendarRepository;

impl CalendarRepository {
    /// Non-cancelled events of `user_id` overlapping `window`.
    pub fn events_in_window(
        conn: &Connection,
        user_id: &str,
        window: &SearchWindow,
    ) -> AppResult<Vec<CalendarEventRecord>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT id, user_id, title, start_at, end_at, event_type, status, created_at
                FROM calendar_events
                WHERE user_id = :user_id
                  AND start_at < :window_end
                  AND end_at > :window_start
                  AND status != 'cancelled'
                ORDER BY start_at ASC
            "#,
        )?;

        let rows = stmt
            .query_map(
                named_params! {
                    ":user_id": user_id,
                    ":window_start": timestamp(&window.start),
                    ":window_end": timestamp(&window.end),
                },
                |row| CalendarEventRow::try_from(row),
            )?
            .map(|row| row.map_err(AppError::from).and_then(|row| row.into_record()))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(rows)
    }

    /// Open tasks of `user_id` due inside `window`.
    pub fn open_tasks_due_in_window(
        conn: &Connection,
        user_id: &str,
        window: &SearchWindow,
    ) -> AppResult<Vec<TaskRecord>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT id, assigned_to, title, due_at, status, created_at
                FROM tasks
                WHERE assigned_to = :user_id
                  AND due_at IS NOT NULL
                  AND due_at >= :window_start
                  AND due_at < :window_end
                  AND status NOT IN ('completed', 'cancelled')
                ORDER BY due_at ASC
            "#,
        )?;

        let rows = stmt
            .query_map(
                named_params! {
                    ":user_id": user_id,
                    ":window_start": timestamp(&window.start),
                    ":window_end": timestamp(&window.end),
                },
                |row| TaskRow::try_from(row),
            )?
            .map(|row| row.map_err(AppError::from).and_then(|row| row.into_record()))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(rows)
    }
}
