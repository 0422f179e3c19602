use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::models::availability::{BusyInterval, SearchWindow, TaskDeadline};

/// Read-only access to participants' commitments.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Busy intervals overlapping `window`.
    async fn get_busy_intervals(
        &self,
        participant_id: &str,
        window: &SearchWindow,
    ) -> AppResult<Vec<BusyInterval>>;

    /// Tasks whose due instant falls inside `window`.
    async fn get_tasks_with_deadlines(
        &self,
        participant_id: &str,
        window: &SearchWindow,
    ) -> AppResult<Vec<TaskDeadline>>;
}

#[derive(Debug, Default, Clone)]
struct ParticipantCalendar {
    busy: Vec<BusyInterval>,
    tasks: Vec<TaskDeadline>,
}

/// Calendar source backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryCalendarSource {
    calendars: RwLock<HashMap<String, ParticipantCalendar>>,
}

impl InMemoryCalendarSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_busy(&self, participant_id: impl Into<String>, interval: BusyInterval) -> AppResult<()> {
        let mut guard = self
            .calendars
            .write()
            .map_err(|_| AppError::other("in-memory calendar lock poisoned"))?;
        guard.entry(participant_id.into()).or_default().busy.push(interval);
        Ok(())
    }

    pub fn add_task(&self, participant_id: impl Into<String>, task: TaskDeadline) -> AppResult<()> {
        let mut guard = self
            .calendars
            .write()
            .map_err(|_| AppError::other("in-memory calendar lock poisoned"))?;
        guard.entry(participant_id.into()).or_default().tasks.push(task);
        Ok(())
    }

    fn calendar(&self, participant_id: &str) -> AppResult<ParticipantCalendar> {
        let guard = self
            .calendars
            .read()
            .map_err(|_| AppError::other("in-memory calendar lock poisoned"))?;
        Ok(guard.get(participant_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl CalendarSource for InMemoryCalendarSource {
    async fn get_busy_intervals(
        &self,
        participant_id: &str,
        window: &SearchWindow,
    ) -> AppResult<Vec<BusyInterval>> {
        let calendar = self.calendar(participant_id)?;
        Ok(calendar
            .busy
            .into_iter()
            .filter(|interval| interval.overlaps(window.start, window.end))
            .collect())
    }

    async fn get_tasks_with_deadlines(
        &self,
        participant_id: &str,
        window: &SearchWindow,
    ) -> AppResult<Vec<TaskDeadline>> {
        let calendar = self.calendar(participant_id)?;
        Ok(calendar
            .tasks
            .into_iter()
            .filter(|task| task.due_at >= window.start && task.due_at < window.end)
            .collect())
    }
}
