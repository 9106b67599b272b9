//! Session-only task collection with a hard capacity ceiling

use jiff::{Timestamp, civil::Date, tz::TimeZone};

use crate::{datetime, task::Task};

/// Maximum number of tasks a session may hold
pub const MAX_TASKS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error(
        "You've reached the maximum limit of {max} tasks. Please complete or remove existing tasks before adding new ones."
    )]
    LimitReached { max: usize },

    #[error("Task {0} not found")]
    NotFound(i64),

    #[error("No task ids left above {0}")]
    IdsExhausted(i64),
}

/// In-memory task list, mutated only through `add`, `update` and `delete`
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
    capacity: usize,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self::with_capacity(MAX_TASKS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tasks: Vec::new(),
            capacity,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.tasks.len() >= self.capacity
    }

    /// Append a task under a fresh id. Rejected without mutation once full.
    pub fn add(&mut self, mut task: Task) -> Result<&Task, StoreError> {
        if self.is_full() {
            return Err(StoreError::LimitReached { max: self.capacity });
        }

        task.id = self.next_id()?;
        task.recompute_status();
        tracing::debug!(id = task.id, title = %task.title, "task added");
        self.tasks.push(task);
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Replace the task with the same id, re-deriving its status from its steps.
    pub fn update(&mut self, mut task: Task) -> Result<&Task, StoreError> {
        let index = self
            .position(task.id)
            .ok_or(StoreError::NotFound(task.id))?;

        task.recompute_status();
        tracing::debug!(id = task.id, status = %task.status, "task updated");
        self.tasks[index] = task;
        Ok(&self.tasks[index])
    }

    pub fn delete(&mut self, id: i64) -> Option<Task> {
        let index = self.position(id)?;
        let removed = self.tasks.remove(index);
        tracing::debug!(id, title = %removed.title, "task deleted");
        Some(removed)
    }

    pub fn find(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Case-insensitive exact title match; no partial or fuzzy matching.
    pub fn find_by_title(&self, title: &str) -> Option<&Task> {
        let title = title.to_lowercase();
        self.tasks
            .iter()
            .find(|task| task.title.to_lowercase() == title)
    }

    /// Case-insensitive substring search over titles and descriptions.
    pub fn search(&self, term: &str) -> Vec<&Task> {
        let term = term.trim().to_lowercase();
        self.tasks
            .iter()
            .filter(|task| {
                term.is_empty()
                    || task.title.to_lowercase().contains(&term)
                    || task.description.to_lowercase().contains(&term)
            })
            .collect()
    }

    /// Tasks due on the civil day `date` in `tz` (day view).
    pub fn due_on(&self, date: Date, tz: &TimeZone) -> Vec<&Task> {
        datetime::day_bounds(date, tz)
            .map(|range| self.due_within(range))
            .unwrap_or_default()
    }

    /// Tasks due in the Sunday-start week containing `date` in `tz` (week view).
    pub fn due_in_week(&self, date: Date, tz: &TimeZone) -> Vec<&Task> {
        datetime::week_bounds(date, tz)
            .map(|range| self.due_within(range))
            .unwrap_or_default()
    }

    fn due_within(&self, (start, end): (Timestamp, Timestamp)) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.due_date >= start && task.due_date < end)
            .collect()
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn next_id(&self) -> Result<i64, StoreError> {
        let newest = self.tasks.iter().map(|task| task.id).max().unwrap_or(0);
        let after_newest = newest
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted(newest))?;
        Ok(Timestamp::now().as_millisecond().max(after_newest))
    }
}
