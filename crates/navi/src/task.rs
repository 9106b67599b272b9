//! Task data model: tasks, ordered completion steps and the derived status

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// A user-tracked to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[ts(type = "string")]
    pub due_date: Timestamp,
    #[serde(default)]
    pub steps: Vec<TaskStep>,
}

impl Task {
    pub fn new(id: i64, title: impl Into<String>, due_date: Timestamp) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            status: TaskStatus::default(),
            due_date,
            steps: Vec::new(),
        }
    }

    /// Re-derive `status` from the completion state of `steps`
    pub fn recompute_status(&mut self) {
        self.status = TaskStatus::from_steps(&self.steps);
    }

    pub fn completed_steps(&self) -> usize {
        self.steps.iter().filter(|step| step.completed).count()
    }
}

/// An ordered sub-item of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TaskStep {
    pub id: u32,
    pub content: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub resources: Option<Vec<String>>,
}

impl TaskStep {
    pub fn new(id: u32, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            completed: false,
            resources: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Status is a pure function of the steps: nothing completed is `todo`,
    /// everything completed is `done`, anything in between is `in-progress`.
    pub fn from_steps(steps: &[TaskStep]) -> Self {
        let completed = steps.iter().filter(|step| step.completed).count();
        if completed == 0 {
            TaskStatus::Todo
        } else if completed == steps.len() {
            TaskStatus::Done
        } else {
            TaskStatus::InProgress
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(TaskStatus::Todo),
            "in-progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coerce untyped step data into an ordered step list.
///
/// Accepts an array of step-like values, a single string (one incomplete
/// step) or anything else (no steps). Ids are reassigned from 1 in order.
pub fn ensure_valid_steps(steps: &Value) -> Vec<TaskStep> {
    match steps {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| step_from_value(index, item))
            .collect(),
        Value::String(content) => vec![TaskStep::new(1, content.clone())],
        _ => Vec::new(),
    }
}

/// Typed counterpart of [`ensure_valid_steps`] for steps that are already structured.
pub fn normalize_steps(steps: &[TaskStep]) -> Vec<TaskStep> {
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| TaskStep {
            id: step_id(index),
            content: step.content.clone(),
            completed: step.completed,
            resources: step.resources.clone().filter(|r| !r.is_empty()),
        })
        .collect()
}

fn step_from_value(index: usize, item: &Value) -> TaskStep {
    let Value::Object(fields) = item else {
        return TaskStep::new(step_id(index), stringify(item));
    };

    let content = match fields.get("content") {
        Some(Value::String(content)) => content.clone(),
        Some(Value::Null) | None => stringify(item),
        Some(other) => stringify(other),
    };

    let completed = fields
        .get("completed")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let resources = match fields.get("resources") {
        Some(Value::Array(links)) if !links.is_empty() => {
            Some(links.iter().map(stringify).collect())
        }
        _ => None,
    };

    TaskStep {
        id: step_id(index),
        content,
        completed,
        resources,
    }
}

fn step_id(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
