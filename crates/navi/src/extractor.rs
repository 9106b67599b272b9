//! Typed view over the model's function-call arguments
//!
//! The model's output is untyped JSON. Every field is checked here before
//! the reconciler sees it: optional fields of the wrong type are dropped,
//! required ones are reported.

use serde_json::{Map, Value};

use crate::{
    brain::ToolCallRequest,
    task::{Priority, TaskStatus},
    tools::{CREATE_TASK, DELETE_TASK, MODIFY_TASK},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("Malformed arguments for {tool}: {reason}")]
    MalformedArguments { tool: String, reason: String },

    #[error("Missing required field '{field}' for {tool}")]
    MissingField { tool: &'static str, field: &'static str },

    #[error("Invalid value for '{field}' in {tool}")]
    InvalidField { tool: &'static str, field: &'static str },

    #[error("Unknown action")]
    UnknownTool(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTaskArgs {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<String>,
    /// Raw step data, normalized later by `ensure_valid_steps`
    pub steps: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModifyTaskArgs {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<String>,
    pub steps: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteTaskArgs {
    pub id: i64,
    pub title: String,
}

/// One operation requested by the model
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOperation {
    Create(CreateTaskArgs),
    Modify(ModifyTaskArgs),
    Delete(DeleteTaskArgs),
}

impl TaskOperation {
    pub fn tool_name(&self) -> &'static str {
        match self {
            TaskOperation::Create(_) => CREATE_TASK,
            TaskOperation::Modify(_) => MODIFY_TASK,
            TaskOperation::Delete(_) => DELETE_TASK,
        }
    }
}

/// Decode the first tool call of a reply. Later calls are ignored.
pub fn first_operation(calls: &[ToolCallRequest]) -> Option<Result<TaskOperation, ExtractError>> {
    if calls.len() > 1 {
        tracing::debug!(
            ignored = calls.len() - 1,
            "model returned several tool calls; using the first"
        );
    }
    calls.first().map(parse_tool_call)
}

pub fn parse_tool_call(call: &ToolCallRequest) -> Result<TaskOperation, ExtractError> {
    let tool = match call.name.as_str() {
        CREATE_TASK => CREATE_TASK,
        MODIFY_TASK => MODIFY_TASK,
        DELETE_TASK => DELETE_TASK,
        other => return Err(ExtractError::UnknownTool(other.to_string())),
    };

    let arguments = decode_arguments(&call.name, &call.arguments)?;
    let fields = Fields { tool, map: &arguments };

    let operation = match tool {
        CREATE_TASK => TaskOperation::Create(CreateTaskArgs {
            title: fields.required_title()?,
            description: fields.text("description"),
            priority: fields.text("priority").as_deref().and_then(Priority::parse),
            status: fields.text("status").as_deref().and_then(TaskStatus::parse),
            due_date: fields.text("dueDate"),
            steps: fields.present("steps"),
        }),
        MODIFY_TASK => TaskOperation::Modify(ModifyTaskArgs {
            id: fields.required_id()?,
            title: fields.text("title").filter(|t| !t.trim().is_empty()),
            description: fields.text("description"),
            priority: fields.text("priority").as_deref().and_then(Priority::parse),
            status: fields.text("status").as_deref().and_then(TaskStatus::parse),
            due_date: fields.text("dueDate").filter(|d| !d.trim().is_empty()),
            steps: fields.present("steps"),
        }),
        _ => TaskOperation::Delete(DeleteTaskArgs {
            id: fields.required_id()?,
            title: fields.required_title()?,
        }),
    };

    tracing::debug!(tool, ?operation, "decoded tool call");
    Ok(operation)
}

fn decode_arguments(tool: &str, raw: &str) -> Result<Map<String, Value>, ExtractError> {
    let raw = if raw.trim().is_empty() { "{}" } else { raw };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ExtractError::MalformedArguments {
            tool: tool.to_string(),
            reason: format!("expected an object, got {other}"),
        }),
        Err(e) => Err(ExtractError::MalformedArguments {
            tool: tool.to_string(),
            reason: e.to_string(),
        }),
    }
}

struct Fields<'a> {
    tool: &'static str,
    map: &'a Map<String, Value>,
}

impl Fields<'_> {
    fn present(&self, key: &str) -> Option<Value> {
        self.map.get(key).filter(|v| !v.is_null()).cloned()
    }

    fn text(&self, key: &str) -> Option<String> {
        self.map.get(key).and_then(Value::as_str).map(str::to_string)
    }

    fn required_title(&self) -> Result<String, ExtractError> {
        match self.map.get("title") {
            None | Some(Value::Null) => Err(ExtractError::MissingField {
                tool: self.tool,
                field: "title",
            }),
            Some(Value::String(title)) if !title.trim().is_empty() => Ok(title.clone()),
            Some(_) => Err(ExtractError::InvalidField {
                tool: self.tool,
                field: "title",
            }),
        }
    }

    fn required_id(&self) -> Result<i64, ExtractError> {
        let value = self.map.get("id").filter(|v| !v.is_null()).ok_or(
            ExtractError::MissingField {
                tool: self.tool,
                field: "id",
            },
        )?;
        parse_id(value).ok_or(ExtractError::InvalidField {
            tool: self.tool,
            field: "id",
        })
    }
}

/// Integers, integral floats and numeric strings are all accepted as ids.
fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}
