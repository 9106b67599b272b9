//! Function-calling schemas offered to the model

use serde_json::{Value, json};

use crate::brain::ToolDefinition;

pub const CREATE_TASK: &str = "create_task";
pub const MODIFY_TASK: &str = "modify_task";
pub const DELETE_TASK: &str = "delete_task";

fn step_list_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "content": { "type": "string" },
                "resources": {
                    "type": "array",
                    "items": { "type": "string" }
                }
            },
            "required": ["content"]
        },
        "minItems": 1
    })
}

fn task_properties(keyed_by_id: bool) -> Value {
    let mut properties = json!({
        "title": { "type": "string" },
        "description": { "type": "string" },
        "priority": { "type": "string", "enum": ["low", "medium", "high"] },
        "status": { "type": "string", "enum": ["todo", "in-progress", "done"] },
        "dueDate": { "type": "string", "format": "date-time" },
        "steps": step_list_schema()
    });
    if keyed_by_id {
        properties["id"] = json!({ "type": "number" });
    }
    properties
}

pub fn create_task_tool() -> ToolDefinition {
    ToolDefinition {
        name: CREATE_TASK.to_string(),
        description: "Create a new task".to_string(),
        parameters: json!({
            "type": "object",
            "properties": task_properties(false),
            "required": ["title", "description", "priority", "status", "dueDate", "steps"]
        }),
    }
}

pub fn modify_task_tool() -> ToolDefinition {
    ToolDefinition {
        name: MODIFY_TASK.to_string(),
        description: "Modify an existing task".to_string(),
        parameters: json!({
            "type": "object",
            "properties": task_properties(true),
            "required": ["id"]
        }),
    }
}

pub fn delete_task_tool() -> ToolDefinition {
    ToolDefinition {
        name: DELETE_TASK.to_string(),
        description: "Delete an existing task".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "id": { "type": "number" },
                "title": { "type": "string" }
            },
            "required": ["id", "title"]
        }),
    }
}

/// The three task operations, in the order they are offered
pub fn task_tools() -> Vec<ToolDefinition> {
    vec![create_task_tool(), modify_task_tool(), delete_task_tool()]
}
