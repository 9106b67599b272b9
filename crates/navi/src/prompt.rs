//! System prompt and message list for one command round-trip

use jiff::{Timestamp, tz::TimeZone};

use crate::{
    brain::ChatMessage,
    conversation::ConversationContext,
    datetime,
    task::Task,
};

const DIRECTIVES: &str = r#"IMPORTANT: Always take direct action based on the user's input. Do not describe what you would do; actually do it.

When interpreting the user's input:

1. CREATE a new task if:
   - The input describes a new, distinct task not present in the current list.
   - The user explicitly asks to create a new task.
   - The task list is empty and the user wants to schedule something.

2. MODIFY an existing task if:
   - The input refers to changing ANY details of a task that already exists in the current task list.
   - The user mentions ANY change related to an existing task, even without saying "modify" or "update".
   - The input is about rescheduling, postponing, bringing forward, or adding information to an existing task.

3. DELETE a task if:
   - The user explicitly asks to remove or delete a task.
   - The input suggests cancelling or no longer needing a specific task.

4. If the input doesn't clearly fit create, modify, or delete, default to CREATING a new task.

Consider the recent interactions and the current task list when choosing the action. When in doubt, prefer creating a new task over modifying one that does not exist.

When creating or modifying tasks, pay special attention to the 'steps' field:

1. Provide detailed, actionable steps that guide the user through completing the task.
2. Tailor the steps to the user's role (technical detail for an engineer, packing and destination advice for a traveler).
3. Each step should be clear, concise, and valuable on its own.
4. Break complex tasks into logical, manageable sub-steps and anticipate likely obstacles.
5. Aim for 3-5 substantive steps unless the task is extremely simple.
6. Attach resources to a step ONLY when they provide significant value. Not every step needs resources.

Remember:
- For CREATE: infer any missing details and provide comprehensive steps. Dates are local to the user's time zone.
- For MODIFY: update only the fields specified or implied by the input and keep the rest unchanged. Only modify tasks that exist in the current task list.
- For DELETE: if the exact task isn't clear, delete the most likely match based on the description.

ALWAYS respond with the action taken, not just a description of what you would do."#;

/// Everything the system prompt is rendered from
pub struct PromptInput<'a> {
    pub tasks: &'a [Task],
    pub time_zone: &'a TimeZone,
    pub time_zone_name: &'a str,
    pub user_role: Option<&'a str>,
    pub now: Timestamp,
}

/// `- Gym (ID: 1, Due: 2024-05-01T18:00:00-04:00, Priority: medium, Status: todo)`
pub fn task_line(task: &Task, tz: &TimeZone) -> String {
    format!(
        "- {} (ID: {}, Due: {}, Priority: {}, Status: {})",
        task.title,
        task.id,
        datetime::format_iso(task.due_date, tz),
        task.priority,
        task.status
    )
}

pub fn build_system_prompt(input: &PromptInput<'_>) -> String {
    let task_lines = input
        .tasks
        .iter()
        .map(|task| task_line(task, input.time_zone))
        .collect::<Vec<_>>()
        .join("\n");

    let user_role = input
        .user_role
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .unwrap_or("Not specified");

    format!(
        "You are an AI assistant for a task management application. Your role is to interpret user inputs and ALWAYS perform actions such as creating, modifying, or deleting tasks. You have access to the current list of tasks.\n\n\
         Today's date and current time: {now}\n\n\
         Current Task List:\n{task_lines}\n\n\
         User Role: {user_role}\n\
         User Time Zone: {zone}\n\n\
         {DIRECTIVES}\n",
        now = datetime::describe_instant(input.now, input.time_zone),
        zone = input.time_zone_name,
    )
}

/// System prompt, then the carried context, then the raw input.
pub fn build_messages(
    system_prompt: String,
    context: &ConversationContext,
    input: &str,
) -> Vec<ChatMessage> {
    let context_json = serde_json::to_string(context).unwrap_or_else(|_| "{}".to_string());
    vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(format!("Previous context: {context_json}")),
        ChatMessage::user(input),
    ]
}
