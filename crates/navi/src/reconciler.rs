//! Maps one extracted operation onto the caller's task list
//!
//! Pure with respect to its inputs: the caller's list is never mutated, the
//! resulting task (or delete acknowledgement) is returned for the client to
//! apply to its own store.

use jiff::{Timestamp, tz::TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::{
    classifier::{self, CommandAction},
    conversation::ConversationContext,
    datetime::{self, DateTimeError},
    extractor::{CreateTaskArgs, DeleteTaskArgs, ModifyTaskArgs, TaskOperation},
    task::{Task, TaskStep, ensure_valid_steps, normalize_steps},
};

/// Due dates closer than this are considered the same appointment
pub const SIMILAR_DUE_WINDOW_MS: i64 = 60 * 60 * 1000;

pub const MSG_SIMILAR_FOUND: &str =
    "Similar task found. Modifying existing task instead of creating a new one.";
pub const MSG_CREATED: &str = "Task created successfully";
pub const MSG_MODIFIED: &str = "Task modified successfully";
pub const MSG_DELETED: &str = "Task deleted successfully";
pub const MSG_INFERRED_MODIFY: &str = "Modifying the last mentioned task based on new input";
pub const MSG_NO_ACTION: &str = "No specific action taken";

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Task not found")]
    TaskNotFound(i64),

    #[error(transparent)]
    DateTime(#[from] DateTimeError),

    #[error("Task id {0} leaves no room for a new task")]
    IdsExhausted(i64),
}

/// Acknowledgement of a delete, carrying the model's id and title verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct DeletedTask {
    pub id: i64,
    pub title: String,
}

/// How the input was read, echoed back for display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AiInterpretation {
    pub original_input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub parsed_due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub formatted_due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub inferred_action: Option<String>,
}

impl AiInterpretation {
    fn for_due_date(input: &str, due: Timestamp, tz: &TimeZone) -> Self {
        Self {
            original_input: input.to_string(),
            parsed_due_date: Some(datetime::format_iso(due, tz)),
            formatted_due_date: Some(datetime::format_human(due, tz)),
            inferred_action: None,
        }
    }
}

/// Everything reconciliation reads
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    pub tasks: &'a [Task],
    pub time_zone: &'a TimeZone,
    pub input: &'a str,
    pub context: &'a ConversationContext,
}

/// Result of reconciling one command, plus the context for the next one
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub action: CommandAction,
    pub message: String,
    pub task: Option<Task>,
    pub deleted_task: Option<DeletedTask>,
    pub interpretation: Option<AiInterpretation>,
    pub response: Option<String>,
    pub context: ConversationContext,
}

impl Reconciled {
    fn with_task(
        action: CommandAction,
        message: &str,
        task: Task,
        interpretation: AiInterpretation,
        previous: &ConversationContext,
    ) -> Self {
        let context = ConversationContext {
            last_action: Some(action),
            last_task_id: Some(task.id),
            last_mentioned_task: Some(task.title.clone()),
            user_time_zone: previous.user_time_zone.clone(),
        };
        Self {
            action,
            message: message.to_string(),
            task: Some(task),
            deleted_task: None,
            interpretation: Some(interpretation),
            response: None,
            context,
        }
    }
}

/// Apply a decoded function call.
pub fn reconcile(
    operation: TaskOperation,
    input: ReconcileInput<'_>,
) -> Result<Reconciled, ReconcileError> {
    match operation {
        TaskOperation::Create(args) => create(args, input),
        TaskOperation::Modify(args) => modify(args, input),
        TaskOperation::Delete(args) => Ok(delete(args, input)),
    }
}

/// Handle a reply that carried no function call.
///
/// A pending last-mentioned task (matched by exact title) absorbs the input
/// as an implicit modify; otherwise the reply is passed through as a query.
pub fn infer_from_text(reply: &str, input: ReconcileInput<'_>) -> Reconciled {
    let action = classifier::determine_action(reply, input.tasks, input.context);
    let context = ConversationContext {
        last_action: Some(action),
        ..input.context.clone()
    };

    let pending = input.context.last_mentioned_task.as_deref().and_then(|title| {
        input.tasks.iter().find(|task| task.title == title)
    });

    if let Some(existing) = pending {
        let mut task = existing.clone();
        task.description = format!("{}\n{}", existing.description, input.input);

        let mut steps = existing.steps.clone();
        steps.push(TaskStep::new(0, input.input));
        task.steps = normalize_steps(&steps);

        tracing::info!(id = task.id, title = %task.title, "input folded into last mentioned task");
        return Reconciled {
            action: CommandAction::ModifyTask,
            message: MSG_INFERRED_MODIFY.to_string(),
            task: Some(task),
            deleted_task: None,
            interpretation: Some(AiInterpretation {
                original_input: input.input.to_string(),
                inferred_action: Some("modify".to_string()),
                ..AiInterpretation::default()
            }),
            response: None,
            context,
        };
    }

    let message = if reply.is_empty() { MSG_NO_ACTION } else { reply };
    Reconciled {
        action: CommandAction::Query,
        message: message.to_string(),
        task: None,
        deleted_task: None,
        interpretation: None,
        response: Some(reply.to_string()),
        context,
    }
}

/// First task with the same title (case-insensitive) or a due date less
/// than an hour away. Due-date proximity only applies when a date was given.
pub fn find_similar_task<'a>(
    title: &str,
    due: Option<Timestamp>,
    tasks: &'a [Task],
) -> Option<&'a Task> {
    let title = title.to_lowercase();
    tasks.iter().find(|task| {
        task.title.to_lowercase() == title
            || due.is_some_and(|due| {
                (task.due_date.as_millisecond() - due.as_millisecond()).abs()
                    < SIMILAR_DUE_WINDOW_MS
            })
    })
}

fn create(args: CreateTaskArgs, input: ReconcileInput<'_>) -> Result<Reconciled, ReconcileError> {
    let tz = input.time_zone;
    let due = datetime::parse_due_date(args.due_date.as_deref(), tz)?;
    let given_due = args.due_date.as_ref().map(|_| due);

    if let Some(similar) = find_similar_task(&args.title, given_due, input.tasks) {
        let mut task = similar.clone();
        task.title = args.title;
        if let Some(description) = args.description {
            task.description = description;
        }
        if let Some(priority) = args.priority {
            task.priority = priority;
        }
        if let Some(status) = args.status {
            task.status = status;
        }
        task.due_date = due;
        task.steps = merge_steps(args.steps.as_ref(), &similar.steps);

        tracing::info!(id = task.id, title = %task.title, "create redirected to similar task");
        let interpretation = AiInterpretation::for_due_date(input.input, due, tz);
        return Ok(Reconciled::with_task(
            CommandAction::ModifyTask,
            MSG_SIMILAR_FOUND,
            task,
            interpretation,
            input.context,
        ));
    }

    let newest = input.tasks.iter().map(|t| t.id).max().unwrap_or(0).max(0);
    let id = newest
        .checked_add(1)
        .ok_or(ReconcileError::IdsExhausted(newest))?;
    let mut task = Task::new(id, args.title, due);
    task.description = args.description.unwrap_or_default();
    task.priority = args.priority.unwrap_or_default();
    task.status = args.status.unwrap_or_default();
    task.steps = ensure_valid_steps(args.steps.as_ref().unwrap_or(&Value::Null));

    tracing::info!(id, title = %task.title, steps = task.steps.len(), "task created");
    let interpretation = AiInterpretation::for_due_date(input.input, due, tz);
    Ok(Reconciled::with_task(
        CommandAction::CreateTask,
        MSG_CREATED,
        task,
        interpretation,
        input.context,
    ))
}

fn modify(args: ModifyTaskArgs, input: ReconcileInput<'_>) -> Result<Reconciled, ReconcileError> {
    let existing = input
        .tasks
        .iter()
        .find(|task| task.id == args.id)
        .ok_or(ReconcileError::TaskNotFound(args.id))?;

    let tz = input.time_zone;
    let mut task = existing.clone();
    if let Some(title) = args.title {
        task.title = title;
    }
    if let Some(description) = args.description {
        task.description = description;
    }
    if let Some(priority) = args.priority {
        task.priority = priority;
    }
    if let Some(status) = args.status {
        task.status = status;
    }
    if let Some(due) = args.due_date.as_deref() {
        task.due_date = datetime::parse_due_date(Some(due), tz)?;
    }
    task.steps = merge_steps(args.steps.as_ref(), &existing.steps);

    tracing::info!(id = task.id, title = %task.title, "task modified");
    let interpretation = AiInterpretation::for_due_date(input.input, task.due_date, tz);
    Ok(Reconciled::with_task(
        CommandAction::ModifyTask,
        MSG_MODIFIED,
        task,
        interpretation,
        input.context,
    ))
}

fn delete(args: DeleteTaskArgs, input: ReconcileInput<'_>) -> Reconciled {
    tracing::info!(id = args.id, title = %args.title, "task delete acknowledged");
    let context = ConversationContext {
        last_action: Some(CommandAction::DeleteTask),
        last_task_id: None,
        last_mentioned_task: Some(args.title.clone()),
        user_time_zone: input.context.user_time_zone.clone(),
    };
    Reconciled {
        action: CommandAction::DeleteTask,
        message: MSG_DELETED.to_string(),
        task: None,
        deleted_task: Some(DeletedTask {
            id: args.id,
            title: args.title,
        }),
        interpretation: None,
        response: None,
        context,
    }
}

/// Model-supplied steps replace the old ones; otherwise the old ones are kept.
fn merge_steps(supplied: Option<&Value>, existing: &[TaskStep]) -> Vec<TaskStep> {
    match supplied {
        Some(steps) => ensure_valid_steps(steps),
        None => normalize_steps(existing),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::task::{Priority, TaskStatus};

    fn new_york() -> TimeZone {
        TimeZone::get("America/New_York").unwrap()
    }

    fn gym() -> Task {
        // 2024-05-01 18:00 in New York
        Task::new(1, "Gym", "2024-05-01T22:00:00Z".parse().unwrap())
    }

    fn create_args(title: &str, due: Option<&str>) -> CreateTaskArgs {
        CreateTaskArgs {
            title: title.to_string(),
            description: None,
            priority: None,
            status: None,
            due_date: due.map(str::to_string),
            steps: Some(json!([{ "content": "Pack shoes" }, { "content": "Go" }])),
        }
    }

    fn modify_args(id: i64) -> ModifyTaskArgs {
        ModifyTaskArgs {
            id,
            title: None,
            description: None,
            priority: None,
            status: None,
            due_date: None,
            steps: None,
        }
    }

    fn run(op: TaskOperation, tasks: &[Task]) -> Result<Reconciled, ReconcileError> {
        let tz = new_york();
        let context = ConversationContext::for_time_zone("America/New_York");
        reconcile(
            op,
            ReconcileInput {
                tasks,
                time_zone: &tz,
                input: "some input",
                context: &context,
            },
        )
    }

    #[test]
    fn create_on_empty_list_uses_id_one_and_defaults() {
        let result = run(
            TaskOperation::Create(create_args("Dentist", Some("2024-05-06T09:00:00"))),
            &[],
        )
        .unwrap();

        assert_eq!(result.action, CommandAction::CreateTask);
        assert_eq!(result.message, MSG_CREATED);
        let task = result.task.unwrap();
        assert_eq!(task.id, 1);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.description, "");
        assert_eq!(task.steps.len(), 2);
        assert_eq!(task.due_date, "2024-05-06T13:00:00Z".parse::<Timestamp>().unwrap());

        let interpretation = result.interpretation.unwrap();
        assert_eq!(
            interpretation.parsed_due_date.as_deref(),
            Some("2024-05-06T09:00:00-04:00")
        );
        assert_eq!(
            interpretation.formatted_due_date.as_deref(),
            Some("Monday, May 6, 2024, 9:00 AM EDT")
        );
        assert_eq!(result.context.last_task_id, Some(1));
        assert_eq!(result.context.last_mentioned_task.as_deref(), Some("Dentist"));
        assert_eq!(result.context.last_action, Some(CommandAction::CreateTask));
    }

    #[test]
    fn create_takes_max_id_plus_one() {
        let mut other = gym();
        other.id = 41;
        other.title = "Other".to_string();
        other.due_date = "2024-06-01T12:00:00Z".parse().unwrap();
        let result = run(
            TaskOperation::Create(create_args("Piano", Some("2024-07-01T10:00:00"))),
            &[other],
        )
        .unwrap();
        assert_eq!(result.task.unwrap().id, 42);
    }

    #[test]
    fn create_after_largest_possible_id_is_rejected() {
        let mut last = gym();
        last.id = i64::MAX;
        last.title = "Other".to_string();
        last.due_date = "2024-06-01T12:00:00Z".parse().unwrap();

        let err = run(
            TaskOperation::Create(create_args("Piano", Some("2024-07-01T10:00:00"))),
            &[last],
        )
        .unwrap_err();
        assert!(matches!(err, ReconcileError::IdsExhausted(i64::MAX)));
    }

    #[test]
    fn same_title_redirects_to_modify() {
        let result = run(
            TaskOperation::Create(create_args("GYM", Some("2024-05-09T18:00:00"))),
            &[gym()],
        )
        .unwrap();

        assert_eq!(result.action, CommandAction::ModifyTask);
        assert_eq!(result.message, MSG_SIMILAR_FOUND);
        let task = result.task.unwrap();
        assert_eq!(task.id, 1);
        assert_eq!(task.title, "GYM");
        assert_eq!(task.steps.len(), 2);
    }

    #[test]
    fn nearby_due_date_redirects_to_modify() {
        let result = run(
            TaskOperation::Create(create_args("Workout", Some("2024-05-01T18:45:00"))),
            &[gym()],
        )
        .unwrap();
        assert_eq!(result.action, CommandAction::ModifyTask);
        assert_eq!(result.task.unwrap().id, 1);
    }

    #[test]
    fn exactly_one_hour_apart_is_not_similar() {
        let result = run(
            TaskOperation::Create(create_args("Workout", Some("2024-05-01T19:00:00"))),
            &[gym()],
        )
        .unwrap();
        assert_eq!(result.action, CommandAction::CreateTask);
        assert_eq!(result.task.unwrap().id, 2);
    }

    #[test]
    fn redirect_keeps_existing_steps_when_none_supplied() {
        let mut existing = gym();
        existing.steps = vec![TaskStep {
            completed: true,
            ..TaskStep::new(1, "Warm up")
        }];
        let mut args = create_args("gym", None);
        args.steps = None;

        let task = run(TaskOperation::Create(args), &[existing]).unwrap().task.unwrap();
        assert_eq!(task.steps.len(), 1);
        assert!(task.steps[0].completed);
    }

    #[test]
    fn modify_merges_only_supplied_fields() {
        let mut existing = gym();
        existing.description = "Leg day".to_string();
        let mut args = modify_args(1);
        args.due_date = Some("2024-05-01T17:00:00".to_string());
        args.priority = Some(Priority::High);

        let result = run(TaskOperation::Modify(args), &[existing]).unwrap();
        assert_eq!(result.message, MSG_MODIFIED);
        let task = result.task.unwrap();
        assert_eq!(task.title, "Gym");
        assert_eq!(task.description, "Leg day");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date, "2024-05-01T21:00:00Z".parse::<Timestamp>().unwrap());
    }

    #[test]
    fn modify_of_missing_id_is_not_found() {
        let err = run(TaskOperation::Modify(modify_args(99)), &[gym()]).unwrap_err();
        assert!(matches!(err, ReconcileError::TaskNotFound(99)));
    }

    #[test]
    fn modify_with_garbage_date_is_rejected() {
        let mut args = modify_args(1);
        args.due_date = Some("next tuesday-ish".to_string());
        let err = run(TaskOperation::Modify(args), &[gym()]).unwrap_err();
        assert!(matches!(err, ReconcileError::DateTime(DateTimeError::InvalidDate(_))));
    }

    #[test]
    fn delete_is_acknowledged_without_lookup() {
        let result = run(
            TaskOperation::Delete(DeleteTaskArgs {
                id: 5,
                title: "Old Task".to_string(),
            }),
            &[],
        )
        .unwrap();

        assert_eq!(result.action, CommandAction::DeleteTask);
        assert_eq!(
            result.deleted_task,
            Some(DeletedTask {
                id: 5,
                title: "Old Task".to_string()
            })
        );
        assert_eq!(result.context.last_task_id, None);
        assert_eq!(result.context.last_mentioned_task.as_deref(), Some("Old Task"));
    }

    #[test]
    fn text_reply_folds_into_last_mentioned_task() {
        let tz = new_york();
        let mut existing = gym();
        existing.description = "Leg day".to_string();
        existing.steps = vec![TaskStep::new(1, "Warm up")];
        let mut context = ConversationContext::for_time_zone("America/New_York");
        context.last_mentioned_task = Some("Gym".to_string());
        context.last_task_id = Some(1);

        let result = infer_from_text(
            "",
            ReconcileInput {
                tasks: &[existing],
                time_zone: &tz,
                input: "bring a towel",
                context: &context,
            },
        );

        assert_eq!(result.action, CommandAction::ModifyTask);
        assert_eq!(result.message, MSG_INFERRED_MODIFY);
        let task = result.task.unwrap();
        assert_eq!(task.description, "Leg day\nbring a towel");
        assert_eq!(task.steps.len(), 2);
        assert_eq!(task.steps[1].id, 2);
        assert_eq!(task.steps[1].content, "bring a towel");
        assert!(!task.steps[1].completed);
        assert_eq!(
            result.interpretation.unwrap().inferred_action.as_deref(),
            Some("modify")
        );
        assert_eq!(result.context.last_task_id, Some(1));
    }

    #[test]
    fn text_reply_without_pending_task_is_a_query() {
        let tz = new_york();
        let context = ConversationContext::for_time_zone("America/New_York");
        let input = ReconcileInput {
            tasks: &[],
            time_zone: &tz,
            input: "what's up?",
            context: &context,
        };

        let result = infer_from_text("Nothing scheduled today.", input);
        assert_eq!(result.action, CommandAction::Query);
        assert_eq!(result.message, "Nothing scheduled today.");
        assert_eq!(result.response.as_deref(), Some("Nothing scheduled today."));
        assert!(result.task.is_none());

        let empty = infer_from_text("", input);
        assert_eq!(empty.message, MSG_NO_ACTION);
        assert_eq!(empty.response.as_deref(), Some(""));
    }

    #[test]
    fn pending_title_must_match_exactly() {
        let tz = new_york();
        let mut context = ConversationContext::for_time_zone("America/New_York");
        context.last_mentioned_task = Some("gym".to_string());
        let result = infer_from_text(
            "ok",
            ReconcileInput {
                tasks: &[gym()],
                time_zone: &tz,
                input: "later",
                context: &context,
            },
        );
        assert_eq!(result.action, CommandAction::Query);
        // still labelled as a modify in the carried context
        assert_eq!(result.context.last_action, Some(CommandAction::ModifyTask));
    }
}
