//! Client-side controller: owns the task store and transcript, applies
//! assistant responses, and records a notification for every outcome.

use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};

use crate::{
    assistant::{AiCommandData, AiCommandRequest, AiCommandResponse},
    classifier::CommandAction,
    conversation::{ConversationContext, ConversationLog},
    datetime::{self, DateTimeError},
    store::{StoreError, TaskStore},
    task::Task,
};

pub const TITLE_CREATED: &str = "Task Created";
pub const TITLE_UPDATED: &str = "Task Updated";
pub const TITLE_DELETED: &str = "Task Deleted";
pub const TITLE_NOT_FOUND: &str = "Task Not Found";
pub const TITLE_REPLY: &str = "Navi";
pub const TITLE_LIMIT: &str = "Task Limit Reached";
pub const TITLE_ERROR: &str = "Error";

const ERROR_PREFIX: &str = "Sorry, I encountered an error while processing your request: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Default,
    Destructive,
}

/// Toast-style notice for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub level: NotificationLevel,
}

impl Notification {
    fn info(title: &str, description: String) -> Self {
        Self {
            title: title.to_string(),
            description,
            level: NotificationLevel::Default,
        }
    }

    fn destructive(title: &str, description: String) -> Self {
        Self {
            title: title.to_string(),
            description,
            level: NotificationLevel::Destructive,
        }
    }
}

/// Proof that a command was started; required to apply its response
#[derive(Debug)]
pub struct CommandTicket {
    request: AiCommandRequest,
}

impl CommandTicket {
    pub fn request(&self) -> &AiCommandRequest {
        &self.request
    }
}

/// What applying a response did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Created(Task),
    Updated(Task),
    Deleted(Task),
    DeleteMissed(String),
    LimitReached,
    Answered(String),
    Failed(String),
}

pub struct AssistantSession {
    store: TaskStore,
    conversation: ConversationLog,
    context: ConversationContext,
    time_zone: TimeZone,
    user_role: Option<String>,
    processing: bool,
    notifications: Vec<Notification>,
}

impl AssistantSession {
    pub fn new(time_zone_name: &str) -> Result<Self, DateTimeError> {
        let time_zone = datetime::resolve_time_zone(time_zone_name)?;
        Ok(Self {
            store: TaskStore::new(),
            conversation: ConversationLog::new(),
            context: ConversationContext::for_time_zone(time_zone_name.trim()),
            time_zone,
            user_role: None,
            processing: false,
            notifications: Vec::new(),
        })
    }

    pub fn with_user_role(mut self, role: Option<String>) -> Self {
        self.user_role = role.filter(|r| !r.trim().is_empty());
        self
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn conversation(&self) -> &ConversationLog {
        &self.conversation
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn time_zone(&self) -> &TimeZone {
        &self.time_zone
    }

    pub fn time_zone_name(&self) -> &str {
        &self.context.user_time_zone
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Start a command. Ignored (returns `None`) while another is in flight
    /// or when the input is blank.
    pub fn begin_command(&mut self, input: &str) -> Option<CommandTicket> {
        let input = input.trim();
        if self.processing || input.is_empty() {
            return None;
        }

        self.processing = true;
        self.conversation.push_user(input);
        Some(CommandTicket {
            request: AiCommandRequest {
                input: input.to_string(),
                task_list: self.store.tasks().to_vec(),
                context: Some(self.context.clone()),
                user_role: self.user_role.clone(),
                user_time_zone: self.context.user_time_zone.clone(),
            },
        })
    }

    /// Apply the server's answer (or transport failure) to the local state.
    /// Exactly one AI entry is appended, whatever happened.
    pub fn apply_response(
        &mut self,
        ticket: CommandTicket,
        result: Result<AiCommandResponse, String>,
    ) -> Outcome {
        self.processing = false;
        tracing::debug!(input = %ticket.request.input, "applying command response");

        let outcome = match result {
            Ok(response) => match (response.success, response.data) {
                (true, Some(data)) => self.apply_data(data, response.message),
                (_, _) => Err(non_empty(response.message, "Unknown error occurred")),
            },
            Err(message) => Err(non_empty(message, "An unknown error occurred")),
        };

        outcome.unwrap_or_else(|message| {
            tracing::warn!(%message, "command failed");
            self.conversation.push_ai(format!("{ERROR_PREFIX}{message}"));
            self.notifications.push(Notification::destructive(
                TITLE_ERROR,
                format!("An error occurred: {message}"),
            ));
            Outcome::Failed(message)
        })
    }

    fn apply_data(&mut self, data: AiCommandData, message: String) -> Result<Outcome, String> {
        let AiCommandData {
            action,
            task,
            deleted_task,
            response,
            context,
            ..
        } = data;

        let outcome = match action {
            CommandAction::CreateTask => {
                if self.store.is_full() {
                    let limit = StoreError::LimitReached {
                        max: self.store.capacity(),
                    };
                    let apology = format!("I'm sorry, but {}", lowercase_first(&limit.to_string()));
                    self.conversation.push_ai(apology);
                    self.notifications
                        .push(Notification::destructive(TITLE_LIMIT, limit.to_string()));
                    Outcome::LimitReached
                } else {
                    let task = task.ok_or("Task creation data is missing")?;
                    let created = self.insert_task(task).map_err(|e| e.to_string())?;
                    let summary = self.describe("Task created", &created);
                    self.conversation.push_ai(summary);
                    Outcome::Created(created)
                }
            }
            CommandAction::ModifyTask => {
                let task = task.ok_or("Task modification data is missing or invalid")?;
                let updated = self.update_task(task).map_err(|e| e.to_string())?;
                let summary = self.describe("Task modified", &updated);
                self.conversation.push_ai(summary);
                Outcome::Updated(updated)
            }
            CommandAction::DeleteTask => {
                let target = deleted_task.ok_or("Task deletion data is missing")?;
                let found = self.store.find_by_title(&target.title).map(|t| t.id);
                match found.and_then(|id| self.delete_task(id)) {
                    Some(removed) => {
                        self.conversation
                            .push_ai(format!("Task \"{}\" has been deleted.", removed.title));
                        Outcome::Deleted(removed)
                    }
                    None => {
                        self.conversation.push_ai(format!(
                            "Could not find a task with the title \"{}\" to delete.",
                            target.title
                        ));
                        self.notifications.push(Notification::destructive(
                            TITLE_NOT_FOUND,
                            format!("\"{}\" is not in your tasks.", target.title),
                        ));
                        Outcome::DeleteMissed(target.title)
                    }
                }
            }
            CommandAction::Query => {
                let text = response.filter(|r| !r.is_empty()).unwrap_or(message);
                self.conversation.push_ai(text.clone());
                self.notifications
                    .push(Notification::info(TITLE_REPLY, text.clone()));
                Outcome::Answered(text)
            }
        };

        self.context = ConversationContext {
            user_time_zone: self.context.user_time_zone.clone(),
            ..context
        };
        // the server numbers tasks against the list it was sent; the store's id wins
        if let Outcome::Created(task) | Outcome::Updated(task) = &outcome {
            self.context.last_task_id = Some(task.id);
        }
        Ok(outcome)
    }

    /// Manual creation (the "add task" form)
    pub fn add_task(&mut self, task: Task) -> Result<Task, StoreError> {
        self.insert_task(task).inspect_err(|err| {
            let title = match err {
                StoreError::LimitReached { .. } => TITLE_LIMIT,
                _ => TITLE_ERROR,
            };
            self.notifications
                .push(Notification::destructive(title, err.to_string()));
        })
    }

    fn insert_task(&mut self, task: Task) -> Result<Task, StoreError> {
        let added = self.store.add(task)?.clone();
        self.notifications.push(Notification::info(
            TITLE_CREATED,
            format!("\"{}\" has been added to your tasks.", added.title),
        ));
        Ok(added)
    }

    /// Manual edit; status is re-derived from the steps.
    pub fn update_task(&mut self, task: Task) -> Result<Task, StoreError> {
        let updated = self.store.update(task)?.clone();
        self.notifications.push(Notification::info(
            TITLE_UPDATED,
            format!("Changes to \"{}\" have been saved.", updated.title),
        ));
        Ok(updated)
    }

    pub fn delete_task(&mut self, id: i64) -> Option<Task> {
        let removed = self.store.delete(id)?;
        self.notifications.push(Notification::destructive(
            TITLE_DELETED,
            format!("\"{}\" has been removed from your tasks.", removed.title),
        ));
        Some(removed)
    }

    /// Flip one step's completion flag (the step checklist in the task view).
    pub fn toggle_step(&mut self, task_id: i64, step_id: u32) -> Result<Task, StoreError> {
        let mut task = self
            .store
            .find(task_id)
            .cloned()
            .ok_or(StoreError::NotFound(task_id))?;
        if let Some(step) = task.steps.iter_mut().find(|s| s.id == step_id) {
            step.completed = !step.completed;
        }
        self.update_task(task)
    }

    fn describe(&self, verb: &str, task: &Task) -> String {
        format!(
            "{verb}: {}\nDue Date: {}\nPriority: {}\nStatus: {}",
            task.title,
            datetime::format_date(task.due_date, &self.time_zone),
            task.priority,
            task.status
        )
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
