//! Keyword fallback for labelling a plain-text model reply

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{conversation::ConversationContext, task::Task};

/// Kind of command a user input resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    CreateTask,
    ModifyTask,
    DeleteTask,
    Query,
}

impl CommandAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandAction::CreateTask => "create_task",
            CommandAction::ModifyTask => "modify_task",
            CommandAction::DeleteTask => "delete_task",
            CommandAction::Query => "query",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "create_task" => Some(CommandAction::CreateTask),
            "modify_task" => Some(CommandAction::ModifyTask),
            "delete_task" => Some(CommandAction::DeleteTask),
            "query" => Some(CommandAction::Query),
            _ => None,
        }
    }
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label a reply that carried no function call.
///
/// Only used to annotate the conversation context; the model's own
/// function-calling decision always takes precedence.
pub fn determine_action(
    reply: &str,
    tasks: &[Task],
    context: &ConversationContext,
) -> CommandAction {
    let reply = reply.to_lowercase();

    if reply.contains("create") || reply.contains("add new task") {
        CommandAction::CreateTask
    } else if reply.contains("delete") || reply.contains("remove") {
        CommandAction::DeleteTask
    } else if reply.contains("modify")
        || reply.contains("update")
        || reply.contains("change")
        || context.last_mentioned_task.is_some()
        || tasks
            .iter()
            .any(|task| reply.contains(&task.title.to_lowercase()))
    {
        CommandAction::ModifyTask
    } else {
        CommandAction::Query
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;

    fn context() -> ConversationContext {
        ConversationContext::for_time_zone("UTC")
    }

    #[test]
    fn keywords_pick_the_action() {
        let cases = [
            ("I will create that for you", CommandAction::CreateTask),
            ("Shall I ADD NEW TASK?", CommandAction::CreateTask),
            ("I can remove it", CommandAction::DeleteTask),
            ("Let me update the time", CommandAction::ModifyTask),
            ("It is sunny today", CommandAction::Query),
        ];
        for (reply, expected) in cases {
            assert_eq!(determine_action(reply, &[], &context()), expected, "{reply}");
        }
    }

    #[test]
    fn create_wins_over_delete() {
        assert_eq!(
            determine_action("create or delete?", &[], &context()),
            CommandAction::CreateTask
        );
    }

    #[test]
    fn pending_mention_implies_modify() {
        let mut context = context();
        context.last_mentioned_task = Some("Gym".to_string());
        assert_eq!(
            determine_action("Sounds good", &[], &context),
            CommandAction::ModifyTask
        );
    }

    #[test]
    fn mentioning_an_existing_title_implies_modify() {
        let tasks = vec![Task::new(1, "Dentist", Timestamp::UNIX_EPOCH)];
        assert_eq!(
            determine_action("Your dentist visit is at 9", &tasks, &context()),
            CommandAction::ModifyTask
        );
    }
}
