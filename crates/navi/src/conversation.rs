//! Conversation transcript and the small context carried between commands

use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::classifier::CommandAction;

/// One line of the transcript shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    pub id: i64,
    pub text: String,
    #[ts(type = "string")]
    pub timestamp: Timestamp,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
}

/// Append-only transcript; entries are never edited or reordered
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    entries: Vec<ConversationEntry>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> &ConversationEntry {
        self.push(text.into(), false)
    }

    pub fn push_ai(&mut self, text: impl Into<String>) -> &ConversationEntry {
        self.push(text.into(), true)
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, text: String, is_ai: bool) -> &ConversationEntry {
        let timestamp = Timestamp::now();
        let previous = self.entries.last().map(|e| e.id).unwrap_or(0);
        let id = timestamp.as_millisecond().max(previous + 1);
        self.entries.push(ConversationEntry {
            id,
            text,
            timestamp,
            is_ai,
        });
        &self.entries[self.entries.len() - 1]
    }
}

/// Rolling state used to resolve follow-ups such as "move it to 5pm".
///
/// The task references are lookup keys, not handles: the task may have been
/// edited or deleted since they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    #[serde(default, deserialize_with = "lenient_action")]
    pub last_action: Option<CommandAction>,
    #[serde(default)]
    pub last_task_id: Option<i64>,
    #[serde(default)]
    pub last_mentioned_task: Option<String>,
    #[serde(default)]
    pub user_time_zone: String,
}

impl ConversationContext {
    pub fn for_time_zone(user_time_zone: impl Into<String>) -> Self {
        Self {
            user_time_zone: user_time_zone.into(),
            ..Self::default()
        }
    }
}

fn lenient_action<'de, D>(deserializer: D) -> Result<Option<CommandAction>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(CommandAction::parse))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn log_appends_in_order_with_increasing_ids() {
        let mut log = ConversationLog::new();
        log.push_user("add gym tomorrow");
        log.push_ai("Task created: Gym");
        log.push_user("thanks");

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert!(!entries[0].is_ai);
        assert!(entries[1].is_ai);
        assert!(entries[0].id < entries[1].id && entries[1].id < entries[2].id);
    }

    #[test]
    fn entry_uses_browser_field_names() {
        let mut log = ConversationLog::new();
        let entry = log.push_ai("hello").clone();
        let value = serde_json::to_value(entry).unwrap();
        assert_eq!(value["isAI"], true);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn context_tolerates_blank_action() {
        let context: ConversationContext = serde_json::from_value(json!({
            "lastAction": "",
            "lastTaskId": null,
            "lastMentionedTask": null,
            "userTimeZone": "Europe/London"
        }))
        .unwrap();
        assert_eq!(context, ConversationContext::for_time_zone("Europe/London"));

        let context: ConversationContext =
            serde_json::from_value(json!({ "lastAction": "modify_task", "lastTaskId": 4 }))
                .unwrap();
        assert_eq!(context.last_action, Some(CommandAction::ModifyTask));
        assert_eq!(context.last_task_id, Some(4));
    }
}
