//! AI command service: one request in, one normalized response out
//!
//! [`TaskAssistant`] holds no per-session state. The task list and the
//! conversation context travel with every request and the updated context is
//! handed back in the response, so concurrent requests never interfere.

use std::sync::Arc;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    brain::{ChatConfig, ChatRequest, LLMProviderTrait, ProviderError},
    classifier::CommandAction,
    conversation::ConversationContext,
    datetime::{self, DateTimeError},
    extractor::{self, ExtractError},
    prompt::{self, PromptInput},
    reconciler::{self, ReconcileError, ReconcileInput, Reconciled},
    task::Task,
    tools,
};

pub use crate::reconciler::{AiInterpretation, DeletedTask};

const FALLBACK_TIME_ZONE: &str = "UTC";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AiCommandRequest {
    pub input: String,
    #[serde(default)]
    pub task_list: Vec<Task>,
    #[serde(default)]
    #[ts(optional)]
    pub context: Option<ConversationContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub user_role: Option<String>,
    #[serde(default)]
    pub user_time_zone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AiCommandData {
    pub action: CommandAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub task: Option<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub deleted_task: Option<DeletedTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub ai_interpretation: Option<AiInterpretation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub response: Option<String>,
    /// Context to send with the next command
    pub context: ConversationContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AiCommandResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub data: Option<AiCommandData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
}

impl AiCommandResponse {
    pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error,
        }
    }
}

impl From<Reconciled> for AiCommandResponse {
    fn from(result: Reconciled) -> Self {
        Self {
            success: true,
            message: result.message,
            data: Some(AiCommandData {
                action: result.action,
                task: result.task,
                deleted_task: result.deleted_task,
                ai_interpretation: result.interpretation,
                response: result.response,
                context: result.context,
            }),
            error: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("Invalid input provided")]
    InvalidInput,

    #[error(transparent)]
    DateTime(#[from] DateTimeError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Task not found")]
    TaskNotFound(i64),

    #[error("Invalid task list: {0}")]
    InvalidTaskList(String),

    #[error("OpenAI API error: {0}")]
    Provider(#[from] ProviderError),
}

impl From<ReconcileError> for AssistantError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::TaskNotFound(id) => AssistantError::TaskNotFound(id),
            ReconcileError::DateTime(e) => AssistantError::DateTime(e),
            err @ ReconcileError::IdsExhausted(_) => {
                AssistantError::InvalidTaskList(err.to_string())
            }
        }
    }
}

impl AssistantError {
    /// HTTP status the failure maps to
    pub fn status(&self) -> u16 {
        match self {
            AssistantError::InvalidInput
            | AssistantError::DateTime(_)
            | AssistantError::Extract(_)
            | AssistantError::InvalidTaskList(_) => 400,
            AssistantError::TaskNotFound(_) => 404,
            AssistantError::Provider(e) => e
                .status()
                .filter(|status| (400..600).contains(status))
                .unwrap_or(500),
        }
    }

    /// Secondary `error` text of the failure body
    pub fn detail(&self) -> Option<String> {
        match self {
            AssistantError::InvalidInput => None,
            AssistantError::TaskNotFound(_) => {
                Some("The task to modify does not exist".to_string())
            }
            AssistantError::Extract(ExtractError::UnknownTool(_)) => {
                Some("Unexpected function call".to_string())
            }
            other => Some(other.to_string()),
        }
    }

    pub fn to_response(&self) -> AiCommandResponse {
        AiCommandResponse::failure(self.to_string(), self.detail())
    }
}

/// Interprets free-form commands against a caller-supplied task list
pub struct TaskAssistant<P: ?Sized = dyn LLMProviderTrait> {
    provider: Arc<P>,
    chat: ChatConfig,
}

impl<P: ?Sized> Clone for TaskAssistant<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            chat: self.chat.clone(),
        }
    }
}

impl<P: LLMProviderTrait + ?Sized> TaskAssistant<P> {
    pub fn new(provider: Arc<P>, chat: ChatConfig) -> Self {
        Self { provider, chat }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn handle(
        &self,
        request: AiCommandRequest,
    ) -> Result<AiCommandResponse, AssistantError> {
        let input = request.input.trim();
        if input.is_empty() {
            return Err(AssistantError::InvalidInput);
        }

        let zone_name = effective_zone(&request);
        let tz = datetime::resolve_time_zone(&zone_name)?;
        let context = request.context.clone().map_or_else(
            || ConversationContext::for_time_zone(zone_name.clone()),
            |mut context| {
                if context.user_time_zone.trim().is_empty() {
                    context.user_time_zone = zone_name.clone();
                }
                context
            },
        );

        tracing::info!(
            tasks = request.task_list.len(),
            zone = %zone_name,
            last_action = ?context.last_action,
            "interpreting command"
        );
        tracing::debug!(input, "command input");

        let system_prompt = prompt::build_system_prompt(&PromptInput {
            tasks: &request.task_list,
            time_zone: &tz,
            time_zone_name: &zone_name,
            user_role: request.user_role.as_deref(),
            now: Timestamp::now(),
        });
        let chat_request = ChatRequest {
            messages: prompt::build_messages(system_prompt, &context, input),
            tools: Some(tools::task_tools()),
            config: self.chat.clone(),
        };

        let reply = self.provider.chat(chat_request).await.map_err(|e| {
            tracing::error!(provider = self.provider.name(), "model call failed: {e}");
            AssistantError::Provider(e)
        })?;

        let reconcile_input = ReconcileInput {
            tasks: &request.task_list,
            time_zone: &tz,
            input,
            context: &context,
        };

        let reconciled = match reply.tool_calls().and_then(extractor::first_operation) {
            Some(operation) => reconciler::reconcile(operation?, reconcile_input)?,
            None => reconciler::infer_from_text(reply.text(), reconcile_input),
        };

        tracing::info!(action = %reconciled.action, message = %reconciled.message, "command resolved");
        Ok(reconciled.into())
    }
}

/// Request zone, then the context's zone, then UTC.
fn effective_zone(request: &AiCommandRequest) -> String {
    let from_context = request
        .context
        .as_ref()
        .map(|c| c.user_time_zone.trim())
        .filter(|zone| !zone.is_empty());

    Some(request.user_time_zone.trim())
        .filter(|zone| !zone.is_empty())
        .or(from_context)
        .unwrap_or(FALLBACK_TIME_ZONE)
        .to_string()
}
