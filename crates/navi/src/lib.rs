//! # Navi - task assistant core
//!
//! Task model and session store, the function-calling round-trip that turns
//! free-form commands into task operations, and the speech-to-text boundary.

pub mod assistant;
pub mod brain;
pub mod classifier;
pub mod conversation;
pub mod datetime;
pub mod extractor;
pub mod prompt;
pub mod reconciler;
pub mod session;
pub mod store;
pub mod task;
pub mod tools;
pub mod voice;

pub use assistant::{
    AiCommandData, AiCommandRequest, AiCommandResponse, AssistantError, TaskAssistant,
};
pub use brain::{LLMConfig, LLMProviderTrait, OpenAIProvider, ProviderError, ProviderType};
pub use classifier::CommandAction;
pub use conversation::{ConversationContext, ConversationEntry, ConversationLog};
pub use reconciler::{AiInterpretation, DeletedTask};
pub use session::{
    AssistantSession, CommandTicket, Notification, NotificationLevel, Outcome, TITLE_REPLY,
};
pub use store::{MAX_TASKS, StoreError, TaskStore};
pub use task::{Priority, Task, TaskStatus, TaskStep};
pub use voice::{SpeechToText, SttConfig, SttError, Transcription, WhisperSTT};
