//! Prompt construction and chat sessions

pub mod prompt;
pub mod session;

pub use prompt::PromptBuilder;
pub use session::{
    ConversationSession, Reply, ReplyKind, SessionId, SessionRegistry, SessionSettings,
};
