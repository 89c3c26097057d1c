pub mod chat;
pub mod credentials;
pub mod message;
pub mod session_log;
pub mod usage;

pub use chat::{AttachedFile, ChatRequest, ChatResponse, ChatResult};
pub use credentials::{CredentialSource, Credentials, CredentialsInfo, OPENAI_KEY_PREFIX};
pub use message::{ConversationMessage, MessageRole};
pub use session_log::{ActiveSession, SessionLogEntry};
pub use usage::{CostEstimate, TokenUsage, UsageStats};
