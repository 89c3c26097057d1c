pub mod completion;
pub mod credentials;
pub mod gateway;
pub mod openai;
pub mod session_logger;
pub mod usage;

pub use completion::{
    AccountInfo, CompletionClient, CompletionRequest, ConnectionTest, CONNECTION_TEST_PROMPT,
};
pub use credentials::{extract_api_key, CredentialResolver};
pub use gateway::{merge_attachments, ChatGateway, ChatUser, ServiceInfo};
pub use openai::{OpenAiClient, OpenAiConfig, OpenAiError};
pub use session_logger::{SessionLogWriter, SessionRegistry};
pub use usage::{estimate_cost, pricing_for, UsageAccountant, UsageReport, UsageReporter};
