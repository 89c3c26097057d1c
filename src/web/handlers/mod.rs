pub mod chat;
pub mod error;
pub mod health;
pub mod openai;
pub mod session;

pub use chat::{chat, SESSION_ID_HEADER};
pub use error::AppError;
pub use health::health_check;
pub use openai::{service_info, test_connection, usage_stats};
pub use session::{start_session, stop_session};
