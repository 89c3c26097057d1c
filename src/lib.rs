pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod web;

pub use error::{GatewayError, Result};
pub use logging::{init_logging, LoggingConfig};
