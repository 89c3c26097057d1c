pub mod config;
pub mod credentials;
pub mod serve;
pub mod session;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::env::server as env_server;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Parser)]
#[command(name = "alchat")]
#[command(about = "Chat gateway for the OpenAI API with usage accounting and session logs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Address to bind
        #[arg(long, env = env_server::HOST, default_value = DEFAULT_HOST)]
        host: String,
        /// Port to listen on
        #[arg(short, long, env = env_server::PORT, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Manage configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Show where the OpenAI key comes from and whether it is valid
    Credentials,
    /// Send a test prompt to OpenAI
    TestConnection,
    /// Write session log records
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key to get
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set
        value: String,
    },
    /// Remove a configuration value
    Unset {
        /// Configuration key to remove
        key: String,
    },
    /// List all configuration values
    List,
    /// Show the path to the config file
    Path,
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Append a session_stop record
    Save {
        /// JSON file holding the metrics object
        #[arg(short, long)]
        metrics_file: Option<PathBuf>,
        /// Session the record belongs to
        #[arg(short, long)]
        session_id: Option<String>,
    },
    /// Append a metric record
    Metric {
        /// Session the metric belongs to
        session_id: String,
        /// Metric name
        name: String,
        /// Metric value as JSON (bare words are stored as strings)
        value: String,
    },
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let rt = Runtime::new()?;

        rt.block_on(async {
            match self.command {
                Commands::Serve { host, port } => serve::handle_serve_command(host, port).await,
                Commands::Config { command } => match command {
                    ConfigCommands::Get { key } => config::handle_config_get(key).await,
                    ConfigCommands::Set { key, value } => {
                        config::handle_config_set(key, value).await
                    }
                    ConfigCommands::Unset { key } => config::handle_config_unset(key).await,
                    ConfigCommands::List => config::handle_config_list().await,
                    ConfigCommands::Path => config::handle_config_path().await,
                },
                Commands::Credentials => credentials::handle_credentials_command().await,
                Commands::TestConnection => credentials::handle_test_connection_command().await,
                Commands::Session { command } => match command {
                    SessionCommands::Save {
                        metrics_file,
                        session_id,
                    } => session::handle_save_command(metrics_file, session_id).await,
                    SessionCommands::Metric {
                        session_id,
                        name,
                        value,
                    } => session::handle_metric_command(session_id, name, value).await,
                },
            }
        })
    }
}
