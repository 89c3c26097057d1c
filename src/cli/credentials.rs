use anyhow::Result;
use console::style;

use crate::config::Settings;
use crate::services::{CompletionClient, ConnectionTest, CredentialResolver, OpenAiClient};

pub async fn handle_credentials_command() -> Result<()> {
    let settings = Settings::load()?;
    let resolver = CredentialResolver::new(settings);
    let credentials = resolver.resolve().await;
    let info = resolver.credentials_info(&credentials);

    println!("{}", style("OpenAI credentials").bold());
    println!();
    println!("  {} {}", style("source:").dim(), style(info.credential_source).cyan());
    println!("  {} {}", style("model:").dim(), info.openai_model);
    println!(
        "  {} {}",
        style("key:").dim(),
        info.openai_api_key_prefix
            .as_deref()
            .unwrap_or(if info.openai_api_key_set { "(short)" } else { "(not set)" })
    );
    println!("  {} {}", style("key length:").dim(), info.openai_api_key_length);
    println!(
        "  {} {}",
        style("credential service:").dim(),
        info.credential_service_url
    );
    println!(
        "  {} {} ({})",
        style("config file:").dim(),
        info.config_file_path,
        if info.config_file_exists { "found" } else { "missing" }
    );
    println!();

    match credentials.validate() {
        Ok(()) => println!("{} Credentials look valid", style("✓").green()),
        Err(e) => println!("{} {}", style("✗").red(), style(e).yellow()),
    }

    Ok(())
}

pub async fn handle_test_connection_command() -> Result<()> {
    let settings = Settings::load()?;
    let resolver = CredentialResolver::new(settings.clone());
    let credentials = resolver.resolve().await;

    let client = OpenAiClient::from_credentials(&credentials, &settings)?;
    println!(
        "Testing OpenAI connection with model {}...",
        style(client.default_model()).cyan()
    );

    match client.test_connection().await {
        ConnectionTest::Success {
            message,
            test_response,
            usage,
            ..
        } => {
            println!("{} {}", style("✓").green(), message);
            println!("  {} {}", style("reply:").dim(), test_response);
            println!("  {} {}", style("tokens:").dim(), usage.total_tokens);
            Ok(())
        }
        ConnectionTest::Error { message, .. } => {
            anyhow::bail!(message)
        }
    }
}
