use anyhow::Result;
use console::style;

use crate::config::Config;

/// Handle config get command
pub async fn handle_config_get(key: String) -> Result<()> {
    let config = Config::load()?;

    if let Some(value) = config.get(&key) {
        println!("{value}");
        Ok(())
    } else {
        anyhow::bail!("Config key '{key}' not found");
    }
}

pub async fn handle_config_set(key: String, value: String) -> Result<()> {
    let mut config = Config::load()?;

    config.set(&key, value)?;
    config.save()?;

    println!(
        "{} Config '{}' set",
        style("✓").green(),
        style(&key).cyan()
    );
    println!(
        "  Saved to: {}",
        style(Config::get_config_path()?.display()).dim()
    );

    Ok(())
}

pub async fn handle_config_unset(key: String) -> Result<()> {
    let mut config = Config::load()?;

    config.unset(&key)?;
    config.save()?;

    println!(
        "{} Config '{}' removed",
        style("✓").green(),
        style(&key).cyan()
    );

    Ok(())
}

pub async fn handle_config_list() -> Result<()> {
    let config = Config::load()?;
    let items = config.list();

    if items.is_empty() {
        println!("{}", style("No configuration set.").dim());
        println!();
        println!("Set the OpenAI key with:");
        println!(
            "  {}",
            style("alchat config set openai-api-key sk-...").cyan()
        );
    } else {
        println!("{}", style("Configuration:").bold());
        println!();
        for (key, value) in items {
            println!("  {} = {}", style(key).cyan(), style(value).dim());
        }
        println!();
        println!(
            "  Config file: {}",
            style(Config::get_config_path()?.display()).dim()
        );
    }

    Ok(())
}

pub async fn handle_config_path() -> Result<()> {
    println!("{}", Config::get_config_path()?.display());
    Ok(())
}
