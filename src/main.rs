use alchat::cli::Cli;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (ignore errors if missing)
    dotenvy::dotenv().ok();

    let _log_guard = alchat::logging::init_from_env()?;

    let cli = Cli::parse();
    cli.run()
}
