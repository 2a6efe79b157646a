// src/main.rs

use addon_index::{generate_index, IndexGenConfig, StatsClient, SystemClock, DEFAULT_STATS_URL};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "addon-index")]
#[command(
    author,
    version,
    about = "Build the addons.xml index of an add-on repository",
    long_about = None
)]
struct Cli {
    /// Path to the generated repository (one directory per add-on)
    #[arg(short, long)]
    input: PathBuf,

    /// Index file to write; a gzip copy is written next to it with .gz appended
    #[arg(short, long)]
    output: PathBuf,

    /// Indent the XML for human readers
    #[arg(short, long)]
    prettify: bool,

    /// Base URL of the download statistics endpoint
    #[arg(long, default_value = DEFAULT_STATS_URL)]
    stats_url: String,

    /// HTTP timeout for the statistics request, in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if !cli.input.is_dir() {
        anyhow::bail!("Repository directory not found: {}", cli.input.display());
    }

    let client = StatsClient::with_timeout(&cli.stats_url, Duration::from_secs(cli.timeout))
        .context("Failed to set up statistics client")?;

    let config = IndexGenConfig {
        repo_dir: cli.input,
        output: cli.output,
        prettify: cli.prettify,
    };

    let result = generate_index(&config, &client, &SystemClock).with_context(|| {
        format!("Failed to build index of {}", config.repo_dir.display())
    })?;

    info!(
        "Indexed {} add-ons into {} and {}",
        result.package_count,
        result.index_path.display(),
        result.gzip_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_short_flags() {
        let cli =
            Cli::try_parse_from(["addon-index", "-i", "repo", "-o", "addons.xml", "-p"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("repo"));
        assert_eq!(cli.output, PathBuf::from("addons.xml"));
        assert!(cli.prettify);
        assert!(!cli.verbose);
        assert_eq!(cli.stats_url, DEFAULT_STATS_URL);
        assert_eq!(cli.timeout, 30);
    }

    #[test]
    fn test_cli_long_flags() {
        let cli = Cli::try_parse_from([
            "addon-index",
            "--input",
            "/srv/repo",
            "--output",
            "/srv/addons.xml",
            "--stats-url",
            "http://localhost:8080/stats",
            "--timeout",
            "5",
        ])
        .unwrap();
        assert!(!cli.prettify);
        assert_eq!(cli.stats_url, "http://localhost:8080/stats");
        assert_eq!(cli.timeout, 5);
    }

    #[test]
    fn test_cli_requires_input_and_output() {
        assert!(Cli::try_parse_from(["addon-index", "-o", "addons.xml"]).is_err());
        assert!(Cli::try_parse_from(["addon-index", "-i", "repo"]).is_err());
    }
}
