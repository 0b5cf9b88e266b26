//! idscrape main entry point
//!
//! This is the command-line interface for the idscrape templated scraper.

use anyhow::Context;
use clap::Parser;
use idscrape::config::{load_config_with_hash, validate, Config};
use idscrape::output::HeaderRow;
use idscrape::pipeline::run_scrape;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// idscrape: scrape a range of ids into a CSV file
///
/// Substitutes every id in [from, to) into the URL template, fetches the
/// page, extracts the name, address, phone and email fields with CSS
/// selectors, and writes one CSV row per successful page.
#[derive(Parser, Debug)]
#[command(name = "idscrape")]
#[command(version)]
#[command(about = "Bounded-concurrency templated scraper", long_about = None)]
struct Cli {
    /// Optional TOML configuration file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// The URL to scrape, containing "%d" where the id should be substituted
    #[arg(long, value_name = "TEMPLATE")]
    url: Option<String>,

    /// The first id to scrape (inclusive)
    #[arg(long, allow_negative_numbers = true)]
    from: Option<i64>,

    /// The last id to scrape (exclusive)
    #[arg(long, allow_negative_numbers = true)]
    to: Option<i64>,

    /// How many scrapers to run in parallel
    #[arg(long)]
    concurrency: Option<usize>,

    /// File to export the CSV results to
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// CSS selector for the name element
    #[arg(long, visible_alias = "nameQuery", value_name = "SELECTOR")]
    name_query: Option<String>,

    /// CSS selector for the address element
    #[arg(long, visible_alias = "addressQuery", value_name = "SELECTOR")]
    address_query: Option<String>,

    /// CSS selector for the phone element
    #[arg(long, visible_alias = "phoneQuery", value_name = "SELECTOR")]
    phone_query: Option<String>,

    /// CSS selector for the email element
    #[arg(long, visible_alias = "emailQuery", value_name = "SELECTOR")]
    email_query: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the configuration and show what would be scraped
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line values on top of `config`
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.scrape.url_template = url.clone();
        }
        if let Some(from) = self.from {
            config.scrape.from = from;
        }
        if let Some(to) = self.to {
            config.scrape.to = to;
        }
        if let Some(concurrency) = self.concurrency {
            config.scrape.concurrency = concurrency;
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }

        let fields = &mut config.fields;
        for (query, field) in [
            (&self.name_query, &mut fields.name),
            (&self.address_query, &mut fields.address),
            (&self.phone_query, &mut fields.phone),
            (&self.email_query, &mut fields.email),
        ] {
            if let Some(selector) = query {
                field.selector = selector.clone();
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let summary = run_scrape(&config)
        .await
        .with_context(|| format!("could not dump CSV to {}", config.output.path))?;
    summary.log();

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so they never mix with piped output.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("idscrape=info,warn"),
            1 => EnvFilter::new("idscrape=debug,info"),
            2 => EnvFilter::new("idscrape=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be scraped
fn handle_dry_run(config: &Config) {
    println!("=== idscrape Dry Run ===\n");

    println!("Scrape:");
    println!("  URL template: {}", config.scrape.url_template);
    println!(
        "  Ids: [{}, {}) -> {} tasks",
        config.scrape.from,
        config.scrape.to,
        config.scrape.task_count()
    );
    println!("  Concurrency: {}", config.scrape.concurrency);

    println!("\nFields:");
    for field in config.fields.ordered() {
        println!("  - {}: {}", field.column, field.selector);
    }

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);

    println!("\nOutput:");
    println!("  Path: {}", config.output.path);
    println!(
        "  Header: {}",
        HeaderRow::new(config.fields.columns()).columns().join(",")
    );

    println!("\n✓ Configuration is valid");
}
