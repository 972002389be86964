#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storecheck::{Config, Scenario, Step, Store, StorecheckError, WebDriverSession};

// Exit codes
const EXIT_SUCCESS: i32 = 0;

#[derive(Parser)]
#[command(name = "storecheck")]
#[command(about = "Acceptance checks for e-commerce search pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a config.properties file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Browser to drive (chrome or firefox)
    #[arg(short, long, global = true)]
    browser: Option<String>,

    /// Run the browser without a window
    #[arg(long, global = true)]
    headless: bool,

    /// Wait budget in seconds
    #[arg(short, long, global = true)]
    timeout: Option<u64>,

    /// Log engine decisions at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Expectation {
    /// Products are listed
    Results,
    /// The store reports no results
    Empty,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a store and check the results page
    Search {
        /// Store to search (amazon, magalu)
        store: String,

        /// Search term
        term: String,

        /// Expected outcome
        #[arg(short, long, value_enum, default_value = "results")]
        expect: Expectation,
    },

    /// Open the deals page of a store and check it lists deals
    Deals {
        /// Store to open (amazon, magalu)
        store: String,
    },

    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing to stderr (so JSON output to stdout remains clean)
    let default_filter = if cli.verbose {
        "storecheck=debug"
    } else {
        "storecheck=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    match run(cli).await {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            let storecheck_err: StorecheckError = err.into();

            // JSON error on stdout for programmatic consumption
            let error_json = json!({
                "error": true,
                "message": storecheck_err.to_string(),
                "exit_code": storecheck_err.exit_code()
            });
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );

            eprintln!("Error: {}", storecheck_err);
            std::process::exit(storecheck_err.exit_code());
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())
        .map_err(|e| StorecheckError::Config(format!("{:#}", e)))?;

    if let Some(browser) = &cli.browser {
        config.browser = browser
            .parse()
            .map_err(|e| StorecheckError::Config(format!("{:#}", e)))?;
    }
    if cli.headless {
        config.headless = true;
    }
    if let Some(secs) = cli.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

fn search_scenario(store: Store, term: &str, expect: Expectation) -> Scenario {
    let tag = format!("@{}", store.key());
    match expect {
        Expectation::Results => Scenario::new(
            format!("Search for '{}' on {} lists products", term, store),
            vec![
                Step::OpenStore(store),
                Step::Search(term.to_string()),
                Step::ExpectReadinessConfirmed,
                Step::ExpectResults,
                Step::ExpectFirstResultContains(term.to_string()),
            ],
        )
        .with_tags(&[tag.as_str(), "@search"]),
        Expectation::Empty => Scenario::new(
            format!("Search for '{}' on {} finds nothing", term, store),
            vec![
                Step::OpenStore(store),
                Step::Search(term.to_string()),
                Step::ExpectReadinessConfirmed,
                Step::ExpectNoResults(store.catalog().results.empty_message_text.to_string()),
            ],
        )
        .with_tags(&[tag.as_str(), "@search", "@empty"]),
    }
}

fn deals_scenario(store: Store) -> Scenario {
    let tag = format!("@{}", store.key());
    Scenario::new(
        format!("Open the deals page on {}", store),
        vec![
            Step::OpenStore(store),
            Step::ClickOption("Ofertas do Dia".to_string()),
            Step::ExpectPage("Ofertas do Dia".to_string()),
            Step::ExpectDealsListed,
        ],
    )
    .with_tags(&[tag.as_str(), "@deals"])
}

async fn run_scenario(scenario: Scenario, config: &Config) -> Result<()> {
    let (report, failure) = scenario
        .run(config, |config| async move {
            WebDriverSession::connect(&config).await
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    match failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Search {
            store,
            term,
            expect,
        } => {
            let store: Store = store.parse()?;
            run_scenario(search_scenario(store, &term, expect), &config).await?
        }

        Commands::Deals { store } => {
            let store: Store = store.parse()?;
            run_scenario(deals_scenario(store), &config).await?
        }

        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
