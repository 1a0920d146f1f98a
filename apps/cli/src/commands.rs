//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use portfolio_core::{HarvestConfig, HarvestResult, ProgressReporter, run_harvest};
use portfolio_shared::{AppConfig, Portfolio, init_config, load_config, load_config_from};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Portfolio harvester: EQT portfolio companies, enriched.
#[derive(Parser)]
#[command(
    name = "portfolio",
    version,
    about = "Harvest the EQT portfolio and enrich it with reference organizations and funding rounds.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.portfolio-harvester/harvester.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Portfolio listing selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum PortfolioArg {
    Current,
    Divested,
}

impl From<PortfolioArg> for Portfolio {
    fn from(arg: PortfolioArg) -> Self {
        match arg {
            PortfolioArg::Current => Portfolio::Current,
            PortfolioArg::Divested => Portfolio::Divested,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Harvest the portfolio and write an enriched result file.
    Harvest {
        /// Portfolio to harvest (repeatable). Defaults to current and divested.
        #[arg(long = "portfolio", value_enum)]
        portfolios: Vec<PortfolioArg>,

        /// Do not load or attach funding rounds.
        #[arg(long)]
        skip_funding_rounds: bool,

        /// Read the rendered HTML pages instead of the page-data JSON.
        #[arg(long)]
        use_html_scraper: bool,

        /// Fetch company details one at a time.
        #[arg(long, conflicts_with = "concurrency")]
        synchronous: bool,

        /// Maximum concurrent detail requests (defaults to available parallelism).
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        concurrency: Option<u16>,

        /// Output directory for the result file.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "portfolio=info",
        1 => "portfolio=debug",
        _ => "portfolio=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Harvest {
            portfolios,
            skip_funding_rounds,
            use_html_scraper,
            synchronous,
            concurrency,
            out,
        } => {
            let app = resolve_config(cli.config.as_deref())?;
            let mut config = HarvestConfig::from(&app);

            if !portfolios.is_empty() {
                config.portfolios = dedup_portfolios(&portfolios);
            }
            if synchronous {
                config.concurrency = 1;
            } else if let Some(n) = concurrency {
                config.concurrency = usize::from(n);
            }
            if let Some(dir) = out {
                config.output_dir = dir;
            }
            config.skip_funding_rounds = skip_funding_rounds;
            config.use_html = use_html_scraper;

            cmd_harvest(&config).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()),
        },
    }
}

/// Load `--config` if given, else the user config (or defaults).
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

/// Selected portfolios in first-mention order, each once.
fn dedup_portfolios(args: &[PortfolioArg]) -> Vec<Portfolio> {
    let mut selected: Vec<Portfolio> = Vec::new();
    for portfolio in args.iter().copied().map(Portfolio::from) {
        if !selected.contains(&portfolio) {
            selected.push(portfolio);
        }
    }
    selected
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_harvest(config: &HarvestConfig) -> Result<()> {
    info!(
        portfolios = ?config.portfolios,
        concurrency = config.concurrency,
        html = config.use_html,
        skip_funding_rounds = config.skip_funding_rounds,
        "harvesting portfolio"
    );

    let reporter = CliProgress::new();
    let result = run_harvest(config, &reporter).await;
    if result.is_err() {
        reporter.spinner.finish_and_clear();
    }
    let result = result?;

    println!();
    println!("  Harvest complete!");
    println!("  Companies:      {}", result.company_count);
    println!("  Matched orgs:   {}", result.matched_count);
    if !config.skip_funding_rounds {
        println!("  Funding rounds: {}", result.funding_round_count);
    }
    println!("  Path:           {}", result.output_path.display());
    println!(
        "  Time:           {:.1}s",
        result.elapsed.as_secs_f64()
    );
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn detail_resolved(&self, title: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetching details [{current}/{total}] {title}"));
    }

    fn done(&self, _result: &HarvestResult) {
        self.spinner.finish_and_clear();
    }
}
