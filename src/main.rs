mod cli;
mod core;

use clap::{Parser, Subcommand};

use crate::core::config::{AppConfig, BillingConfig};

#[derive(Parser)]
#[command(name = "qv", about = "Quota, pricing and top-up calculator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a quota value as currency (or abbreviated units)
    Quota {
        #[arg(allow_negative_numbers = true)]
        quota: i64,

        /// Decimal places for the currency amount
        #[arg(short, long, default_value_t = 2)]
        digits: u32,

        /// Show abbreviated quota units even when currency display is on
        #[arg(long)]
        raw: bool,
    },
    /// Convert a currency amount to quota
    Amount {
        #[arg(allow_negative_numbers = true)]
        amount: String,
    },
    /// Show the list price for a model ratio
    Price {
        ratio: String,

        /// Only print the USD price
        #[arg(long)]
        usd_only: bool,

        /// Ratio is quoted per million tokens
        #[arg(long)]
        per_million: bool,
    },
    /// Explain token usage and cost of log entries (JSON file, or - for stdin)
    Log {
        #[arg(default_value = "-")]
        file: String,
    },
    /// Quote the fee and payable total for a top-up
    Topup {
        amount: String,

        /// Payment channel uuid or name (default: first by sort order)
        #[arg(short, long)]
        channel: Option<String>,

        /// Choose the payment channel interactively
        #[arg(long)]
        pick: bool,

        /// Discount table as backend JSON, e.g. '{"50": 0.9}' (overrides config)
        #[arg(long)]
        discounts: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Generate default config file
    Init,
    /// Validate config file
    Check,
    /// Print the effective configuration
    Show,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "qv=debug" } else { "qv=warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("{}; using defaults", e);
        AppConfig::default()
    });

    let output_opts = cli::output::OutputOptions::resolve(
        &config.settings,
        cli.format.as_deref(),
        cli.json,
        cli.pretty,
        cli.no_color,
        cli.verbose,
    );

    match cli.command {
        Commands::Quota { quota, digits, raw } => {
            let billing = if raw {
                BillingConfig::new(config.billing.quota_per_unit, false)
            } else {
                config.billing
            };
            cli::quota_cmd::quota(quota, digits, &billing, &output_opts)?
        }
        Commands::Amount { amount } => {
            cli::quota_cmd::amount(&amount, &config.billing, &output_opts)?
        }
        Commands::Price {
            ratio,
            usd_only,
            per_million,
        } => cli::quota_cmd::price(&ratio, usd_only, per_million, &output_opts)?,
        Commands::Log { file } => cli::log_cmd::run(&file, &config.billing, &output_opts)?,
        Commands::Topup {
            amount,
            channel,
            pick,
            discounts,
        } => cli::topup_cmd::run(
            &amount,
            channel.as_deref(),
            pick,
            discounts.as_deref(),
            &config,
            &output_opts,
        )?,
        Commands::Config { action } => match action {
            ConfigAction::Init => cli::config_cmd::init(&output_opts)?,
            ConfigAction::Check => cli::config_cmd::check(&output_opts)?,
            ConfigAction::Show => cli::config_cmd::show(&config, &output_opts)?,
        },
    }

    Ok(())
}
