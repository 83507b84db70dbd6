use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use ratecache::core::ConversionItem;
use ratecache::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn parse_currency(s: &str) -> Result<String, String> {
    let code = s.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(format!("'{s}' is not a three letter currency code"))
    }
}

fn parse_item(s: &str) -> Result<ConversionItem, String> {
    let (amount, currency) = s
        .split_once(':')
        .ok_or_else(|| format!("'{s}' should look like AMOUNT:CURRENCY, e.g. 12.5:EUR"))?;
    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|e| format!("Invalid amount in '{s}': {e}"))?;
    Ok(ConversionItem::new(amount, &parse_currency(currency)?))
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show the exchange rate between two currencies
    Rate {
        #[arg(value_parser = parse_currency)]
        from: String,
        #[arg(value_parser = parse_currency)]
        to: String,
        /// Historical date (YYYY-MM-DD) instead of the latest rate
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Convert an amount into another currency
    Convert {
        amount: f64,
        #[arg(value_parser = parse_currency)]
        from: String,
        /// Target currency, defaults to the configured currency
        #[arg(short, long, value_parser = parse_currency)]
        to: Option<String>,
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Locale used to format the result, e.g. de-DE
        #[arg(short, long)]
        locale: Option<String>,
    },
    /// Convert several AMOUNT:CURRENCY items into one currency
    ConvertMany {
        #[arg(required = true, value_parser = parse_item)]
        items: Vec<ConversionItem>,
        #[arg(short, long, value_parser = parse_currency)]
        to: Option<String>,
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(short, long)]
        locale: Option<String>,
    },
    /// Warm the cache with latest rates into a base currency
    Preload {
        #[arg(required = true, value_parser = parse_currency)]
        currencies: Vec<String>,
        #[arg(short, long, value_parser = parse_currency)]
        base: Option<String>,
    },
    /// Remove every cached exchange rate
    ClearCache,
}

impl From<Commands> for ratecache::AppCommand {
    fn from(cmd: Commands) -> ratecache::AppCommand {
        match cmd {
            Commands::Rate { from, to, date } => ratecache::AppCommand::Rate { from, to, date },
            Commands::Convert {
                amount,
                from,
                to,
                date,
                locale,
            } => ratecache::AppCommand::Convert {
                amount,
                from,
                to,
                date,
                locale,
            },
            Commands::ConvertMany {
                items,
                to,
                date,
                locale,
            } => ratecache::AppCommand::ConvertMany {
                items,
                to,
                date,
                locale,
            },
            Commands::Preload { currencies, base } => {
                ratecache::AppCommand::Preload { currencies, base }
            }
            Commands::ClearCache => ratecache::AppCommand::ClearCache,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => ratecache::cli::setup::setup_at_path(path),
            None => ratecache::cli::setup::setup(),
        },
        Some(cmd) => ratecache::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
