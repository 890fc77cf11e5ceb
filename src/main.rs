//! Split Ledger CLI
//!
//! Prints net balances, settle-up plans, and cent-exact splits for a group.
//!
//! # Usage
//!
//! ```bash
//! split-ledger balances trip.json
//! split-ledger settle trip.json --format json
//! split-ledger allocate --total 10 --member a --member b --member c
//! split-ledger settle --group trip --record   # uses store_path from settings
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `SPLIT_LEDGER_CONFIG`: Path to a JSON settings file

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use split_ledger::report::{write_allocation, write_balances, write_transfers};
use split_ledger::{
    allocate_equal, allocate_percent, allocate_proportional, compute_net_by_user,
    suggest_settlements, Group, GroupData, GroupId, GroupLedger, GroupStore, JsonFileStore,
    LedgerError, LogNotifier, MemberId, Money, OutputFormat, Result, Settings, Transfer,
};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "split-ledger", version, about = "Shared expense balances and settle-up plans")]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true, env = "SPLIT_LEDGER_CONFIG")]
    config: Option<PathBuf>,

    /// Output format, overriding the configured one
    #[arg(long, global = true, value_enum)]
    format: Option<FormatArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every member's net balance
    Balances(Source),

    /// Print the transfers that would settle the group
    Settle {
        #[command(flatten)]
        source: Source,

        /// Record the plan as settlements in the configured store
        #[arg(long, requires = "group")]
        record: bool,
    },

    /// Split an amount among members
    Allocate {
        /// Amount to split, e.g. 10.00
        #[arg(long, value_parser = parse_money, allow_hyphen_values = true)]
        total: Money,

        /// Member id; repeat in split order
        #[arg(long = "member", required = true)]
        members: Vec<String>,

        /// Weight per member, in member order
        #[arg(long = "weight", value_parser = parse_decimal, conflicts_with = "percents")]
        weights: Vec<Decimal>,

        /// Percentage per member, in member order
        #[arg(long = "percent", value_parser = parse_decimal)]
        percents: Vec<Decimal>,
    },
}

/// Where group data comes from: a snapshot file or the configured store.
#[derive(Args)]
struct Source {
    /// Group snapshot JSON file
    snapshot: Option<PathBuf>,

    /// Group id to read from the configured store
    #[arg(long, conflicts_with = "snapshot")]
    group: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn parse_money(s: &str) -> std::result::Result<Money, String> {
    Money::from_str(s).map_err(|e| e.to_string())
}

fn parse_decimal(s: &str) -> std::result::Result<Decimal, String> {
    Decimal::from_str(s.trim()).map_err(|e| e.to_string())
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load_or_default(cli.config.as_deref())?;
    let format = cli.format.map(OutputFormat::from).unwrap_or(settings.output_format);

    let stdout = io::stdout();
    let handle = stdout.lock();

    match cli.command {
        Command::Balances(source) => {
            let data = load_source(&source, &settings)?;
            let net = compute_net_by_user(&data.group, &data.expenses, &data.settlements)?;
            let currency = currency_of(&data.group, &settings);
            write_balances(handle, &data.group, &net, currency, format)
        }
        Command::Settle { source, record } => {
            let transfers = if record {
                settle_in_store(&source, &settings)?
            } else {
                let data = load_source(&source, &settings)?;
                suggest_settlements(&data.group, &data.expenses, &data.settlements)?
            };
            write_transfers(handle, &transfers, format)
        }
        Command::Allocate {
            total,
            members,
            weights,
            percents,
        } => {
            let members: Vec<MemberId> = members.into_iter().map(MemberId::from).collect();
            let allocation = if !weights.is_empty() {
                allocate_proportional(&members, &weights, total)?
            } else if !percents.is_empty() {
                allocate_percent(&members, &percents, total)?
            } else {
                allocate_equal(&members, total)
            };
            write_allocation(handle, &allocation, format)
        }
    }
}

fn load_source(source: &Source, settings: &Settings) -> Result<GroupData> {
    match (&source.snapshot, &source.group) {
        (Some(path), _) => {
            let reader = BufReader::new(File::open(path)?);
            Ok(serde_json::from_reader(reader)?)
        }
        (None, Some(group)) => {
            open_store(settings)?.load_group_data(&GroupId::from(group.as_str()))
        }
        (None, None) => Err(LedgerError::Config(
            "either a snapshot file or --group is required".to_string(),
        )),
    }
}

fn settle_in_store(source: &Source, settings: &Settings) -> Result<Vec<Transfer>> {
    let group = source
        .group
        .as_deref()
        .ok_or_else(|| LedgerError::Config("--record needs --group".to_string()))?;

    let mut ledger = GroupLedger::new(open_store(settings)?, LogNotifier);
    let settlements = ledger.settle_up(&GroupId::from(group), Utc::now())?;

    Ok(settlements
        .into_iter()
        .map(|s| Transfer::new(s.from, s.to, s.amount))
        .collect())
}

fn open_store(settings: &Settings) -> Result<JsonFileStore> {
    let path = settings
        .store_path
        .as_ref()
        .ok_or_else(|| LedgerError::Config("no store_path configured".to_string()))?;
    JsonFileStore::open(path)
}

fn currency_of<'a>(group: &'a Group, settings: &'a Settings) -> &'a str {
    if group.currency.trim().is_empty() {
        &settings.default_currency
    } else {
        &group.currency
    }
}
