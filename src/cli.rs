use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::api::{self, DEFAULT_PORT};
use crate::core::{
    AccumulationRequest, DecumulationRequest, DrawdownMonth, decumulation_schedule,
};
use crate::currency::{self, Currency};
use crate::report;
use crate::store::{FileStore, History, Projection, SavedCalculation, default_data_file};

#[derive(Parser, Debug)]
#[command(
    name = "sipcalc",
    version,
    about = "SIP and SWP projections with a local history of saved calculations"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Print JSON instead of a text summary")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        env = "SIPCALC_DATA_FILE",
        help = "Where saved calculations and the currency preference live"
    )]
    pub data_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Project a monthly SIP, optionally with a lumpsum and an annual step-up.
    Sip(SipArgs),
    /// Project monthly withdrawals from a corpus.
    Swp(SwpArgs),
    /// Inspect or prune saved calculations.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Show the display currency, or set it when a code is given.
    Currency { code: Option<String> },
}

#[derive(clap::Args, Debug)]
pub struct SipArgs {
    #[arg(long, default_value_t = 5_000.0, help = "Monthly contribution")]
    pub monthly: f64,
    #[arg(long, default_value_t = 0.0, help = "One-time investment at the start")]
    pub lumpsum: f64,
    #[arg(
        long,
        default_value_t = 12.0,
        allow_negative_numbers = true,
        help = "Expected annual return in percent, e.g. 12"
    )]
    pub rate: f64,
    #[arg(long, default_value_t = 10)]
    pub years: u32,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Yearly increase of the monthly contribution in percent"
    )]
    pub step_up: f64,
    #[arg(long, help = "Keep the result in the saved history")]
    pub save: bool,
}

#[derive(clap::Args, Debug)]
pub struct SwpArgs {
    #[arg(long, default_value_t = 1_000_000.0, help = "Starting corpus")]
    pub initial: f64,
    #[arg(long, default_value_t = 10_000.0)]
    pub withdrawal: f64,
    #[arg(
        long,
        default_value_t = 8.0,
        allow_negative_numbers = true,
        help = "Expected annual return in percent, e.g. 8"
    )]
    pub rate: f64,
    #[arg(long, default_value_t = 15)]
    pub years: u32,
    #[arg(long, help = "Print the month-by-month drawdown")]
    pub schedule: bool,
    #[arg(long, help = "Keep the result in the saved history")]
    pub save: bool,
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List saved calculations, newest first.
    List {
        #[arg(long, help = "Match on SIP/SWP or a YYYY-MM-DD date")]
        query: Option<String>,
    },
    Show { id: String },
    Delete { id: String },
    /// Remove every saved calculation.
    Clear,
}

#[derive(Serialize)]
struct ProjectionOutput<'a> {
    currency: Currency,
    #[serde(flatten)]
    projection: &'a Projection,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<&'a [DrawdownMonth]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved: Option<&'a SavedCalculation>,
}

#[derive(Serialize)]
struct CurrencyOutput {
    code: Currency,
    symbol: &'static str,
    name: &'static str,
}

impl SipArgs {
    fn request(&self) -> AccumulationRequest {
        AccumulationRequest {
            monthly_amount: self.monthly,
            lumpsum_amount: self.lumpsum,
            annual_rate_percent: self.rate,
            years: self.years,
            step_up_percent: self.step_up,
        }
    }
}

impl SwpArgs {
    fn request(&self) -> DecumulationRequest {
        DecumulationRequest {
            initial_amount: self.initial,
            monthly_withdrawal: self.withdrawal,
            annual_rate_percent: self.rate,
            years: self.years,
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let data_file = match cli.data_file {
        Some(path) => path,
        None => default_data_file()
            .context("no data file: pass --data-file or set SIPCALC_DATA_FILE")?,
    };

    match cli.command {
        Command::Serve { port } => {
            api::run_http_server(port, data_file)
                .await
                .context("HTTP server stopped")?;
            Ok(())
        }
        Command::Sip(args) => run_sip(&mut open_history(data_file), &args, cli.json),
        Command::Swp(args) => run_swp(&mut open_history(data_file), &args, cli.json),
        Command::History { action } => {
            run_history(&mut open_history(data_file), action, cli.json)
        }
        Command::Currency { code } => {
            run_currency(&mut open_history(data_file), code.as_deref(), cli.json)
        }
    }
}

fn open_history(data_file: PathBuf) -> History<FileStore> {
    History::new(FileStore::new(data_file))
}

fn run_sip(history: &mut History<FileStore>, args: &SipArgs, json: bool) -> anyhow::Result<()> {
    let request = args.request();
    api::validate_accumulation(&request)?;
    let currency = history.currency();
    let projection = Projection::accumulation(request);
    let saved = save_if_requested(history, projection, currency, args.save)?;

    if json {
        return print_json(&ProjectionOutput {
            currency,
            projection: &projection,
            schedule: None,
            saved: saved.as_ref(),
        });
    }

    if let Projection::Sip { request, result } = &projection {
        println!("{}", report::accumulation_summary(request, result, currency));
        let words = currency.to_words(result.maturity_amount);
        if !words.is_empty() {
            println!("In words: {words}");
        }
    }
    print_saved_id(saved.as_ref());
    Ok(())
}

fn run_swp(history: &mut History<FileStore>, args: &SwpArgs, json: bool) -> anyhow::Result<()> {
    let request = args.request();
    api::validate_decumulation(&request)?;
    let currency = history.currency();
    let projection = Projection::decumulation(request);
    let schedule = args.schedule.then(|| decumulation_schedule(&request));
    let saved = save_if_requested(history, projection, currency, args.save)?;

    if json {
        return print_json(&ProjectionOutput {
            currency,
            projection: &projection,
            schedule: schedule.as_deref(),
            saved: saved.as_ref(),
        });
    }

    if let Projection::Swp { request, result } = &projection {
        println!("{}", report::decumulation_summary(request, result, currency));
    }
    if let Some(schedule) = &schedule {
        println!();
        print_schedule(schedule, currency);
    }
    print_saved_id(saved.as_ref());
    Ok(())
}

fn run_history(
    history: &mut History<FileStore>,
    action: HistoryAction,
    json: bool,
) -> anyhow::Result<()> {
    match action {
        HistoryAction::List { query } => {
            let saved = match query.as_deref() {
                Some(query) => history.search(query),
                None => history.list(),
            };
            if json {
                return print_json(&saved);
            }
            if saved.is_empty() {
                println!("No saved calculations");
            }
            for calculation in &saved {
                println!("{}", history_line(calculation));
            }
        }
        HistoryAction::Show { id } => {
            let calculation = history.get(&id)?;
            if json {
                return print_json(&calculation);
            }
            println!("{}", report::summary(&calculation));
        }
        HistoryAction::Delete { id } => {
            history.delete(&id)?;
            if json {
                return print_json(&serde_json::json!({ "deleted": id }));
            }
            println!("Deleted {id}");
        }
        HistoryAction::Clear => {
            history.clear()?;
            if json {
                return print_json(&serde_json::json!({ "cleared": true }));
            }
            println!(
                "Cleared saved calculations in {}",
                history.store().path().display()
            );
        }
    }
    Ok(())
}

fn run_currency(
    history: &mut History<FileStore>,
    code: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let currency = match code {
        Some(code) => {
            let currency: Currency = code.parse()?;
            history.set_currency(currency)?;
            currency
        }
        None => history.currency(),
    };

    if json {
        return print_json(&CurrencyOutput {
            code: currency,
            symbol: currency.symbol(),
            name: currency.name(),
        });
    }
    println!("{} ({}) {}", currency.code(), currency.symbol(), currency.name());
    Ok(())
}

fn save_if_requested(
    history: &mut History<FileStore>,
    projection: Projection,
    currency: Currency,
    save: bool,
) -> anyhow::Result<Option<SavedCalculation>> {
    if !save {
        return Ok(None);
    }
    let saved = history.save(SavedCalculation::new(projection, currency, Utc::now()))?;
    Ok(Some(saved))
}

fn print_saved_id(saved: Option<&SavedCalculation>) {
    if let Some(saved) = saved {
        println!("Saved as {}", saved.id);
    }
}

fn history_line(calculation: &SavedCalculation) -> String {
    let currency = calculation.currency.parse::<Currency>().unwrap_or_default();
    let headline = match &calculation.projection {
        Projection::Sip { result, .. } => result.maturity_amount,
        Projection::Swp { result, .. } => result.total_withdrawn,
    };
    format!(
        "{}  {}  {}  {} {}",
        calculation.id,
        calculation.created_at.format("%Y-%m-%d %H:%M"),
        calculation.kind().label(),
        currency::symbol_for(&calculation.currency),
        currency.format(headline)
    )
}

fn print_schedule(schedule: &[DrawdownMonth], currency: Currency) {
    println!(
        "{:>5}  {:>14}  {:>12}  {:>12}  {:>14}",
        "Month", "Opening", "Growth", "Withdrawal", "Closing"
    );
    for step in schedule {
        println!(
            "{:>5}  {:>14}  {:>12}  {:>12}  {:>14}",
            step.month,
            currency.format(step.opening_balance),
            currency.format(step.growth),
            currency.format(step.withdrawal),
            currency.format(step.closing_balance)
        );
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
