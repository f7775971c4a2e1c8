pub mod config;
pub mod dashboard;
pub mod demo;
pub mod export;
pub mod files;
pub mod init;
pub mod list;
pub mod notify;
pub mod paid;
pub mod scan;
pub mod status;
pub mod sync;

use clap::{Parser, Subcommand};

use crate::error::{CourtsideError, Result};
use crate::models::Duty;

/// Validate and zero-pad a `--month YYYY-MM` filter; stored dates are
/// zero-padded, so the LIKE pattern must be too.
pub(crate) fn parse_month_opt(month: &Option<String>) -> Result<Option<String>> {
    let Some(m) = month else {
        return Ok(None);
    };
    match chrono::NaiveDate::parse_from_str(&format!("{m}-01"), "%Y-%m-%d") {
        Ok(d) => Ok(Some(d.format("%Y-%m").to_string())),
        Err(_) => Err(CourtsideError::Settings(format!(
            "Invalid month '{m}' (expected YYYY-MM)"
        ))),
    }
}

pub(crate) fn parse_duty_opt(duty: &Option<String>) -> Result<Option<Duty>> {
    let Some(d) = duty else {
        return Ok(None);
    };
    Duty::from_key(d).map(Some).ok_or_else(|| {
        CourtsideError::Settings(format!(
            "Unknown duty '{d}' (expected scorer, timer or shot_clock)"
        ))
    })
}

#[derive(Parser)]
#[command(
    name = "courtside",
    about = "Tracks table-official assignments scraped from shared league schedules."
)]
pub struct Cli {
    /// Debug logging to stderr (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up Courtside: choose a data directory and initialize the database.
    Init {
        /// Path for Courtside data (default: ~/Documents/courtside)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Pull schedules from the shared folder and pick up new assignments.
    Sync {
        /// Skip WhatsApp notifications for this run
        #[arg(long = "no-notify")]
        no_notify: bool,
    },
    /// Scan a local spreadsheet instead of the shared folder.
    Scan {
        /// Path to an .xlsx/.xls/.ods schedule
        file: String,
    },
    /// List assignments.
    List {
        /// Include past assignments
        #[arg(long)]
        all: bool,
        /// Only unpaid league assignments (implies --all)
        #[arg(long)]
        unpaid: bool,
        /// Month filter: YYYY-MM
        #[arg(long)]
        month: Option<String>,
        /// Duty filter: scorer, timer, shot_clock
        #[arg(long)]
        duty: Option<String>,
    },
    /// Mark an assignment as paid.
    Paid {
        /// Assignment ID (shown in `courtside list`)
        id: i64,
    },
    /// Mark an assignment as not paid after all.
    Unpaid {
        /// Assignment ID (shown in `courtside list`)
        id: i64,
    },
    /// List the schedule files being tracked.
    Files,
    /// Export assignments to CSV.
    Export {
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<String>,
        /// Include past assignments
        #[arg(long)]
        all: bool,
        /// Only unpaid league assignments (implies --all)
        #[arg(long)]
        unpaid: bool,
        /// Month filter: YYYY-MM
        #[arg(long)]
        month: Option<String>,
        /// Duty filter: scorer, timer, shot_clock
        #[arg(long)]
        duty: Option<String>,
    },
    /// Show paths, settings and register counts.
    Status,
    /// Show or change settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Send a test message through the WhatsApp gateway.
    NotifyTest,
    /// Load sample schedules to explore Courtside without a shared folder.
    Demo,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the current settings.
    Show,
    /// Set a settings key, e.g. `config set person "Ayşe Kaya"`.
    Set {
        /// Key: person, payment_marker, drive.folder_id, drive.api_key,
        /// whatsapp.phone, whatsapp.api_key, whatsapp.gateway_url,
        /// columns.<field>, columns.header_rows
        key: String,
        value: String,
    },
}
