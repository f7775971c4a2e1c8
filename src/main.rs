mod cli;
mod dashboard;
mod db;
mod drive;
mod error;
mod fmt;
mod http;
mod models;
mod notify;
mod register;
mod scanner;
mod settings;
mod sync;
mod tui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ConfigCommands};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("courtside=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("courtside=warn"))
    };
    // stderr, so log lines never land inside a table or the board
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        None => cli::dashboard::run().await,
        Some(Commands::Init { data_dir }) => cli::init::run(data_dir),
        Some(Commands::Sync { no_notify }) => cli::sync::run(no_notify).await,
        Some(Commands::Scan { file }) => cli::scan::run(&file),
        Some(Commands::List {
            all,
            unpaid,
            month,
            duty,
        }) => cli::list::run(all, unpaid, month, duty),
        Some(Commands::Paid { id }) => cli::paid::run(id, true),
        Some(Commands::Unpaid { id }) => cli::paid::run(id, false),
        Some(Commands::Files) => cli::files::run(),
        Some(Commands::Export {
            output,
            all,
            unpaid,
            month,
            duty,
        }) => cli::export::run(output, all, unpaid, month, duty),
        Some(Commands::Status) => cli::status::run(),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => cli::config::show(),
            ConfigCommands::Set { key, value } => cli::config::set(&key, &value),
        },
        Some(Commands::NotifyTest) => cli::notify::run().await,
        Some(Commands::Demo) => cli::demo::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
