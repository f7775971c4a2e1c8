use chrono::Local;

use crate::dashboard::{Dashboard, DashboardExit};
use crate::db::get_connection;
use crate::drive::DefaultDriveClient;
use crate::error::Result;
use crate::notify::DefaultNotifier;
use crate::settings::{get_data_dir, load_settings, settings_file_exists};
use crate::sync::run_sync;

/// Default command: the interactive board. Pressing `s` drops out of the
/// alternate screen, runs a sync, and re-opens the board on fresh data.
pub async fn run() -> Result<()> {
    if !settings_file_exists() {
        println!("Welcome to Courtside.");
        println!();
        println!("Run `courtside init` to set up, then:");
        println!("  courtside config set person \"Your Name\"");
        println!("  courtside config set drive.folder_id <shared folder id>");
        println!("  courtside config set drive.api_key <api key>");
        println!();
        println!("Or run `courtside demo` to look around with sample data first.");
        return Ok(());
    }

    let db_path = get_data_dir().join("courtside.db");
    if !db_path.exists() {
        println!("Database not found. Run `courtside init` first.");
        return Ok(());
    }
    let conn = get_connection(&db_path)?;

    let mut pending_status: Option<String> = None;
    loop {
        let settings = load_settings();
        let mut board = Dashboard::new(&conn, settings.person.clone(), Local::now().naive_local())?;
        if let Some(msg) = pending_status.take() {
            board.set_status(msg);
        }

        match board.run(&conn)? {
            DashboardExit::Quit => return Ok(()),
            DashboardExit::Sync => {
                let client = DefaultDriveClient::new(&settings.drive.api_key);
                let notifier = DefaultNotifier::new(&settings.whatsapp);
                let now = Local::now().naive_local();
                pending_status = Some(
                    match run_sync(&conn, &client, Some(&notifier), &settings, now).await {
                        Ok(report) => format!(
                            "Sync done: {} new, {} unchanged, {} failed",
                            report.new_assignments.len(),
                            report.files_skipped,
                            report.files_failed
                        ),
                        Err(e) => format!("Sync failed: {e}"),
                    },
                );
            }
        }
    }
}
