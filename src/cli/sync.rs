use chrono::Local;
use colored::Colorize;

use crate::db::get_connection;
use crate::drive::DefaultDriveClient;
use crate::error::Result;
use crate::fmt::display_when;
use crate::notify::DefaultNotifier;
use crate::settings::{get_data_dir, load_settings};
use crate::sync::{run_sync, SyncReport};

pub async fn run(no_notify: bool) -> Result<()> {
    let settings = load_settings();
    let conn = get_connection(&get_data_dir().join("courtside.db"))?;
    let now = Local::now().naive_local();

    let client = DefaultDriveClient::new(&settings.drive.api_key);
    let notifier = DefaultNotifier::new(&settings.whatsapp);
    let notifier_ref = if no_notify { None } else { Some(&notifier) };

    println!("Checking the shared folder...");
    let report = run_sync(&conn, &client, notifier_ref, &settings, now).await?;
    print_report(&report);
    Ok(())
}

pub(crate) fn print_report(report: &SyncReport) {
    for failure in &report.subtree_failures {
        println!(
            "{} skipped folder '{}': {}",
            "warning:".yellow(),
            failure.folder,
            failure.message
        );
    }

    println!(
        "{} file(s) found: {} scanned, {} unchanged, {} failed",
        report.files_seen, report.files_scanned, report.files_skipped, report.files_failed
    );

    if report.new_assignments.is_empty() {
        println!("No new assignments.");
    } else {
        println!(
            "{}",
            format!("{} new assignment(s):", report.new_assignments.len()).bold()
        );
        for a in &report.new_assignments {
            println!(
                "  #{}  {}  {} vs {}  ({})",
                a.id,
                display_when(&a.date, a.time.as_deref()),
                a.home_team,
                a.away_team,
                a.duty.label()
            );
        }
    }
    if report.updated > 0 {
        println!("{} already-known assignment(s) refreshed.", report.updated);
    }
    if report.notified > 0 {
        println!("Sent {} WhatsApp notification(s).", report.notified);
    }
    if report.notify_failures > 0 {
        println!(
            "{} {} notification(s) failed; they will be retried on the next sync.",
            "warning:".yellow(),
            report.notify_failures
        );
    }
}
