use std::path::PathBuf;

use crate::db::get_connection;
use crate::error::{CourtsideError, Result};
use crate::fmt::display_when;
use crate::register;
use crate::scanner::{self, name_matches};
use crate::settings::{get_data_dir, load_settings, shellexpand_path};

/// Scan one spreadsheet from disk. Same pipeline as a sync, minus the
/// network: checksum, scan, upsert under a `local:` id.
pub fn run(file: &str) -> Result<()> {
    let settings = load_settings();
    if settings.person.trim().is_empty() {
        return Err(CourtsideError::NotConfigured(
            "person (courtside config set person \"Your Name\")",
        ));
    }

    let path = PathBuf::from(shellexpand_path(file));
    let bytes = std::fs::read(&path)?;
    let parsed = scanner::scan_workbook_bytes(&bytes, &settings.columns, &settings.person)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());
    let eligible = name_matches(&name, &settings.payment_marker);
    let checksum = register::checksum_bytes(&bytes);
    let remote_id = format!("local:{}", path.display());

    let conn = get_connection(&get_data_dir().join("courtside.db"))?;
    let file_id = register::upsert_file(
        &conn,
        &remote_id,
        &name,
        "local",
        Some(&checksum),
        None,
        eligible,
    )?;
    let stats = register::upsert_assignments(&conn, file_id, &parsed)?;

    println!(
        "{}: {} assignment(s) for {} ({} new, {} already tracked)",
        name,
        parsed.len(),
        settings.person,
        stats.new_ids.len(),
        stats.updated
    );
    for id in stats.new_ids {
        let a = register::get_assignment(&conn, id)?;
        println!(
            "  #{}  {}  {} vs {}  ({})",
            a.id,
            display_when(&a.date, a.time.as_deref()),
            a.home_team,
            a.away_team,
            a.duty.label()
        );
    }
    if !eligible {
        println!("Note: file name has no '{}' marker, so these do not count as payable.", settings.payment_marker);
    }
    Ok(())
}
