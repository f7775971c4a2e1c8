use std::path::PathBuf;

use chrono::Local;

use crate::db::{get_connection, get_meta};
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::register;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join("courtside.db");

    let person = if settings.person.is_empty() {
        "(not set)"
    } else {
        &settings.person
    };
    let folder = if settings.drive.folder_id.is_empty() {
        "(not set)"
    } else {
        &settings.drive.folder_id
    };
    println!("Person:     {person}");
    println!("Folder ID:  {folder}");
    println!("Marker:     {}", settings.payment_marker);
    println!(
        "WhatsApp:   {}",
        if settings.whatsapp.is_configured() {
            "configured"
        } else {
            "(not configured)"
        }
    );
    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let counts = register::counts(&conn, Local::now().naive_local())?;
        let last_sync = get_meta(&conn, "last_sync_at");

        println!();
        println!("Schedule files:    {}", counts.files);
        println!("Assignments:       {}", counts.assignments);
        println!("Upcoming:          {}", counts.upcoming);
        println!("Awaiting payment:  {}", counts.unpaid);
        println!("Last sync:         {}", last_sync.as_deref().unwrap_or("never"));
    } else {
        println!();
        println!("Database not found. Run `courtside init` to set up.");
    }

    Ok(())
}
