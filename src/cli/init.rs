use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }

    let dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&dir)?;

    let db_path = dir.join("courtside.db");
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    save_settings(&settings)?;

    println!("Database ready at {}", db_path.display());
    println!("Settings file:    {}", settings_path().display());
    println!();
    println!("Next steps:");
    println!("  courtside config set person \"Your Name\"");
    println!("  courtside config set drive.folder_id <shared folder id>");
    println!("  courtside config set drive.api_key <api key>");
    println!("  courtside sync");
    println!();
    println!("Or run `courtside demo` to look around with sample data first.");
    Ok(())
}
