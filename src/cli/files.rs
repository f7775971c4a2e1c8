use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::register;
use crate::settings::get_data_dir;

pub fn run() -> Result<()> {
    let conn = get_connection(&get_data_dir().join("courtside.db"))?;
    let files = register::list_files(&conn)?;

    if files.is_empty() {
        println!("No schedule files tracked yet. Run `courtside sync` first.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Folder", "Modified", "Payable", "Last synced"]);
    for f in &files {
        table.add_row(vec![
            Cell::new(f.id),
            Cell::new(&f.name),
            Cell::new(&f.folder),
            Cell::new(f.modified_time.as_deref().unwrap_or("")),
            Cell::new(if f.payment_eligible { "yes" } else { "" }),
            Cell::new(&f.last_synced_at),
        ]);
    }
    println!("Schedule files\n{table}");
    Ok(())
}
