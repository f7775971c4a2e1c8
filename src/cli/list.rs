use chrono::Local;
use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{parse_duty_opt, parse_month_opt};
use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::display_date;
use crate::register;
use crate::settings::{get_data_dir, load_settings};

pub fn run(all: bool, unpaid: bool, month: Option<String>, duty: Option<String>) -> Result<()> {
    let settings = load_settings();
    let conn = get_connection(&get_data_dir().join("courtside.db"))?;
    let month = parse_month_opt(&month)?;
    let duty = parse_duty_opt(&duty)?;
    let now = Local::now().naive_local();

    // --unpaid alone must surface old debts, so it lifts the date cutoff
    let include_past = all || unpaid;
    let rows = register::list_assignments(&conn, include_past, unpaid, month.as_deref(), duty, now)?;

    if rows.is_empty() {
        println!("No assignments found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Time", "Duty", "Home", "Away", "Venue", "Paid"]);
    for a in &rows {
        let paid = if !a.payment_eligible {
            "\u{2014}".dimmed().to_string()
        } else if a.is_paid {
            "Paid".green().to_string()
        } else {
            "Unpaid".red().to_string()
        };
        table.add_row(vec![
            Cell::new(a.id),
            Cell::new(display_date(&a.date)),
            Cell::new(a.time.as_deref().unwrap_or("")),
            Cell::new(a.duty.label()),
            Cell::new(&a.home_team),
            Cell::new(&a.away_team),
            Cell::new(&a.venue),
            Cell::new(paid),
        ]);
    }

    let title = if settings.person.is_empty() {
        "Assignments".to_string()
    } else {
        format!("Assignments for {}", settings.person)
    };
    println!("{title}\n{table}");

    let open = rows.iter().filter(|a| a.payment_eligible && !a.is_paid).count();
    if open > 0 {
        println!("{} awaiting payment.", open);
    }
    Ok(())
}
