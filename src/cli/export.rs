use std::io::Write;

use chrono::Local;

use super::{parse_duty_opt, parse_month_opt};
use crate::db::get_connection;
use crate::error::Result;
use crate::register;
use crate::settings::{get_data_dir, shellexpand_path};

pub fn run(
    output: Option<String>,
    all: bool,
    unpaid: bool,
    month: Option<String>,
    duty: Option<String>,
) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("courtside.db"))?;
    let month = parse_month_opt(&month)?;
    let duty = parse_duty_opt(&duty)?;
    let now = Local::now().naive_local();

    let include_past = all || unpaid;
    let rows = register::list_assignments(&conn, include_past, unpaid, month.as_deref(), duty, now)?;

    let out: Box<dyn Write> = match &output {
        Some(path) => Box::new(std::fs::File::create(shellexpand_path(path))?),
        None => Box::new(std::io::stdout()),
    };
    let mut writer = csv::Writer::from_writer(out);

    writer.write_record([
        "id",
        "date",
        "time",
        "duty",
        "home",
        "away",
        "venue",
        "file",
        "payment_eligible",
        "paid",
        "paid_at",
    ])?;
    for a in &rows {
        writer.write_record([
            a.id.to_string(),
            a.date.clone(),
            a.time.clone().unwrap_or_default(),
            a.duty.key().to_string(),
            a.home_team.clone(),
            a.away_team.clone(),
            a.venue.clone(),
            a.file_name.clone().unwrap_or_default(),
            (if a.payment_eligible { "1" } else { "0" }).to_string(),
            (if a.is_paid { "1" } else { "0" }).to_string(),
            a.paid_at.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;

    if let Some(path) = output {
        println!("Exported {} assignment(s) to {path}", rows.len());
    }
    Ok(())
}
