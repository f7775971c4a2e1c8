use colored::Colorize;

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::display_when;
use crate::register;
use crate::settings::get_data_dir;

pub fn run(id: i64, paid: bool) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("courtside.db"))?;
    let a = register::set_paid(&conn, id, paid)?;

    let state = if paid {
        "paid".green().to_string()
    } else {
        "unpaid".red().to_string()
    };
    println!(
        "#{}  {}  {} vs {}  ({}) marked {}",
        a.id,
        display_when(&a.date, a.time.as_deref()),
        a.home_team,
        a.away_team,
        a.duty.label(),
        state
    );
    Ok(())
}
