use crate::error::{CourtsideError, Result};
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path};

pub fn show() -> Result<()> {
    let s = load_settings();
    let c = &s.columns;

    println!("person:                {}", or_unset(&s.person));
    println!("data_dir:              {}", s.data_dir);
    println!("payment_marker:        {}", s.payment_marker);
    println!("drive.folder_id:       {}", or_unset(&s.drive.folder_id));
    println!("drive.api_key:         {}", mask(&s.drive.api_key));
    println!("whatsapp.gateway_url:  {}", s.whatsapp.gateway_url);
    println!("whatsapp.phone:        {}", or_unset(&s.whatsapp.phone));
    println!("whatsapp.api_key:      {}", mask(&s.whatsapp.api_key));
    println!(
        "columns:               date={} time={} venue={} home={} away={} scorer={} timer={} shot_clock={} header_rows={}",
        c.date, c.time, c.venue, c.home, c.away, c.scorer, c.timer, c.shot_clock, c.header_rows
    );
    println!();
    println!("Settings file: {}", settings_path().display());
    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let mut s = load_settings();
    match key {
        "person" => s.person = value.to_string(),
        "data_dir" => s.data_dir = shellexpand_path(value),
        "payment_marker" => s.payment_marker = value.to_string(),
        "drive.folder_id" => s.drive.folder_id = value.to_string(),
        "drive.api_key" => s.drive.api_key = value.to_string(),
        "whatsapp.gateway_url" => s.whatsapp.gateway_url = value.to_string(),
        "whatsapp.phone" => s.whatsapp.phone = value.to_string(),
        "whatsapp.api_key" => s.whatsapp.api_key = value.to_string(),
        "columns.date" => s.columns.date = parse_index(key, value)?,
        "columns.time" => s.columns.time = parse_index(key, value)?,
        "columns.venue" => s.columns.venue = parse_index(key, value)?,
        "columns.home" => s.columns.home = parse_index(key, value)?,
        "columns.away" => s.columns.away = parse_index(key, value)?,
        "columns.scorer" => s.columns.scorer = parse_index(key, value)?,
        "columns.timer" => s.columns.timer = parse_index(key, value)?,
        "columns.shot_clock" => s.columns.shot_clock = parse_index(key, value)?,
        "columns.header_rows" => s.columns.header_rows = parse_index(key, value)?,
        _ => {
            return Err(CourtsideError::Settings(format!(
                "Unknown settings key '{key}' (see `courtside config show`)"
            )))
        }
    }
    save_settings(&s)?;
    println!("Set {key}");
    Ok(())
}

fn parse_index(key: &str, value: &str) -> Result<usize> {
    value.parse().map_err(|_| {
        CourtsideError::Settings(format!("{key} expects a number, got '{value}'"))
    })
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

fn mask(value: &str) -> String {
    if value.is_empty() {
        "(not set)".to_string()
    } else if value.chars().count() <= 4 {
        "****".to_string()
    } else {
        let head: String = value.chars().take(4).collect();
        format!("{head}****")
    }
}
