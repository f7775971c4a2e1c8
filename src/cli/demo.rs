use std::path::PathBuf;

use chrono::{Duration, Local};

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::models::{Duty, ParsedAssignment};
use crate::register;
use crate::settings::{load_settings, save_settings};

const DEMO_PERSON: &str = "Ayşe Kaya";

struct DemoGame {
    /// Days relative to today; negative is history.
    day_offset: i64,
    time: &'static str,
    venue: &'static str,
    home: &'static str,
    away: &'static str,
    duty: Duty,
}

const LEAGUE_GAMES: &[DemoGame] = &[
    DemoGame { day_offset: -10, time: "14:30", venue: "Halkapınar Ek Salon", home: "Göztepe", away: "Karşıyaka", duty: Duty::Scorer },
    DemoGame { day_offset: -3, time: "18:00", venue: "Celal Atik Spor Salonu", home: "Bornova", away: "Buca", duty: Duty::Timer },
    DemoGame { day_offset: 2, time: "16:00", venue: "Halkapınar Ek Salon", home: "Karşıyaka", away: "Bornova", duty: Duty::Scorer },
    DemoGame { day_offset: 6, time: "20:30", venue: "Celal Atik Spor Salonu", home: "Buca", away: "Göztepe", duty: Duty::ShotClock },
    DemoGame { day_offset: 13, time: "12:00", venue: "Halkapınar Ek Salon", home: "Göztepe", away: "Bornova", duty: Duty::Timer },
];

const FRIENDLY_GAMES: &[DemoGame] = &[
    DemoGame { day_offset: -1, time: "19:00", venue: "Alsancak Spor Salonu", home: "Alsancak", away: "Konak", duty: Duty::Scorer },
    DemoGame { day_offset: 4, time: "17:30", venue: "Alsancak Spor Salonu", home: "Konak", away: "Karşıyaka", duty: Duty::Timer },
];

fn to_parsed(games: &[DemoGame]) -> Vec<ParsedAssignment> {
    let today = Local::now().date_naive();
    games
        .iter()
        .map(|g| ParsedAssignment {
            date: (today + Duration::days(g.day_offset))
                .format("%Y-%m-%d")
                .to_string(),
            time: Some(g.time.to_string()),
            venue: g.venue.to_string(),
            home_team: g.home.to_string(),
            away_team: g.away.to_string(),
            duty: g.duty,
        })
        .collect()
}

pub fn run() -> Result<()> {
    let mut settings = load_settings();
    if settings.person.trim().is_empty() {
        settings.person = DEMO_PERSON.to_string();
        save_settings(&settings)?;
        println!("Set person to {DEMO_PERSON} (change it with `courtside config set person ...`).");
    }

    let data_dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let conn = get_connection(&data_dir.join("courtside.db"))?;
    init_db(&conn)?;

    let league_file = register::upsert_file(
        &conn,
        "demo:league",
        "2025-26 LİG Masa Görevlileri.xlsx",
        "Demo",
        None,
        None,
        true,
    )?;
    let league = register::upsert_assignments(&conn, league_file, &to_parsed(LEAGUE_GAMES))?;

    let friendly_file = register::upsert_file(
        &conn,
        "demo:friendly",
        "Hazırlık Maçları.xlsx",
        "Demo",
        None,
        None,
        false,
    )?;
    let friendly = register::upsert_assignments(&conn, friendly_file, &to_parsed(FRIENDLY_GAMES))?;

    // the oldest league game arrives already settled, so both payment
    // states show up
    if let Some(&first) = league.new_ids.first() {
        register::set_paid(&conn, first, true)?;
    }

    let seeded = league.new_ids.len() + friendly.new_ids.len();
    if seeded == 0 {
        println!("Demo data already loaded.");
    } else {
        println!(
            "Demo data loaded: 2 schedule files, {seeded} assignments for {}.",
            settings.person
        );
    }
    println!();
    println!("Try:");
    println!("  courtside              (interactive board)");
    println!("  courtside list --all");
    println!("  courtside list --unpaid");
    println!("  courtside status");
    Ok(())
}
