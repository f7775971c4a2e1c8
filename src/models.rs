/// The three duty columns a schedule row can name a table official in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Duty {
    Scorer,
    Timer,
    ShotClock,
}

impl Duty {
    pub const ALL: [Duty; 3] = [Duty::Scorer, Duty::Timer, Duty::ShotClock];

    /// Stable key used in the database and the composite identifier.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Scorer => "scorer",
            Self::Timer => "timer",
            Self::ShotClock => "shot_clock",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Scorer => "Scorer",
            Self::Timer => "Timer",
            Self::ShotClock => "Shot clock",
        }
    }

    pub fn from_key(raw: &str) -> Option<Duty> {
        match raw.trim().to_lowercase().replace('-', "_").as_str() {
            "scorer" => Some(Self::Scorer),
            "timer" => Some(Self::Timer),
            "shot_clock" | "shotclock" => Some(Self::ShotClock),
            _ => None,
        }
    }
}

/// One duty extracted from a schedule row, before it lands in the database.
/// Dates are ISO `YYYY-MM-DD`, times `HH:MM`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAssignment {
    pub date: String,
    pub time: Option<String>,
    pub venue: String,
    pub home_team: String,
    pub away_team: String,
    pub duty: Duty,
}

impl ParsedAssignment {
    /// Derived composite identifier: `date|time|HOME|AWAY|duty`, with team
    /// names normalized so the key survives diacritic/case drift between
    /// re-publishes of the same sheet.
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.date,
            self.time.as_deref().unwrap_or(""),
            crate::scanner::normalize_name(&self.home_team),
            crate::scanner::normalize_name(&self.away_team),
            self.duty.key(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub id: i64,
    pub key: String,
    pub date: String,
    pub time: Option<String>,
    pub venue: String,
    pub home_team: String,
    pub away_team: String,
    pub duty: Duty,
    pub file_name: Option<String>,
    pub payment_eligible: bool,
    pub is_paid: bool,
    pub paid_at: Option<String>,
    pub notified: bool,
    pub first_seen_at: String,
}

#[derive(Debug, Clone)]
pub struct ScheduleFile {
    pub id: i64,
    pub remote_id: String,
    pub name: String,
    pub folder: String,
    pub checksum: Option<String>,
    pub modified_time: Option<String>,
    pub payment_eligible: bool,
    pub last_synced_at: String,
}
