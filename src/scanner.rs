use std::io::{Read, Seek};

use calamine::{Data, Reader, Sheets};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Duty, ParsedAssignment};

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

/// Zero-based column positions of the fields a schedule sheet carries.
/// Federation sheets have kept the same shape for years; the layout is still
/// configurable because district offices occasionally insert a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub date: usize,
    pub time: usize,
    pub venue: usize,
    pub home: usize,
    pub away: usize,
    pub scorer: usize,
    pub timer: usize,
    pub shot_clock: usize,
    /// Rows to skip at the top of every worksheet.
    pub header_rows: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            date: 0,
            time: 1,
            venue: 2,
            home: 3,
            away: 4,
            scorer: 5,
            timer: 6,
            shot_clock: 7,
            header_rows: 1,
        }
    }
}

impl ColumnLayout {
    pub fn duty_col(&self, duty: Duty) -> usize {
        match duty {
            Duty::Scorer => self.scorer,
            Duty::Timer => self.timer,
            Duty::ShotClock => self.shot_clock,
        }
    }
}

// ---------------------------------------------------------------------------
// Name normalization
// ---------------------------------------------------------------------------

/// Uppercase, fold Turkish letters to ASCII and collapse runs of whitespace.
/// Officials' names are typed by hand in every district office, so the same
/// person shows up as "Ahmet Yılmaz", "AHMET YILMAZ" and "Ahmet  YILMAZ".
pub fn normalize_name(raw: &str) -> String {
    let folded: String = raw
        .chars()
        .map(|ch| match ch {
            'ğ' | 'Ğ' => 'G',
            'ü' | 'Ü' => 'U',
            'ş' | 'Ş' => 'S',
            'ı' | 'İ' => 'I',
            'ö' | 'Ö' => 'O',
            'ç' | 'Ç' => 'C',
            _ => ch,
        })
        .collect();
    folded
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Substring match on normalized forms, so "Yılmaz" finds "AHMET YILMAZ".
pub fn name_matches(cell: &str, person: &str) -> bool {
    let person = normalize_name(person);
    if person.is_empty() {
        return false;
    }
    normalize_name(cell).contains(&person)
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

static EMPTY_CELL: Data = Data::Empty;

fn cell<'a>(row: &'a [Data], idx: usize) -> &'a Data {
    row.get(idx).unwrap_or(&EMPTY_CELL)
}

pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

pub fn excel_serial_to_date(serial: f64) -> String {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    let date = base + chrono::Duration::days(serial as i64);
    date.format("%Y-%m-%d").to_string()
}

fn parse_date_dmy(raw: &str, sep: char) -> Option<String> {
    let parts: Vec<&str> = raw.split(sep).collect();
    if parts.len() != 3 {
        return None;
    }
    let d: u32 = parts[0].trim().parse().ok()?;
    let m: u32 = parts[1].trim().parse().ok()?;
    let mut y: i32 = parts[2].trim().parse().ok()?;
    if y < 100 {
        y += 2000;
    }
    chrono::NaiveDate::from_ymd_opt(y, m, d).map(|dt| dt.format("%Y-%m-%d").to_string())
}

fn parse_date_iso(raw: &str) -> Option<String> {
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Accepts `07.09.2025`, `7/9/2025` and `2025-09-07`; extra tokens around the
/// date (weekday names, mostly) are ignored.
pub fn parse_date_text(raw: &str) -> Option<String> {
    raw.split_whitespace().find_map(|token| {
        parse_date_dmy(token, '.')
            .or_else(|| parse_date_dmy(token, '/'))
            .or_else(|| parse_date_iso(token))
    })
}

pub fn parse_date_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => parse_date_text(s),
        Data::Float(f) if *f > 0.0 => Some(excel_serial_to_date(*f)),
        Data::Int(i) if *i > 0 => Some(excel_serial_to_date(*i as f64)),
        Data::DateTime(dt) if dt.as_f64() > 0.0 => Some(excel_serial_to_date(dt.as_f64())),
        Data::DateTimeIso(s) => s.split('T').next().and_then(parse_date_iso),
        _ => None,
    }
}

/// An Excel time is the fractional part of the serial; a bare date serial
/// carries no time at all.
fn serial_to_time(serial: f64) -> Option<String> {
    let frac = serial.fract();
    if serial <= 0.0 || (frac == 0.0 && serial >= 1.0) {
        return None;
    }
    let minutes = (frac * 24.0 * 60.0).round() as i64;
    Some(format!("{:02}:{:02}", (minutes / 60) % 24, minutes % 60))
}

/// Accepts `14:30`, `14.30` and `14:30:00`, normalized to zero-padded `HH:MM`.
pub fn parse_time_text(raw: &str) -> Option<String> {
    let token = raw.trim().split_whitespace().next()?;
    let token = token.replace('.', ":");
    let parts: Vec<&str> = token.split(':').collect();
    if parts.len() < 2 {
        return None;
    }
    let h: u32 = parts[0].parse().ok()?;
    let m: u32 = parts[1].parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(format!("{h:02}:{m:02}"))
}

pub fn parse_time_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => parse_time_text(s),
        Data::Float(f) => serial_to_time(*f),
        Data::Int(i) => serial_to_time(*i as f64),
        Data::DateTime(dt) => serial_to_time(dt.as_f64()),
        Data::DateTimeIso(s) => match s.split_once('T') {
            Some((_, t)) => parse_time_text(t),
            None => parse_time_text(s),
        },
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Row scanning
// ---------------------------------------------------------------------------

/// Scan one schedule row for the given person. A row yields one assignment
/// per duty column the person appears in, so a single match can produce up
/// to three. Rows without a readable date are skipped.
pub fn scan_row(row: &[Data], layout: &ColumnLayout, person: &str) -> Vec<ParsedAssignment> {
    let person_norm = normalize_name(person);
    if person_norm.is_empty() {
        return Vec::new();
    }
    let Some(date) = parse_date_cell(cell(row, layout.date)) else {
        return Vec::new();
    };
    let time = parse_time_cell(cell(row, layout.time));
    let venue = cell_text(cell(row, layout.venue));
    let home_team = cell_text(cell(row, layout.home));
    let away_team = cell_text(cell(row, layout.away));
    // Filler rows carry a date but no matchup, and the register key needs both teams.
    if home_team.is_empty() || away_team.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    for duty in Duty::ALL {
        let text = cell_text(cell(row, layout.duty_col(duty)));
        if !text.is_empty() && normalize_name(&text).contains(&person_norm) {
            out.push(ParsedAssignment {
                date: date.clone(),
                time: time.clone(),
                venue: venue.clone(),
                home_team: home_team.clone(),
                away_team: away_team.clone(),
                duty,
            });
        }
    }
    out
}

fn scan_sheets<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    layout: &ColumnLayout,
    person: &str,
) -> Vec<ParsedAssignment> {
    let mut out = Vec::new();
    let names = workbook.sheet_names();
    for name in &names {
        let range = match workbook.worksheet_range(name) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(sheet = %name, "skipping unreadable worksheet: {e}");
                continue;
            }
        };
        for row in range.rows().skip(layout.header_rows) {
            out.extend(scan_row(row, layout, person));
        }
    }
    out
}

/// Scan every worksheet of a schedule file. Federation files spread rounds
/// across tabs, so all of them count. Takes bytes rather than a path: the
/// sync has them fresh from a download, and the checksum needs them anyway.
pub fn scan_workbook_bytes(bytes: &[u8], layout: &ColumnLayout, person: &str) -> Result<Vec<ParsedAssignment>> {
    let cursor = std::io::Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)?;
    Ok(scan_sheets(&mut workbook, layout, person))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<Data> {
        cells.iter().map(|c| Data::String(c.to_string())).collect()
    }

    #[test]
    fn test_normalize_name_folds_turkish_letters() {
        assert_eq!(normalize_name("Ahmet Yılmaz"), "AHMET YILMAZ");
        assert_eq!(normalize_name("gül ŞEN"), "GUL SEN");
        assert_eq!(normalize_name("Çağrı Özgür İnce"), "CAGRI OZGUR INCE");
    }

    #[test]
    fn test_normalize_name_collapses_whitespace() {
        assert_eq!(normalize_name("  Ahmet   Yılmaz "), "AHMET YILMAZ");
        assert_eq!(normalize_name("A\tB\nC"), "A B C");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_name_matches_is_substring_on_normalized_forms() {
        assert!(name_matches("AHMET YILMAZ", "Ahmet Yılmaz"));
        assert!(name_matches("Ahmet Yılmaz / Mehmet Öz", "AHMET YILMAZ"));
        assert!(name_matches("AHMET YILMAZ", "Yılmaz"));
        assert!(!name_matches("MEHMET KAYA", "Ahmet Yılmaz"));
        assert!(!name_matches("AHMET YILMAZ", ""));
    }

    #[test]
    fn test_parse_date_text_formats() {
        assert_eq!(parse_date_text("07.09.2025"), Some("2025-09-07".to_string()));
        assert_eq!(parse_date_text("7/9/2025"), Some("2025-09-07".to_string()));
        assert_eq!(parse_date_text("2025-09-07"), Some("2025-09-07".to_string()));
        assert_eq!(parse_date_text("07.09.25"), Some("2025-09-07".to_string()));
        assert_eq!(parse_date_text("07.09.2025 Pazar"), Some("2025-09-07".to_string()));
        assert_eq!(parse_date_text("Pazar 07.09.2025"), Some("2025-09-07".to_string()));
    }

    #[test]
    fn test_parse_date_text_rejects_garbage() {
        assert_eq!(parse_date_text(""), None);
        assert_eq!(parse_date_text("salon"), None);
        assert_eq!(parse_date_text("32.01.2025"), None);
        assert_eq!(parse_date_text("01.13.2025"), None);
    }

    #[test]
    fn test_parse_date_cell_serials() {
        assert_eq!(excel_serial_to_date(45667.0), "2025-01-10");
        assert_eq!(
            parse_date_cell(&Data::Float(45907.0)),
            Some("2025-09-07".to_string())
        );
        assert_eq!(
            parse_date_cell(&Data::Int(45907)),
            Some("2025-09-07".to_string())
        );
        assert_eq!(parse_date_cell(&Data::Empty), None);
        assert_eq!(parse_date_cell(&Data::Float(0.0)), None);
    }

    #[test]
    fn test_parse_date_cell_iso_datetime() {
        assert_eq!(
            parse_date_cell(&Data::DateTimeIso("2025-09-07T14:30:00".to_string())),
            Some("2025-09-07".to_string())
        );
    }

    #[test]
    fn test_parse_time_text_formats() {
        assert_eq!(parse_time_text("14:30"), Some("14:30".to_string()));
        assert_eq!(parse_time_text("14.30"), Some("14:30".to_string()));
        assert_eq!(parse_time_text("9:05"), Some("09:05".to_string()));
        assert_eq!(parse_time_text("14:30:00"), Some("14:30".to_string()));
        assert_eq!(parse_time_text("14"), None);
        assert_eq!(parse_time_text("25:00"), None);
        assert_eq!(parse_time_text(""), None);
    }

    #[test]
    fn test_parse_time_cell_fractions() {
        // 14:30 is 870 minutes into the day
        assert_eq!(parse_time_cell(&Data::Float(870.0 / 1440.0)), Some("14:30".to_string()));
        assert_eq!(
            parse_time_cell(&Data::Float(45907.0 + 870.0 / 1440.0)),
            Some("14:30".to_string())
        );
        // a bare date serial carries no time
        assert_eq!(parse_time_cell(&Data::Float(45907.0)), None);
        assert_eq!(parse_time_cell(&Data::Empty), None);
    }

    #[test]
    fn test_scan_row_emits_one_assignment_per_matching_duty() {
        let layout = ColumnLayout::default();
        let row = text_row(&[
            "07.09.2025",
            "14:30",
            "Atatürk Spor Salonu",
            "Göztepe",
            "Karşıyaka",
            "AHMET YILMAZ",
            "MEHMET KAYA",
            "Ahmet  Yılmaz",
        ]);
        let found = scan_row(&row, &layout, "Ahmet Yılmaz");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].duty, Duty::Scorer);
        assert_eq!(found[1].duty, Duty::ShotClock);
        assert_eq!(found[0].date, "2025-09-07");
        assert_eq!(found[0].time.as_deref(), Some("14:30"));
        assert_eq!(found[0].home_team, "Göztepe");
        assert_eq!(found[0].key(), "2025-09-07|14:30|GOZTEPE|KARSIYAKA|scorer");
    }

    #[test]
    fn test_scan_row_skips_rows_without_date() {
        let layout = ColumnLayout::default();
        let row = text_row(&[
            "", "14:30", "Salon", "A", "B", "AHMET YILMAZ", "", "",
        ]);
        assert!(scan_row(&row, &layout, "Ahmet Yılmaz").is_empty());
    }

    #[test]
    fn test_scan_row_skips_rows_without_both_teams() {
        let layout = ColumnLayout::default();
        let row = text_row(&[
            "07.09.2025", "14:30", "Salon", "A", "", "AHMET YILMAZ", "", "",
        ]);
        assert!(scan_row(&row, &layout, "Ahmet Yılmaz").is_empty());
    }

    #[test]
    fn test_scan_row_ignores_other_people() {
        let layout = ColumnLayout::default();
        let row = text_row(&[
            "07.09.2025", "14:30", "Salon", "A", "B",
            "MEHMET KAYA", "AYSE DEMIR", "CAN POLAT",
        ]);
        assert!(scan_row(&row, &layout, "Ahmet Yılmaz").is_empty());
        assert!(scan_row(&row, &layout, "").is_empty());
    }

    #[test]
    fn test_scan_row_tolerates_short_rows() {
        let layout = ColumnLayout::default();
        let row = text_row(&["07.09.2025", "14:30", "Salon", "A", "B", "AHMET YILMAZ"]);
        let found = scan_row(&row, &layout, "Ahmet Yılmaz");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].duty, Duty::Scorer);
    }

    #[test]
    fn test_scan_row_custom_layout() {
        let layout = ColumnLayout {
            date: 1,
            time: 2,
            venue: 0,
            home: 3,
            away: 4,
            scorer: 6,
            timer: 5,
            shot_clock: 7,
            header_rows: 2,
        };
        let row = text_row(&[
            "Salon", "07.09.2025", "18:00", "Ev", "Misafir",
            "AHMET YILMAZ", "", "",
        ]);
        let found = scan_row(&row, &layout, "Ahmet Yılmaz");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].duty, Duty::Timer);
        assert_eq!(found[0].venue, "Salon");
    }

    fn schedule_xlsx(sheets: &[(&str, &[[&str; 8]])]) -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        for (name, rows) in sheets {
            let sheet = workbook.add_worksheet();
            sheet.set_name(*name).unwrap();
            let header = [
                "Tarih", "Saat", "Salon", "Ev Sahibi", "Misafir",
                "Sayı", "Süre", "Şut Saati",
            ];
            for (col, h) in header.iter().enumerate() {
                sheet.write_string(0, col as u16, *h).unwrap();
            }
            for (r, row) in rows.iter().enumerate() {
                for (col, value) in row.iter().enumerate() {
                    sheet.write_string(r as u32 + 1, col as u16, *value).unwrap();
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_scan_workbook_covers_every_sheet() {
        let bytes = schedule_xlsx(&[
            (
                "1. Hafta",
                &[
                    ["06.09.2025", "12:00", "Salon A", "Göztepe", "Bornova", "MEHMET KAYA", "AHMET YILMAZ", "CAN POLAT"],
                    ["06.09.2025", "14:00", "Salon A", "Karşıyaka", "Buca", "AYSE DEMIR", "CAN POLAT", "MEHMET KAYA"],
                ],
            ),
            (
                "2. Hafta",
                &[
                    ["13.09.2025", "16:30", "Salon B", "Buca", "Göztepe", "AHMET YILMAZ", "AYSE DEMIR", "CAN POLAT"],
                ],
            ),
        ]);
        let found = scan_workbook_bytes(&bytes, &ColumnLayout::default(), "Ahmet Yılmaz").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].date, "2025-09-06");
        assert_eq!(found[0].duty, Duty::Timer);
        assert_eq!(found[1].date, "2025-09-13");
        assert_eq!(found[1].duty, Duty::Scorer);
        assert_eq!(found[1].venue, "Salon B");
    }

    #[test]
    fn test_scan_workbook_skips_header_rows() {
        let bytes = schedule_xlsx(&[(
            "Fikstür",
            &[["07.09.2025", "14:30", "Salon", "Ev", "Deplasman", "AHMET YILMAZ", "", ""]],
        )]);
        let found = scan_workbook_bytes(&bytes, &ColumnLayout::default(), "ahmet yılmaz").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].home_team, "Ev");

        // header_rows: 2 swallows the first data row as well
        let wide_header = ColumnLayout {
            header_rows: 2,
            ..ColumnLayout::default()
        };
        assert!(scan_workbook_bytes(&bytes, &wide_header, "ahmet yılmaz")
            .unwrap()
            .is_empty());
    }
}
