/// Render an ISO date the way the schedules print it: 07.09.2025
pub fn display_date(iso: &str) -> String {
    match chrono::NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
        Ok(d) => d.format("%d.%m.%Y").to_string(),
        Err(_) => iso.to_string(),
    }
}

/// Date plus kickoff time when one is known.
pub fn display_when(date: &str, time: Option<&str>) -> String {
    match time {
        Some(t) if !t.is_empty() => format!("{} {}", display_date(date), t),
        _ => display_date(date),
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_date() {
        assert_eq!(display_date("2025-09-07"), "07.09.2025");
        assert_eq!(display_date("not-a-date"), "not-a-date");
    }

    #[test]
    fn test_display_when() {
        assert_eq!(display_when("2025-09-07", Some("14:30")), "07.09.2025 14:30");
        assert_eq!(display_when("2025-09-07", None), "07.09.2025");
        assert_eq!(display_when("2025-09-07", Some("")), "07.09.2025");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
