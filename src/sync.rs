use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db;
use crate::drive::{DriveClient, SubtreeFailure};
use crate::error::{CourtsideError, Result};
use crate::http::HttpBackend;
use crate::models::Assignment;
use crate::notify::{assignment_message, Notifier};
use crate::register;
use crate::scanner::{self, name_matches};
use crate::settings::Settings;

/// What one sync run did, for the summary line and the tests.
#[derive(Default)]
pub struct SyncReport {
    pub files_seen: usize,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub new_assignments: Vec<Assignment>,
    pub updated: usize,
    pub notified: usize,
    pub notify_failures: usize,
    pub subtree_failures: Vec<SubtreeFailure>,
}

/// walk -> fetch -> scan -> upsert -> notify. A file that fails to download
/// or parse is skipped with a warning; only a broken root folder or a broken
/// local database aborts the run.
pub async fn run_sync<D: HttpBackend, N: HttpBackend>(
    conn: &Connection,
    client: &DriveClient<D>,
    notifier: Option<&Notifier<N>>,
    settings: &Settings,
    now: NaiveDateTime,
) -> Result<SyncReport> {
    if settings.person.trim().is_empty() {
        return Err(CourtsideError::NotConfigured(
            "person (courtside config set person \"Your Name\")",
        ));
    }
    if settings.drive.folder_id.is_empty() {
        return Err(CourtsideError::NotConfigured(
            "drive.folder_id (courtside config set drive.folder_id <id>)",
        ));
    }

    let scan = client.walk_folder(&settings.drive.folder_id).await?;
    let mut report = SyncReport {
        files_seen: scan.sheets.len(),
        subtree_failures: scan.failures,
        ..SyncReport::default()
    };

    for sheet in &scan.sheets {
        let file = &sheet.file;
        let eligible = name_matches(&file.name, &settings.payment_marker);
        let stored = register::find_file(conn, &file.id);

        // Same modification stamp as last sync: refresh the record, skip the
        // download entirely.
        if let (Some(stored), Some(remote_mtime)) = (&stored, &file.modified_time) {
            if stored.checksum.is_some()
                && stored.modified_time.as_deref() == Some(remote_mtime.as_str())
            {
                register::upsert_file(
                    conn,
                    &file.id,
                    &file.name,
                    &sheet.folder,
                    stored.checksum.as_deref(),
                    Some(remote_mtime.as_str()),
                    eligible,
                )?;
                report.files_skipped += 1;
                continue;
            }
        }

        let bytes = match client.fetch_sheet(file).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(file = %file.name, "fetch failed: {e}");
                report.files_failed += 1;
                continue;
            }
        };

        let checksum = register::checksum_bytes(&bytes);
        if let Some(stored) = &stored {
            if stored.checksum.as_deref() == Some(checksum.as_str()) {
                register::upsert_file(
                    conn,
                    &file.id,
                    &file.name,
                    &sheet.folder,
                    Some(&checksum),
                    file.modified_time.as_deref(),
                    eligible,
                )?;
                report.files_skipped += 1;
                continue;
            }
        }

        let parsed = match scanner::scan_workbook_bytes(&bytes, &settings.columns, &settings.person)
        {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(file = %file.name, "scan failed: {e}");
                report.files_failed += 1;
                continue;
            }
        };

        let file_id = register::upsert_file(
            conn,
            &file.id,
            &file.name,
            &sheet.folder,
            Some(&checksum),
            file.modified_time.as_deref(),
            eligible,
        )?;
        let stats = register::upsert_assignments(conn, file_id, &parsed)?;
        for id in stats.new_ids {
            report.new_assignments.push(register::get_assignment(conn, id)?);
        }
        report.updated += stats.updated;
        report.files_scanned += 1;
        tracing::info!(file = %file.name, matched = parsed.len(), "scanned");
    }

    if let Some(notifier) = notifier {
        if notifier.is_configured() {
            let pending = register::unnotified_upcoming(conn, now)?;
            for a in &pending {
                match notifier.send(&assignment_message(a)).await {
                    Ok(()) => {
                        register::mark_notified(conn, a.id)?;
                        report.notified += 1;
                    }
                    Err(e) => {
                        tracing::warn!(assignment = a.id, "notification failed: {e}");
                        report.notify_failures += 1;
                    }
                }
            }
        } else {
            tracing::debug!("whatsapp gateway not configured, skipping notifications");
        }
    }

    db::set_meta(
        conn,
        "last_sync_at",
        &now.format("%Y-%m-%d %H:%M:%S").to_string(),
    )?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use crate::drive::XLSX_MIME;
    use crate::http::testing::FakeBackend;
    use serde_json::json;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn test_settings() -> Settings {
        let mut s = Settings::default();
        s.person = "Ahmet Yılmaz".to_string();
        s.drive.folder_id = "root1".to_string();
        s.whatsapp.phone = "+905551112233".to_string();
        s.whatsapp.api_key = "123456".to_string();
        s
    }

    fn noon(date: &str) -> NaiveDateTime {
        chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn schedule_bytes(rows: &[[&str; 8]]) -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        let header = [
            "Tarih", "Saat", "Salon", "Ev Sahibi", "Misafir", "Sayı", "Süre", "Şut Saati",
        ];
        for (col, h) in header.iter().enumerate() {
            sheet.write_string(0, col as u16, *h).unwrap();
        }
        for (r, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                sheet.write_string(r as u32 + 1, col as u16, *value).unwrap();
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    fn listing(files: &[(&str, &str, &str)]) -> serde_json::Value {
        let entries: Vec<serde_json::Value> = files
            .iter()
            .map(|(id, name, mtime)| {
                json!({"id": id, "name": name, "mimeType": XLSX_MIME, "modifiedTime": mtime})
            })
            .collect();
        json!({ "files": entries })
    }

    #[tokio::test]
    async fn test_sync_end_to_end() {
        let (_dir, conn) = test_db();
        let settings = test_settings();

        let lig_bytes = schedule_bytes(&[
            ["07.09.2025", "14:30", "Salon A", "Göztepe", "Karşıyaka", "AHMET YILMAZ", "MEHMET KAYA", "CAN POLAT"],
            ["08.09.2025", "18:00", "Salon B", "Buca", "Bornova", "AYSE DEMIR", "AHMET YILMAZ", "CAN POLAT"],
        ]);
        let friendly_bytes = schedule_bytes(&[
            ["10.09.2025", "20:00", "Salon C", "Alsancak", "Konak", "AHMET YILMAZ", "", ""],
        ]);

        let backend = FakeBackend::new()
            .with_json(
                "root1",
                listing(&[
                    ("f1", "2025 LİG programı.xlsx", "2025-09-01T10:00:00Z"),
                    ("f2", "hazirlik_maclari.xlsx", "2025-09-01T11:00:00Z"),
                ]),
            )
            .with_bytes("files/f1?alt=media", lig_bytes)
            .with_bytes("files/f2?alt=media", friendly_bytes)
            .with_text("callmebot", 200, "Message queued.");
        let handle = backend.clone();
        let client = DriveClient::with_backend(backend.clone(), "key");
        let notifier = Notifier::with_backend(backend, &settings.whatsapp);
        let now = noon("2025-09-01");

        let report = run_sync(&conn, &client, Some(&notifier), &settings, now)
            .await
            .unwrap();
        assert_eq!(report.files_seen, 2);
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.files_failed, 0);
        assert_eq!(report.new_assignments.len(), 3);
        assert_eq!(report.notified, 3);
        assert!(report.subtree_failures.is_empty());

        // eligibility follows the marker, after normalization
        let files = register::list_files(&conn).unwrap();
        assert!(files.iter().find(|f| f.remote_id == "f1").unwrap().payment_eligible);
        assert!(!files.iter().find(|f| f.remote_id == "f2").unwrap().payment_eligible);

        // everything upcoming got notified
        assert!(register::unnotified_upcoming(&conn, now).unwrap().is_empty());
        assert_eq!(db::get_meta(&conn, "last_sync_at").as_deref(), Some("2025-09-01 12:00:00"));

        // second run: modification stamps unchanged, nothing re-downloaded,
        // nothing re-notified
        let gateway_calls = |h: &FakeBackend| {
            h.requests().iter().filter(|u| u.contains("callmebot")).count()
        };
        let sends_before = gateway_calls(&handle);
        let report2 = run_sync(&conn, &client, Some(&notifier), &settings, now)
            .await
            .unwrap();
        assert_eq!(report2.files_skipped, 2);
        assert_eq!(report2.files_scanned, 0);
        assert!(report2.new_assignments.is_empty());
        assert_eq!(gateway_calls(&handle), sends_before);
    }

    #[tokio::test]
    async fn test_sync_changed_file_notifies_only_the_new_row() {
        let (_dir, conn) = test_db();
        let settings = test_settings();
        let now = noon("2025-09-01");

        let v1 = schedule_bytes(&[
            ["07.09.2025", "14:30", "Salon A", "Göztepe", "Karşıyaka", "AHMET YILMAZ", "", ""],
        ]);
        let backend = FakeBackend::new()
            .with_json("root1", listing(&[("f1", "lig.xlsx", "2025-09-01T10:00:00Z")]))
            .with_bytes("files/f1?alt=media", v1)
            .with_text("callmebot", 200, "Message queued.");
        let handle = backend.clone();
        let client = DriveClient::with_backend(backend.clone(), "key");
        let notifier = Notifier::with_backend(backend, &settings.whatsapp);

        let r1 = run_sync(&conn, &client, Some(&notifier), &settings, now).await.unwrap();
        assert_eq!(r1.new_assignments.len(), 1);
        assert_eq!(r1.notified, 1);

        // the sheet gets re-published with one extra row; canned entries
        // added later win ties, so these replace the originals
        let v2 = schedule_bytes(&[
            ["07.09.2025", "14:30", "Salon A", "Göztepe", "Karşıyaka", "AHMET YILMAZ", "", ""],
            ["14.09.2025", "16:00", "Salon A", "Karşıyaka", "Buca", "", "AHMET YILMAZ", ""],
        ]);
        let _ = handle
            .clone()
            .with_json("root1", listing(&[("f1", "lig.xlsx", "2025-09-02T09:00:00Z")]))
            .with_bytes("files/f1?alt=media", v2);

        let r2 = run_sync(&conn, &client, Some(&notifier), &settings, now).await.unwrap();
        assert_eq!(r2.files_scanned, 1);
        assert_eq!(r2.new_assignments.len(), 1);
        assert_eq!(r2.new_assignments[0].date, "2025-09-14");
        assert_eq!(r2.updated, 1);
        assert_eq!(r2.notified, 1);

        let total: i64 = conn
            .query_row("SELECT count(*) FROM assignments", [], |r| r.get(0))
            .unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_sync_tolerates_download_and_notify_failures() {
        let (_dir, conn) = test_db();
        let settings = test_settings();
        let now = noon("2025-09-01");

        let good = schedule_bytes(&[
            ["07.09.2025", "14:30", "Salon A", "Göztepe", "Karşıyaka", "AHMET YILMAZ", "", ""],
        ]);
        // f2 has no canned bytes, so its download 404s; the gateway rejects
        // every message
        let backend = FakeBackend::new()
            .with_json(
                "root1",
                listing(&[
                    ("f1", "lig_a.xlsx", "2025-09-01T10:00:00Z"),
                    ("f2", "lig_b.xlsx", "2025-09-01T10:00:00Z"),
                ]),
            )
            .with_bytes("files/f1?alt=media", good)
            .with_text("callmebot", 200, "ERROR: APIKey is invalid");
        let client = DriveClient::with_backend(backend.clone(), "key");
        let notifier = Notifier::with_backend(backend, &settings.whatsapp);

        let report = run_sync(&conn, &client, Some(&notifier), &settings, now)
            .await
            .unwrap();
        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.files_failed, 1);
        assert_eq!(report.new_assignments.len(), 1);
        assert_eq!(report.notified, 0);
        assert_eq!(report.notify_failures, 1);

        // failed notifications stay pending for the next run
        assert_eq!(register::unnotified_upcoming(&conn, now).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sync_without_notifier_keeps_assignments_pending() {
        let (_dir, conn) = test_db();
        let settings = test_settings();
        let now = noon("2025-09-01");

        let bytes = schedule_bytes(&[
            ["07.09.2025", "14:30", "Salon A", "Göztepe", "Karşıyaka", "AHMET YILMAZ", "", ""],
        ]);
        let backend = FakeBackend::new()
            .with_json("root1", listing(&[("f1", "lig.xlsx", "2025-09-01T10:00:00Z")]))
            .with_bytes("files/f1?alt=media", bytes);
        let handle = backend.clone();
        let client = DriveClient::with_backend(backend, "key");

        let report = run_sync(&conn, &client, None::<&Notifier<FakeBackend>>, &settings, now)
            .await
            .unwrap();
        assert_eq!(report.new_assignments.len(), 1);
        assert_eq!(report.notified, 0);
        assert_eq!(register::unnotified_upcoming(&conn, now).unwrap().len(), 1);
        assert!(handle.requests().iter().all(|u| !u.contains("callmebot")));
    }

    #[tokio::test]
    async fn test_sync_requires_person_and_folder() {
        let (_dir, conn) = test_db();
        let client = DriveClient::with_backend(FakeBackend::new(), "key");
        let now = noon("2025-09-01");

        let mut settings = test_settings();
        settings.person = String::new();
        let result = run_sync(&conn, &client, None::<&Notifier<FakeBackend>>, &settings, now).await;
        assert!(matches!(result, Err(CourtsideError::NotConfigured(_))));

        let mut settings = test_settings();
        settings.drive.folder_id = String::new();
        let result = run_sync(&conn, &client, None::<&Notifier<FakeBackend>>, &settings, now).await;
        assert!(matches!(result, Err(CourtsideError::NotConfigured(_))));
    }
}
