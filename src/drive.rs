use std::collections::VecDeque;

use serde::Deserialize;
use url::Url;

use crate::error::{CourtsideError, Result};
use crate::http::{HttpBackend, ReqwestBackend};

pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
pub const SHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
pub const XLSX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const API_BASE: &str = "https://www.googleapis.com/drive/v3";
const PAGE_SIZE: &str = "1000";
// Federation folders nest season/league/district; anything deeper is a loop.
const MAX_DEPTH: usize = 10;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub modified_time: Option<String>,
    /// Drive serializes sizes as decimal strings, absent for native docs.
    #[serde(default)]
    pub size: Option<String>,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME
    }

    /// A native Google Sheet, which has to go through the export endpoint.
    pub fn is_native_sheet(&self) -> bool {
        self.mime_type == SHEET_MIME
    }

    /// Anything we can hand to the scanner: native sheets plus uploaded
    /// xlsx/xls files, some of which arrive with a generic mime type.
    pub fn is_spreadsheet(&self) -> bool {
        if self.is_native_sheet()
            || self.mime_type == XLSX_MIME
            || self.mime_type == "application/vnd.ms-excel"
            || self.mime_type == "application/vnd.oasis.opendocument.spreadsheet"
        {
            return true;
        }
        let name = self.name.to_lowercase();
        name.ends_with(".xlsx") || name.ends_with(".xls") || name.ends_with(".ods")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListPage {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// A spreadsheet found somewhere under the root folder, with the folder path
/// it was found at ("" for the root itself).
#[derive(Debug, Clone)]
pub struct RemoteSheet {
    pub file: DriveFile,
    pub folder: String,
}

#[derive(Debug)]
pub struct SubtreeFailure {
    pub folder: String,
    pub message: String,
}

/// Result of walking the root folder. A broken subtree does not take the
/// rest of the walk down with it; it lands in `failures` instead.
#[derive(Debug, Default)]
pub struct FolderScan {
    pub sheets: Vec<RemoteSheet>,
    pub failures: Vec<SubtreeFailure>,
}

// ---------------------------------------------------------------------------
// Drive client
// ---------------------------------------------------------------------------

pub type DefaultDriveClient = DriveClient<ReqwestBackend>;

pub struct DriveClient<B: HttpBackend> {
    backend: B,
    base_url: String,
    api_key: String,
}

impl DefaultDriveClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            backend: ReqwestBackend::new(),
            base_url: API_BASE.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

impl<B: HttpBackend> DriveClient<B> {
    #[cfg(test)]
    pub(crate) fn with_backend(backend: B, api_key: &str) -> Self {
        Self {
            backend,
            base_url: API_BASE.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn list_url(&self, folder_id: &str, page_token: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/files", self.base_url))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("q", &format!("'{folder_id}' in parents and trashed=false"))
                .append_pair(
                    "fields",
                    "files(id,name,mimeType,modifiedTime,size),nextPageToken",
                )
                .append_pair("pageSize", PAGE_SIZE)
                .append_pair("orderBy", "folder,name")
                .append_pair("key", &self.api_key);
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        Ok(url)
    }

    /// Direct children of one folder, following nextPageToken to the end.
    pub async fn list_children(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let url = self.list_url(folder_id, page_token.as_deref())?;
            let page: FileListPage = self.backend.get_json(&url).await?;
            out.extend(page.files);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(out)
    }

    /// Walk the folder tree under `root_id` and collect every spreadsheet.
    /// A subtree that fails to list is recorded and skipped; only a failure
    /// at the root itself aborts the walk.
    pub async fn walk_folder(&self, root_id: &str) -> Result<FolderScan> {
        let mut scan = FolderScan::default();
        let mut queue: VecDeque<(String, String, usize)> = VecDeque::new();
        queue.push_back((root_id.to_string(), String::new(), 0));

        while let Some((folder_id, path, depth)) = queue.pop_front() {
            let children = match self.list_children(&folder_id).await {
                Ok(c) => c,
                Err(CourtsideError::ApiStatus { status: 404, .. }) if path.is_empty() => {
                    return Err(CourtsideError::FolderNotFound(root_id.to_string()));
                }
                Err(e) if path.is_empty() => return Err(e),
                Err(e) => {
                    tracing::warn!(folder = %path, "skipping unreadable subtree: {e}");
                    scan.failures.push(SubtreeFailure {
                        folder: path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            for child in children {
                if child.is_folder() {
                    let child_path = if path.is_empty() {
                        child.name.clone()
                    } else {
                        format!("{path}/{}", child.name)
                    };
                    if depth + 1 > MAX_DEPTH {
                        tracing::warn!(folder = %child_path, "folder nesting too deep, skipping");
                        scan.failures.push(SubtreeFailure {
                            folder: child_path,
                            message: "folder nesting too deep".to_string(),
                        });
                        continue;
                    }
                    queue.push_back((child.id.clone(), child_path, depth + 1));
                } else if child.is_spreadsheet() {
                    scan.sheets.push(RemoteSheet {
                        file: child,
                        folder: path.clone(),
                    });
                }
            }
        }
        Ok(scan)
    }

    /// Download a spreadsheet as xlsx bytes. Native Google Sheets go through
    /// the export endpoint, everything else is fetched as stored.
    pub async fn fetch_sheet(&self, file: &DriveFile) -> Result<Vec<u8>> {
        let url = if file.is_native_sheet() {
            let mut url = Url::parse(&format!("{}/files/{}/export", self.base_url, file.id))?;
            url.query_pairs_mut()
                .append_pair("mimeType", XLSX_MIME)
                .append_pair("key", &self.api_key);
            url
        } else {
            let mut url = Url::parse(&format!("{}/files/{}", self.base_url, file.id))?;
            url.query_pairs_mut()
                .append_pair("alt", "media")
                .append_pair("key", &self.api_key);
            url
        };
        self.backend.get_bytes(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::FakeBackend;
    use serde_json::json;

    fn file_json(id: &str, name: &str, mime: &str) -> serde_json::Value {
        json!({"id": id, "name": name, "mimeType": mime, "modifiedTime": "2025-09-01T10:00:00Z"})
    }

    #[test]
    fn test_is_spreadsheet() {
        let native = DriveFile {
            id: "a".into(),
            name: "Fikstür".into(),
            mime_type: SHEET_MIME.into(),
            modified_time: None,
            size: None,
        };
        assert!(native.is_spreadsheet());
        assert!(native.is_native_sheet());

        let uploaded = DriveFile {
            id: "b".into(),
            name: "Program.XLSX".into(),
            mime_type: "application/octet-stream".into(),
            modified_time: None,
            size: Some("1024".into()),
        };
        assert!(uploaded.is_spreadsheet());
        assert!(!uploaded.is_native_sheet());

        let ods = DriveFile {
            id: "c".into(),
            name: "fikstur.ods".into(),
            mime_type: "application/vnd.oasis.opendocument.spreadsheet".into(),
            modified_time: None,
            size: Some("2048".into()),
        };
        assert!(ods.is_spreadsheet());

        let pdf = DriveFile {
            id: "d".into(),
            name: "duyuru.pdf".into(),
            mime_type: "application/pdf".into(),
            modified_time: None,
            size: Some("99".into()),
        };
        assert!(!pdf.is_spreadsheet());
    }

    #[tokio::test]
    async fn test_list_children_follows_page_tokens() {
        let backend = FakeBackend::new()
            .with_json(
                "root1",
                json!({
                    "files": [file_json("f1", "a.xlsx", XLSX_MIME), file_json("f2", "b.xlsx", XLSX_MIME)],
                    "nextPageToken": "tok2"
                }),
            )
            .with_json(
                "pageToken=tok2",
                json!({"files": [file_json("f3", "c.xlsx", XLSX_MIME)]}),
            );
        let client = DriveClient::with_backend(backend, "test-key");
        let files = client.list_children("root1").await.unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(files[2].id, "f3");
    }

    #[tokio::test]
    async fn test_walk_folder_collects_sheets_and_tolerates_broken_subtrees() {
        // root: one subfolder (whose listing will 404), two sheets, one pdf
        let backend = FakeBackend::new().with_json(
            "root1",
            json!({"files": [
                file_json("sub1", "2025-26 Sezonu", FOLDER_MIME),
                file_json("f1", "lig_programi.xlsx", XLSX_MIME),
                file_json("f2", "Fikstür", SHEET_MIME),
                file_json("f3", "duyuru.pdf", "application/pdf"),
            ]}),
        );
        let client = DriveClient::with_backend(backend, "test-key");
        let scan = client.walk_folder("root1").await.unwrap();

        assert_eq!(scan.sheets.len(), 2);
        assert!(scan.sheets.iter().all(|s| s.folder.is_empty()));
        assert_eq!(scan.failures.len(), 1);
        assert_eq!(scan.failures[0].folder, "2025-26 Sezonu");
    }

    #[tokio::test]
    async fn test_walk_folder_prefixes_subfolder_paths() {
        let backend = FakeBackend::new()
            .with_json(
                "root1",
                json!({"files": [file_json("sub1", "Erkekler", FOLDER_MIME)]}),
            )
            .with_json(
                "sub1",
                json!({"files": [file_json("f1", "hafta1.xlsx", XLSX_MIME)]}),
            );
        let client = DriveClient::with_backend(backend, "test-key");
        let scan = client.walk_folder("root1").await.unwrap();
        assert_eq!(scan.sheets.len(), 1);
        assert_eq!(scan.sheets[0].folder, "Erkekler");
        assert!(scan.failures.is_empty());
    }

    #[tokio::test]
    async fn test_walk_folder_missing_root_is_fatal() {
        let client = DriveClient::with_backend(FakeBackend::new(), "test-key");
        let result = client.walk_folder("gone").await;
        assert!(matches!(result, Err(CourtsideError::FolderNotFound(_))));
    }

    #[tokio::test]
    async fn test_fetch_sheet_picks_download_or_export() {
        let backend = FakeBackend::new()
            .with_bytes("files/plain1?alt=media", b"xlsx-bytes".to_vec())
            .with_bytes("files/native1/export", b"exported-bytes".to_vec());
        let client = DriveClient::with_backend(backend, "test-key");

        let plain = DriveFile {
            id: "plain1".into(),
            name: "a.xlsx".into(),
            mime_type: XLSX_MIME.into(),
            modified_time: None,
            size: None,
        };
        assert_eq!(client.fetch_sheet(&plain).await.unwrap(), b"xlsx-bytes");

        let native = DriveFile {
            id: "native1".into(),
            name: "Fikstür".into(),
            mime_type: SHEET_MIME.into(),
            modified_time: None,
            size: None,
        };
        assert_eq!(client.fetch_sheet(&native).await.unwrap(), b"exported-bytes");
    }

    #[tokio::test]
    async fn test_list_url_carries_key_and_query() {
        let backend = FakeBackend::new().with_json("root1", json!({"files": []}));
        let handle = backend.clone();
        let client = DriveClient::with_backend(backend, "secret-key");
        client.list_children("root1").await.unwrap();

        let requests = handle.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains("key=secret-key"));
        assert!(requests[0].contains("trashed%3Dfalse") || requests[0].contains("trashed=false"));
        assert!(requests[0].contains("pageSize=1000"));
    }
}
