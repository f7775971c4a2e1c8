use thiserror::Error;

#[derive(Error, Debug)]
pub enum CourtsideError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Sheet(#[from] calamine::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Drive API returned {status} for {url}")]
    ApiStatus { status: u16, url: String },

    #[error("Drive folder not found: {0} (is it shared publicly?)")]
    FolderNotFound(String),

    #[error("WhatsApp gateway rejected the message: {0}")]
    Gateway(String),

    #[error("No assignment with id {0}")]
    UnknownAssignment(i64),

    #[error("Assignment {0} comes from a schedule without the payment marker; nothing to track")]
    NotPaymentEligible(i64),

    #[error("Not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CourtsideError>;
