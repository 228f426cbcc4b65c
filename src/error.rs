use thiserror::Error;

pub type Result<T> = std::result::Result<T, PortalError>;

/// Failures surfaced by the import, rollback, and view operations.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The source file extension is neither `.csv` nor `.xlsx`.
    #[error("unsupported file format '{0}': only .xlsx or .csv supported")]
    UnsupportedFormat(String),

    /// A required canonical column is absent from the table header.
    #[error("{kind}: missing column '{column}'")]
    MissingColumn { kind: String, column: String },

    #[error("unknown upload kind '{0}'")]
    UnknownKind(String),

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet read error: {0}")]
    Spreadsheet(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store's write lock could not be acquired within the busy timeout.
    #[error("database is busy: {0}")]
    Busy(String),

    #[error("database error: {0}")]
    Store(rusqlite::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),
}

impl From<rusqlite::Error> for PortalError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
                PortalError::Busy(e.to_string())
            }
            _ => PortalError::Store(e),
        }
    }
}

impl From<calamine::XlsxError> for PortalError {
    fn from(e: calamine::XlsxError) -> Self {
        PortalError::Spreadsheet(e.to_string())
    }
}

impl PortalError {
    /// Stable error code reported over IPC.
    pub fn code(&self) -> &'static str {
        match self {
            PortalError::UnsupportedFormat(_) => "unsupported_format",
            PortalError::MissingColumn { .. } => "missing_column",
            PortalError::UnknownKind(_) | PortalError::InvalidInput(_) => "bad_params",
            PortalError::Csv(_) | PortalError::Spreadsheet(_) => "parse_failed",
            PortalError::Io(_) => "io_failed",
            PortalError::Busy(_) => "busy",
            PortalError::Store(_) => "db_query_failed",
            PortalError::NotFound(_) => "not_found",
        }
    }
}
