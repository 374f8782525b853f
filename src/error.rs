use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Malformed row {row} in sheet '{sheet}': column '{column}' {reason}")]
    MalformedRow {
        sheet: String,
        row: usize,
        column: String,
        reason: String,
    },

    #[error("No marketing data found in any sheet")]
    NoData,

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
