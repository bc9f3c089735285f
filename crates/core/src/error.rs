use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("entity index {index} out of range (entity count {count})")]
    EntityOutOfRange { index: usize, count: usize },

    #[error("field {field} does not hold rows")]
    NotRows { field: String },

    #[error("field {field} does not hold choices")]
    NotChoices { field: String },

    #[error("row {row} out of range for field {field} ({len} rows)")]
    RowOutOfRange { field: String, row: usize, len: usize },

    #[error("invalid data: {0}")]
    InvalidData(String),
}
