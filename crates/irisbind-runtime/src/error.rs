use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The process is not running inside an IRIS instance (or the session is not authenticated).
    #[error("Embedded Python not available: {0}")]
    NotAvailable(String),

    #[error("SQL error {sqlcode}: {message}")]
    Sql { sqlcode: i32, message: String },

    #[error("ObjectScript error: {0}")]
    ObjectScript(String),

    #[error("transaction error: {0}")]
    Transaction(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
