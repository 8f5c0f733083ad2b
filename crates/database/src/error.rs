use thiserror::Error;

/// Failure to establish the database session.
///
/// Cloneable so that every caller awaiting the same handshake observes the
/// same cause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Invalid database target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Failed to connect to the database at {target}: {reason}")]
    Handshake { target: String, reason: String },
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("The database connection has not been established.")]
    NotConnected,

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
