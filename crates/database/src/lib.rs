//! # Matka Database Crate
//!
//! This crate owns the process-wide connection to the document database.
//!
//! ## Architectural Principles
//!
//! - **Single Session:** Exactly one database session exists per process. It is
//!   created on first use by the [`ConnectionManager`] and shared read-only by
//!   everything else for the remainder of the process.
//! - **Connect Once:** The handshake runs at most once per manager, whether the
//!   process is a long-running server or a reused per-invocation function.
//!   Concurrent callers wait on the in-flight attempt instead of racing it.
//! - **Driver Behind a Seam:** The manager only knows the [`Connector`] trait,
//!   so tests can swap MongoDB for an in-memory fake.
//!
//! ## Public API
//!
//! - `ConnectionManager`: idempotent `ensure_connected`, readiness queries and
//!   access to the live session.
//! - `MongoConnector` / `MongoSession`: the MongoDB implementation of the seam.
//! - `ConnectionError`, `DbError`: the error types returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod manager;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{Connector, MongoConnector, MongoSession, redact_target};
pub use error::{ConnectionError, DbError};
pub use manager::{ConnectionManager, ConnectionState};

/// The manager type used by the application binary.
pub type MongoConnectionManager = ConnectionManager<MongoConnector>;
