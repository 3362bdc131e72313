//! Core library for Minutes.
//!
//! This crate provides the domain models and database operations for the
//! meeting-knowledge portal, independent of any transport layer.
//!
//! # Usage
//!
//! ```no_run
//! use minutes_core::db::Database;
//! use minutes_core::models::*;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let recordings = db.list_recordings()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod db;
pub mod error;
pub mod models;

// Re-export commonly used types at crate root
pub use db::Database;
pub use error::StoreError;
