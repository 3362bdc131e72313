pub mod api;
pub mod auth;

// Domain models and database operations live in the core crate.
pub use minutes_core::{db, error, models};
