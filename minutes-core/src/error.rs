use thiserror::Error;

/// Failures surfaced by the store.
///
/// `InvalidInput` means the caller's input was rejected before any database
/// interaction took place. Missing rows are reported as `Option::None` /
/// `false` by the individual operations rather than as an error variant.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
