use std::io;

use polars::prelude::PolarsError;
use thiserror::Error;

use crate::types::SourceId;

/// Error type for source reads, frame operations, and manifest persistence.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The backing store could not be opened or read.
    #[error("feature source '{source_id}' is unavailable: {reason}")]
    SourceUnavailable {
        /// Source that failed.
        source_id: SourceId,
        /// Underlying failure, as reported by the store.
        reason: String,
    },
    /// The store was readable but its records do not fit the request.
    #[error("feature source '{source_id}' returned inconsistent data: {details}")]
    SourceInconsistent {
        /// Source that returned the records.
        source_id: SourceId,
        /// What did not fit.
        details: String,
    },
    /// A column is missing or has a type the operation cannot use.
    #[error("schema error: {0}")]
    Schema(String),
    /// Failure inside a dataframe operation.
    #[error(transparent)]
    Frame(#[from] PolarsError),
    /// Filesystem failure while writing output or manifests.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// An argument is out of range for the operation.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Input has no rows where rows are required.
    #[error("empty input: {0}")]
    EmptyInput(String),
    /// The item catalog join dropped pair rows under `strict_catalog`.
    #[error("item catalog is missing articles referenced by {dropped} pair rows")]
    MissingCatalogRows {
        /// Pair rows without a catalog match.
        dropped: usize,
    },
}
