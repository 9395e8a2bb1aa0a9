//! Feature source interfaces and the built-in sources.
//!
//! Ownership model:
//! - `FeatureSource` is the builder-facing interface: one `scan` call that
//!   materializes a projected `DataFrame`.
//! - `FeatureSourceExt` layers the `select` / `select_except` / `read` query
//!   surface on top of any source, including trait objects.
//! - `Projection` owns column selection so every backend projects identically.

use polars::prelude::DataFrame;

use crate::errors::DatasetError;
use crate::table::column_names;
use crate::types::{ColumnName, SourceId};

/// Source implementation modules.
pub mod sources;

pub use sources::csv_source::CsvSource;
pub use sources::parquet_source::ParquetSource;

/// Column selection applied to a source read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Projection {
    /// Every stored column, in source order.
    All,
    /// Exactly these columns, in this order. Missing columns are an error.
    Only(Vec<ColumnName>),
    /// Every stored column except these. Unknown names are ignored.
    Except(Vec<ColumnName>),
}

impl Projection {
    /// Build an `Only` projection.
    pub fn only<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnName>,
    {
        Projection::Only(columns.into_iter().map(Into::into).collect())
    }

    /// Build an `Except` projection.
    pub fn except<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnName>,
    {
        Projection::Except(columns.into_iter().map(Into::into).collect())
    }

    /// Apply the projection to a fully read frame from `source_id`.
    pub fn apply(&self, source_id: &str, frame: &DataFrame) -> Result<DataFrame, DatasetError> {
        match self {
            Projection::All => Ok(frame.clone()),
            Projection::Only(columns) => {
                if let Some(missing) = columns
                    .iter()
                    .find(|column| frame.get_column_index(column).is_none())
                {
                    return Err(DatasetError::SourceInconsistent {
                        source_id: source_id.to_string(),
                        details: format!(
                            "requested column '{missing}' is not stored (available: {})",
                            column_names(frame).join(", ")
                        ),
                    });
                }
                Ok(frame.select(columns.iter().map(String::as_str))?)
            }
            Projection::Except(columns) => {
                let keep: Vec<String> = column_names(frame)
                    .into_iter()
                    .filter(|name| !columns.contains(name))
                    .collect();
                Ok(frame.select(keep)?)
            }
        }
    }
}

/// Builder-facing feature source interface.
///
/// For an unchanged backing store, `scan` must return the same frame on every
/// call. Row order is the store's order; callers do not rely on it being sorted.
pub trait FeatureSource: Send + Sync {
    /// Stable source identifier used in errors and logs.
    fn id(&self) -> &str;

    /// Materialize the stored records restricted to `projection`.
    fn scan(&self, projection: &Projection) -> Result<DataFrame, DatasetError>;
}

impl<T: FeatureSource + ?Sized> FeatureSource for Box<T> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn scan(&self, projection: &Projection) -> Result<DataFrame, DatasetError> {
        (**self).scan(projection)
    }
}

/// A pending read against a feature source.
pub struct SourceQuery<'a, S: ?Sized> {
    source: &'a S,
    projection: Projection,
}

impl<'a, S: FeatureSource + ?Sized> SourceQuery<'a, S> {
    /// Projection this query will apply.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Execute the read.
    pub fn read(&self) -> Result<DataFrame, DatasetError> {
        self.source.scan(&self.projection)
    }
}

/// Query surface shared by every `FeatureSource`.
pub trait FeatureSourceExt: FeatureSource {
    /// Restrict a read to exactly `columns`.
    fn select<I, C>(&self, columns: I) -> SourceQuery<'_, Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnName>,
    {
        SourceQuery {
            source: self,
            projection: Projection::only(columns),
        }
    }

    /// Read every column except `columns`.
    fn select_except<I, C>(&self, columns: I) -> SourceQuery<'_, Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnName>,
    {
        SourceQuery {
            source: self,
            projection: Projection::except(columns),
        }
    }

    /// Read every stored column.
    fn read(&self) -> Result<DataFrame, DatasetError> {
        self.scan(&Projection::All)
    }
}

impl<T: FeatureSource + ?Sized> FeatureSourceExt for T {}

/// In-memory feature source for tests and small datasets.
pub struct InMemorySource {
    id: SourceId,
    frame: DataFrame,
}

impl InMemorySource {
    /// Create an in-memory source from a prebuilt frame.
    pub fn new(id: impl Into<SourceId>, frame: DataFrame) -> Self {
        Self {
            id: id.into(),
            frame,
        }
    }
}

impl FeatureSource for InMemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn scan(&self, projection: &Projection) -> Result<DataFrame, DatasetError> {
        projection.apply(&self.id, &self.frame)
    }
}
