use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use polars::prelude::*;
use tracing::debug;

use crate::errors::DatasetError;
use crate::source::{FeatureSource, Projection};
use crate::types::{ColumnName, SourceId};

/// Feature source backed by a headered CSV file.
///
/// Column types are inferred by polars over every row. Empty cells are nulls.
/// Use `with_column_type` to pin a column, for example zero-padded identifiers
/// that must stay strings, or key columns that must keep their type when the
/// file has no data rows.
pub struct CsvSource {
    id: SourceId,
    path: PathBuf,
    delimiter: u8,
    overrides: IndexMap<ColumnName, DataType>,
}

impl CsvSource {
    /// Create a comma-delimited CSV source.
    pub fn new(id: impl Into<SourceId>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            delimiter: b',',
            overrides: IndexMap::new(),
        }
    }

    /// Use a different field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Force `column` to `dtype` instead of inferring it. The column must exist
    /// in the file header.
    pub fn with_column_type(mut self, column: impl Into<ColumnName>, dtype: DataType) -> Self {
        self.overrides.insert(column.into(), dtype);
        self
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<DataFrame, DatasetError> {
        if !self.path.is_file() {
            return Err(DatasetError::SourceUnavailable {
                source_id: self.id.clone(),
                reason: format!("no such file {}", self.path.display()),
            });
        }
        let mut overwrite = Schema::default();
        for (name, dtype) in &self.overrides {
            overwrite.with_column(name.as_str().into(), dtype.clone());
        }
        let delimiter = self.delimiter;
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .with_schema_overwrite(Some(Arc::new(overwrite)))
            .map_parse_options(|options| options.with_separator(delimiter))
            .try_into_reader_with_file_path(Some(self.path.clone()))
            .and_then(|reader| reader.finish())
            .map_err(|err| DatasetError::SourceInconsistent {
                source_id: self.id.clone(),
                details: format!("failed parsing {}: {err}", self.path.display()),
            })?;
        debug!(
            "[ranking:source] csv source='{}' rows={} columns={}",
            self.id,
            frame.height(),
            frame.width()
        );
        Ok(frame)
    }
}

impl FeatureSource for CsvSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn scan(&self, projection: &Projection) -> Result<DataFrame, DatasetError> {
        let frame = self.load()?;
        projection.apply(&self.id, &frame)
    }
}
