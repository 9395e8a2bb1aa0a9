use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::debug;

use crate::errors::DatasetError;
use crate::source::{FeatureSource, Projection};
use crate::types::SourceId;

/// Feature source backed by a single Parquet file.
///
/// Column types come from the file schema, so typed columns survive files with
/// no rows or only nulls.
pub struct ParquetSource {
    id: SourceId,
    path: PathBuf,
}

impl ParquetSource {
    /// Create a Parquet source.
    pub fn new(id: impl Into<SourceId>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<DataFrame, DatasetError> {
        let file = File::open(&self.path).map_err(|err| DatasetError::SourceUnavailable {
            source_id: self.id.clone(),
            reason: format!("failed opening parquet file {}: {err}", self.path.display()),
        })?;
        let frame = ParquetReader::new(file)
            .finish()
            .map_err(|err| DatasetError::SourceInconsistent {
                source_id: self.id.clone(),
                details: format!("failed reading parquet file {}: {err}", self.path.display()),
            })?;
        debug!(
            "[ranking:source] parquet source='{}' rows={} columns={}",
            self.id,
            frame.height(),
            frame.width()
        );
        Ok(frame)
    }
}

impl FeatureSource for ParquetSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn scan(&self, projection: &Projection) -> Result<DataFrame, DatasetError> {
        let frame = self.load()?;
        projection.apply(&self.id, &frame)
    }
}
