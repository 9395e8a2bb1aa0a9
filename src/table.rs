//! Dataframe helpers the ranking builder layers on top of polars.
//!
//! Tables are plain `polars` `DataFrame`s. `FrameExt` adds the few operations
//! whose exact semantics the build depends on:
//! - seeded row resampling that does not move with the polars version;
//! - single-key equi-joins that keep left row order and reject float keys;
//! - first-occurrence dedup;
//! - a content fingerprint and CSV output.

use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{BufWriter, Write};
use std::path::Path;

use polars::prelude::*;

use crate::errors::DatasetError;
use crate::hash::stable_hash_with;
use crate::rng::sample_with_replacement;

const JOIN_ROW_INDEX: &str = "__ranking_row";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JoinKind {
    Left,
    Inner,
}

/// Column names of `frame`, in order.
pub fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Ranking-specific operations on `DataFrame`.
pub trait FrameExt {
    /// Draw `count` whole rows with replacement using a fixed seed.
    fn sample_rows(&self, count: usize, seed: u64) -> Result<DataFrame, DatasetError>;

    /// Keep the first row for each distinct value of `key` (nulls count as one value).
    fn dedup_by_key(&self, key: &str) -> Result<DataFrame, DatasetError>;

    /// Left equi-join on `on`; unmatched left rows get null right-hand columns.
    fn left_join_on(&self, right: &DataFrame, on: &str) -> Result<DataFrame, DatasetError>;

    /// Inner equi-join on `on`; unmatched left rows are dropped.
    fn inner_join_on(&self, right: &DataFrame, on: &str) -> Result<DataFrame, DatasetError>;

    /// Content hash over names, dtypes, and cell values.
    fn fingerprint(&self) -> Result<u64, DatasetError>;

    /// Write the frame as CSV with a header row; nulls are empty cells.
    fn write_csv<W: Write>(&self, writer: W) -> Result<(), DatasetError>;

    /// Write the frame as CSV to `path`, creating parent directories.
    fn write_csv_path(&self, path: &Path) -> Result<(), DatasetError>;
}

impl FrameExt for DataFrame {
    fn sample_rows(&self, count: usize, seed: u64) -> Result<DataFrame, DatasetError> {
        let indices = sample_with_replacement(self.height(), count, seed)?
            .into_iter()
            .map(|idx| {
                IdxSize::try_from(idx).map_err(|_| {
                    DatasetError::Configuration(format!("row index {idx} exceeds the index width"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.take(&IdxCa::from_vec(PlSmallStr::EMPTY, indices))?)
    }

    fn dedup_by_key(&self, key: &str) -> Result<DataFrame, DatasetError> {
        key_dtype(self, key)?;
        Ok(self
            .clone()
            .lazy()
            .filter(col(key).is_first_distinct())
            .collect()?)
    }

    fn left_join_on(&self, right: &DataFrame, on: &str) -> Result<DataFrame, DatasetError> {
        join_ordered(self, right, on, JoinKind::Left)
    }

    fn inner_join_on(&self, right: &DataFrame, on: &str) -> Result<DataFrame, DatasetError> {
        join_ordered(self, right, on, JoinKind::Inner)
    }

    fn fingerprint(&self) -> Result<u64, DatasetError> {
        let mut cells = Vec::with_capacity(self.width());
        for column in self.get_columns() {
            let values = (0..self.height())
                .map(|idx| column.get(idx))
                .collect::<PolarsResult<Vec<_>>>()?;
            cells.push((column.name().to_string(), column.dtype().to_string(), values));
        }
        Ok(stable_hash_with(|hasher| {
            self.height().hash(hasher);
            for (name, dtype, values) in &cells {
                name.hash(hasher);
                dtype.hash(hasher);
                for value in values {
                    hash_cell(value, hasher);
                }
            }
        }))
    }

    fn write_csv<W: Write>(&self, writer: W) -> Result<(), DatasetError> {
        let mut frame = self.clone();
        CsvWriter::new(writer)
            .include_header(true)
            .finish(&mut frame)?;
        Ok(())
    }

    fn write_csv_path(&self, path: &Path) -> Result<(), DatasetError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.write_csv(BufWriter::new(File::create(path)?))
    }
}

fn key_dtype(frame: &DataFrame, key: &str) -> Result<DataType, DatasetError> {
    let column = frame
        .column(key)
        .map_err(|_| DatasetError::Schema(format!("missing key column '{key}'")))?;
    let dtype = column.dtype().clone();
    if dtype.is_float() {
        return Err(DatasetError::Schema(format!(
            "column '{key}' is {dtype} and cannot be used as a key"
        )));
    }
    Ok(dtype)
}

fn cast_key(frame: &mut DataFrame, key: &str, dtype: &DataType) -> Result<(), DatasetError> {
    let cast = frame.column(key)?.cast(dtype)?;
    frame.with_column(cast)?;
    Ok(())
}

/// Joins through polars, then restores left order via a row index so output
/// order never depends on the join strategy polars picks.
fn join_ordered(
    left: &DataFrame,
    right: &DataFrame,
    on: &str,
    kind: JoinKind,
) -> Result<DataFrame, DatasetError> {
    let left_type = key_dtype(left, on)?;
    let right_type = key_dtype(right, on)?;
    let mut left = left.clone();
    let mut right = right.clone();
    // A zero-row key column carries no evidence of its type.
    if left_type != right_type {
        if left.height() == 0 {
            cast_key(&mut left, on, &right_type)?;
        } else if right.height() == 0 {
            cast_key(&mut right, on, &left_type)?;
        } else {
            return Err(DatasetError::Schema(format!(
                "join key '{on}' is {left_type} on the left but {right_type} on the right"
            )));
        }
    }

    let left = left.with_row_index(JOIN_ROW_INDEX.into(), None)?;
    let joined = match kind {
        JoinKind::Left => left.left_join(&right, [on], [on])?,
        JoinKind::Inner => left.inner_join(&right, [on], [on])?,
    };
    let ordered = joined.sort(
        [JOIN_ROW_INDEX],
        SortMultipleOptions::default().with_maintain_order(true),
    )?;
    Ok(ordered.drop(JOIN_ROW_INDEX)?)
}

fn hash_cell(value: &AnyValue<'_>, hasher: &mut impl Hasher) {
    match value {
        AnyValue::Null => 0u8.hash(hasher),
        AnyValue::Float64(v) => (1u8, v.to_bits()).hash(hasher),
        AnyValue::Float32(v) => (1u8, f64::from(*v).to_bits()).hash(hasher),
        AnyValue::String(v) => (2u8, *v).hash(hasher),
        AnyValue::StringOwned(v) => (2u8, v.as_str()).hash(hasher),
        other => (3u8, other.to_string()).hash(hasher),
    }
}
