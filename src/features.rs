//! Cyclical month encoding for transaction timestamps.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::f64::consts::PI;

use crate::constants::columns::{MONTH_COS, MONTH_SIN};
use crate::constants::features::MONTHS_PER_YEAR;
use crate::errors::DatasetError;
use crate::source::{FeatureSource, Projection};
use crate::table::column_names;
use crate::types::ColumnName;

/// `(sin, cos)` of the date's month on a 12-step circle, so December and
/// January end up adjacent.
pub fn month_cyclical(date: impl Datelike) -> (f64, f64) {
    let angle = 2.0 * PI * f64::from(date.month()) / MONTHS_PER_YEAR;
    (angle.sin(), angle.cos())
}

/// Append `month_sin` / `month_cos` computed from an ISO date (`YYYY-MM-DD`) column.
///
/// Null dates give null features; unparseable dates are an error. Existing
/// month columns are replaced.
pub fn add_month_features(frame: &DataFrame, date_column: &str) -> Result<DataFrame, DatasetError> {
    let dates = frame
        .column(date_column)
        .map_err(|_| DatasetError::Schema(format!("missing date column '{date_column}'")))?;
    let dates = dates.str().map_err(|_| {
        DatasetError::Schema(format!(
            "date column '{date_column}' must hold text, found {}",
            dates.dtype()
        ))
    })?;
    let mut sin = Vec::with_capacity(frame.height());
    let mut cos = Vec::with_capacity(frame.height());
    for (idx, raw) in dates.into_iter().enumerate() {
        let encoded = match raw {
            Some(raw) => {
                let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|err| {
                    DatasetError::Schema(format!(
                        "row {idx} of '{date_column}': '{raw}' is not a YYYY-MM-DD date ({err})"
                    ))
                })?;
                Some(month_cyclical(date))
            }
            None => None,
        };
        sin.push(encoded.map(|(s, _)| s));
        cos.push(encoded.map(|(_, c)| c));
    }
    let keep: Vec<String> = column_names(frame)
        .into_iter()
        .filter(|name| name != MONTH_SIN && name != MONTH_COS)
        .collect();
    let mut enriched = frame.select(keep)?;
    enriched.with_column(Series::new(MONTH_SIN.into(), sin))?;
    enriched.with_column(Series::new(MONTH_COS.into(), cos))?;
    Ok(enriched)
}

/// Source adapter that derives month features from a raw date column before
/// applying the requested projection.
pub struct MonthFeatureSource<S> {
    inner: S,
    date_column: ColumnName,
}

impl<S: FeatureSource> MonthFeatureSource<S> {
    /// Wrap `inner`, reading dates from `date_column`.
    pub fn new(inner: S, date_column: impl Into<ColumnName>) -> Self {
        Self {
            inner,
            date_column: date_column.into(),
        }
    }
}

impl<S: FeatureSource> FeatureSource for MonthFeatureSource<S> {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn scan(&self, projection: &Projection) -> Result<DataFrame, DatasetError> {
        let raw = self.inner.scan(&Projection::All)?;
        let enriched = add_month_features(&raw, &self.date_column).map_err(|err| {
            DatasetError::SourceInconsistent {
                source_id: self.inner.id().to_string(),
                details: err.to_string(),
            }
        })?;
        projection.apply(self.inner.id(), &enriched)
    }
}
