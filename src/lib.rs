#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line runners shared by the binaries.
pub mod apps;
/// Ranking build configuration types.
pub mod config;
/// Centralized column names, seeds, and file names.
pub mod constants;
/// Model registry manifests for the two-tower towers.
pub mod export;
/// Cyclical month features.
pub mod features;
mod hash;
/// Ranking dataset construction and negative sampling.
pub mod ranking;
mod rng;
/// Feature source traits and built-in sources.
pub mod source;
/// Dataframe helpers layered on polars.
pub mod table;
/// Shared type aliases.
pub mod types;

mod errors;

pub use config::{EmptyInputPolicy, RankingConfig};
pub use errors::DatasetError;
pub use export::{
    ModelExport, ModelSchema, Schema, SchemaColumn, ServingSignature, TensorSpec, dtype_label,
};
pub use features::{MonthFeatureSource, add_month_features, month_cyclical};
pub use ranking::{
    PairLabel, RankingDataset, RankingDatasetBuilder, RankingStats, item_catalog, label_pairs,
    negative_pairs, positive_pairs, positive_rows,
};
pub use source::{
    CsvSource, FeatureSource, FeatureSourceExt, InMemorySource, ParquetSource, Projection,
    SourceQuery,
};
pub use table::{FrameExt, column_names};
pub use types::{ColumnName, DtypeLabel, ModelName, SourceId};
