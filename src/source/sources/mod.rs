/// CSV file backed feature source.
pub mod csv_source;
/// Parquet file backed feature source.
pub mod parquet_source;
