use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, error::ErrorKind};
use polars::prelude::DataType;
use tracing::{info, warn};

use crate::config::{EmptyInputPolicy, RankingConfig};
use crate::constants::columns::{ARTICLE_ID, CUSTOMER_ID, QUERY_FEATURES};
use crate::export::ModelExport;
use crate::features::MonthFeatureSource;
use crate::ranking::{RankingDatasetBuilder, item_catalog, positive_rows};
use crate::source::{CsvSource, FeatureSource, FeatureSourceExt, ParquetSource};
use crate::table::FrameExt;

type DynSource = Box<dyn FeatureSource + 'static>;

#[derive(Debug, Parser)]
#[command(
    name = "build_ranking_dataset",
    disable_help_subcommand = true,
    about = "Build a labeled ranking dataset with sampled negatives",
    long_about = "Join transaction, article, and customer feature files into positive pairs, add ten sampled negatives per positive, attach item attributes, and write the result as CSV.",
    after_help = "Feature files are read as Parquet when the extension is .parquet and as CSV otherwise."
)]
/// CLI for `build_ranking_dataset`.
///
/// Common usage:
/// - `--transactions t.csv --articles a.parquet --customers c.csv --output ranking.csv`
/// - Add `--transaction-date-column t_dat` when transactions carry raw dates
///   instead of `month_sin` / `month_cos`.
/// - Add `--export-dir models/` to also write query/candidate model manifests.
struct BuildRankingDatasetCli {
    #[arg(long, value_name = "PATH", help = "Transaction feature file")]
    transactions: PathBuf,
    #[arg(long, value_name = "PATH", help = "Article feature file")]
    articles: PathBuf,
    #[arg(long, value_name = "PATH", help = "Customer feature file")]
    customers: PathBuf,
    #[arg(long, value_name = "PATH", help = "Destination CSV for the ranking dataset")]
    output: PathBuf,
    #[arg(
        long = "transaction-date-column",
        value_name = "COLUMN",
        help = "Derive month_sin/month_cos from this YYYY-MM-DD transaction column"
    )]
    transaction_date_column: Option<String>,
    #[arg(long = "reject-empty", help = "Fail when the transaction file has no rows")]
    reject_empty: bool,
    #[arg(
        long = "strict-catalog",
        help = "Fail when transactions reference articles missing from the article file"
    )]
    strict_catalog: bool,
    #[arg(
        long = "export-dir",
        value_name = "DIR",
        help = "Also write query/candidate model manifests under this directory"
    )]
    export_dir: Option<PathBuf>,
    #[arg(
        long = "embedding-dim",
        default_value_t = 16,
        value_parser = parse_positive_usize,
        help = "Embedding width declared in model manifests"
    )]
    embedding_dim: usize,
}

/// Parse CLI args, build the ranking dataset, and write it (plus optional manifests).
pub fn run_build_ranking_dataset<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<BuildRankingDatasetCli, _>(
        std::iter::once("build_ranking_dataset".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let raw_transactions = open_source(
        "transactions",
        &cli.transactions,
        &[(ARTICLE_ID, DataType::Int64), (CUSTOMER_ID, DataType::String)],
    );
    let transactions: DynSource = match &cli.transaction_date_column {
        Some(column) => Box::new(MonthFeatureSource::new(raw_transactions, column.clone())),
        None => raw_transactions,
    };
    let articles = open_source("articles", &cli.articles, &[(ARTICLE_ID, DataType::Int64)]);
    let customers = open_source("customers", &cli.customers, &[(CUSTOMER_ID, DataType::String)]);

    let config = RankingConfig {
        empty_input: if cli.reject_empty {
            EmptyInputPolicy::Reject
        } else {
            EmptyInputPolicy::Proceed
        },
        strict_catalog: cli.strict_catalog,
    };
    let dataset = RankingDatasetBuilder::new(&*transactions, &*articles, &*customers)
        .with_config(config)
        .build()?;
    dataset.table.write_csv_path(&cli.output)?;
    info!(
        "[ranking:app] wrote {} rows to {} (fingerprint={:016x})",
        dataset.table.height(),
        cli.output.display(),
        dataset.table.fingerprint()?
    );
    println!(
        "positives={} negatives={} dropped={} rows={} output={}",
        dataset.stats.positives,
        dataset.stats.negatives,
        dataset.stats.dropped_rows,
        dataset.table.height(),
        cli.output.display()
    );

    if let Some(export_dir) = &cli.export_dir {
        if dataset.table.height() == 0 {
            warn!(
                "[ranking:app] dataset is empty; skipping model manifests under {}",
                export_dir.display()
            );
            return Ok(());
        }
        let query_columns: Vec<&str> = QUERY_FEATURES
            .into_iter()
            .filter(|column| *column != ARTICLE_ID)
            .collect();
        let query_features = positive_rows(&dataset.table)?.select(query_columns)?;
        let items = item_catalog(&articles.read()?)?;
        for export in [
            ModelExport::query_model(&query_features, cli.embedding_dim)?,
            ModelExport::candidate_model(&items, cli.embedding_dim)?,
        ] {
            let path = export.save(export_dir)?;
            println!("manifest={} path={}", export.name, path.display());
        }
    }
    Ok(())
}

/// Parquet files carry their own types; CSV key columns are pinned so that
/// zero-padded ids stay text and header-only files keep joinable keys.
fn open_source(id: &str, path: &Path, keys: &[(&str, DataType)]) -> DynSource {
    let is_parquet = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        return Box::new(ParquetSource::new(id, path));
    }
    Box::new(
        keys.iter()
            .fold(CsvSource::new(id, path), |source, (column, dtype)| {
                source.with_column_type(*column, dtype.clone())
            }),
    )
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw.parse::<usize>().map_err(|_| {
        format!(
            "Could not parse --embedding-dim value '{}' as a positive integer",
            raw
        )
    })?;
    if parsed == 0 {
        return Err("--embedding-dim must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_usize_parser_rejects_zero_and_garbage() {
        assert_eq!(parse_positive_usize("32"), Ok(32));
        assert!(parse_positive_usize("0").is_err());
        assert!(parse_positive_usize("wide").is_err());
    }

    #[test]
    fn help_is_not_an_error() {
        let parsed = parse_cli::<BuildRankingDatasetCli, _>(["build_ranking_dataset", "--help"]);
        assert!(matches!(parsed, Ok(None)));
    }

    #[test]
    fn missing_required_paths_fail_to_parse() {
        let parsed = parse_cli::<BuildRankingDatasetCli, _>(["build_ranking_dataset"]);
        assert!(parsed.is_err());
    }
}
