//! Ranking dataset construction with synthetic negatives.
//!
//! Positives are observed (customer, article) interactions enriched with
//! customer age and purchase-month context. Negatives are drawn column-group
//! by column-group from the positives' marginals, so their combinations are
//! mostly implausible. Each draw uses its own fixed seed, which makes the
//! whole build reproducible for unchanged sources.

use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{EmptyInputPolicy, RankingConfig};
use crate::constants::columns::{
    ARTICLE_ID, CONTEXT_COLUMNS, CUSTOMER_COLUMNS, CUSTOMER_ID, EXCLUDED_ARTICLE_COLUMNS,
    ITEM_CATALOG_COLUMNS, LABEL, QUERY_FEATURES, TRANSACTION_COLUMNS,
};
use crate::constants::sampling::{
    ARTICLE_SEED, CONTEXT_SEED, CUSTOMER_SEED, NEGATIVES_PER_POSITIVE,
};
use crate::errors::DatasetError;
use crate::source::{FeatureSource, FeatureSourceExt};
use crate::table::{FrameExt, column_names};

/// Pair label for ranking rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairLabel {
    /// Observed interaction, label 1.
    Positive,
    /// Sampled pair, label 0.
    Negative,
}

impl PairLabel {
    /// Value stored in the `label` column.
    pub fn value(self) -> i64 {
        match self {
            PairLabel::Positive => 1,
            PairLabel::Negative => 0,
        }
    }
}

/// Row counts observed while building a dataset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RankingStats {
    /// Observed interactions.
    pub positives: usize,
    /// Sampled negatives (always `NEGATIVES_PER_POSITIVE × positives`).
    pub negatives: usize,
    /// Labeled rows before the item catalog join.
    pub labeled_rows: usize,
    /// Distinct articles in the item catalog snapshot.
    pub catalog_articles: usize,
    /// Labeled rows lost in the catalog join.
    pub dropped_rows: usize,
}

/// Output of `RankingDatasetBuilder::build`.
#[derive(Clone, Debug)]
pub struct RankingDataset {
    /// One row per positive or negative pair, positives first.
    pub table: DataFrame,
    /// Row counts observed while building `table`.
    pub stats: RankingStats,
}

/// Joins transaction, article, and customer features into a labeled ranking table.
pub struct RankingDatasetBuilder<'a> {
    transactions: &'a dyn FeatureSource,
    articles: &'a dyn FeatureSource,
    customers: &'a dyn FeatureSource,
    config: RankingConfig,
}

impl<'a> RankingDatasetBuilder<'a> {
    /// Create a builder over the three feature sources with default configuration.
    pub fn new(
        transactions: &'a dyn FeatureSource,
        articles: &'a dyn FeatureSource,
        customers: &'a dyn FeatureSource,
    ) -> Self {
        Self {
            transactions,
            articles,
            customers,
            config: RankingConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: RankingConfig) -> Self {
        self.config = config;
        self
    }

    /// Read the sources and build the labeled dataset.
    ///
    /// Source read errors propagate unchanged. Rows dropped by the catalog join
    /// are logged, or rejected when `strict_catalog` is set.
    pub fn build(&self) -> Result<RankingDataset, DatasetError> {
        let transactions = self.transactions.select(TRANSACTION_COLUMNS).read()?;
        let articles = self
            .articles
            .select_except(EXCLUDED_ARTICLE_COLUMNS)
            .read()?;
        let customers = self.customers.select(CUSTOMER_COLUMNS).read()?;
        info!(
            "[ranking:builder] read transactions={} articles={} customers={}",
            transactions.height(),
            articles.height(),
            customers.height()
        );

        if transactions.height() == 0 {
            match self.config.empty_input {
                EmptyInputPolicy::Reject => {
                    return Err(DatasetError::EmptyInput(format!(
                        "transaction source '{}' has no rows",
                        self.transactions.id()
                    )));
                }
                EmptyInputPolicy::Proceed => warn!(
                    "[ranking:builder] transaction source '{}' is empty; output will be header-only",
                    self.transactions.id()
                ),
            }
        }

        let positives = positive_pairs(&transactions, &articles, &customers)?;
        let negatives = negative_pairs(&positives)?;
        let labeled = label_pairs(&positives, &negatives)?;
        debug!(
            "[ranking:builder] labeled positives={} negatives={}",
            positives.height(),
            negatives.height()
        );

        let catalog = item_catalog(&self.articles.read()?)?;
        let table = labeled.inner_join_on(&catalog, ARTICLE_ID)?;
        let dropped = labeled.height().saturating_sub(table.height());
        if dropped > 0 {
            if self.config.strict_catalog {
                return Err(DatasetError::MissingCatalogRows { dropped });
            }
            warn!(
                "[ranking:builder] item catalog from '{}' is missing articles for {} pair rows; rows dropped",
                self.articles.id(),
                dropped
            );
        }

        let stats = RankingStats {
            positives: positives.height(),
            negatives: negatives.height(),
            labeled_rows: labeled.height(),
            catalog_articles: catalog.height(),
            dropped_rows: dropped,
        };
        info!(
            "[ranking:builder] built rows={} positives={} negatives={} dropped={}",
            table.height(),
            stats.positives,
            stats.negatives,
            stats.dropped_rows
        );
        Ok(RankingDataset { table, stats })
    }
}

/// Enrich transactions with article and customer features and project to the
/// query feature set.
///
/// Both joins are left joins: transactions without a matching customer keep a
/// null `age`.
pub fn positive_pairs(
    transactions: &DataFrame,
    articles: &DataFrame,
    customers: &DataFrame,
) -> Result<DataFrame, DatasetError> {
    Ok(transactions
        .left_join_on(articles, ARTICLE_ID)?
        .left_join_on(customers, CUSTOMER_ID)?
        .select(QUERY_FEATURES)?)
}

/// Sample `NEGATIVES_PER_POSITIVE` negatives per positive.
///
/// Article ids come from the distinct positive articles, customer ids from the
/// positive rows, and age/month context as one joint row draw. The three draws
/// are independent and are not checked against the positive set.
pub fn negative_pairs(positives: &DataFrame) -> Result<DataFrame, DatasetError> {
    let count = positives.height() * NEGATIVES_PER_POSITIVE;
    let articles = positives
        .select([ARTICLE_ID])?
        .dedup_by_key(ARTICLE_ID)?
        .sample_rows(count, ARTICLE_SEED)?;
    let customers = positives
        .select([CUSTOMER_ID])?
        .sample_rows(count, CUSTOMER_SEED)?;
    let context = positives
        .select(CONTEXT_COLUMNS)?
        .sample_rows(count, CONTEXT_SEED)?;
    Ok(articles
        .hstack(customers.get_columns())?
        .hstack(context.get_columns())?
        .select(column_names(positives))?)
}

/// Label positives 1 and negatives 0 and stack them, positives first.
pub fn label_pairs(positives: &DataFrame, negatives: &DataFrame) -> Result<DataFrame, DatasetError> {
    let negatives = negatives.select(column_names(positives))?;
    let positives = with_label(positives.clone(), PairLabel::Positive)?;
    let negatives = with_label(negatives, PairLabel::Negative)?;
    Ok(positives.vstack(&negatives)?)
}

fn with_label(mut frame: DataFrame, label: PairLabel) -> Result<DataFrame, DatasetError> {
    let rows = frame.height();
    frame.with_column(Series::new(LABEL.into(), vec![label.value(); rows]))?;
    Ok(frame)
}

/// One row per distinct article (first occurrence wins), restricted to the
/// categorical item attributes.
pub fn item_catalog(articles: &DataFrame) -> Result<DataFrame, DatasetError> {
    Ok(articles
        .dedup_by_key(ARTICLE_ID)?
        .select(ITEM_CATALOG_COLUMNS)?)
}

/// Rows labeled positive, in dataset order.
pub fn positive_rows(dataset: &DataFrame) -> Result<DataFrame, DatasetError> {
    Ok(dataset
        .clone()
        .lazy()
        .filter(col(LABEL).eq(lit(PairLabel::Positive.value())))
        .collect()?)
}
