/// How the builder treats a transaction source with no rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyInputPolicy {
    /// Produce a header-only dataset.
    #[default]
    Proceed,
    /// Fail with `DatasetError::EmptyInput`.
    Reject,
}

/// Top-level ranking dataset configuration.
#[derive(Clone, Debug, Default)]
pub struct RankingConfig {
    /// Behavior when the transaction source is empty.
    pub empty_input: EmptyInputPolicy,
    /// Fail when the item catalog join drops pair rows instead of logging a warning.
    ///
    /// A drop means the article source lacks identifiers referenced by
    /// transactions; the builder itself never introduces unknown articles.
    pub strict_catalog: bool,
}
