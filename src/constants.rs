/// Column names shared by the feature sources and the ranking dataset.
pub mod columns {
    /// Article key shared by transactions, articles, and the item catalog.
    pub const ARTICLE_ID: &str = "article_id";
    /// Customer key shared by transactions and customers.
    pub const CUSTOMER_ID: &str = "customer_id";
    /// Customer age.
    pub const AGE: &str = "age";
    /// Sine of the purchase month.
    pub const MONTH_SIN: &str = "month_sin";
    /// Cosine of the purchase month.
    pub const MONTH_COS: &str = "month_cos";
    /// Binary pair label (1 = observed, 0 = sampled negative).
    pub const LABEL: &str = "label";

    /// Columns read from the transaction source.
    pub const TRANSACTION_COLUMNS: [&str; 4] = [ARTICLE_ID, CUSTOMER_ID, MONTH_SIN, MONTH_COS];
    /// Columns read from the customer source.
    pub const CUSTOMER_COLUMNS: [&str; 2] = [CUSTOMER_ID, AGE];
    /// Large or unstructured article columns left out of the enrichment read.
    pub const EXCLUDED_ARTICLE_COLUMNS: [&str; 3] = ["article_description", "embeddings", "image_url"];
    /// Query feature set, in output order.
    pub const QUERY_FEATURES: [&str; 5] = [CUSTOMER_ID, AGE, MONTH_SIN, MONTH_COS, ARTICLE_ID];
    /// Customer/time context drawn jointly for negatives.
    pub const CONTEXT_COLUMNS: [&str; 3] = [AGE, MONTH_SIN, MONTH_COS];
    /// Item catalog projection: the article key followed by categorical attributes.
    pub const ITEM_CATALOG_COLUMNS: [&str; 12] = [
        ARTICLE_ID,
        "product_type_name",
        "product_group_name",
        "graphical_appearance_name",
        "colour_group_name",
        "perceived_colour_value_name",
        "perceived_colour_master_name",
        "department_name",
        "index_name",
        "index_group_name",
        "section_name",
        "garment_group_name",
    ];
}

/// Constants used by negative sampling.
pub mod sampling {
    /// Negative pairs generated per positive pair.
    pub const NEGATIVES_PER_POSITIVE: usize = 10;
    /// Seed for the article identifier draw.
    pub const ARTICLE_SEED: u64 = 2;
    /// Seed for the customer identifier draw.
    pub const CUSTOMER_SEED: u64 = 3;
    /// Seed for the joint age/month context draw.
    pub const CONTEXT_SEED: u64 = 4;
}


/// Constants used by model export manifests.
pub mod export {
    /// Model registry name of the query tower.
    pub const QUERY_MODEL_NAME: &str = "query_model";
    /// Model registry name of the candidate tower.
    pub const CANDIDATE_MODEL_NAME: &str = "candidate_model";
    /// Description attached to the query tower.
    pub const QUERY_MODEL_DESCRIPTION: &str =
        "Model that generates query embeddings from user and transaction features";
    /// Description attached to the candidate tower.
    pub const CANDIDATE_MODEL_DESCRIPTION: &str =
        "Model that generates candidate embeddings from item features";
    /// Output column of the query tower.
    pub const QUERY_EMBEDDING: &str = "query_embedding";
    /// Output column of the candidate tower.
    pub const CANDIDATE_EMBEDDING: &str = "candidate_embedding";
    /// Embedding tensor key returned by the query serving signature.
    pub const QUERY_EMB_OUTPUT: &str = "query_emb";
    /// Dtype of embedding outputs.
    pub const EMBEDDING_DTYPE: &str = "float32";
    /// Seed used to draw the input example row.
    pub const INPUT_EXAMPLE_SEED: u64 = 0x5EED_E7A3;
    /// File name of the manifest header (name, description, signature).
    pub const MANIFEST_FILENAME: &str = "model.json";
    /// File name of the serialized model schema.
    pub const MODEL_SCHEMA_FILENAME: &str = "model_schema.json";
    /// File name of the serialized input example.
    pub const INPUT_EXAMPLE_FILENAME: &str = "input_example.json";
}

/// Constants used by feature helpers.
pub mod features {
    /// Months per cycle for the cyclical month encoding.
    pub const MONTHS_PER_YEAR: f64 = 12.0;
}
