/// Identifier for the feature source that produced a frame.
/// Examples: `transactions`, `articles`, `customers`
pub type SourceId = String;
/// Column name inside a frame or feature source.
/// Examples: `article_id`, `month_sin`, `product_type_name`
pub type ColumnName = String;
/// Name of a registered model.
/// Examples: `query_model`, `candidate_model`
pub type ModelName = String;
/// Logical dtype label written into model schemas.
/// Examples: `string`, `float64`, `float32`
pub type DtypeLabel = String;
