//! Model registry manifests for the two-tower embedding models.
//!
//! The trained towers themselves are produced elsewhere; this module declares
//! what a registry needs next to them: the input schema (taken from the dtypes
//! of the feature frame the tower consumes), the embedding output schema, one input
//! example row, and for the query tower its serving signature.

use polars::prelude::{AnyValue, DataFrame, DataType};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::columns::{AGE, CUSTOMER_ID, MONTH_COS, MONTH_SIN};
use crate::constants::export::{
    CANDIDATE_EMBEDDING, CANDIDATE_MODEL_DESCRIPTION, CANDIDATE_MODEL_NAME, EMBEDDING_DTYPE,
    INPUT_EXAMPLE_FILENAME, INPUT_EXAMPLE_SEED, MANIFEST_FILENAME, MODEL_SCHEMA_FILENAME,
    QUERY_EMB_OUTPUT, QUERY_EMBEDDING, QUERY_MODEL_DESCRIPTION, QUERY_MODEL_NAME,
};
use crate::errors::DatasetError;
use crate::table::FrameExt;
use crate::types::{ColumnName, DtypeLabel, ModelName};

/// One named column of a model schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    /// Column or tensor name.
    pub name: ColumnName,
    /// Logical dtype label (`int64`, `float64`, `string`, ...).
    #[serde(rename = "type")]
    pub dtype: DtypeLabel,
    /// Fixed tensor shape; absent for scalar columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
}

/// Ordered column declarations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Columns in declaration order.
    pub columns: Vec<SchemaColumn>,
}

impl Schema {
    /// Infer a schema from a frame's column names and dtypes.
    pub fn from_frame(frame: &DataFrame) -> Self {
        Self {
            columns: frame
                .get_columns()
                .iter()
                .map(|column| SchemaColumn {
                    name: column.name().to_string(),
                    dtype: dtype_label(column.dtype()),
                    shape: None,
                })
                .collect(),
        }
    }

    /// Single tensor column with a fixed shape.
    pub fn tensor(name: impl Into<ColumnName>, dtype: impl Into<DtypeLabel>, shape: Vec<usize>) -> Self {
        Self {
            columns: vec![SchemaColumn {
                name: name.into(),
                dtype: dtype.into(),
                shape: Some(shape),
            }],
        }
    }
}

/// Input and output schema pair registered with a model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    /// Columns the model consumes.
    pub input_schema: Schema,
    /// Tensors the model produces.
    pub output_schema: Schema,
}

/// Tensor accepted by a serving signature. `None` dimensions are dynamic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorSpec {
    /// Input name.
    pub name: ColumnName,
    /// Logical dtype label.
    pub dtype: DtypeLabel,
    /// Dimensions; `None` is dynamic.
    pub shape: Vec<Option<usize>>,
}

impl TensorSpec {
    /// Rank-1 tensor with a dynamic batch dimension.
    pub fn batch(name: &str, dtype: &DataType) -> Self {
        Self {
            name: name.to_string(),
            dtype: dtype_label(dtype),
            shape: vec![None],
        }
    }
}

/// Serving signature of the query tower.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServingSignature {
    /// Tensors accepted at serving time.
    pub inputs: Vec<TensorSpec>,
    /// Names returned at serving time.
    pub outputs: Vec<ColumnName>,
}

impl ServingSignature {
    /// Query tower signature: customer and month context in, the passthrough
    /// keys plus the embedding out.
    pub fn query() -> Self {
        Self {
            inputs: vec![
                TensorSpec::batch(CUSTOMER_ID, &DataType::String),
                TensorSpec::batch(MONTH_SIN, &DataType::Float64),
                TensorSpec::batch(MONTH_COS, &DataType::Float64),
                TensorSpec::batch(AGE, &DataType::Float64),
            ],
            outputs: [CUSTOMER_ID, MONTH_SIN, MONTH_COS, QUERY_EMB_OUTPUT]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Everything registered alongside a trained tower.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelExport {
    /// Registry name, also the manifest directory name.
    pub name: ModelName,
    /// Free-text description.
    pub description: String,
    /// Input and output schemas.
    pub model_schema: ModelSchema,
    /// One record drawn from the input frame.
    pub input_example: JsonMap<String, JsonValue>,
    /// Serving signature, for towers served directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<ServingSignature>,
}

#[derive(Serialize)]
struct ManifestHeader<'a> {
    name: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<&'a ServingSignature>,
}

impl ModelExport {
    /// Manifest for the query tower over `query_features`.
    ///
    /// `query_features` must carry every signature input column.
    pub fn query_model(query_features: &DataFrame, embedding_dim: usize) -> Result<Self, DatasetError> {
        let signature = ServingSignature::query();
        if let Some(missing) = signature
            .inputs
            .iter()
            .find(|spec| query_features.get_column_index(&spec.name).is_none())
        {
            return Err(DatasetError::Schema(format!(
                "query features lack signature input '{}'",
                missing.name
            )));
        }
        Self::build(
            QUERY_MODEL_NAME,
            QUERY_MODEL_DESCRIPTION,
            query_features,
            QUERY_EMBEDDING,
            embedding_dim,
            Some(signature),
        )
    }

    /// Manifest for the candidate tower over `items`.
    pub fn candidate_model(items: &DataFrame, embedding_dim: usize) -> Result<Self, DatasetError> {
        Self::build(
            CANDIDATE_MODEL_NAME,
            CANDIDATE_MODEL_DESCRIPTION,
            items,
            CANDIDATE_EMBEDDING,
            embedding_dim,
            None,
        )
    }

    fn build(
        name: &str,
        description: &str,
        inputs: &DataFrame,
        output: &str,
        embedding_dim: usize,
        signature: Option<ServingSignature>,
    ) -> Result<Self, DatasetError> {
        if embedding_dim == 0 {
            return Err(DatasetError::Configuration(format!(
                "embedding dimension for '{name}' must be positive"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            model_schema: ModelSchema {
                input_schema: Schema::from_frame(inputs),
                output_schema: Schema::tensor(output, EMBEDDING_DTYPE, vec![embedding_dim]),
            },
            input_example: input_example(name, inputs)?,
            signature,
        })
    }

    /// Write the manifest under `<dir>/<name>/` and return that directory.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, DatasetError> {
        let target = dir.join(&self.name);
        fs::create_dir_all(&target)?;
        let header = ManifestHeader {
            name: &self.name,
            description: &self.description,
            signature: self.signature.as_ref(),
        };
        write_json(&target.join(MANIFEST_FILENAME), &header)?;
        write_json(&target.join(MODEL_SCHEMA_FILENAME), &self.model_schema)?;
        write_json(&target.join(INPUT_EXAMPLE_FILENAME), &self.input_example)?;
        info!(
            "[ranking:export] wrote '{}' manifest to {}",
            self.name,
            target.display()
        );
        Ok(target)
    }
}

fn input_example(name: &str, inputs: &DataFrame) -> Result<JsonMap<String, JsonValue>, DatasetError> {
    if inputs.height() == 0 {
        return Err(DatasetError::EmptyInput(format!(
            "no rows to draw an input example for '{name}'"
        )));
    }
    let sample = inputs.sample_rows(1, INPUT_EXAMPLE_SEED)?;
    let mut record = JsonMap::new();
    for column in sample.get_columns() {
        record.insert(column.name().to_string(), cell_to_json(&column.get(0)?));
    }
    Ok(record)
}

/// Registry dtype label for a polars dtype.
pub fn dtype_label(dtype: &DataType) -> DtypeLabel {
    match dtype {
        DataType::String => "string".to_string(),
        DataType::Boolean => "boolean".to_string(),
        DataType::Float32 => "float32".to_string(),
        DataType::Float64 => "float64".to_string(),
        other if other.is_integer() => "int64".to_string(),
        other => other.to_string(),
    }
}

/// JSON rendering of a cell; non-finite floats become `null`.
fn cell_to_json(value: &AnyValue<'_>) -> JsonValue {
    match value {
        AnyValue::Null => JsonValue::Null,
        AnyValue::Boolean(flag) => JsonValue::Bool(*flag),
        AnyValue::String(text) => JsonValue::String(text.to_string()),
        AnyValue::StringOwned(text) => JsonValue::String(text.to_string()),
        AnyValue::Float32(number) => float_json(f64::from(*number)),
        AnyValue::Float64(number) => float_json(*number),
        other if other.dtype().is_integer() => other
            .extract::<i64>()
            .map(JsonValue::from)
            .unwrap_or(JsonValue::Null),
        other => JsonValue::String(other.to_string()),
    }
}

fn float_json(number: f64) -> JsonValue {
    serde_json::Number::from_f64(number)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DatasetError> {
    let payload = serde_json::to_vec_pretty(value).map_err(std::io::Error::from)?;
    fs::write(path, payload)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use serde_json::json;

    fn query_frame() -> DataFrame {
        df!(
            "customer_id" => ["c1"],
            "month_sin" => [0.5],
            "month_cos" => [-0.5],
            "age" => [33.0],
        )
        .unwrap()
    }

    #[test]
    fn schema_from_frame_uses_dtype_labels() {
        let schema = Schema::from_frame(&query_frame());
        let labels: Vec<(&str, &str)> = schema
            .columns
            .iter()
            .map(|column| (column.name.as_str(), column.dtype.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("customer_id", "string"),
                ("month_sin", "float64"),
                ("month_cos", "float64"),
                ("age", "float64"),
            ]
        );
    }

    #[test]
    fn schema_column_serializes_type_key_and_skips_missing_shape() {
        let encoded = serde_json::to_value(Schema::tensor("query_embedding", "float32", vec![16]))
            .unwrap();
        assert_eq!(
            encoded,
            json!({"columns": [{"name": "query_embedding", "type": "float32", "shape": [16]}]})
        );
        let inferred = serde_json::to_value(Schema::from_frame(&query_frame())).unwrap();
        assert!(inferred["columns"][0].get("shape").is_none());
    }

    #[test]
    fn query_model_requires_signature_inputs() {
        let frame = query_frame().drop("age").unwrap();
        assert!(matches!(
            ModelExport::query_model(&frame, 16),
            Err(DatasetError::Schema(_))
        ));
    }

    #[test]
    fn zero_embedding_dim_is_rejected() {
        assert!(matches!(
            ModelExport::candidate_model(&query_frame(), 0),
            Err(DatasetError::Configuration(_))
        ));
    }

    #[test]
    fn input_example_is_a_frame_row() {
        let export = ModelExport::query_model(&query_frame(), 8).unwrap();
        assert_eq!(export.input_example["customer_id"], json!("c1"));
        assert_eq!(export.input_example["age"], json!(33.0));
        assert_eq!(export.signature, Some(ServingSignature::query()));
    }
}
