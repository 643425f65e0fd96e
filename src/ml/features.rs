use crate::error::{AppError, Result};
use crate::ml::schema::{FeatureSchema, InputSchema, RawRecord};
use ndarray::{Array1, ArrayView1};
use std::sync::Arc;

/// Named numeric columns in feature-schema order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    columns: Arc<[String]>,
    values: Array1<f64>,
}

impl FeatureVector {
    pub(crate) fn new(columns: Arc<[String]>, values: Array1<f64>) -> Result<Self> {
        if columns.len() != values.len() {
            return Err(AppError::Shape {
                expected: columns.len(),
                actual: values.len(),
            });
        }
        Ok(Self { columns, values })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i])
    }

    /// Same columns, new values
    pub(crate) fn with_values(&self, values: Array1<f64>) -> Result<Self> {
        Self::new(Arc::clone(&self.columns), values)
    }
}

/// Turns raw records into the exact column layout the models were trained on
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    input: InputSchema,
    schema: Arc<FeatureSchema>,
}

impl FeatureEncoder {
    pub fn new(input: InputSchema, schema: Arc<FeatureSchema>) -> Self {
        Self { input, schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Encode one record.
    ///
    /// Categorical fields become `{field}_{value}` indicators and continuous
    /// fields keep their own name. The expansion is then reindexed against the
    /// feature schema: absent columns are zero, unknown columns are dropped.
    pub fn encode(&self, record: &RawRecord) -> Result<FeatureVector> {
        let expanded = self.expand(record)?;
        Ok(self.align(expanded))
    }

    /// One-hot expansion of a record, in input-schema order
    fn expand(&self, record: &RawRecord) -> Result<Vec<(String, f64)>> {
        let mut expanded = Vec::with_capacity(self.input.fields().len());

        for spec in self.input.fields() {
            let raw = record.get(spec.name).ok_or_else(|| {
                AppError::Encoding(format!("missing required field '{}'", spec.name))
            })?;
            let value = raw.coerce(spec.kind).ok_or_else(|| {
                AppError::Encoding(format!(
                    "field '{}' expects {:?}, got {:?}",
                    spec.name, spec.kind, raw
                ))
            })?;

            if spec.kind.is_categorical() {
                expanded.push((format!("{}_{}", spec.name, value as i64), 1.0));
            } else {
                expanded.push((spec.name.to_string(), value));
            }
        }

        Ok(expanded)
    }

    fn align(&self, expanded: Vec<(String, f64)>) -> FeatureVector {
        let mut values = Array1::<f64>::zeros(self.schema.len());

        for (column, value) in expanded {
            match self.schema.index_of(&column) {
                Some(i) => values[i] = value,
                // reference level or a level never seen in training
                None => tracing::trace!(column = %column, "Dropping column absent from schema"),
            }
        }

        FeatureVector {
            columns: self.schema.shared_columns(),
            values,
        }
    }
}

/// Encode `record` against `schema` using the heart input fields
pub fn encode(record: &RawRecord, schema: &FeatureSchema) -> Result<FeatureVector> {
    FeatureEncoder::new(InputSchema::heart(), Arc::new(schema.clone())).encode(record)
}
