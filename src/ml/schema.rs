//! Input and feature schemas.
//!
//! [`InputSchema`] is the statically declared list of clinical fields a request
//! must carry. [`FeatureSchema`] is the ordered column list produced at training
//! time; it decides which encoded columns exist and in what order.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// How a raw field is typed and encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Whole number passed through as-is
    Integer,
    /// Floating point passed through as-is
    Float,
    /// Small integer code expanded into `{field}_{level}` indicators
    Categorical,
}

impl FieldKind {
    pub fn is_categorical(&self) -> bool {
        matches!(self, FieldKind::Categorical)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Clinical attributes of the heart disease dataset, in form order
pub const HEART_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("age", FieldKind::Integer),
    FieldSpec::new("trestbps", FieldKind::Integer),
    FieldSpec::new("chol", FieldKind::Integer),
    FieldSpec::new("thalach", FieldKind::Integer),
    FieldSpec::new("oldpeak", FieldKind::Float),
    FieldSpec::new("sex", FieldKind::Categorical),
    FieldSpec::new("cp", FieldKind::Categorical),
    FieldSpec::new("fbs", FieldKind::Categorical),
    FieldSpec::new("restecg", FieldKind::Categorical),
    FieldSpec::new("exang", FieldKind::Categorical),
    FieldSpec::new("slope", FieldKind::Categorical),
    FieldSpec::new("ca", FieldKind::Categorical),
    FieldSpec::new("thal", FieldKind::Categorical),
];

/// Ordered `(name, kind)` declaration of the raw input record
#[derive(Debug, Clone, Copy)]
pub struct InputSchema {
    fields: &'static [FieldSpec],
}

impl InputSchema {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    pub const fn heart() -> Self {
        Self::new(HEART_FIELDS)
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn categorical(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| f.kind.is_categorical())
    }
}

impl Default for InputSchema {
    fn default() -> Self {
        Self::heart()
    }
}

/// A single raw value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
}

impl FieldValue {
    /// Parse text according to the declared kind of the field
    pub fn parse(kind: FieldKind, text: &str) -> Option<Self> {
        let text = text.trim();
        match kind {
            FieldKind::Integer | FieldKind::Categorical => text.parse().ok().map(FieldValue::Int),
            FieldKind::Float => text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(FieldValue::Float),
        }
    }

    /// Value as a feature column, if it has the right type for `kind`
    pub fn coerce(&self, kind: FieldKind) -> Option<f64> {
        match (kind, self) {
            (FieldKind::Integer | FieldKind::Categorical, FieldValue::Int(v)) => Some(*v as f64),
            (FieldKind::Float, FieldValue::Int(v)) => Some(*v as f64),
            (FieldKind::Float, FieldValue::Float(v)) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

/// Flat mapping of field name to value for one patient
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    values: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_int(self, name: impl Into<String>, value: i64) -> Self {
        self.with(name, FieldValue::Int(value))
    }

    pub fn with_float(self, name: impl Into<String>, value: f64) -> Self {
        self.with(name, FieldValue::Float(value))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build a record from textual `name = value` pairs.
    ///
    /// Names outside the input schema are ignored; every declared field must be
    /// present and parse as its declared kind.
    pub fn from_pairs<'a, I>(pairs: I, input: &InputSchema) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut record = RawRecord::new();
        for (name, text) in pairs {
            let Some(spec) = input.field(name) else {
                continue;
            };
            let value = FieldValue::parse(spec.kind, text).ok_or_else(|| {
                AppError::Encoding(format!(
                    "field '{}' expects {:?}, got '{}'",
                    name, spec.kind, text
                ))
            })?;
            record.insert(name, value);
        }

        record.check_complete(input)?;
        Ok(record)
    }

    /// Fail on the first declared field that is absent
    pub fn check_complete(&self, input: &InputSchema) -> Result<()> {
        match input.fields().iter().find(|f| !self.values.contains_key(f.name)) {
            Some(missing) => Err(AppError::Encoding(format!(
                "missing required field '{}'",
                missing.name
            ))),
            None => Ok(()),
        }
    }
}

/// On-disk shape of the feature list: a bare array or `{"columns": [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureSchemaFile {
    Columns { columns: Vec<String> },
    Bare(Vec<String>),
}

/// Ordered column names persisted from training
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    columns: Arc<[String]>,
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Build and validate a schema against the declared input fields.
    ///
    /// Every column must be a non-categorical field name or
    /// `{categorical_field}_{integer_level}`; duplicates are rejected.
    pub fn new(columns: Vec<String>, input: &InputSchema) -> Result<Self> {
        if columns.is_empty() {
            return Err(AppError::artifact("feature schema", "no columns"));
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            validate_column(column, input)?;
            if index.insert(column.clone(), i).is_some() {
                return Err(AppError::artifact(
                    "feature schema",
                    format!("duplicate column '{}'", column),
                ));
            }
        }

        Ok(Self {
            columns: columns.into(),
            index,
        })
    }

    /// Load from a JSON file
    pub fn load(path: &Path, input: &InputSchema) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::artifact(path.display().to_string(), e.to_string()))?;
        let file: FeatureSchemaFile = serde_json::from_str(&text)
            .map_err(|e| AppError::artifact(path.display().to_string(), e.to_string()))?;
        let columns = match file {
            FeatureSchemaFile::Columns { columns } => columns,
            FeatureSchemaFile::Bare(columns) => columns,
        };
        Self::new(columns, input)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub(crate) fn shared_columns(&self) -> Arc<[String]> {
        Arc::clone(&self.columns)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    /// Indicator levels present in the schema for a categorical field, ascending
    pub fn levels(&self, field: &str) -> Vec<i64> {
        let prefix = format!("{}_", field);
        let mut levels: Vec<i64> = self
            .columns
            .iter()
            .filter_map(|c| c.strip_prefix(&prefix))
            .filter_map(|level| level.parse().ok())
            .collect();
        levels.sort_unstable();
        levels
    }

    /// Continuous fields missing from the schema; such a schema still encodes,
    /// but the field is silently ignored, so it is worth reporting at startup.
    pub fn missing_passthrough(&self, input: &InputSchema) -> Vec<&'static str> {
        let present: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        input
            .fields()
            .iter()
            .filter(|f| !f.kind.is_categorical() && !present.contains(f.name))
            .map(|f| f.name)
            .collect()
    }
}

fn validate_column(column: &str, input: &InputSchema) -> Result<()> {
    if let Some(spec) = input.field(column) {
        if !spec.kind.is_categorical() {
            return Ok(());
        }
    }

    let known_indicator = column
        .rsplit_once('_')
        .and_then(|(field, level)| {
            let spec = input.field(field)?;
            (spec.kind.is_categorical() && level.parse::<i64>().is_ok()).then_some(())
        })
        .is_some();

    if known_indicator {
        Ok(())
    } else {
        Err(AppError::artifact(
            "feature schema",
            format!("column '{}' does not correspond to any input field", column),
        ))
    }
}
