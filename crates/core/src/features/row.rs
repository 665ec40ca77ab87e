use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Ordered, named numeric columns for a single observation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, column: impl Into<String>, value: f64) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| self.values[idx])
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Reindex against the model's column layout.
    ///
    /// The result has exactly `model_columns`, in that order. Columns the row lacks are 0;
    /// columns the model doesn't know are dropped. An empty layout means the model never
    /// declared one, so the row is returned as-is.
    pub fn align(self, model_columns: &[String]) -> FeatureRow {
        if model_columns.is_empty() {
            return self;
        }

        let mut index: HashMap<&str, f64> = HashMap::with_capacity(self.len());
        for (column, value) in self.iter() {
            index.entry(column).or_insert(value);
        }

        let mut dropped = 0usize;
        for column in &self.columns {
            if !model_columns.contains(column) {
                dropped += 1;
            }
        }

        let mut aligned = FeatureRow::with_capacity(model_columns.len());
        let mut filled = 0usize;
        for column in model_columns {
            let value = match index.get(column.as_str()) {
                Some(v) => *v,
                None => {
                    filled += 1;
                    0.0
                }
            };
            aligned.push(column.clone(), value);
        }

        tracing::debug!(
            width = aligned.len(),
            filled,
            dropped,
            "aligned feature row to model columns"
        );
        aligned
    }
}

impl FromIterator<(String, f64)> for FeatureRow {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut row = FeatureRow::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}

impl Serialize for FeatureRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, &value)?;
        }
        map.end()
    }
}
