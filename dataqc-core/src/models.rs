//! Record model shared by every quality component.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{DataQcError, Result};

/// One unit of input data: a field name to value mapping.
///
/// Records wrap arbitrary JSON so that malformed entries (a bare string in
/// the batch, for example) can still flow through the engine and be reported
/// instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Value);

impl Record {
    /// Wraps a JSON value as a record.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Returns the field map, or `None` when the record is not an object.
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }

    /// True when the record is a JSON object.
    pub fn is_object(&self) -> bool {
        self.0.is_object()
    }

    /// Looks up a top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields().and_then(|fields| fields.get(field))
    }

    /// Resolves a field by dotted path (`address.city`).
    ///
    /// A literal key containing dots takes precedence over nested traversal.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.get(path) {
            return Some(value);
        }
        if !path.contains('.') {
            return None;
        }
        path.split('.')
            .try_fold(&self.0, |current, segment| current.as_object()?.get(segment))
    }

    /// Returns the record identifier from its `id` field, if any.
    pub fn id(&self) -> Option<String> {
        match self.get("id")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Returns the `id` field or a positional identifier.
    pub fn id_or_position(&self, index: usize) -> String {
        self.id().unwrap_or_else(|| format!("record_{}", index))
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Converts a JSON batch into records.
///
/// # Errors
/// Returns `DataQcError::InvalidInput` when the batch is not an array.
pub fn records_from_value(batch: Value) -> Result<Vec<Record>> {
    match batch {
        Value::Array(items) => Ok(items.into_iter().map(Record::new).collect()),
        Value::Null => Err(DataQcError::invalid_input(
            "data is required and must be an array of records",
        )),
        other => Err(DataQcError::invalid_input(format!(
            "data must be an array of records, got {}",
            crate::value::type_name(&other)
        ))),
    }
}
