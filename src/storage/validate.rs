//! Shape validation of decoded JSON.
//!
//! A value is accepted when it decodes into the record type (required fields
//! present, primitive types and value-object constraints respected) and the
//! decoded record passes its `validator` rules.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

/// Anything the persistence adapter can store.
pub trait Record: Serialize + DeserializeOwned + Validate + Clone {}

impl<T> Record for T where T: Serialize + DeserializeOwned + Validate + Clone {}

/// A single shape violation. `index` locates the record inside a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub index: Option<usize>,
    pub message: String,
}

impl Violation {
    fn at(index: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(index) => write!(f, "record {index}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

pub fn describe(violations: &[Violation]) -> Vec<String> {
    violations.iter().map(ToString::to_string).collect()
}

fn check_one<T: Record>(value: &Value, index: Option<usize>) -> Result<T, Vec<Violation>> {
    let record: T = serde_json::from_value(value.clone())
        .map_err(|e| vec![Violation::at(index, e.to_string())])?;
    match record.validate() {
        Ok(()) => Ok(record),
        Err(errors) => {
            // Struct-level checks land under `__all__`; nested ones only show
            // up in the rendered message.
            let mut violations: Vec<Violation> = errors
                .field_errors()
                .into_iter()
                .map(|(field, errs)| {
                    let codes: Vec<String> = errs.iter().map(|e| e.code.to_string()).collect();
                    Violation::at(index, format!("{field}: {}", codes.join(", ")))
                })
                .collect();
            if violations.is_empty() {
                violations.push(Violation::at(index, errors.to_string()));
            }
            Err(violations)
        }
    }
}

/// Validate a decoded collection. Every record is checked so the caller gets
/// the full list of violations, not just the first.
pub fn validate_collection<T: Record>(value: &Value) -> Result<Vec<T>, Vec<Violation>> {
    let Some(items) = value.as_array() else {
        return Err(vec![Violation::at(None, "expected an array of records")]);
    };

    let mut records = Vec::with_capacity(items.len());
    let mut violations = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match check_one::<T>(item, Some(index)) {
            Ok(record) => records.push(record),
            Err(mut errs) => violations.append(&mut errs),
        }
    }

    if violations.is_empty() {
        Ok(records)
    } else {
        Err(violations)
    }
}

/// Validate a decoded singleton document.
pub fn validate_document<T: Record>(value: &Value) -> Result<T, Vec<Violation>> {
    if !value.is_object() {
        return Err(vec![Violation::at(None, "expected an object")]);
    }
    check_one(value, None)
}

/// Validate records about to be written.
pub fn validate_outgoing<T: Record>(items: &[T]) -> Result<(), Vec<Violation>> {
    let violations: Vec<Violation> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| item.validate().err().map(|e| (index, e)))
        .map(|(index, errors)| Violation::at(Some(index), errors.to_string()))
        .collect();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
