//! Field-level validation results.

use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::domain::DraftField;

/// Per-field error messages for one draft. Valid iff no field has an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation<F: Ord> {
    errors: BTreeMap<F, String>,
}

impl<F: Ord> Default for Validation<F> {
    fn default() -> Self {
        Self {
            errors: BTreeMap::new(),
        }
    }
}

impl<F: Ord + Copy> Validation<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for `field` when `failed` holds. First message wins.
    pub fn check(&mut self, field: F, failed: bool, message: &str) {
        if failed {
            self.errors
                .entry(field)
                .or_insert_with(|| message.to_string());
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&self, field: F) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<F, String> {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<F: DraftField> Validation<F> {
    pub fn missing_labels(&self) -> Vec<&'static str> {
        self.errors.keys().map(|field| field.label()).collect()
    }
}

impl<F: Ord + Serialize> Serialize for Validation<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Validation", 2)?;
        state.serialize_field("is_valid", &self.errors.is_empty())?;
        state.serialize_field("errors", &self.errors)?;
        state.end()
    }
}

/// True when the text is empty after trimming.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
