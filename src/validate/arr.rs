use serde_json::Value;

use super::Validator;
use crate::ast::ArrayType;
use crate::error::{ErrorKind, ValidateResult, ValidationError};

impl Validator {
    /// Positional match of `items` against the elements; with `repeating`,
    /// the last entry absorbs every remaining element (zero or more).
    pub(super) fn array(&self, value: &Value, arr: &ArrayType, depth: usize) -> ValidateResult {
        let Value::Array(xs) = value else {
            return Err(ValidationError::new(ErrorKind::NotAnArray, value.clone()));
        };

        if arr.items.is_empty() {
            return if xs.is_empty() {
                Ok(())
            } else {
                Err(ValidationError::new(ErrorKind::ArrayMustBeEmpty, value.clone()))
            };
        }

        let fixed = if arr.repeating { arr.items.len() - 1 } else { arr.items.len() };
        if xs.len() < fixed {
            tracing::trace!(len = xs.len(), want = fixed, "array too short");
            return Err(ValidationError::new(ErrorKind::ArrayTooFewElements, value.clone()));
        }
        if !arr.repeating && xs.len() != fixed {
            tracing::trace!(len = xs.len(), want = fixed, "array length mismatch");
            return Err(ValidationError::new(ErrorKind::ArrayLengthMismatch, value.clone()));
        }

        for (i, (el, node)) in xs.iter().zip(&arr.items[..fixed]).enumerate() {
            self.value_at(Some(el), node, depth + 1).map_err(|e| e.at_index(i))?;
        }
        if let (true, Some(tail)) = (arr.repeating, arr.items.last()) {
            for (i, el) in xs.iter().enumerate().skip(fixed) {
                self.value_at(Some(el), tail, depth + 1).map_err(|e| e.at_index(i))?;
            }
        }
        Ok(())
    }
}
