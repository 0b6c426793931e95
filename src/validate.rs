//! Structural validator: walks a `TypeNode` against a decoded JSON value.
//!
//! Pure functions over an immutable tree and an immutable input; nothing is
//! cached between calls and no locking is needed to share a `Validator`.
//!
//! - Null and absence are the same thing for nullability.
//! - Integers must fit the declared width exactly; floats never pass as ints.
//! - The first failure is returned; no partial work continues after it.
pub mod scalar;
pub mod arr;
pub mod obj;

use serde_json::Value;

use crate::ast::{Shape, TypeNode};
use crate::error::{ErrorKind, ValidateResult, ValidationError};

pub use scalar::validate_scalar;

// ------------------------------- Policy ---------------------------------- //

/// Nesting allowed before validation gives up with `DepthLimitExceeded`.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct Validator {
    max_depth: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// `None` means the value is absent (a missing key, or no body).
    pub fn validate_value(&self, value: Option<&Value>, node: &TypeNode) -> ValidateResult {
        self.value_at(value, node, 0)
    }

    pub(crate) fn value_at(&self, value: Option<&Value>, node: &TypeNode, depth: usize) -> ValidateResult {
        let value = match value {
            None | Some(Value::Null) if node.nullable => return Ok(()),
            None | Some(Value::Null) => {
                let offending = value.cloned().unwrap_or(Value::Null);
                return Err(ValidationError::new(ErrorKind::ValueNotNullable, offending));
            }
            Some(v) => v,
        };
        if depth > self.max_depth {
            tracing::debug!(depth, max_depth = self.max_depth, "validation depth limit hit");
            return Err(ValidationError::new(ErrorKind::DepthLimitExceeded, value.clone()));
        }
        match &node.shape {
            Shape::Scalar(ty) => validate_scalar(value, ty),
            Shape::Array(arr) => self.array(value, arr, depth),
            Shape::Object(obj) => self.object(value, obj, depth),
        }
    }
}

/// Validate with the default policy.
pub fn validate_value(value: Option<&Value>, node: &TypeNode) -> ValidateResult {
    Validator::default().validate_value(value, node)
}

// -------------------------------- Tests ----------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ArrayType, ScalarType};
    use serde_json::json;

    fn nested_arrays(depth: usize) -> TypeNode {
        let mut node = TypeNode::scalar(ScalarType::U8);
        for _ in 0..depth {
            node = TypeNode::new(Shape::Array(ArrayType { items: vec![node], repeating: true }));
        }
        node
    }

    #[test]
    fn null_and_absent_follow_nullability() {
        let plain = TypeNode::scalar(ScalarType::Bool);
        let nullable = plain.clone().nullable();
        assert!(validate_value(None, &nullable).is_ok());
        assert!(validate_value(Some(&Value::Null), &nullable).is_ok());
        assert_eq!(
            validate_value(Some(&Value::Null), &plain).unwrap_err().kind,
            ErrorKind::ValueNotNullable
        );
        assert_eq!(validate_value(None, &plain).unwrap_err().kind, ErrorKind::ValueNotNullable);
    }

    #[test]
    fn nullable_does_not_relax_shape() {
        let node = TypeNode::scalar(ScalarType::I8).nullable();
        assert_eq!(validate_value(Some(&json!(300)), &node).unwrap_err().kind, ErrorKind::InvalidI8);
    }

    #[test]
    fn depth_limit_is_a_distinct_error() {
        let node = nested_arrays(5);
        let value = json!([[[[[1]]]]]);
        assert!(Validator::with_max_depth(8).validate_value(Some(&value), &node).is_ok());
        let err = Validator::with_max_depth(3).validate_value(Some(&value), &node).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DepthLimitExceeded);
        assert_eq!(err.path, "/0/0/0/0");
        assert_eq!(err.value, json!([1]));
    }
}
