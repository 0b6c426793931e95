use serde_json::Value;

use crate::ast::ScalarType;
use crate::error::{ErrorKind, ValidateResult, ValidationError};

pub(crate) fn error_kind(ty: &ScalarType) -> ErrorKind {
    match ty {
        ScalarType::Bool => ErrorKind::InvalidBool,
        ScalarType::U8 => ErrorKind::InvalidU8,
        ScalarType::U16 => ErrorKind::InvalidU16,
        ScalarType::U32 => ErrorKind::InvalidU32,
        ScalarType::U64 => ErrorKind::InvalidU64,
        ScalarType::I8 => ErrorKind::InvalidI8,
        ScalarType::I16 => ErrorKind::InvalidI16,
        ScalarType::I32 => ErrorKind::InvalidI32,
        ScalarType::I64 => ErrorKind::InvalidI64,
        ScalarType::Float => ErrorKind::InvalidFloat,
        ScalarType::String { .. } => ErrorKind::InvalidString,
    }
}

/// Native integer value of a JSON number; `None` for floats (even `5.0`).
fn as_integer(value: &Value) -> Option<i128> {
    let Value::Number(n) = value else { return None };
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Check one value against one primitive. No coercion: `1` is not a bool,
/// `"1"` is not a number, `1.0` is not an integer.
pub fn validate_scalar(value: &Value, ty: &ScalarType) -> ValidateResult {
    let ok = match ty {
        ScalarType::Bool => value.is_boolean(),
        ScalarType::Float => value.is_number(),
        ScalarType::String { max_len } => match value {
            Value::String(s) => max_len.is_none_or(|max| s.chars().count() as u64 <= max),
            _ => false,
        },
        int => {
            let (min, max) = int.int_bounds().unwrap_or((0, -1));
            as_integer(value).is_some_and(|n| (min..=max).contains(&n))
        }
    };
    if ok {
        Ok(())
    } else {
        tracing::trace!(expected = %ty, %value, "scalar mismatch");
        Err(ValidationError::new(error_kind(ty), value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kind(value: Value, ty: ScalarType) -> Option<ErrorKind> {
        validate_scalar(&value, &ty).err().map(|e| e.kind)
    }

    #[test]
    fn u8_accepts_exactly_its_range() {
        for n in 0..=255 {
            assert_eq!(kind(json!(n), ScalarType::U8), None, "{n}");
        }
        assert_eq!(kind(json!(256), ScalarType::U8), Some(ErrorKind::InvalidU8));
        assert_eq!(kind(json!(-1), ScalarType::U8), Some(ErrorKind::InvalidU8));
    }

    #[test]
    fn integer_widths() {
        assert_eq!(kind(json!(199), ScalarType::U8), None);
        assert_eq!(kind(json!(1999), ScalarType::U8), Some(ErrorKind::InvalidU8));
        assert_eq!(kind(json!(65535), ScalarType::U16), None);
        assert_eq!(kind(json!(65535 * 2), ScalarType::U16), Some(ErrorKind::InvalidU16));
        assert_eq!(kind(json!(4294967295u64), ScalarType::U32), None);
        assert_eq!(kind(json!(4294967296u64), ScalarType::U32), Some(ErrorKind::InvalidU32));
        assert_eq!(kind(json!(u64::MAX), ScalarType::U64), None);
        assert_eq!(kind(json!(u64::MAX), ScalarType::I64), Some(ErrorKind::InvalidI64));
        assert_eq!(kind(json!(-128), ScalarType::I8), None);
        assert_eq!(kind(json!(-129), ScalarType::I8), Some(ErrorKind::InvalidI8));
        assert_eq!(kind(json!(127), ScalarType::I8), None);
        assert_eq!(kind(json!(1888), ScalarType::I8), Some(ErrorKind::InvalidI8));
        assert_eq!(kind(json!(i64::MIN), ScalarType::I64), None);
        assert_eq!(kind(json!(-1), ScalarType::I32), None);
    }

    #[test]
    fn no_coercion_between_kinds() {
        assert_eq!(kind(json!(5.0), ScalarType::I32), Some(ErrorKind::InvalidI32));
        assert_eq!(kind(json!("5"), ScalarType::U8), Some(ErrorKind::InvalidU8));
        assert_eq!(kind(json!(true), ScalarType::U8), Some(ErrorKind::InvalidU8));
        assert_eq!(kind(json!(true), ScalarType::Bool), None);
        assert_eq!(kind(json!(1), ScalarType::Bool), Some(ErrorKind::InvalidBool));
    }

    #[test]
    fn float_accepts_any_number() {
        assert_eq!(kind(json!(0.1), ScalarType::Float), None);
        assert_eq!(kind(json!(1), ScalarType::Float), None);
        assert_eq!(kind(json!("1"), ScalarType::Float), Some(ErrorKind::InvalidFloat));
    }

    #[test]
    fn string_bounds_count_characters() {
        let bounded = |n| ScalarType::String { max_len: Some(n) };
        assert_eq!(kind(json!("test"), ScalarType::String { max_len: None }), None);
        assert_eq!(kind(json!("test"), bounded(4)), None);
        assert_eq!(kind(json!("test"), bounded(3)), Some(ErrorKind::InvalidString));
        assert_eq!(kind(json!("αβγ"), bounded(3)), None);
        assert_eq!(kind(json!(""), bounded(0)), None);
        assert_eq!(kind(json!(19), bounded(31)), Some(ErrorKind::InvalidString));
    }

    #[test]
    fn error_carries_offending_value() {
        let err = validate_scalar(&json!(300), &ScalarType::U8).unwrap_err();
        assert_eq!(err.value, json!(300));
        assert_eq!(err.code(), 2);
    }
}
