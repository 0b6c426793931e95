//! Error families: compile-time (`LexError`, `GrammarError`) and per-call
//! validation (`ValidationError`). Compile errors abort schema construction;
//! validation errors are returned once per call and never partially recovered.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("illegal character {ch:?} at line {line}")]
    IllegalCharacter { ch: char, line: usize },

    #[error("unexpected escape sequence \\{ch} at line {line}")]
    InvalidEscape { ch: char, line: usize },

    #[error("unterminated string literal at line {line}")]
    UnterminatedString { line: usize },

    #[error("integer literal {literal} out of range at line {line}")]
    IntegerOverflow { literal: String, line: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("grammar error {token} at line {line}")]
    Unexpected { token: String, line: usize },

    #[error("grammar error at end of input")]
    UnexpectedEof,

    #[error("duplicate object key {key:?} at line {line}")]
    DuplicateKey { key: String, line: usize },

    #[error("types nested too deeply at line {line}")]
    NestingTooDeep { line: usize },
}

/// Either stage of schema compilation failed; the endpoint is mis-specified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// Closed failure taxonomy. Numeric codes are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    InvalidBool,
    InvalidU8,
    InvalidU16,
    InvalidU32,
    InvalidU64,
    InvalidI8,
    InvalidI16,
    InvalidI32,
    InvalidI64,
    InvalidFloat,
    InvalidString,
    NotAnArray,
    ArrayTooFewElements,
    ArrayLengthMismatch,
    ArrayMustBeEmpty,
    NotAnObject,
    ObjectKeyNotFound,
    ObjectUnexpectedKey,
    ValueNotNullable,
    InvalidJsonRoot,
    InvalidMethod,
    RouteVariableNotFound,
    NoMatchingResponseSchema,
    DepthLimitExceeded,
}

impl ErrorKind {
    pub fn code(self) -> u16 {
        match self {
            ErrorKind::InvalidBool => 1,
            ErrorKind::InvalidU8 => 2,
            ErrorKind::InvalidU16 => 3,
            ErrorKind::InvalidU32 => 4,
            ErrorKind::InvalidU64 => 5,
            ErrorKind::InvalidI8 => 6,
            ErrorKind::InvalidI16 => 7,
            ErrorKind::InvalidI32 => 8,
            ErrorKind::InvalidI64 => 9,
            ErrorKind::InvalidFloat => 10,
            ErrorKind::InvalidString => 11,
            ErrorKind::NotAnArray => 12,
            ErrorKind::ArrayTooFewElements => 13,
            ErrorKind::ArrayLengthMismatch => 14,
            ErrorKind::ArrayMustBeEmpty => 15,
            ErrorKind::NotAnObject => 16,
            ErrorKind::ObjectKeyNotFound => 17,
            ErrorKind::ObjectUnexpectedKey => 18,
            ErrorKind::ValueNotNullable => 19,
            ErrorKind::InvalidJsonRoot => 20,
            ErrorKind::InvalidMethod => 21,
            ErrorKind::RouteVariableNotFound => 22,
            ErrorKind::NoMatchingResponseSchema => 23,
            ErrorKind::DepthLimitExceeded => 24,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            ErrorKind::InvalidBool => "invalid bool",
            ErrorKind::InvalidU8 => "invalid u8",
            ErrorKind::InvalidU16 => "invalid u16",
            ErrorKind::InvalidU32 => "invalid u32",
            ErrorKind::InvalidU64 => "invalid u64",
            ErrorKind::InvalidI8 => "invalid i8",
            ErrorKind::InvalidI16 => "invalid i16",
            ErrorKind::InvalidI32 => "invalid i32",
            ErrorKind::InvalidI64 => "invalid i64",
            ErrorKind::InvalidFloat => "invalid float",
            ErrorKind::InvalidString => "invalid string",
            ErrorKind::NotAnArray => "not an array",
            ErrorKind::ArrayTooFewElements => "array has too few elements",
            ErrorKind::ArrayLengthMismatch => "array length mismatch",
            ErrorKind::ArrayMustBeEmpty => "array must be empty",
            ErrorKind::NotAnObject => "not an object",
            ErrorKind::ObjectKeyNotFound => "object key not found",
            ErrorKind::ObjectUnexpectedKey => "unexpected object key",
            ErrorKind::ValueNotNullable => "value is not nullable",
            ErrorKind::InvalidJsonRoot => "invalid json body",
            ErrorKind::InvalidMethod => "method not allowed",
            ErrorKind::RouteVariableNotFound => "route variable not found",
            ErrorKind::NoMatchingResponseSchema => "no response schema declared for this status",
            ErrorKind::DepthLimitExceeded => "nesting depth limit exceeded",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} (code {}) at {:?}: {value}", .kind.reason(), .kind.code(), display_path(.path))]
pub struct ValidationError {
    pub kind: ErrorKind,
    /// The offending value (or key name / method / status for structural failures).
    pub value: Value,
    /// JSON Pointer to the offending value; empty at the root.
    pub path: String,
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "/" } else { path }
}

impl ValidationError {
    pub fn new(kind: ErrorKind, value: impl Into<Value>) -> Self {
        Self { kind, value: value.into(), path: String::new() }
    }

    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    pub fn reason(&self) -> &'static str {
        self.kind.reason()
    }

    /// Prefix the path with an object key while unwinding.
    pub(crate) fn at_key(mut self, key: &str) -> Self {
        let escaped = key.replace('~', "~0").replace('/', "~1");
        self.path = format!("/{escaped}{}", self.path);
        self
    }

    /// Prefix the path with an array index while unwinding.
    pub(crate) fn at_index(mut self, index: usize) -> Self {
        self.path = format!("/{index}{}", self.path);
        self
    }
}

pub type ValidateResult = Result<(), ValidationError>;

/// Endpoint-level failure with its request/response origin, so hosts can map
/// them to distinct outward behaviors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EndpointError {
    #[error("request validation failed: {0}")]
    Request(ValidationError),

    #[error("response validation failed: {0}")]
    Response(ValidationError),
}

impl EndpointError {
    pub fn inner(&self) -> &ValidationError {
        match self {
            EndpointError::Request(e) | EndpointError::Response(e) => e,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.inner().kind
    }

    pub fn code(&self) -> u16 {
        self.inner().code()
    }

    pub fn reason(&self) -> &'static str {
        self.inner().reason()
    }

    pub fn value(&self) -> &Value {
        &self.inner().value
    }

    pub fn is_request(&self) -> bool {
        matches!(self, EndpointError::Request(_))
    }

    /// A bad request is the client's fault, a bad response is ours.
    pub fn suggested_status(&self) -> u16 {
        if self.is_request() { 400 } else { 500 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_is_built_outside_in() {
        let err = ValidationError::new(ErrorKind::InvalidI32, "abc")
            .at_key("id")
            .at_index(2)
            .at_key("a/b");
        assert_eq!(err.path, "/a~1b/2/id");
        assert_eq!(err.code(), 8);
        assert_eq!(err.value, json!("abc"));
    }

    #[test]
    fn kinds_serialize_kebab_case() {
        let s = serde_json::to_string(&ErrorKind::ObjectKeyNotFound).unwrap();
        assert_eq!(s, "\"object-key-not-found\"");
        let k: ErrorKind = serde_json::from_str("\"invalid-u8\"").unwrap();
        assert_eq!(k, ErrorKind::InvalidU8);
    }

    #[test]
    fn endpoint_error_carries_origin() {
        let err = EndpointError::Response(ValidationError::new(ErrorKind::NoMatchingResponseSchema, 418));
        assert!(!err.is_request());
        assert_eq!(err.suggested_status(), 500);
        assert_eq!(err.code(), 23);
        assert_eq!(err.value(), &json!(418));
    }
}
