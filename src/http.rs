//! Request/response level checks: method membership, route variables,
//! status-code matching and body presence.

use std::borrow::Cow;

use serde_json::{Map, Number, Value};

use crate::ast::{Method, ResponseCase, Route, ScalarType, StatusMatcher, TypeNode};
use crate::error::{ErrorKind, ValidateResult, ValidationError};
use crate::validate::{validate_scalar, Validator};

/// A payload as handed over by the host.
#[derive(Debug, Clone, Copy)]
pub enum Body<'a> {
    Empty,
    /// Undecoded bytes; an empty payload counts as no body.
    Raw(&'a [u8]),
    Json(&'a Value),
}

impl<'a> Body<'a> {
    /// `None` when there is no body. Zero-length raw payloads and a decoded
    /// empty string both count as "no body" for compatibility with hosts that
    /// send `""` for no-content responses.
    pub fn decode(self) -> Result<Option<Cow<'a, Value>>, ValidationError> {
        match self {
            Body::Empty => Ok(None),
            Body::Raw(bytes) if bytes.is_empty() => Ok(None),
            Body::Raw(bytes) => serde_json::from_slice::<Value>(bytes)
                .map(|v| Some(Cow::Owned(v)))
                .map_err(|error| {
                    tracing::trace!(%error, "body is not valid JSON");
                    ValidationError::new(ErrorKind::InvalidJsonRoot, String::from_utf8_lossy(bytes).into_owned())
                }),
            Body::Json(Value::String(s)) if s.is_empty() => Ok(None),
            Body::Json(v) => Ok(Some(Cow::Borrowed(v))),
        }
    }
}

impl<'a> From<&'a Value> for Body<'a> {
    fn from(value: &'a Value) -> Self {
        Body::Json(value)
    }
}

impl<'a> From<Option<&'a Value>> for Body<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        value.map_or(Body::Empty, Body::Json)
    }
}

// ------------------------------- Method ----------------------------------- //

pub fn validate_method(actual: &str, declared: &[Method]) -> ValidateResult {
    match actual.parse::<Method>() {
        Ok(m) if declared.contains(&m) => Ok(()),
        _ => Err(ValidationError::new(ErrorKind::InvalidMethod, actual)),
    }
}

// -------------------------------- Route ----------------------------------- //

/// Raw path segments arrive as strings; parse them into the declared
/// primitive before range-checking. Unparseable text is left as-is so the
/// scalar check reports it.
fn coerce_route_value<'v>(value: &'v Value, ty: &ScalarType) -> Cow<'v, Value> {
    let Value::String(raw) = value else { return Cow::Borrowed(value) };
    let parsed = match ty {
        ScalarType::String { .. } => None,
        ScalarType::Bool => raw.parse::<bool>().ok().map(Value::Bool),
        ScalarType::Float => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        _ => raw
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| raw.parse::<u64>().map(Value::from))
            .ok(),
    };
    parsed.map_or(Cow::Borrowed(value), Cow::Owned)
}

/// Every declared variable must be present; untyped `<name>` variables only
/// need to be present.
pub fn validate_route(actual: &Map<String, Value>, route: &Route) -> ValidateResult {
    for var in route.vars() {
        let Some(value) = actual.get(&var.name) else {
            return Err(ValidationError::new(ErrorKind::RouteVariableNotFound, var.name.as_str()));
        };
        if let Some(ty) = &var.ty {
            validate_scalar(&coerce_route_value(value, ty), ty).map_err(|e| e.at_key(&var.name))?;
        }
    }
    Ok(())
}

// ------------------------------- Status ----------------------------------- //

/// Digit-wise comparison; `X` matches any digit. Unequal lengths never match.
pub fn match_status_code(matcher: &StatusMatcher, code: u16) -> bool {
    let actual = code.to_string();
    match matcher {
        StatusMatcher::Literal(n) => *n == code,
        StatusMatcher::Pattern(p) => {
            p.len() == actual.len()
                && p.chars()
                    .zip(actual.chars())
                    .all(|(want, got)| want == StatusMatcher::WILDCARD || want == got)
        }
    }
}

// -------------------------------- Bodies ---------------------------------- //

/// Declared schema vs. actual body. No schema means no body is allowed;
/// with a schema the body is required and its root may never be null.
pub(crate) fn validate_body(validator: &Validator, body: Body<'_>, schema: Option<&TypeNode>) -> ValidateResult {
    let decoded = body.decode()?;
    match (schema, decoded) {
        (None, None) => Ok(()),
        (None, Some(v)) => Err(ValidationError::new(ErrorKind::InvalidJsonRoot, v.into_owned())),
        (Some(node), decoded) => validator.validate_value(decoded.as_deref(), &node.required()),
    }
}

pub fn validate_request_body(validator: &Validator, body: Body<'_>, schema: Option<&TypeNode>) -> ValidateResult {
    validate_body(validator, body, schema)
}

/// First matching matcher wins; its case decides the outcome.
pub fn validate_response(
    validator: &Validator,
    status: u16,
    body: Body<'_>,
    cases: &[ResponseCase],
) -> ValidateResult {
    let case = cases
        .iter()
        .find(|case| case.matchers.iter().any(|m| match_status_code(m, status)));
    let Some(case) = case else {
        return Err(ValidationError::new(ErrorKind::NoMatchingResponseSchema, status));
    };
    validate_body(validator, body, case.schema.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{RouteSegment, RouteVar};
    use crate::parser::parse_schema;
    use serde_json::json;

    fn pattern(p: &str) -> StatusMatcher {
        StatusMatcher::Pattern(p.into())
    }

    fn args(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("object expected"),
        }
    }

    #[test]
    fn wildcard_status_matching() {
        assert!(match_status_code(&pattern("4XX"), 404));
        assert!(match_status_code(&pattern("4XX"), 499));
        assert!(!match_status_code(&pattern("4XX"), 504));
        assert!(!match_status_code(&pattern("4XX"), 40));
        assert!(!match_status_code(&pattern("4XX"), 4000));
        assert!(match_status_code(&pattern("20X"), 204));
        assert!(match_status_code(&StatusMatcher::Literal(201), 201));
        assert!(!match_status_code(&StatusMatcher::Literal(201), 200));
    }

    #[test]
    fn method_membership() {
        let declared = [Method::Post, Method::Put];
        assert!(validate_method("POST", &declared).is_ok());
        assert!(validate_method("put", &declared).is_ok());
        let err = validate_method("GET", &declared).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidMethod);
        assert_eq!(err.value, json!("GET"));
        assert!(validate_method("BREW", &declared).is_err());
    }

    #[test]
    fn typed_route_variables_are_parsed_then_checked() {
        let route = parse_schema("GET /user/<i32:id>").unwrap().request.route;
        assert!(validate_route(&args(json!({"id": "123"})), &route).is_ok());
        assert!(validate_route(&args(json!({"id": 123})), &route).is_ok());
        let err = validate_route(&args(json!({"id": "abc"})), &route).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidI32);
        assert_eq!(err.value, json!("abc"));
        let err = validate_route(&args(json!({"id": "2147483648"})), &route).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidI32);
    }

    #[test]
    fn missing_route_variable_is_always_an_error() {
        let route = Route {
            segments: vec![
                RouteSegment::Static("/a/".into()),
                RouteSegment::Var(RouteVar { name: "slug".into(), ty: None }),
            ],
        };
        assert!(validate_route(&args(json!({"slug": "anything"})), &route).is_ok());
        let err = validate_route(&args(json!({})), &route).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RouteVariableNotFound);
        assert_eq!(err.value, json!("slug"));
    }

    #[test]
    fn bool_float_and_string_route_variables() {
        let route = parse_schema("GET /f/<bool:on>/<float:x>/<string(3):s>").unwrap().request.route;
        assert!(validate_route(&args(json!({"on": "true", "x": "1.5", "s": "abc"})), &route).is_ok());
        let err = validate_route(&args(json!({"on": "1", "x": "1.5", "s": "abc"})), &route).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidBool);
        let err = validate_route(&args(json!({"on": "false", "x": "1.5", "s": "abcd"})), &route).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidString);
    }

    #[test]
    fn response_without_schema_requires_no_body() {
        let cases = parse_schema("DELETE /item/<i32:id>\n201\n4XX/5XX {\"message\": string}").unwrap().responses;
        let v = Validator::default();
        assert!(validate_response(&v, 201, Body::Empty, &cases).is_ok());
        assert!(validate_response(&v, 201, Body::Raw(b""), &cases).is_ok());
        assert!(validate_response(&v, 201, Body::Json(&json!("")), &cases).is_ok());
        let err = validate_response(&v, 201, Body::Json(&json!({"a": 1})), &cases).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidJsonRoot);
    }

    #[test]
    fn response_with_schema_requires_a_non_null_body() {
        let cases = parse_schema("GET /a\n200 {\"id\": i32}").unwrap().responses;
        let v = Validator::default();
        assert!(validate_response(&v, 200, Body::Raw(br#"{"id": 7}"#), &cases).is_ok());
        assert_eq!(
            validate_response(&v, 200, Body::Empty, &cases).unwrap_err().kind,
            ErrorKind::ValueNotNullable
        );
        assert_eq!(
            validate_response(&v, 200, Body::Json(&Value::Null), &cases).unwrap_err().kind,
            ErrorKind::ValueNotNullable
        );
        assert_eq!(
            validate_response(&v, 200, Body::Raw(b"{not json"), &cases).unwrap_err().kind,
            ErrorKind::InvalidJsonRoot
        );
    }

    #[test]
    fn unmatched_status_and_first_match_wins() {
        let cases = parse_schema("GET /a\n200 {\"id\": i32}\n2XX [u8, ...]").unwrap().responses;
        let v = Validator::default();
        let err = validate_response(&v, 302, Body::Empty, &cases).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoMatchingResponseSchema);
        assert_eq!(err.value, json!(302));
        // 200 hits the object case first and never falls through to the array case.
        let err = validate_response(&v, 200, Body::Json(&json!([1, 2])), &cases).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotAnObject);
        assert!(validate_response(&v, 201, Body::Json(&json!([1, 2])), &cases).is_ok());
    }

    #[test]
    fn request_body_rules_mirror_responses() {
        let schema = parse_schema("POST /item {\"name\": string(10)}").unwrap();
        let v = Validator::default();
        let node = schema.request.schema.as_ref();
        assert!(validate_request_body(&v, Body::Json(&json!({"name": "x"})), node).is_ok());
        assert_eq!(
            validate_request_body(&v, Body::Empty, node).unwrap_err().kind,
            ErrorKind::ValueNotNullable
        );
        assert_eq!(
            validate_request_body(&v, Body::Json(&json!({"name": "x"})), None).unwrap_err().kind,
            ErrorKind::InvalidJsonRoot
        );
    }
}
