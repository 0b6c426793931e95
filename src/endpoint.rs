//! One compiled schema bound to one endpoint.

use serde_json::{Map, Value};

use crate::ast::Schema;
use crate::block::extract_block;
use crate::error::{CompileError, EndpointError};
use crate::http::{self, Body};
use crate::parser::parse_schema;
use crate::validate::Validator;

/// Extract the schema block from documentation text and compile it.
/// `Ok(None)` when the text carries no schema.
pub fn compile(doc: &str) -> Result<Option<Schema>, CompileError> {
    extract_block(doc).map(|src| parse_schema(&src)).transpose()
}

#[derive(Debug, Clone)]
pub struct Endpoint {
    schema: Schema,
    validator: Validator,
}

impl Endpoint {
    pub fn new(schema: Schema) -> Self {
        Self { schema, validator: Validator::default() }
    }

    pub fn compile(doc: &str) -> Result<Option<Self>, CompileError> {
        Ok(compile(doc)?.map(Self::new))
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Method, then route variables, then body.
    pub fn validate_request<'b>(
        &self,
        method: &str,
        route_args: &Map<String, Value>,
        body: impl Into<Body<'b>>,
    ) -> Result<(), EndpointError> {
        let request = &self.schema.request;
        http::validate_method(method, &request.methods)
            .and_then(|()| http::validate_route(route_args, &request.route))
            .and_then(|()| http::validate_request_body(&self.validator, body.into(), request.schema.as_ref()))
            .map_err(|error| {
                tracing::debug!(route = %request.route.template(), %error, "request rejected");
                EndpointError::Request(error)
            })
    }

    pub fn validate_response<'b>(&self, status: u16, body: impl Into<Body<'b>>) -> Result<(), EndpointError> {
        http::validate_response(&self.validator, status, body.into(), &self.schema.responses).map_err(|error| {
            tracing::debug!(route = %self.schema.request.route.template(), status, %error, "response rejected");
            EndpointError::Response(error)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    const DOC: &str = r#"Get an item by id.

    Schema::

        GET /item/<i32:id>

        200
        {
            "id": i32,
            "name": string(10),
            "number": i8
        }
        4XX/5XX
        {"message": string}
    "#;

    fn no_args() -> Map<String, Value> {
        Map::new()
    }

    #[test]
    fn text_without_schema_compiles_to_nothing() {
        assert!(compile("just docs").unwrap().is_none());
        assert!(Endpoint::compile("").unwrap().is_none());
    }

    #[test]
    fn request_errors_are_tagged_as_request() {
        let endpoint = Endpoint::compile(DOC).unwrap().unwrap();
        let mut args = Map::new();
        args.insert("id".into(), json!("42"));
        assert!(endpoint.validate_request("GET", &args, Body::Empty).is_ok());

        let err = endpoint.validate_request("POST", &args, Body::Empty).unwrap_err();
        assert!(err.is_request());
        assert_eq!(err.kind(), ErrorKind::InvalidMethod);
        assert_eq!(err.suggested_status(), 400);

        let err = endpoint.validate_request("GET", &no_args(), Body::Empty).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RouteVariableNotFound);
    }

    #[test]
    fn response_errors_are_tagged_as_response() {
        let endpoint = Endpoint::compile(DOC).unwrap().unwrap();
        let ok = json!({"id": 1, "name": "name", "number": 12});
        assert!(endpoint.validate_response(200, &ok).is_ok());

        let bad = json!({"id": 1, "name": "name", "number": 123456});
        let err = endpoint.validate_response(200, &bad).unwrap_err();
        assert!(!err.is_request());
        assert_eq!(err.kind(), ErrorKind::InvalidI8);
        assert_eq!(err.inner().path, "/number");
        assert_eq!(err.suggested_status(), 500);
    }

    #[test]
    fn compile_errors_bubble_up() {
        let doc = "Schema::\n    GET /a\n    200 {\"x\": nope}\n";
        assert!(matches!(Endpoint::compile(doc), Err(CompileError::Grammar(_))));
    }
}
