//! Compile a schema DSL embedded in endpoint documentation and validate
//! request/response pairs against it.
//!
//! ```text
//! docs ──block──▶ DSL source ──lexer──▶ tokens ──parser──▶ Schema
//! Schema + (method, route args, body) ──validate──▶ Ok | EndpointError
//! ```
pub mod ast;
pub mod block;
pub mod cli;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod lexer;
pub mod parser;
pub mod path_de;
pub mod registry;
pub mod validate;

pub use ast::Schema;
pub use endpoint::{compile, Endpoint};
pub use error::{CompileError, EndpointError, ErrorKind, ValidationError};
pub use http::Body;
pub use parser::parse_schema;
pub use registry::{Registry, RegistryError};
pub use validate::Validator;
