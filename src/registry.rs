//! Process-lifetime cache of compiled endpoints, keyed by endpoint name.
//!
//! Registration happens at startup; a compile failure there is a
//! configuration fault, not a per-request one.

use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::endpoint::Endpoint;
use crate::error::CompileError;
use crate::validate::Validator;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("schema for endpoint {name:?} is mis-specified: {source}")]
pub struct RegistryError {
    pub name: String,
    #[source]
    pub source: CompileError,
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    endpoints: IndexMap<String, Arc<Endpoint>>,
    validator: Validator,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every endpoint registered afterwards uses `validator`.
    pub fn with_validator(validator: Validator) -> Self {
        Self { endpoints: IndexMap::new(), validator }
    }

    /// Compile `doc` once and keep it under `name`. Returns `Ok(false)` when
    /// the text has no schema block (nothing to validate for that endpoint).
    /// Re-registering a name replaces the previous schema.
    pub fn register(&mut self, name: impl Into<String>, doc: &str) -> Result<bool, RegistryError> {
        let name = name.into();
        let endpoint = match Endpoint::compile(doc) {
            Ok(Some(endpoint)) => endpoint.with_validator(self.validator),
            Ok(None) => {
                tracing::debug!(%name, "no schema block; skipping");
                return Ok(false);
            }
            Err(source) => return Err(RegistryError { name, source }),
        };
        tracing::debug!(%name, route = %endpoint.schema().request.route.template(), "registered endpoint");
        self.endpoints.insert(name, Arc::new(endpoint));
        Ok(true)
    }

    /// Shared handle; validations through it need no locking.
    pub fn get(&self, name: &str) -> Option<Arc<Endpoint>> {
        self.endpoints.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Endpoint>)> {
        self.endpoints.iter().map(|(k, v)| (k.as_str(), v))
    }
}
