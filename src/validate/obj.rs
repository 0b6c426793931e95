use serde_json::Value;

use super::Validator;
use crate::ast::ObjectType;
use crate::error::{ErrorKind, ValidateResult, ValidationError};

impl Validator {
    pub(super) fn object(&self, value: &Value, obj: &ObjectType, depth: usize) -> ValidateResult {
        let Value::Object(map) = value else {
            return Err(ValidationError::new(ErrorKind::NotAnObject, value.clone()));
        };

        for (key, node) in &obj.fields {
            match map.get(key) {
                None if node.nullable => {}
                None => return Err(ValidationError::new(ErrorKind::ObjectKeyNotFound, key.as_str())),
                Some(v) => self.value_at(Some(v), node, depth + 1).map_err(|e| e.at_key(key))?,
            }
        }

        if !obj.allow_extra_keys {
            if let Some(extra) = map.keys().find(|k| !obj.fields.contains_key(k.as_str())) {
                return Err(ValidationError::new(ErrorKind::ObjectUnexpectedKey, extra.as_str()));
            }
        }
        Ok(())
    }
}
