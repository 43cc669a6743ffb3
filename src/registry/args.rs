use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::registry::failure::Failure;

/// Validated argument payload as seen by a handler. The validator has
/// already checked presence and types for declared properties, so the
/// getters here only fail on contract gaps a schema cannot express (for
/// example an array whose elements have the wrong shape).
#[derive(Debug, Clone)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

impl ToolArgs {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.values.get(name) {
            Some(Value::Null) => None,
            other => other,
        }
    }

    pub fn req_str(&self, name: &str) -> Result<&str, Failure> {
        self.get(name)
            .and_then(|value| value.as_str())
            .ok_or_else(|| Failure::invalid_arguments(format!("missing required property: {name}")))
    }

    pub fn req_path(&self, name: &str) -> Result<PathBuf, Failure> {
        Ok(PathBuf::from(self.req_str(name)?))
    }

    /// Required path that must already exist on disk.
    pub fn req_existing_path(&self, name: &str) -> Result<PathBuf, Failure> {
        let path = self.req_path(name)?;
        if !path.exists() {
            return Err(Failure::not_found(&path));
        }
        Ok(path)
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.as_str())
    }

    pub fn opt_u64(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(|value| value.as_u64())
    }

    pub fn opt_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|value| value.as_i64())
    }

    pub fn opt_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|value| value.as_bool())
    }

    pub fn req_array(&self, name: &str) -> Result<&Vec<Value>, Failure> {
        self.get(name)
            .and_then(|value| value.as_array())
            .ok_or_else(|| Failure::invalid_arguments(format!("missing required property: {name}")))
    }

    pub fn req_object(&self, name: &str) -> Result<&Map<String, Value>, Failure> {
        self.get(name)
            .and_then(|value| value.as_object())
            .ok_or_else(|| Failure::invalid_arguments(format!("missing required property: {name}")))
    }

    /// Required array of strings, each checked to name an existing file.
    /// Shape is validated for the whole array before any disk check, so a
    /// malformed element is always `InvalidArguments` and only a missing
    /// file is `NotFound`.
    pub fn req_existing_paths(&self, name: &str) -> Result<Vec<PathBuf>, Failure> {
        let mut paths = Vec::new();
        for entry in self.req_array(name)? {
            let Some(text) = entry.as_str() else {
                return Err(Failure::invalid_arguments(format!(
                    "property {name} must be an array of strings"
                )));
            };
            paths.push(PathBuf::from(text));
        }
        for path in &paths {
            if !path.exists() {
                return Err(Failure::not_found(path));
            }
        }
        Ok(paths)
    }
}

/// Existence check used by handlers that take paths outside ToolArgs.
pub fn require_exists(path: &Path) -> Result<(), Failure> {
    if path.exists() {
        Ok(())
    } else {
        Err(Failure::not_found(path))
    }
}
