use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::runtime::Runtime;

/// Package metadata stored next to every installed script (`package.json`).
///
/// Only `name` and `version` are interpreted; every other field is carried
/// through untouched and in its original order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Meta {
    fields: Map<String, Value>,
}

impl Meta {
    pub fn new(name: &str, version: &str) -> Self {
        let mut meta = Meta::default();
        meta.set_name_version(name, version);
        meta
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.fields.get("version").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Overwrite `name` and `version`, keeping every other field.
    pub fn set_name_version(&mut self, name: &str, version: &str) {
        self.fields
            .insert("name".to_string(), Value::String(name.to_string()));
        self.fields
            .insert("version".to_string(), Value::String(version.to_string()));
    }

    pub fn parse(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        match value {
            Value::Object(fields) => Ok(Meta { fields }),
            other => Err(anyhow!("Expected a JSON object, found {}", other)),
        }
    }

    #[tracing::instrument(skip(runtime, path))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        Self::parse(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        runtime
            .write(path, content.as_bytes())
            .with_context(|| format!("Failed to save metadata to {:?}", path))
    }
}
