//! Manifest written next to downloaded job results.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// File name of the manifest inside the output directory.
pub const MANIFEST_FILE_NAME: &str = "workflow.result.json";

/// Result name -> relative local path (downloaded outputs) or the original
/// value (literal outputs).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct DownloadManifest(pub BTreeMap<String, Value>);

impl DownloadManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a downloaded output by its path relative to the output directory.
    pub fn insert_local(&mut self, name: impl Into<String>, relative_path: impl Into<String>) {
        self.0.insert(name.into(), Value::String(relative_path.into()));
    }

    /// Record a literal output unchanged.
    pub fn insert_value(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
