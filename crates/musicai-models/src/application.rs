//! Application metadata.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata of the application the API key belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ApplicationInfo {
    pub id: String,
    pub name: String,
    /// Any additional fields the service returns
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
