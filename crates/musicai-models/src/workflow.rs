//! Workflow definitions.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A remotely defined processing pipeline, identified by its slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Slug used when submitting jobs
    pub slug: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared input parameters, as described by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Workflow listing. Envelope form is what the service normally returns.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WorkflowList {
    Envelope { workflows: Vec<Workflow> },
    Bare(Vec<Workflow>),
}

impl WorkflowList {
    pub fn into_vec(self) -> Vec<Workflow> {
        match self {
            WorkflowList::Envelope { workflows } | WorkflowList::Bare(workflows) => workflows,
        }
    }
}
