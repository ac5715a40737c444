//! Upload slot types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One-time pair of a write URL and the URL the uploaded file is readable at.
///
/// Valid for a single upload; its lifetime is governed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicket {
    /// Signed URL accepting a single PUT
    pub upload_url: String,
    /// URL to reference the uploaded file in job parameters
    pub download_url: String,
}
