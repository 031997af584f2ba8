//! Wire types shared by the server and the client.

use serde::{Deserialize, Serialize};

/// Body of a describe request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DescribeRequest {
    /// Base64 encoded image bytes, without a data-URL prefix.
    #[serde(default)]
    pub image: Option<String>,
}

/// Successful describe response.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DescribeResponse {
    pub labels: Vec<String>,
    pub description: String,
}

/// Body of every failed request.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}
