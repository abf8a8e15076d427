// Wire types for the DNS provider REST API (Cloudflare v4 shape).
//
// Every response is wrapped in `{success, errors, messages, result,
// result_info}`. Record bodies use `type` as a field name, hence the
// renames.

use serde::{Deserialize, Serialize};

/// Standard response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    pub result: Option<T>,
    #[serde(default)]
    pub result_info: Option<ResultInfo>,
}

/// An entry in the envelope's `errors` / `messages` arrays.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Pagination metadata for list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResultInfo {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub total_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneResponse {
    pub id: String,
    pub name: String,
}

/// A DNS record as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

fn default_ttl() -> u32 {
    1
}

/// Body for create and update calls.
#[derive(Debug, Clone, Serialize)]
pub struct RecordBody<'a> {
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub name: &'a str,
    pub content: &'a str,
    pub ttl: u32,
}

/// Result shape of a delete call.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletedRecord {
    pub id: String,
}
