//! Data structures for monitoring streams as served by `GET /streaming`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Active,
    Inactive,
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamStatus::Active => f.pad("active"),
            StreamStatus::Inactive => f.pad("inactive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamOwner {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub is_active: bool,
}

/// Detection use case a stream is analysed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessCase {
    pub id: i64,
    pub name: String,
    pub business_case_type: String,
    pub confidence_threshold: f64,
    #[serde(default)]
    pub model_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfiguration {
    pub id: i64,
    pub name: String,
    pub confidence_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSource {
    pub id: i64,
    pub name: String,
    pub source_type: String,
    pub status: String,
    /// Source-specific and opaque to the client.
    #[serde(default)]
    pub credentials: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub id: i64,
    pub user_id: i64,
    pub business_case_id: i64,
    #[serde(default)]
    pub configuration_ids: Vec<i64>,
    pub video_source_id: i64,
    pub status: StreamStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<StreamOwner>,
    #[serde(default)]
    pub business_case: Option<BusinessCase>,
    #[serde(default)]
    pub configurations: Vec<StreamConfiguration>,
    #[serde(default)]
    pub video_source: Option<VideoSource>,
}

impl Stream {
    pub fn is_active(&self) -> bool {
        self.status == StreamStatus::Active
    }
}

/// Pagination metadata returned with each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            total: 0,
            total_pages: 0,
        }
    }
}

/// `data` member of the stream listing response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamPage {
    #[serde(default)]
    pub streams: Vec<Stream>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Client-side cache of the last fetched page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamState {
    pub streams: Vec<Stream>,
    pub loading: bool,
    pub error: Option<String>,
    pub pagination: Pagination,
}
