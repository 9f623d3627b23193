// Wire types for the group data endpoint.
//
// Request bodies are built by the caller; response types are lenient
// (`#[serde(default)]` everywhere) because the service adds fields freely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One `(feed key, value)` pair inside a group update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedValue {
    pub key: String,
    pub value: String,
}

/// Body of `POST /{username}/groups/{group_key}/data`.
///
/// Every listed feed gets one new data point; feeds that don't exist yet
/// are created inside the group by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFeedData {
    pub feeds: Vec<FeedValue>,

    /// Timestamp applied to every point. Service time when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl GroupFeedData {
    pub fn new(feeds: Vec<FeedValue>) -> Self {
        Self {
            feeds,
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

/// A data point as echoed back by the service after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedDatum {
    pub id: Option<String>,
    pub value: Option<String>,
    pub feed_id: Option<u64>,
    pub feed_key: Option<String>,
    pub group_id: Option<u64>,
    pub created_at: Option<String>,
}

/// Error body shape: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}
