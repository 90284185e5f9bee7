//! Tab data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tab {
    /// Unique identifier, never reused
    pub id: String,
    /// Page title (hostname-derived until the page reports one)
    pub title: String,
    /// Current URL
    pub url: String,
    /// Favicon URL if available
    pub favicon_url: Option<String>,
    /// When the tab was created
    pub created_at: DateTime<Utc>,
}

impl Tab {
    pub fn new(url: String, title: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            url,
            favicon_url: None,
            created_at: Utc::now(),
        }
    }

    /// Move the tab into the closed ring.
    pub fn into_closed(self) -> ClosedTab {
        ClosedTab {
            id: self.id,
            title: self.title,
            url: self.url,
            favicon_url: self.favicon_url,
            created_at: self.created_at,
            closed_at: Utc::now(),
        }
    }
}

/// A tab in the recently-closed ring, eligible for restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTab {
    pub id: String,
    pub title: String,
    pub url: String,
    pub favicon_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

impl ClosedTab {
    /// Convert back into an active tab. `created_at` is preserved so a
    /// close/restore round trip is lossless.
    pub fn into_tab(self) -> Tab {
        Tab {
            id: self.id,
            title: self.title,
            url: self.url,
            favicon_url: self.favicon_url,
            created_at: self.created_at,
        }
    }
}
