//! Short links

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

/// A short code mapped to an original URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortLink {
    /// Unique, immutable identifier used in the redirect path
    pub code: String,

    /// Location the link redirects to
    pub original_url: String,

    /// The owner of the link, absent for anonymous links
    pub owner_id: Option<Uuid>,

    /// Number of successful resolutions
    ///
    /// Only ever changed by the storage increment
    pub click_count: u64,

    /// Soft-delete flag
    pub is_active: bool,

    /// Moment the link stops resolving, absent means never
    pub expires_at: Option<DateTime<Utc>>,

    /// Creation date
    pub created_at: DateTime<Utc>,

    /// Last updated at
    pub updated_at: DateTime<Utc>,
}

impl ShortLink {
    /// Has the link expired at the given moment?
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Is the link owned by the given requester?
    ///
    /// Anonymous requesters never own anything
    pub fn is_owned_by(&self, requester: Option<&Uuid>) -> bool {
        match (&self.owner_id, requester) {
            (Some(owner_id), Some(requester)) => owner_id == requester,
            _ => false,
        }
    }

    /// Full short URL based on the public base URL
    pub fn short_url(&self, public_url: &str) -> String {
        format!("{}/{}", public_url.trim_end_matches('/'), self.code)
    }
}
