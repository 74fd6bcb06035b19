//! All things related to the storage of short links

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::links::ShortLink;

pub use memory::Memory;
pub use postgres::Postgres;

mod memory;
mod postgres;

/// Storage errors
#[derive(Debug, Error)]
pub enum Error {
    /// A link with the code already exists
    #[error("Code already exists: {0}")]
    Collision(String),

    /// No link with the code exists
    #[error("Code not found: {0}")]
    NotFound(String),

    /// A connection error with the storage
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a link
pub struct CreateLinkValues<'a> {
    /// The code of the link
    pub code: &'a str,

    /// The URL the link redirects to
    pub original_url: &'a str,

    /// The (optional) owner of the link
    pub owner_id: Option<&'a Uuid>,

    /// The (optional) expiration of the link
    pub expires_at: Option<&'a DateTime<Utc>>,
}

/// Values to update a link
///
/// The code, click count and creation date can not be updated
#[derive(Default)]
pub struct UpdateLinkValues<'a> {
    /// New (optional) URL of the link
    pub original_url: Option<&'a str>,

    /// New (optional) active state, `false` is the soft-delete
    pub is_active: Option<bool>,

    /// New (optional) expiration, `Some(None)` removes the expiration
    pub expires_at: Option<Option<&'a DateTime<Utc>>>,
}

/// Storage with all supported operations
///
/// Every operation either fully applies or returns an error
#[async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    /// Insert a new link, unless a link with the same code already exists
    ///
    /// The check and the write are a single atomic operation, a taken code results in
    /// [`Error::Collision`], including codes of inactive links
    async fn try_insert_link(&self, values: &CreateLinkValues<'_>) -> Result<ShortLink>;

    /// Find a single link by code
    ///
    /// DOES NOT respect the soft-delete, handle with care
    async fn find_single_link_by_code(&self, code: &str) -> Result<Option<ShortLink>>;

    /// Find all links of an owner, newest first
    ///
    /// Links created at the same moment are ordered by code, descending
    ///
    /// Respects the soft-delete
    async fn find_all_links_by_owner(&self, owner_id: &Uuid) -> Result<Vec<ShortLink>>;

    /// Atomically increment the click count of a link, returning the new count
    async fn increment_click_count(&self, code: &str) -> Result<u64>;

    /// Update a single link
    async fn update_link(&self, code: &str, values: &UpdateLinkValues<'_>) -> Result<ShortLink>;
}
