//! Link service
//!
//! Creation, resolution and statistics of short links, independent of the HTTP boundary

use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::codes::Generator;
use crate::codes::MAX_CODE_LENGTH;
use crate::codes::RandomGenerator;
use crate::codes::is_valid_code;
use crate::links::ShortLink;
use crate::storage;
use crate::storage::CreateLinkValues;
use crate::storage::Storage;
use crate::storage::UpdateLinkValues;

/// Maximum number of generated codes tried before giving up
///
/// Collisions are astronomically rare, this only guards against a broken generator
pub const MAX_GENERATION_ATTEMPTS: usize = 5;

/// Maximum length of an original URL
pub const MAX_URL_LENGTH: usize = 2048;

/// Schemes an original URL may use
const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

/// Service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input, correctable by the caller
    #[error("{0}")]
    Validation(String),

    /// Custom code is already taken
    #[error("Code already in use")]
    Collision(String),

    /// Unknown code
    #[error("Link not found")]
    NotFound,

    /// Soft-deleted link, reported like an unknown code
    #[error("Link not found")]
    Inactive,

    /// Link is past its expiration
    #[error("Link has expired")]
    Expired,

    /// Requester does not own the link
    #[error("You do not have permission to view this link")]
    Forbidden,

    /// No unique code found within the attempt budget
    #[error("Could not generate a unique code after {0} attempts")]
    Exhausted(usize),

    /// Any other storage failure
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

/// Result type for all service interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a link with
pub struct CreateLink<'a> {
    /// URL to redirect to
    pub original_url: &'a str,

    /// Code to use instead of a generated one
    pub custom_code: Option<&'a str>,

    /// The owner, absent for anonymous links
    pub owner_id: Option<&'a Uuid>,

    /// The (optional) expiration
    pub expires_at: Option<&'a DateTime<Utc>>,
}

/// Values to update a link with, all optional
#[derive(Default)]
pub struct UpdateLink<'a> {
    /// New URL to redirect to
    pub original_url: Option<&'a str>,

    /// New active state
    pub is_active: Option<bool>,

    /// New expiration, `Some(None)` removes it
    pub expires_at: Option<Option<&'a DateTime<Utc>>>,
}

/// Statistics of a single link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    /// Code of the link
    pub code: String,

    /// URL the link redirects to
    pub original_url: String,

    /// Number of resolutions
    pub click_count: u64,

    /// Creation date
    pub created_at: DateTime<Utc>,

    /// Is the link past its expiration?
    pub is_expired: bool,
}

/// Link service
#[derive(Clone)]
pub struct LinkService<S: Storage> {
    /// Storage, the single source of truth
    storage: S,

    /// Source of generated codes
    generator: Arc<dyn Generator>,

    /// Source of "now" for expiration checks
    clock: Arc<dyn Clock>,

    /// Length of generated codes
    code_length: usize,
}

impl<S: Storage> LinkService<S> {
    /// Create a service with a random generator and the system clock
    pub fn new(storage: S, code_length: usize) -> Self {
        Self {
            storage,
            generator: Arc::new(RandomGenerator),
            clock: Arc::new(SystemClock),
            code_length,
        }
    }

    /// Replace the code generator
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = generator;
        self
    }

    /// Replace the clock
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create a link, with a custom code or a generated one
    pub async fn create(&self, values: &CreateLink<'_>) -> Result<ShortLink> {
        let original_url = parse_original_url(values.original_url)?;

        if let Some(custom_code) = values.custom_code {
            return self.create_with_custom_code(values, &original_url, custom_code).await;
        }

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let code = self.generator.generate(self.code_length);

            let insert_values = CreateLinkValues {
                code: &code,
                original_url: original_url.as_str(),
                owner_id: values.owner_id,
                expires_at: values.expires_at,
            };

            match self.storage.try_insert_link(&insert_values).await {
                Ok(link) => return Ok(link),
                Err(storage::Error::Collision(code)) => {
                    tracing::warn!(r#"Generated code "{code}" collided (attempt {attempt})"#);
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(Error::Exhausted(MAX_GENERATION_ATTEMPTS))
    }

    /// Create a link with a code chosen by the caller
    async fn create_with_custom_code(
        &self,
        values: &CreateLink<'_>,
        original_url: &Url,
        custom_code: &str,
    ) -> Result<ShortLink> {
        if !is_valid_code(custom_code) {
            return Err(Error::Validation(format!(
                "Code must be 1 to {MAX_CODE_LENGTH} letters and numbers"
            )));
        }

        // a code taken in the meantime is still rejected by the insert
        if self
            .storage
            .find_single_link_by_code(custom_code)
            .await?
            .is_some()
        {
            return Err(Error::Collision(custom_code.to_string()));
        }

        let insert_values = CreateLinkValues {
            code: custom_code,
            original_url: original_url.as_str(),
            owner_id: values.owner_id,
            expires_at: values.expires_at,
        };

        self.storage
            .try_insert_link(&insert_values)
            .await
            .map_err(|err| match err {
                storage::Error::Collision(code) => Error::Collision(code),
                err => Error::Storage(err),
            })
    }

    /// Resolve a code into the URL to redirect to
    ///
    /// A successful resolution counts as a click, failing to count it does not fail the resolution
    pub async fn resolve(&self, code: &str) -> Result<String> {
        if !is_valid_code(code) {
            return Err(Error::NotFound);
        }

        let link = self
            .storage
            .find_single_link_by_code(code)
            .await?
            .ok_or(Error::NotFound)?;

        if !link.is_active {
            return Err(Error::Inactive);
        }

        if link.is_expired(self.clock.now()) {
            return Err(Error::Expired);
        }

        if let Err(err) = self.storage.increment_click_count(code).await {
            tracing::warn!(r#"Could not count click on "{code}": {err}"#);
        }

        Ok(link.original_url)
    }

    /// Statistics of a link
    ///
    /// Links with an owner are only visible to that owner, links without one to anybody
    pub async fn stats(&self, code: &str, requester: Option<&Uuid>) -> Result<Stats> {
        let link = self.find_active(code).await?;

        if link.owner_id.is_some() && !link.is_owned_by(requester) {
            return Err(Error::Forbidden);
        }

        Ok(Stats {
            is_expired: link.is_expired(self.clock.now()),
            code: link.code,
            original_url: link.original_url,
            click_count: link.click_count,
            created_at: link.created_at,
        })
    }

    /// All active links of an owner, newest first
    ///
    /// Anonymous requesters own nothing
    pub async fn list(&self, owner_id: Option<&Uuid>) -> Result<Vec<ShortLink>> {
        let Some(owner_id) = owner_id else {
            return Ok(Vec::new());
        };

        Ok(self.storage.find_all_links_by_owner(owner_id).await?)
    }

    /// A single active link of an owner
    ///
    /// Links of others are reported as not found
    pub async fn owned(&self, code: &str, owner_id: &Uuid) -> Result<ShortLink> {
        let link = self.find_active(code).await?;

        if link.is_owned_by(Some(owner_id)) {
            Ok(link)
        } else {
            Err(Error::NotFound)
        }
    }

    /// Update a single active link of an owner
    pub async fn update(
        &self,
        code: &str,
        owner_id: &Uuid,
        values: &UpdateLink<'_>,
    ) -> Result<ShortLink> {
        let link = self.owned(code, owner_id).await?;

        let original_url = values.original_url.map(parse_original_url).transpose()?;

        let update_values = UpdateLinkValues {
            original_url: original_url.as_ref().map(Url::as_str),
            is_active: values.is_active,
            expires_at: values.expires_at,
        };

        Ok(self.storage.update_link(&link.code, &update_values).await?)
    }

    /// Soft-delete a single active link of an owner
    pub async fn deactivate(&self, code: &str, owner_id: &Uuid) -> Result<()> {
        let values = UpdateLink {
            is_active: Some(false),
            ..UpdateLink::default()
        };

        self.update(code, owner_id, &values).await.map(|_| ())
    }

    /// Find a link that is not soft-deleted
    async fn find_active(&self, code: &str) -> Result<ShortLink> {
        if !is_valid_code(code) {
            return Err(Error::NotFound);
        }

        match self.storage.find_single_link_by_code(code).await? {
            Some(link) if link.is_active => Ok(link),
            Some(_) => Err(Error::Inactive),
            None => Err(Error::NotFound),
        }
    }
}

/// Parse and validate an original URL
///
/// Only absolute URLs with a host and a known scheme are accepted
pub fn parse_original_url(original_url: &str) -> Result<Url> {
    if original_url.chars().count() > MAX_URL_LENGTH {
        return Err(Error::Validation(format!(
            "URL can not be longer than {MAX_URL_LENGTH} characters"
        )));
    }

    let url = Url::parse(original_url)
        .map_err(|err| Error::Validation(format!("Invalid URL: {err}")))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(Error::Validation(format!(
            r#"URL scheme "{}" is not supported"#,
            url.scheme()
        )));
    }

    if !url.has_host() {
        return Err(Error::Validation("URL must have a host".to_string()));
    }

    if url.as_str().len() > MAX_URL_LENGTH {
        return Err(Error::Validation(format!(
            "URL can not be longer than {MAX_URL_LENGTH} characters"
        )));
    }

    Ok(url)
}
