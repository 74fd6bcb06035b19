//! Links API endpoints
//!
//! Everything related to the creation and management of short links

use std::sync::Arc;

use axum::Extension;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::links::ShortLink;
use crate::service::CreateLink;
use crate::service::LinkService;
use crate::service::Stats;
use crate::service::UpdateLink;
use crate::storage::Storage;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;
use super::deserialize_some;

/// Link response going to the user
///
/// Basically filtering which fields are shown to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    /// Code used to identify the link by the root
    pub code: String,

    /// Full URL to hand out
    pub short_url: String,

    /// Url where root will redirect to
    pub original_url: String,

    /// Owner of the link, `null` for anonymous links
    pub owner_id: Option<Uuid>,

    /// Number of redirects
    pub click_count: u64,

    /// Soft-delete flag
    pub is_active: bool,

    /// Expiration, `null` when the link never expires
    pub expires_at: Option<DateTime<Utc>>,

    /// Creation date
    pub created_at: DateTime<Utc>,

    /// Last updated at
    pub updated_at: DateTime<Utc>,
}

impl LinkResponse {
    /// Create a response from a [`ShortLink`](ShortLink)
    fn from_link(link: ShortLink, public_url: &str) -> Self {
        Self {
            short_url: link.short_url(public_url),
            code: link.code,
            original_url: link.original_url,
            owner_id: link.owner_id,
            click_count: link.click_count,
            is_active: link.is_active,
            expires_at: link.expires_at,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }

    /// Create a response from multiple [`ShortLink`](ShortLink)s
    fn from_link_multiple(links: Vec<ShortLink>, public_url: &str) -> Vec<Self> {
        links
            .into_iter()
            .map(|link| Self::from_link(link, public_url))
            .collect::<Vec<Self>>()
    }
}

/// Statistics response going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Code of the link
    pub code: String,

    /// Url where root will redirect to
    pub original_url: String,

    /// Number of redirects
    pub click_count: u64,

    /// Creation date
    pub created_at: DateTime<Utc>,

    /// Is the link past its expiration?
    pub is_expired: bool,
}

impl From<Stats> for StatsResponse {
    fn from(stats: Stats) -> Self {
        Self {
            code: stats.code,
            original_url: stats.original_url,
            click_count: stats.click_count,
            created_at: stats.created_at,
            is_expired: stats.is_expired,
        }
    }
}

/// List all links of the current user
///
/// Anonymous users get an empty list
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/links
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "code": "abc123", "shortUrl": "http://localhost:6000/abc123" ... } ] }
/// ```
pub async fn list<S: Storage>(
    Extension(service): Extension<LinkService<S>>,
    Extension(config): Extension<Arc<Config>>,
    current_user: Option<CurrentUser>,
) -> Result<Success<Vec<LinkResponse>>, Error> {
    let owner_id = current_user.as_ref().map(|current_user| &current_user.owner_id);

    let links = service.list(owner_id).await?;

    Ok(Success::ok(LinkResponse::from_link_multiple(
        links,
        &config.public_url,
    )))
}

/// Get a single link of the current user
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/links/abc123
/// ```
///
/// Response:
/// ```json
/// { "data": { "code": "abc123", "shortUrl": "http://localhost:6000/abc123" ... } }
/// ```
pub async fn single<S: Storage>(
    Extension(service): Extension<LinkService<S>>,
    Extension(config): Extension<Arc<Config>>,
    current_user: CurrentUser,
    PathParameters(code): PathParameters<String>,
) -> Result<Success<LinkResponse>, Error> {
    let link = service.owned(&code, &current_user.owner_id).await?;

    Ok(Success::ok(LinkResponse::from_link(
        link,
        &config.public_url,
    )))
}

/// Create link form
///
/// Fields to create a link with
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkForm {
    /// Url to create a link for
    original_url: String,

    /// Code to use instead of a generated one, an empty code counts as no code
    custom_code: Option<String>,

    /// Moment the link stops redirecting
    expires_at: Option<DateTime<Utc>>,
}

/// Create a link based on the [`CreateLinkForm`](CreateLinkForm) form
///
/// Anyone can create links, links created with a token are owned by that user
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "originalUrl": "https://www.example.com/", "customCode": "abc123" }' \
///     http://localhost:6000/api/links
/// ```
///
/// Response
/// ```json
/// { "data": { "code": "abc123", "shortUrl": "http://localhost:6000/abc123" ... } }
/// ```
pub async fn create<S: Storage>(
    Extension(service): Extension<LinkService<S>>,
    Extension(config): Extension<Arc<Config>>,
    current_user: Option<CurrentUser>,
    Form(form): Form<CreateLinkForm>,
) -> Result<Success<LinkResponse>, Error> {
    let values = CreateLink {
        original_url: &form.original_url,
        custom_code: form
            .custom_code
            .as_deref()
            .filter(|custom_code| !custom_code.is_empty()),
        owner_id: current_user
            .as_ref()
            .map(|current_user| &current_user.owner_id),
        expires_at: form.expires_at.as_ref(),
    };

    let link = service.create(&values).await?;

    tracing::debug!(r#"Created "{}" for: {}"#, link.code, link.original_url);

    Ok(Success::created(LinkResponse::from_link(
        link,
        &config.public_url,
    )))
}

/// Update link form
///
/// Fields to update a link with, all fields are optional and are not touched when not provided
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinkForm {
    /// New url of the link
    original_url: Option<String>,

    /// New active state, `false` deletes the link
    is_active: Option<bool>,

    /// New expiration, `null` removes the expiration
    #[serde(default, deserialize_with = "deserialize_some")]
    expires_at: Option<Option<DateTime<Utc>>>,
}

/// Update a link based on the [`UpdateLinkForm`](UpdateLinkForm) form
///
/// Only provided values are processed, the other fields of the link will not be touched
///
/// Request:
/// ```sh
/// curl -v -XPATCH -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "originalUrl": "https://www.example.com/", "expiresAt": null }' \
///     http://localhost:6000/api/links/abc123
/// ```
///
/// Response
/// ```json
/// { "data": { "code": "abc123", "shortUrl": "http://localhost:6000/abc123" ... } }
/// ```
pub async fn update<S: Storage>(
    Extension(service): Extension<LinkService<S>>,
    Extension(config): Extension<Arc<Config>>,
    current_user: CurrentUser,
    PathParameters(code): PathParameters<String>,
    Form(form): Form<UpdateLinkForm>,
) -> Result<Success<LinkResponse>, Error> {
    let values = UpdateLink {
        original_url: form.original_url.as_deref(),
        is_active: form.is_active,
        expires_at: form.expires_at.as_ref().map(Option::as_ref),
    };

    let link = service
        .update(&code, &current_user.owner_id, &values)
        .await?;

    Ok(Success::ok(LinkResponse::from_link(
        link,
        &config.public_url,
    )))
}

/// Delete a link
///
/// Links are never removed, only deactivated, the code stays taken
///
/// Request:
/// ```sh
/// curl -v -XDELETE \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/links/abc123
/// ```
pub async fn delete<S: Storage>(
    Extension(service): Extension<LinkService<S>>,
    current_user: CurrentUser,
    PathParameters(code): PathParameters<String>,
) -> Result<Success<&'static str>, Error> {
    service.deactivate(&code, &current_user.owner_id).await?;

    Ok(Success::<&'static str>::no_content())
}

/// Statistics of a link
///
/// Links with an owner are only visible to that owner
///
/// Request:
/// ```sh
/// curl -v http://localhost:6000/api/links/abc123/stats
/// ```
///
/// Response
/// ```json
/// { "data": { "code": "abc123", "clickCount": 42, "isExpired": false ... } }
/// ```
pub async fn stats<S: Storage>(
    Extension(service): Extension<LinkService<S>>,
    current_user: Option<CurrentUser>,
    PathParameters(code): PathParameters<String>,
) -> Result<Success<StatsResponse>, Error> {
    let requester = current_user
        .as_ref()
        .map(|current_user| &current_user.owner_id);

    let stats = service.stats(&code, requester).await?;

    Ok(Success::ok(StatsResponse::from(stats)))
}
