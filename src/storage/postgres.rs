//! Postgres storage
//!
//! Uniqueness of codes is enforced by the primary key, click counts are incremented in place

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::links::ShortLink;

use super::CreateLinkValues;
use super::Error;
use super::Result;
use super::Storage;
use super::UpdateLinkValues;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Columns returned for every link query
const LINK_COLUMNS: &str =
    "code, original_url, owner_id, click_count, is_active, expires_at, created_at, updated_at";

/// Postgres storage
#[derive(Clone, Debug)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Connect to Postgres
    ///
    /// Migrations will be run
    pub async fn connect(database_url: &str) -> Result<Self> {
        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
            .map_err(connection_error)?;

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> Result<Self> {
        MIGRATOR
            .run(&connection_pool)
            .await
            .map_err(|err| Error::Connection(format!("Migrations could not run: {err}")))?;

        Ok(Self { connection_pool })
    }
}

/// `SQLx` version of a link
#[derive(FromRow)]
struct SqlxLink {
    /// Code
    code: String,

    /// Original URL
    original_url: String,

    /// Owner ID
    owner_id: Option<Uuid>,

    /// Click count, `BIGINT` is signed
    click_count: i64,

    /// Soft-delete flag
    is_active: bool,

    /// Expiration
    expires_at: Option<DateTime<Utc>>,

    /// Creation date
    created_at: DateTime<Utc>,

    /// Last updated at
    updated_at: DateTime<Utc>,
}

impl From<SqlxLink> for ShortLink {
    fn from(link: SqlxLink) -> Self {
        Self {
            code: link.code,
            original_url: link.original_url,
            owner_id: link.owner_id,
            click_count: count_from_sqlx(link.click_count),
            is_active: link.is_active,
            expires_at: link.expires_at,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

#[async_trait]
impl Storage for Postgres {
    async fn try_insert_link(&self, values: &CreateLinkValues<'_>) -> Result<ShortLink> {
        let link = sqlx::query_as::<_, SqlxLink>(&format!(
            r"
            INSERT INTO links (code, original_url, owner_id, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO NOTHING
            RETURNING {LINK_COLUMNS}
            "
        ))
        .bind(values.code)
        .bind(values.original_url)
        .bind(values.owner_id)
        .bind(values.expires_at)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        link.map(ShortLink::from)
            .ok_or_else(|| Error::Collision(values.code.to_string()))
    }

    async fn find_single_link_by_code(&self, code: &str) -> Result<Option<ShortLink>> {
        let link = sqlx::query_as::<_, SqlxLink>(&format!(
            r"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE code = $1
            LIMIT 1
            "
        ))
        .bind(code)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(link.map(ShortLink::from))
    }

    async fn find_all_links_by_owner(&self, owner_id: &Uuid) -> Result<Vec<ShortLink>> {
        let links = sqlx::query_as::<_, SqlxLink>(&format!(
            r"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE is_active AND owner_id = $1
            ORDER BY created_at DESC, code DESC
            "
        ))
        .bind(owner_id)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(links.into_iter().map(ShortLink::from).collect())
    }

    async fn increment_click_count(&self, code: &str) -> Result<u64> {
        let click_count = sqlx::query_scalar::<_, i64>(
            r"
            UPDATE links
            SET click_count = click_count + 1
            WHERE code = $1
            RETURNING click_count
            ",
        )
        .bind(code)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        click_count
            .map(count_from_sqlx)
            .ok_or_else(|| Error::NotFound(code.to_string()))
    }

    async fn update_link(&self, code: &str, values: &UpdateLinkValues<'_>) -> Result<ShortLink> {
        let link = sqlx::query_as::<_, SqlxLink>(&format!(
            r"
            UPDATE links
            SET original_url = COALESCE($2, original_url),
                is_active = COALESCE($3, is_active),
                expires_at = CASE WHEN $4 THEN $5 ELSE expires_at END,
                updated_at = CURRENT_TIMESTAMP
            WHERE code = $1
            RETURNING {LINK_COLUMNS}
            "
        ))
        .bind(code)
        .bind(values.original_url)
        .bind(values.is_active)
        .bind(values.expires_at.is_some())
        .bind(values.expires_at.flatten())
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        link.map(ShortLink::from)
            .ok_or_else(|| Error::NotFound(code.to_string()))
    }
}

/// Convert a `BIGINT` counter, the column has a non-negative check
fn count_from_sqlx(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
