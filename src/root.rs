//! The root!
//!
//! The most important part of Shortlink, the actual redirect logic

use std::str::Utf8Error;
use std::sync::Arc;

use axum::Extension;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::http::header::LOCATION;
use percent_encoding::percent_decode_str;

use crate::config::Config;
use crate::service;
use crate::service::LinkService;
use crate::storage::Storage;

/// The root!
///
/// All wildcard requests end up in this function.
///
/// The code is taken from the path and resolved by the service, a successful resolution counts
/// as a click. Expired links send the visitor to the configured landing page.
pub async fn root<S: Storage>(
    Extension(service): Extension<LinkService<S>>,
    Extension(config): Extension<Arc<Config>>,
    uri: Uri,
) -> Result<(StatusCode, HeaderMap), (StatusCode, String)> {
    let code = uri.path().trim_matches('/');
    let code = url_decode_code(code).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "URL contains invalid UTF-8 characters".to_string(),
        )
    })?;

    tracing::debug!("Looking for code: /{code}");

    let mut headers = HeaderMap::new();

    let status_code = match service.resolve(&code).await {
        Ok(original_url) => {
            tracing::debug!(r#"Code "{code}" redirecting to: {original_url}"#);

            headers.insert(
                LOCATION,
                HeaderValue::from_str(&original_url).map_err(internal_error)?,
            );

            StatusCode::FOUND
        }
        Err(service::Error::Expired) => {
            tracing::debug!(r#"Code "{code}" has expired"#);

            headers.insert(
                LOCATION,
                HeaderValue::from_str(&config.expired_redirect).map_err(internal_error)?,
            );

            StatusCode::FOUND
        }
        Err(service::Error::NotFound | service::Error::Inactive) => {
            tracing::debug!(r#"Code "{code}" not found"#);

            StatusCode::NOT_FOUND
        }
        Err(err) => {
            tracing::error!(r#"Could not resolve "{code}": {err}"#);

            return Err(internal_error(err));
        }
    };

    Ok((status_code, headers))
}

/// Utility function for mapping any error into a `500 Internal Server Error`
/// response.
fn internal_error<E>(err: E) -> (StatusCode, String)
where
    E: std::error::Error,
{
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// URL decode code
///
/// Uses percentage encoding for the decoding, might error in case of invalid UTF-8
fn url_decode_code(code: &str) -> Result<String, Utf8Error> {
    let decoded = percent_decode_str(code);

    decoded.decode_utf8().map(|decoded| decoded.to_string())
}
