//! API response helpers

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;

use crate::service;

/// Hold data for a successful API interaction
pub struct Success<V>
where
    V: Serialize,
{
    status_code: StatusCode,
    data: Option<V>,
}

impl<V> Success<V>
where
    V: Serialize,
{
    pub fn ok(data: V) -> Self {
        Self {
            status_code: StatusCode::OK,
            data: Some(data),
        }
    }

    pub fn created(data: V) -> Self {
        Self {
            status_code: StatusCode::CREATED,
            data: Some(data),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status_code: StatusCode::NO_CONTENT,
            data: None,
        }
    }
}

#[derive(Serialize)]
struct DataWrapper<D>
where
    D: Serialize,
{
    data: D,
}

impl<V> IntoResponse for Success<V>
where
    V: Serialize,
{
    fn into_response(self) -> Response {
        if let Some(data) = self.data {
            (self.status_code, Json(DataWrapper { data })).into_response()
        } else {
            self.status_code.into_response()
        }
    }
}

/// Hold data for a failed API interaction
#[derive(Debug)]
pub struct Error {
    status_code: StatusCode,
    message: String,
    description: Option<String>,
}

impl Error {
    pub fn bad_request<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn gone<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self::new(StatusCode::GONE, message)
    }

    pub fn internal_server_error<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_description<M>(self, description: M) -> Self
    where
        M: ToString,
    {
        Self {
            description: Some(description.to_string()),
            ..self
        }
    }

    fn new<M>(status_code: StatusCode, message: M) -> Self
    where
        M: ToString,
    {
        Self {
            status_code,
            message: message.to_string(),
            description: None,
        }
    }
}

impl From<service::Error> for Error {
    fn from(err: service::Error) -> Self {
        use service::Error as ServiceError;

        match err {
            ServiceError::Validation(_) | ServiceError::Collision(_) => Self::bad_request(err),
            ServiceError::NotFound | ServiceError::Inactive => Self::not_found(err),
            ServiceError::Expired => Self::gone(err),
            ServiceError::Forbidden => Self::forbidden(err),
            ServiceError::Exhausted(_) | ServiceError::Storage(_) => {
                tracing::error!("Internal error: {err}");

                Self::internal_server_error("Internal server error")
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorWrapper<D>
where
    D: Serialize,
{
    error: D,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<D>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (
            self.status_code,
            Json(ErrorWrapper {
                error: self.message,
                description: self.description,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage;

    #[test]
    fn test_from_service_error() {
        let cases = [
            (
                service::Error::Validation("Invalid URL".to_string()),
                StatusCode::BAD_REQUEST,
                "Invalid URL",
            ),
            (
                service::Error::Collision("abc123".to_string()),
                StatusCode::BAD_REQUEST,
                "Code already in use",
            ),
            (
                service::Error::NotFound,
                StatusCode::NOT_FOUND,
                "Link not found",
            ),
            (
                service::Error::Inactive,
                StatusCode::NOT_FOUND,
                "Link not found",
            ),
            (
                service::Error::Expired,
                StatusCode::GONE,
                "Link has expired",
            ),
            (
                service::Error::Forbidden,
                StatusCode::FORBIDDEN,
                "You do not have permission to view this link",
            ),
            (
                service::Error::Exhausted(5),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ),
            (
                service::Error::Storage(storage::Error::Connection("gone".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ),
        ];

        for (err, status_code, message) in cases {
            let err = Error::from(err);

            assert_eq!(err.status_code, status_code);
            assert_eq!(err.message, message);
        }
    }
}
