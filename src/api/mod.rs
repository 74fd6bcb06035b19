//! All API endpoint setup

use axum::Router;
use axum::routing::get;

pub use current_user::CurrentUser;
pub use current_user::JwtKeys;
pub use request::Form;
pub use request::PathParameters;
pub use request::deserialize_some;
pub use response::Error;
pub use response::Success;

#[cfg(test)]
pub use current_user::Claims;

use crate::storage::Storage;

mod current_user;
mod links;
mod request;
mod response;

/// Get the Axum router for all API routes
pub fn router<S: Storage>() -> Router {
    let links = Router::new()
        .route("/", get(links::list::<S>).post(links::create::<S>))
        .route(
            "/{code}",
            get(links::single::<S>)
                .patch(links::update::<S>)
                .delete(links::delete::<S>),
        )
        .route("/{code}/stats", get(links::stats::<S>));

    Router::new().nest("/links", links)
}
