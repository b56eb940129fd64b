//! All API endpoint setup

use axum::Router;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::routing::put;

pub use request::Form;
pub use request::PathParameters;
pub use response::Error;
pub use response::Success;

use crate::storage::Storage;

mod admin;
mod aliases;
mod request;
mod response;

/// Get the Axum router for all API routes
pub fn router<S: Storage>() -> Router {
    let aliases = Router::new()
        .route("/", get(aliases::list::<S>))
        .route("/", post(aliases::create::<S>))
        .route("/{alias}/use", post(aliases::mark_used::<S>))
        .route("/{alias}", put(aliases::update::<S>))
        .route("/{alias}/color", patch(aliases::update_color::<S>))
        .route("/{alias}", delete(aliases::delete::<S>));

    Router::new()
        .route("/status", get(aliases::status::<S>))
        .nest("/aliases", aliases)
        .route("/used-addresses", delete(admin::clear_used_addresses::<S>))
        .route("/daily-usage", delete(admin::reset_daily_usage::<S>))
}
