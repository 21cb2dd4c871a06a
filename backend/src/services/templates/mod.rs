//! # Template Service Module
//!
//! Routes every request under `/api/templates` to its handler.
//!
//! ## Sub-modules:
//! - `save`: creates a template or replaces the stored one with the same id.
//! - `get`: fetches one template, or lists all of them.
//! - `delete`: removes a template.
//! - `placeholders`: reports the `{{placeholders}}` a template's content uses.

mod delete;
mod get;
mod placeholders;
mod save;

use actix_web::web::{delete, get, post, scope};
use actix_web::Scope;

/// The base path for all template-related API endpoints.
const API_PATH: &str = "/api/templates";

/// Configures and returns the Actix `Scope` for all template-related routes.
///
/// # Registered Routes:
///
/// *   **`POST /save`**: `save::process`. Body is a `Template`.
/// *   **`GET /`**: `get::list`. Every stored template, ordered by name.
/// *   **`GET /{template_id}`**: `get::process`.
/// *   **`DELETE /{template_id}`**: `delete::process`.
/// *   **`GET /{template_id}/placeholders`**: `placeholders::process`.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(get::list))
        .route("/save", post().to(save::process))
        .route("/{template_id}", get().to(get::process))
        .route("/{template_id}", delete().to(delete::process))
        .route("/{template_id}/placeholders", get().to(placeholders::process))
}
