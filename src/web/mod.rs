//! Web server module
//!
//! Provides the HTTP API and the query page.

mod error;
mod handlers;
mod routes;
mod state;
mod templates;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use templates::Templates;
