//! HTTP front end of the filter builder.
//!
//! Serves the filter form, stores each submission in a cookie-keyed session
//! and exports the stored selections as a PyCantus filter document.

pub mod config;
pub mod error;
pub mod handlers;
pub mod session;
pub mod templates;

use axum::routing::get;
use axum::Router;

use crate::handlers::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route(
            "/filter",
            get(handlers::filter_form).post(handlers::submit_filter),
        )
        .route("/filter/download", get(handlers::download))
        .route("/filter/help", get(handlers::help))
        .route("/filter/about", get(handlers::about))
        .route("/filter/contact", get(handlers::contact))
        .with_state(state)
}
