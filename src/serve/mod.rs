//! HTTP surface of the gateway.
//!
//! Routes:
//!
//! - `GET /` - landing page rendered from Markdown at startup
//! - `GET /resolve?url=...` - channel page URL to feed path, as JSON
//! - `GET /:cp_name/:document` - `.xml` Atom feed or `.json` profile
//! - `GET /:cp_name/:sub_id/:document` - `.xml` category-scoped feed
//!
//! All state is shared behind one [`AppState`]; the app itself is plain
//! axum with permissive CORS so the resolve endpoint is usable from
//! anywhere.

mod handlers;
pub mod home;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use url::Url;

use crate::scrape::ChannelScraper;

pub struct AppState {
    pub scraper: ChannelScraper,
    /// External base URL when the service sits behind a proxy. Overrides
    /// Host-header derivation for feed self links.
    pub public_base_url: Option<Url>,
    /// Pre-rendered landing page document.
    pub home_html: String,
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/", get(handlers::home))
        .route("/resolve", get(handlers::resolve))
        .route("/:cp_name/:document", get(handlers::channel_document))
        .route("/:cp_name/:sub_id/:document", get(handlers::category_document))
        .layer(cors)
        .with_state(Arc::new(state))
}
