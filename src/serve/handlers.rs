//! Request handlers for the feed gateway.
//!
//! Routing cannot express an extension suffix inside one path segment, so
//! the channel routes capture a whole `document` segment and dispatch on
//! its extension here: `.xml` serves the Atom feed, `.json` the channel
//! profile. Upstream lookups that miss return a plain 404; anything else
//! that goes wrong is a 500 with the chain in the server log.
use anyhow::Context;
use axum::extract::{Host, OriginalUri, Path, Query, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

use crate::channel::ChannelId;
use crate::feed;
use crate::scrape::ScrapeError;
use crate::serve::AppState;

const ATOM_CONTENT_TYPE: &str = "application/atom+xml; charset=utf-8";

enum DocumentKind {
    Feed,
    Profile,
}

/// Splits `atelier.xml` into `("atelier", Feed)`. Empty stems and unknown
/// extensions are rejected, which turns them into plain 404s.
fn split_document(document: &str) -> Option<(&str, DocumentKind)> {
    let (stem, kind) = if let Some(stem) = document.strip_suffix(".xml") {
        (stem, DocumentKind::Feed)
    } else if let Some(stem) = document.strip_suffix(".json") {
        (stem, DocumentKind::Profile)
    } else {
        return None;
    };
    if stem.is_empty() {
        return None;
    }
    Some((stem, kind))
}

pub async fn home(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.home_html.clone())
}

/// Handles `GET /:cp_name/:document`, the whole-channel feed or profile.
pub async fn channel_document(
    State(state): State<Arc<AppState>>,
    Host(host): Host,
    OriginalUri(uri): OriginalUri,
    Path((cp_name, document)): Path<(String, String)>,
) -> Response {
    match split_document(&document) {
        Some((sub_id, DocumentKind::Feed)) => {
            serve_feed(&state, ChannelId::new(&cp_name, sub_id), &host, &uri).await
        }
        Some((sub_id, DocumentKind::Profile)) => {
            serve_profile(&state, ChannelId::new(&cp_name, sub_id)).await
        }
        None => not_found(),
    }
}

/// Handles `GET /:cp_name/:sub_id/:document`, the category-scoped feed.
/// Profiles are channel-level, so only `.xml` is served under a category.
pub async fn category_document(
    State(state): State<Arc<AppState>>,
    Host(host): Host,
    OriginalUri(uri): OriginalUri,
    Path((cp_name, sub_id, document)): Path<(String, String, String)>,
) -> Response {
    match split_document(&document) {
        Some((category_id, DocumentKind::Feed)) => {
            let id = ChannelId::with_category(&cp_name, &sub_id, category_id);
            serve_feed(&state, id, &host, &uri).await
        }
        _ => not_found(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveResponse {
    cp_name: String,
    sub_id: String,
    category_id: Option<String>,
    feed_path: String,
}

/// Handles `GET /resolve?url=...`, mapping a channel page URL to its feed path.
pub async fn resolve(Query(query): Query<ResolveQuery>) -> Response {
    match ChannelId::from_page_url(&query.url) {
        Some(id) => {
            let body = ResolveResponse {
                feed_path: id.feed_path(),
                cp_name: id.cp_name,
                sub_id: id.sub_id,
                category_id: id.category_id,
            };
            Json(body).into_response()
        }
        None => {
            tracing::debug!(url = %query.url, "Rejected unresolvable page URL");
            (StatusCode::UNPROCESSABLE_ENTITY, "Not a channel page URL").into_response()
        }
    }
}

async fn serve_feed(state: &AppState, id: ChannelId, host: &str, uri: &Uri) -> Response {
    let channel = match state.scraper.scrape(&id).await {
        Ok(channel) => channel,
        Err(e) => return scrape_error_response(e),
    };
    let self_url = match self_url(state, host, uri) {
        Ok(url) => url,
        Err(e) => return internal_error(e),
    };
    match feed::render(&channel, &self_url) {
        Ok(xml) => ([(header::CONTENT_TYPE, ATOM_CONTENT_TYPE)], xml).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn serve_profile(state: &AppState, id: ChannelId) -> Response {
    match state.scraper.scrape_profile(&id).await {
        Ok(profile) => Json(profile).into_response(),
        Err(e) => scrape_error_response(e),
    }
}

/// The URL this request was (nominally) served at. Becomes the feed id and
/// self link. `public_base_url` wins when configured; otherwise the Host
/// header is trusted, with a plain-http scheme.
fn self_url(state: &AppState, host: &str, uri: &Uri) -> anyhow::Result<Url> {
    let path = uri
        .path_and_query()
        .map_or(uri.path(), |pq| pq.as_str());
    let absolute = match &state.public_base_url {
        Some(base) => format!("{}{}", base.as_str().trim_end_matches('/'), path),
        None => format!("http://{host}{path}"),
    };
    Url::parse(&absolute).with_context(|| format!("Invalid feed self URL: {absolute}"))
}

fn scrape_error_response(error: ScrapeError) -> Response {
    match error {
        ScrapeError::ChannelNotFound(id) => {
            tracing::debug!(channel = %id, "Channel not found");
            not_found()
        }
        ScrapeError::Unexpected(e) => internal_error(e),
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn internal_error(error: anyhow::Error) -> Response {
    tracing::error!(error = ?error, "Request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}
