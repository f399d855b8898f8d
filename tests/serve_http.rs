//! Integration tests for the HTTP surface.
//!
//! Each test spawns the real axum app on an ephemeral port, backed by a
//! `wiremock` upstream, and talks to it with a plain HTTP client.

use premfeed::channel::ChannelId;
use premfeed::scrape::{upstream, ChannelScraper};
use premfeed::serve::{self, home, AppState};
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_gateway(upstream_server: &MockServer, public_base_url: Option<&str>) -> String {
    let scraper = ChannelScraper::new(
        reqwest::Client::new(),
        Url::parse(&upstream_server.uri()).unwrap(),
    );
    let state = AppState {
        scraper,
        public_base_url: public_base_url.map(|raw| Url::parse(raw).unwrap()),
        home_html: home::render("# premfeed\n\nFeeds for Premium Content channels.\n"),
    };
    let app = serve::create_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn mount_document(
    server: &MockServer,
    component: &str,
    id: &ChannelId,
    body: serde_json::Value,
) {
    let mut mock = Mock::given(method("GET"))
        .and(path(format!("/{component}")))
        .and(query_param("cpName", id.cp_name.as_str()))
        .and(query_param("subId", id.sub_id.as_str()));
    if let Some(category_id) = &id.category_id {
        mock = mock.and(query_param("categoryId", category_id.as_str()));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn atelier_document(list_key: &str) -> serde_json::Value {
    json!({
        "component": {
            "SCS_PREMIUM_CHANNEL_INFO_V1": {
                "value": {
                    "channelName": "Atelier Notes",
                    "description": "Hand-tool woodworking, weekly",
                    "isPartner": false,
                    "absoluteHomeUrl": "https://contents.premium.naver.com/woodworks/atelier",
                    "thumbnail": "https://img.example.com/atelier/thumb.png",
                    "coverImage": "https://img.example.com/atelier/cover.png",
                    "provider": "Kim",
                    "representativeName": "Kim",
                    "channelInfo": { "lastContentPublishDt": "2024-03-01T09:30:00" }
                }
            },
            "SCS_PREMIUM_CATEGORY_LIST_V1": {
                "value": { "data": [
                    { "categoryId": "tools", "categoryName": "Tools",
                      "contentListByCategoryIdUrl": "atelier/contents?categoryId=tools" }
                ] }
            },
            (list_key): {
                "value": { "data": [
                    {
                        "author": "Kim",
                        "title": "Sharpening by hand",
                        "readTime": 180,
                        "categoryId": "tools",
                        "thumbnail": null,
                        "tagList": [],
                        "publishDatetime": "2024-03-01T09:30:00",
                        "modifyDatetime": "2024-03-01T09:30:00",
                        "link": "https://contents.premium.naver.com/woodworks/atelier/contents/1"
                    }
                ] }
            }
        }
    })
}

// ============================================================================
// Feed routes
// ============================================================================

#[tokio::test]
async fn test_get_feed_document() {
    let upstream_server = MockServer::start().await;
    let id = ChannelId::new("woodworks", "atelier");
    mount_document(
        &upstream_server,
        upstream::CONTENT_LIST,
        &id,
        atelier_document(upstream::CONTENT_LIST),
    )
    .await;
    let base = spawn_gateway(&upstream_server, None).await;

    let response = reqwest::get(format!("{base}/woodworks/atelier.xml"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/atom+xml; charset=utf-8")
    );

    let body = response.text().await.unwrap();
    let parsed = feed_rs::parser::parse(body.as_bytes()).unwrap();
    assert_eq!(
        parsed.title.as_ref().map(|t| t.content.as_str()),
        Some("Atelier Notes")
    );
    // Without a configured public base the self link reflects the Host
    // header of the request.
    assert_eq!(parsed.id, format!("{base}/woodworks/atelier.xml"));
}

#[tokio::test]
async fn test_get_scoped_feed_document() {
    let upstream_server = MockServer::start().await;
    let id = ChannelId::with_category("woodworks", "atelier", "tools");
    mount_document(
        &upstream_server,
        upstream::CONTENT_LIST_BY_CATEGORY,
        &id,
        atelier_document(upstream::CONTENT_LIST_BY_CATEGORY),
    )
    .await;
    let base = spawn_gateway(&upstream_server, None).await;

    let response = reqwest::get(format!("{base}/woodworks/atelier/tools.xml"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    let parsed = feed_rs::parser::parse(body.as_bytes()).unwrap();
    assert_eq!(parsed.categories.len(), 1);
    assert_eq!(parsed.categories[0].term, "tools");
    assert_eq!(parsed.id, format!("{base}/woodworks/atelier/tools.xml"));
}

#[tokio::test]
async fn test_feed_self_link_uses_public_base_url() {
    let upstream_server = MockServer::start().await;
    let id = ChannelId::new("woodworks", "atelier");
    mount_document(
        &upstream_server,
        upstream::CONTENT_LIST,
        &id,
        atelier_document(upstream::CONTENT_LIST),
    )
    .await;
    let base = spawn_gateway(&upstream_server, Some("https://feeds.example.com")).await;

    let body = reqwest::get(format!("{base}/woodworks/atelier.xml"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let parsed = feed_rs::parser::parse(body.as_bytes()).unwrap();
    assert_eq!(parsed.id, "https://feeds.example.com/woodworks/atelier.xml");
}

#[tokio::test]
async fn test_missing_channel_is_plain_404() {
    let upstream_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream_server)
        .await;
    let base = spawn_gateway(&upstream_server, None).await;

    let response = reqwest::get(format!("{base}/nobody/nothing.xml"))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/plain; charset=utf-8")
    );
    assert_eq!(response.text().await.unwrap(), "Not Found");
}

#[tokio::test]
async fn test_unknown_document_extension_is_404_without_upstream_call() {
    let upstream_server = MockServer::start().await;
    let base = spawn_gateway(&upstream_server, None).await;

    let response = reqwest::get(format!("{base}/woodworks/atelier.rss"))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // No mounted mock was required: the request never reached upstream.
    assert!(upstream_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upstream_failure_is_500() {
    let upstream_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("surprise"))
        .mount(&upstream_server)
        .await;
    let base = spawn_gateway(&upstream_server, None).await;

    let response = reqwest::get(format!("{base}/woodworks/atelier.xml"))
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
}

// ============================================================================
// Profile route
// ============================================================================

#[tokio::test]
async fn test_get_profile_document() {
    let upstream_server = MockServer::start().await;
    let id = ChannelId::new("woodworks", "atelier");
    mount_document(
        &upstream_server,
        upstream::CHANNEL_INFO,
        &id,
        atelier_document(upstream::CONTENT_LIST),
    )
    .await;
    let base = spawn_gateway(&upstream_server, None).await;

    let response = reqwest::get(format!("{base}/woodworks/atelier.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .starts_with("application/json"));

    let profile: serde_json::Value = response.json().await.unwrap();
    assert_eq!(profile["name"], json!("Atelier Notes"));
    assert_eq!(profile["partner"], json!(false));
    assert_eq!(profile["provider"]["name"], json!("Kim"));
    assert_eq!(
        profile["thumbnailUrl"],
        json!("https://img.example.com/atelier/thumb.png")
    );
}

#[tokio::test]
async fn test_profile_not_served_under_category_path() {
    let upstream_server = MockServer::start().await;
    let base = spawn_gateway(&upstream_server, None).await;

    let response = reqwest::get(format!("{base}/woodworks/atelier/tools.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

// ============================================================================
// Resolve endpoint
// ============================================================================

#[tokio::test]
async fn test_resolve_channel_page_url() {
    let upstream_server = MockServer::start().await;
    let base = spawn_gateway(&upstream_server, None).await;

    let response = reqwest::get(format!(
        "{base}/resolve?url=https://contents.premium.naver.com/woodworks/atelier"
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), 200);

    let resolved: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        resolved,
        json!({
            "cpName": "woodworks",
            "subId": "atelier",
            "categoryId": null,
            "feedPath": "/woodworks/atelier.xml"
        })
    );
}

#[tokio::test]
async fn test_resolve_category_listing_url() {
    let upstream_server = MockServer::start().await;
    let base = spawn_gateway(&upstream_server, None).await;

    let page = "https://contents.premium.naver.com/woodworks/atelier/contents?categoryId=tools";
    let encoded = url::form_urlencoded::byte_serialize(page.as_bytes()).collect::<String>();
    let resolved: serde_json::Value = reqwest::get(format!("{base}/resolve?url={encoded}"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(resolved["categoryId"], json!("tools"));
    assert_eq!(resolved["feedPath"], json!("/woodworks/atelier/tools.xml"));
}

#[tokio::test]
async fn test_resolve_rejects_foreign_url() {
    let upstream_server = MockServer::start().await;
    let base = spawn_gateway(&upstream_server, None).await;

    let response = reqwest::get(format!("{base}/resolve?url=https://example.com/a/b"))
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn test_resolve_requires_url_parameter() {
    let upstream_server = MockServer::start().await;
    let base = spawn_gateway(&upstream_server, None).await;

    let response = reqwest::get(format!("{base}/resolve")).await.unwrap();
    assert_eq!(response.status(), 400);
}

// ============================================================================
// Landing page
// ============================================================================

#[tokio::test]
async fn test_landing_page_serves_rendered_markdown() {
    let upstream_server = MockServer::start().await;
    let base = spawn_gateway(&upstream_server, None).await;

    let response = reqwest::get(&base).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .starts_with("text/html"));

    let body = response.text().await.unwrap();
    assert!(body.contains("<title>premfeed</title>"));
    assert!(body.contains("<h1>premfeed</h1>"));
}
