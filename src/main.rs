use anyhow::{Context, Result};
use clap::Parser;
use reqwest::redirect::Policy;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use premfeed::config::Config;
use premfeed::scrape::ChannelScraper;
use premfeed::serve::{self, home, AppState};

/// Create a custom redirect policy with loop detection and limited hops.
///
/// - Limits redirects to 3 hops maximum
/// - Detects redirect loops (same URL appearing twice in chain)
/// - Logs redirect chain for debugging
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        // Limit to 3 redirects
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        // Detect loops
        let url = attempt.url();
        for prev in attempt.previous() {
            if prev.as_str() == url.as_str() {
                return attempt.error("Redirect loop detected");
            }
        }

        // Log redirect chain
        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "premfeed",
    about = "Atom feed gateway for Naver Premium Content channels"
)]
struct Args {
    /// Path to the TOML config file
    #[arg(long, value_name = "FILE", default_value = "premfeed.toml")]
    config: PathBuf,

    /// Listen address (overrides the config file)
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config).context("Failed to load configuration")?;
    let bind = args.bind.unwrap_or_else(|| config.bind.clone());

    let upstream_base_url = Url::parse(&config.upstream_base_url)
        .with_context(|| format!("Invalid upstream_base_url: {}", config.upstream_base_url))?;
    let public_base_url = config
        .public_base_url
        .as_deref()
        .map(Url::parse)
        .transpose()
        .context("Invalid public_base_url")?;

    let home_html =
        home::load(Path::new(&config.home_page)).context("Failed to render landing page")?;

    let client = reqwest::Client::builder()
        .redirect(create_redirect_policy())
        .pool_idle_timeout(Duration::from_secs(30)) // Close idle connections promptly
        .tcp_keepalive(Duration::from_secs(60)) // TCP keepalive probes
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let state = AppState {
        scraper: ChannelScraper::new(client, upstream_base_url.clone()),
        public_base_url,
        home_html,
    };
    let app = serve::create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!(addr = %bind, upstream = %upstream_base_url, "Starting server");
    println!("Listening on http://{bind}");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
