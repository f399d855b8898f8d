//! Fetches the upstream component document and normalizes it into the
//! domain model.
use anyhow::{anyhow, Context};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::channel::{Category, Channel, ChannelId, ChannelProfile, Content, Person};
use crate::scrape::upstream::{self, ChannelInfo, Components, ContentEntry, Document};

/// Upper bound on an upstream response body (10 MB).
const MAX_PAYLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Upstream timestamps are local wall-clock strings; the platform clock is
/// fixed at UTC+9.
const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Errors surfaced by [`ChannelScraper`].
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The channel does not exist, is inaccessible, or the requested
    /// category is not in its category table.
    #[error("Channel not found: {0}")]
    ChannelNotFound(ChannelId),
    /// Everything else: transport faults, oversized responses, payloads
    /// that do not match the component schema.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// Scrapes one channel per call from the upstream template endpoint.
///
/// Holds the HTTP client and the endpoint base URL, both injected by the
/// caller; tests point `base_url` at a mock server. Each call performs
/// exactly one GET, with no retries and no caching. Timeout policy lives on
/// the injected client.
#[derive(Debug, Clone)]
pub struct ChannelScraper {
    client: reqwest::Client,
    base_url: Url,
}

impl ChannelScraper {
    /// Scraper against `base_url`, which must serve the template document
    /// shape. Production configuration points this at the real endpoint;
    /// tests point it at a mock server.
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Fetches and normalizes a full channel: branding, category table and
    /// the article list for the id's scope.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::ChannelNotFound`] when the upstream reports the channel
    /// missing (non-success status, embedded error code >= 400, or error
    /// component 404) or when `id.category_id` is not in the category table.
    /// Any other failure is [`ScrapeError::Unexpected`].
    pub async fn scrape(&self, id: &ChannelId) -> Result<Channel, ScrapeError> {
        let url = self.list_url(id)?;
        let document = self.fetch_document(url, id).await?;
        let channel = normalize_channel(document.component, id)?;
        tracing::debug!(
            channel = %id,
            articles = channel.contents.len(),
            categories = channel.categories.len(),
            "Normalized channel"
        );
        Ok(channel)
    }

    /// Fetches only the channel-info component and normalizes the branding
    /// fields. Any category scope on `id` is ignored; the profile document
    /// carries no category table to validate it against.
    pub async fn scrape_profile(&self, id: &ChannelId) -> Result<ChannelProfile, ScrapeError> {
        let url = self.profile_url(id)?;
        let document = self.fetch_document(url, id).await?;
        normalize_profile(document.component)
    }

    fn list_url(&self, id: &ChannelId) -> anyhow::Result<Url> {
        let component = match id.category_id {
            None => upstream::CONTENT_LIST,
            Some(_) => upstream::CONTENT_LIST_BY_CATEGORY,
        };
        let mut url = self
            .base_url
            .join(component)
            .with_context(|| format!("building upstream URL for {component}"))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("cpName", &id.cp_name)
                .append_pair("subId", &id.sub_id);
            if let Some(category_id) = &id.category_id {
                pairs.append_pair("categoryId", category_id);
            }
        }
        Ok(url)
    }

    fn profile_url(&self, id: &ChannelId) -> anyhow::Result<Url> {
        let mut url = self
            .base_url
            .join(upstream::CHANNEL_INFO)
            .context("building upstream profile URL")?;
        url.query_pairs_mut()
            .append_pair("cpName", &id.cp_name)
            .append_pair("subId", &id.sub_id);
        Ok(url)
    }

    /// One GET against the template endpoint, with status and embedded
    /// error-code checks applied.
    async fn fetch_document(&self, url: Url, id: &ChannelId) -> Result<Document, ScrapeError> {
        tracing::debug!(url = %url, channel = %id, "Fetching upstream document");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        if !response.status().is_success() {
            tracing::debug!(
                status = %response.status(),
                channel = %id,
                "Upstream answered with non-success status"
            );
            return Err(ScrapeError::ChannelNotFound(id.clone()));
        }

        let bytes = read_limited_body(response).await?;
        let document: Document = serde_json::from_slice(&bytes)
            .with_context(|| format!("unexpected payload shape from {url}"))?;

        if embedded_not_found(&document.component) {
            return Err(ScrapeError::ChannelNotFound(id.clone()));
        }
        Ok(document)
    }
}

/// Reads a response body incrementally, refusing more than
/// [`MAX_PAYLOAD_SIZE`] bytes.
async fn read_limited_body(response: reqwest::Response) -> Result<Vec<u8>, ScrapeError> {
    if let Some(len) = response.content_length() {
        if len as usize > MAX_PAYLOAD_SIZE {
            return Err(anyhow!("upstream response is {len} bytes, refusing to read").into());
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("reading upstream response body")?;
        if bytes.len().saturating_add(chunk.len()) > MAX_PAYLOAD_SIZE {
            return Err(anyhow!("upstream response exceeds {MAX_PAYLOAD_SIZE} bytes").into());
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Not-found conditions a 200 response can still embed: an error code on the
/// channel-info component, or a request-level ERROR component reporting 404.
fn embedded_not_found(components: &Components) -> bool {
    if let Some(error) = &components.channel_info.error {
        if error.code >= 400 {
            return true;
        }
    }
    matches!(&components.error, Some(error) if error.code == 404)
}

fn normalize_channel(components: Components, id: &ChannelId) -> Result<Channel, ScrapeError> {
    let Components {
        channel_info,
        category_list,
        content_list,
        content_list_by_category,
        error: _,
    } = components;

    let info = channel_info
        .value
        .ok_or_else(|| anyhow!("channel info component has no value"))?;

    let home_url = Url::parse(&info.absolute_home_url)
        .with_context(|| format!("invalid channel home URL {:?}", info.absolute_home_url))?;

    let provider = resolve_provider(&info).map(Arc::new);

    let category_entries = category_list
        .and_then(|block| block.value)
        .ok_or_else(|| anyhow!("category list component missing"))?
        .data;

    // Empty-id entries are a "no category" placeholder, not real categories.
    // Later duplicates of an id overwrite earlier ones, as upstream intends.
    let mut categories = BTreeMap::new();
    for entry in category_entries {
        if entry.category_id.is_empty() {
            continue;
        }
        let url = home_url
            .join(&entry.content_list_by_category_id_url)
            .with_context(|| {
                format!(
                    "invalid category URL {:?}",
                    entry.content_list_by_category_id_url
                )
            })?;
        categories.insert(
            entry.category_id.clone(),
            Category {
                id: entry.category_id,
                name: entry.category_name,
                url,
            },
        );
    }

    // A scoped request must match a real category; a miss is a hard failure,
    // never a silent fallback to the unscoped view.
    let selected_category = match &id.category_id {
        None => None,
        Some(category_id) => match categories.get(category_id) {
            Some(category) => Some(category.clone()),
            None => return Err(ScrapeError::ChannelNotFound(id.clone())),
        },
    };

    let article_block = match id.category_id {
        None => content_list,
        Some(_) => content_list_by_category,
    };
    let article_entries = article_block
        .and_then(|block| block.value)
        .ok_or_else(|| anyhow!("article list component missing for the requested scope"))?
        .data;

    let mut contents = Vec::with_capacity(article_entries.len());
    for entry in article_entries {
        contents.push(normalize_content(entry, provider.as_ref(), &categories)?);
    }

    Ok(Channel {
        url: home_url,
        name: info.channel_name,
        description: info.description,
        partner: info.is_partner,
        provider,
        thumbnail_url: Url::parse(&info.thumbnail)
            .with_context(|| format!("invalid channel thumbnail URL {:?}", info.thumbnail))?,
        cover_image_url: Url::parse(&info.cover_image)
            .with_context(|| format!("invalid channel cover URL {:?}", info.cover_image))?,
        categories,
        selected_category,
        contents,
        latest_updated: parse_kst(&info.channel_info.last_content_publish_dt)?,
    })
}

fn normalize_profile(components: Components) -> Result<ChannelProfile, ScrapeError> {
    let info = components
        .channel_info
        .value
        .ok_or_else(|| anyhow!("channel info component has no value"))?;

    let provider = resolve_provider(&info).map(Arc::new);
    Ok(ChannelProfile {
        name: info.channel_name,
        description: info.description,
        partner: info.is_partner,
        provider,
        thumbnail_url: Url::parse(&info.thumbnail)
            .with_context(|| format!("invalid channel thumbnail URL {:?}", info.thumbnail))?,
        cover_image_url: Url::parse(&info.cover_image)
            .with_context(|| format!("invalid channel cover URL {:?}", info.cover_image))?,
        latest_updated: parse_kst(&info.channel_info.last_content_publish_dt)?,
    })
}

/// Resolves the channel operator identity.
///
/// The display name comes from the `provider` field when present and
/// non-blank, else from the trimmed `representativeName`; a blank candidate
/// means the channel has no resolvable operator. The registered contact
/// email is attached only when the registration record's own title, trimmed,
/// equals the candidate name exactly. That guards against projecting a
/// business registration email onto an unrelated display name.
fn resolve_provider(info: &ChannelInfo) -> Option<Person> {
    let provider_field = info
        .provider
        .as_deref()
        .filter(|name| !name.trim().is_empty());
    let candidate = provider_field.map(str::to_owned).or_else(|| {
        info.representative_name
            .as_deref()
            .map(|name| name.trim().to_owned())
    })?;
    if candidate.trim().is_empty() {
        return None;
    }

    let register_info = info
        .cp_info
        .as_ref()
        .and_then(|cp| cp.cp_register_info.as_ref());
    let email = register_info.and_then(|register| {
        let title = register.cp_title.as_deref()?.trim();
        if title == candidate {
            register
                .email
                .as_deref()
                .map(|email| email.trim().to_owned())
                .filter(|email| !email.is_empty())
        } else {
            None
        }
    });

    Some(Person {
        name: candidate,
        email,
    })
}

fn normalize_content(
    entry: ContentEntry,
    provider: Option<&Arc<Person>>,
    categories: &BTreeMap<String, Category>,
) -> anyhow::Result<Content> {
    let published = parse_kst(&entry.publish_datetime)?;
    let updated = parse_kst(&entry.modify_datetime)?;

    // Articles written by the operator share the provider value itself, so
    // identity (and the resolved email) carries over to the byline.
    let author = match provider {
        Some(provider) if provider.name == entry.author => Arc::clone(provider),
        _ => Arc::new(Person {
            name: entry.author,
            email: None,
        }),
    };

    let thumbnail_url = match entry.thumbnail {
        None => None,
        Some(raw) => Some(
            Url::parse(&raw).with_context(|| format!("invalid article thumbnail URL {raw:?}"))?,
        ),
    };

    Ok(Content {
        author,
        title: entry.title,
        reading_seconds: entry.read_time,
        category: categories.get(&entry.category_id).cloned(),
        thumbnail_url,
        tags: entry.tag_list.into_iter().collect(),
        published,
        // Upstream occasionally reports a modify time before the publish
        // time; the model never exposes that.
        updated: updated.max(published),
        url: Url::parse(&entry.link)
            .with_context(|| format!("invalid article URL {:?}", entry.link))?,
    })
}

/// Parses a zone-less upstream timestamp as UTC+9 wall-clock time.
///
/// Accepts `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD HH:MM:SS`, with optional
/// fractional seconds.
fn parse_kst(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    let trimmed = raw.trim();
    let naive = FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .with_context(|| format!("unparseable upstream timestamp {raw:?}"))?;
    let offset = FixedOffset::east_opt(KST_OFFSET_SECS).context("UTC+9 offset out of range")?;
    let local = naive
        .and_local_timezone(offset)
        .single()
        .with_context(|| format!("timestamp {raw:?} is not a valid UTC+9 instant"))?;
    Ok(local.with_timezone(&Utc))
}
