//! Domain model for a premium-content channel and its articles.
//!
//! All values are built fresh from one upstream JSON snapshot per scrape and
//! are never mutated afterwards. The provider is held behind an `Arc` so that
//! articles written by the channel operator can share the exact same `Person`
//! value (observable via `Arc::ptr_eq`).
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Host serving the public channel pages that `from_page_url` recognizes.
const CHANNEL_PAGE_HOST: &str = "contents.premium.naver.com";

/// Identifies one scrape target.
///
/// `cp_name` is the provider namespace and `sub_id` the channel slug within
/// it; both are opaque strings chosen by the upstream platform. An optional
/// `category_id` narrows the scrape to a single category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelId {
    pub cp_name: String,
    pub sub_id: String,
    /// Scopes the article list to one category. `None` means all categories.
    pub category_id: Option<String>,
}

impl ChannelId {
    pub fn new(cp_name: &str, sub_id: &str) -> Self {
        Self {
            cp_name: cp_name.to_owned(),
            sub_id: sub_id.to_owned(),
            category_id: None,
        }
    }

    pub fn with_category(cp_name: &str, sub_id: &str, category_id: &str) -> Self {
        Self {
            cp_name: cp_name.to_owned(),
            sub_id: sub_id.to_owned(),
            category_id: Some(category_id.to_owned()),
        }
    }

    /// Derives a `ChannelId` from a public channel page URL.
    ///
    /// Recognizes `https://contents.premium.naver.com/{cp}/{sub}` (optionally
    /// with extra trailing path segments) and the category listing form
    /// `/{cp}/{sub}/contents?categoryId=X`. A plain-`http` URL is upgraded to
    /// `https` first; anything on another host, with credentials or an
    /// explicit port, or with slugs outside `[A-Za-z0-9._-]` is rejected.
    ///
    /// Returns `None` when the URL is not a recognizable channel page.
    pub fn from_page_url(raw: &str) -> Option<Self> {
        let mut url = Url::parse(raw).ok()?;
        if url.scheme() == "http" {
            url.set_scheme("https").ok()?;
        }
        if url.scheme() != "https"
            || url.host_str() != Some(CHANNEL_PAGE_HOST)
            || url.port().is_some()
            || !url.username().is_empty()
            || url.password().is_some()
        {
            return None;
        }

        let segments: Vec<&str> = url.path_segments()?.collect();

        // Category listing page: /{cp}/{sub}/contents?categoryId=X with a
        // non-blank X. A blank or missing categoryId falls through to the
        // unscoped form below.
        if let [cp_name, sub_id, "contents"] = segments.as_slice() {
            if is_slug(cp_name) && is_slug(sub_id) {
                let category_id = url
                    .query_pairs()
                    .find(|(key, _)| key == "categoryId")
                    .map(|(_, value)| value.into_owned());
                if let Some(category_id) = category_id {
                    if !category_id.trim().is_empty() {
                        return Some(Self::with_category(cp_name, sub_id, &category_id));
                    }
                }
            }
        }

        match segments.as_slice() {
            [cp_name, sub_id, ..] if is_slug(cp_name) && is_slug(sub_id) => {
                Some(Self::new(cp_name, sub_id))
            }
            _ => None,
        }
    }

    /// Path of the Atom feed serving this id, relative to this service's root.
    pub fn feed_path(&self) -> String {
        match &self.category_id {
            Some(category_id) => format!("/{}/{}/{}.xml", self.cp_name, self.sub_id, category_id),
            None => format!("/{}/{}.xml", self.cp_name, self.sub_id),
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cp_name, self.sub_id)?;
        if let Some(category_id) = &self.category_id {
            write!(f, " (category: {})", category_id)?;
        }
        Ok(())
    }
}

fn is_slug(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

/// A channel operator or article author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub name: String,
    pub email: Option<String>,
}

/// A named subdivision of a channel's articles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Opaque id, unique within the channel, never the empty string.
    pub id: String,
    pub name: String,
    /// Absolute link to the category's listing page.
    pub url: Url,
}

/// A fully normalized channel: branding, category table and article list.
#[derive(Debug, Clone)]
pub struct Channel {
    /// Canonical home page.
    pub url: Url,
    pub name: String,
    pub description: String,
    /// Partner vs. non-partner provider account. Informational only.
    pub partner: bool,
    /// Resolved operator identity, shared with matching article authors.
    pub provider: Option<Arc<Person>>,
    pub thumbnail_url: Url,
    pub cover_image_url: Url,
    /// Category table keyed by category id. Keys are unique and non-empty.
    pub categories: BTreeMap<String, Category>,
    /// The category matching a scoped request, absent for unscoped scrapes.
    pub selected_category: Option<Category>,
    /// Articles in upstream order (reverse-chronological).
    pub contents: Vec<Content>,
    /// Most recent publish time across the channel, as reported upstream.
    pub latest_updated: DateTime<Utc>,
}

/// One article within a channel.
#[derive(Debug, Clone)]
pub struct Content {
    /// Byline author; `Arc`-shared with `Channel::provider` when the raw
    /// author name matches the resolved provider name.
    pub author: Arc<Person>,
    pub title: String,
    /// Estimated reading time in seconds.
    pub reading_seconds: u32,
    /// Resolved category. Always present in a category-scoped scrape; may be
    /// absent in the unscoped view when the article carries no known category.
    pub category: Option<Category>,
    pub thumbnail_url: Option<Url>,
    /// Tag membership only; upstream order and duplicates are discarded.
    pub tags: BTreeSet<String>,
    pub published: DateTime<Utc>,
    /// Last modification time, clamped to never precede `published`.
    pub updated: DateTime<Utc>,
    /// Canonical article link.
    pub url: Url,
}

/// Identity and branding fields of a channel, without categories or articles.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub name: String,
    pub description: String,
    pub partner: bool,
    pub provider: Option<Arc<Person>>,
    pub thumbnail_url: Url,
    pub cover_image_url: Url,
    pub latest_updated: DateTime<Utc>,
}
