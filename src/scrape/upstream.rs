//! Serde mirror of the upstream component-template document.
//!
//! The upstream endpoint answers every request with one JSON object whose
//! `component` field maps opaque component names to blocks. Each block either
//! carries a `value` payload or an embedded `error`; a separate `ERROR`
//! component reports request-level failures. Only the four components below
//! are read; everything else in the document is ignored.
use serde::Deserialize;

/// Channel branding and provider identity.
pub const CHANNEL_INFO: &str = "SCS_PREMIUM_CHANNEL_INFO_V1";
/// The channel's category table.
pub const CATEGORY_LIST: &str = "SCS_PREMIUM_CATEGORY_LIST_V1";
/// Unscoped article list (all categories).
pub const CONTENT_LIST: &str = "SCS_PREMIUM_CONTENT_LIST";
/// Article list narrowed to one category.
pub const CONTENT_LIST_BY_CATEGORY: &str = "SCS_PREMIUM_CONTENT_LIST_BY_CATEGORY";

/// Top-level template document.
#[derive(Debug, Deserialize)]
pub struct Document {
    pub component: Components,
}

/// The component blocks this service reads.
///
/// `channel_info` is present in every well-formed response, including
/// not-found responses (which carry its `error` instead of a `value`). The
/// article lists are mutually exclusive per request scope.
#[derive(Debug, Deserialize)]
pub struct Components {
    #[serde(rename = "SCS_PREMIUM_CHANNEL_INFO_V1")]
    pub channel_info: Component<ChannelInfo>,
    #[serde(rename = "SCS_PREMIUM_CATEGORY_LIST_V1")]
    pub category_list: Option<Component<DataList<CategoryEntry>>>,
    #[serde(rename = "SCS_PREMIUM_CONTENT_LIST")]
    pub content_list: Option<Component<DataList<ContentEntry>>>,
    #[serde(rename = "SCS_PREMIUM_CONTENT_LIST_BY_CATEGORY")]
    pub content_list_by_category: Option<Component<DataList<ContentEntry>>>,
    #[serde(rename = "ERROR")]
    pub error: Option<ErrorComponent>,
}

/// One named block: a `value` payload, or an `error` when the component could
/// not be produced.
#[derive(Debug, Deserialize)]
pub struct Component<T> {
    pub value: Option<T>,
    pub error: Option<ComponentError>,
}

/// Error embedded in a single component block.
#[derive(Debug, Deserialize)]
pub struct ComponentError {
    pub code: i64,
}

/// Request-level `ERROR` component; `code` 404 means the channel is gone.
#[derive(Debug, Deserialize)]
pub struct ErrorComponent {
    pub code: i64,
}

/// Common `{ "data": [...] }` wrapper inside list component values.
#[derive(Debug, Deserialize)]
pub struct DataList<T> {
    pub data: Vec<T>,
}

/// Value of the channel-info component.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub channel_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_partner: bool,
    pub absolute_home_url: String,
    pub thumbnail: String,
    pub cover_image: String,
    pub provider: Option<String>,
    pub representative_name: Option<String>,
    pub cp_info: Option<CpInfo>,
    /// Nested stats object, same key as the component value itself.
    pub channel_info: ChannelStats,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    /// Local wall-clock time of the most recent publish, no zone marker.
    pub last_content_publish_dt: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpInfo {
    pub cp_register_info: Option<RegisterInfo>,
}

/// Business registration record of a partner provider.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInfo {
    pub cp_title: Option<String>,
    pub email: Option<String>,
}

/// One entry of the category-list component.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntry {
    pub category_id: String,
    pub category_name: String,
    /// Listing-page link, possibly relative to the channel home URL.
    pub content_list_by_category_id_url: String,
}

/// One entry of either article-list component.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub author: String,
    pub title: String,
    #[serde(default)]
    pub read_time: u32,
    #[serde(default)]
    pub category_id: String,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub tag_list: Vec<String>,
    /// Local wall-clock timestamps, no zone marker.
    pub publish_datetime: String,
    pub modify_datetime: String,
    pub link: String,
}
