//! Atom feed gateway for Naver Premium Content channels.
//!
//! Premium Content channels publish through a template API that returns
//! page-component JSON instead of anything a feed reader understands. This
//! crate scrapes that API, normalizes the result into a channel model, and
//! serves it back out as Atom 1.0:
//!
//! - [`channel`] - channel identity and the normalized domain model
//! - [`scrape`] - upstream fetch and normalization
//! - [`feed`] - Atom rendering
//! - [`serve`] - the axum HTTP surface
//! - [`config`] - TOML configuration

pub mod channel;
pub mod config;
pub mod feed;
pub mod scrape;
pub mod serve;
