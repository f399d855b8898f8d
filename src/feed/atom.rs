//! Atom 1.0 document writer.
//!
//! Renders a normalized [`Channel`] into a pretty-printed, UTF-8 Atom feed.
//! The transform is pure and deterministic: the same channel and self URL
//! always produce byte-identical output, and entries are emitted in the
//! order the channel carries them (reverse-chronological, per upstream).
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use url::Url;

use crate::channel::{Category, Channel, Content, Person};

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

type AtomWriter = Writer<Cursor<Vec<u8>>>;

/// Renders `channel` as an Atom 1.0 document.
///
/// `self_url` must be the stable retrieval URL of the feed document itself;
/// it becomes both the feed `<id>` and the `rel="self"` link. The `Result`
/// covers writer plumbing only; a well-formed channel cannot fail to
/// render.
pub fn render(channel: &Channel, self_url: &Url) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .context("Failed to write XML declaration")?;

    let mut feed = BytesStart::new("feed");
    feed.push_attribute(("xmlns", ATOM_NS));
    writer
        .write_event(Event::Start(feed))
        .context("Failed to write feed element")?;

    text_element(&mut writer, "id", self_url.as_str())?;

    let mut self_link = BytesStart::new("link");
    self_link.push_attribute(("rel", "self"));
    self_link.push_attribute(("type", "application/atom+xml"));
    self_link.push_attribute(("href", self_url.as_str()));
    writer
        .write_event(Event::Empty(self_link))
        .context("Failed to write self link")?;

    link_alternate(&mut writer, &channel.url)?;
    text_element(&mut writer, "title", &channel.name)?;
    text_element(&mut writer, "subtitle", &channel.description)?;

    if let Some(provider) = &channel.provider {
        author_element(&mut writer, provider)?;
    }

    text_element(
        &mut writer,
        "updated",
        &format_instant(channel.latest_updated),
    )?;
    text_element(&mut writer, "icon", channel.thumbnail_url.as_str())?;
    text_element(&mut writer, "logo", channel.cover_image_url.as_str())?;

    // Category-scoped feeds advertise their scope once at feed level.
    if let Some(category) = &channel.selected_category {
        category_element(&mut writer, category)?;
    }

    for content in &channel.contents {
        entry_element(&mut writer, content)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("feed")))
        .context("Failed to write feed end")?;

    let rendered = writer.into_inner().into_inner();
    String::from_utf8(rendered).context("Rendered feed contains invalid UTF-8")
}

fn entry_element(writer: &mut AtomWriter, content: &Content) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("entry")))
        .context("Failed to write entry element")?;

    text_element(writer, "id", content.url.as_str())?;
    link_alternate(writer, &content.url)?;
    text_element(writer, "title", &content.title)?;
    text_element(writer, "published", &format_instant(content.published))?;
    text_element(writer, "updated", &format_instant(content.updated))?;
    author_element(writer, &content.author)?;
    if let Some(category) = &content.category {
        category_element(writer, category)?;
    }
    summary_element(writer, content)?;

    writer
        .write_event(Event::End(BytesEnd::new("entry")))
        .context("Failed to write entry end")?;
    Ok(())
}

fn link_alternate(writer: &mut AtomWriter, url: &Url) -> Result<()> {
    let mut link = BytesStart::new("link");
    link.push_attribute(("rel", "alternate"));
    link.push_attribute(("href", url.as_str()));
    writer
        .write_event(Event::Empty(link))
        .context("Failed to write alternate link")?;
    Ok(())
}

fn author_element(writer: &mut AtomWriter, person: &Person) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("author")))
        .context("Failed to write author element")?;
    text_element(writer, "name", &person.name)?;
    if let Some(email) = &person.email {
        text_element(writer, "email", email)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("author")))
        .context("Failed to write author end")?;
    Ok(())
}

fn category_element(writer: &mut AtomWriter, category: &Category) -> Result<()> {
    let mut element = BytesStart::new("category");
    element.push_attribute(("term", category.id.as_str()));
    element.push_attribute(("label", category.name.as_str()));
    element.push_attribute(("scheme", category.url.as_str()));
    writer
        .write_event(Event::Empty(element))
        .context("Failed to write category element")?;
    Ok(())
}

/// `<summary type="html">` with a deliberately thin body: one paragraph
/// holding one link to the article. The fragment is HTML-escaped here and
/// XML-escaped again by the writer, so a title like `a < b` survives both
/// layers.
fn summary_element(writer: &mut AtomWriter, content: &Content) -> Result<()> {
    let fragment = format!(
        "<p><a href=\"{}\">{}</a></p>",
        escape(content.url.as_str()),
        escape(&content.title)
    );

    let mut summary = BytesStart::new("summary");
    summary.push_attribute(("type", "html"));
    writer
        .write_event(Event::Start(summary))
        .context("Failed to write summary element")?;
    writer
        .write_event(Event::Text(BytesText::new(&fragment)))
        .context("Failed to write summary text")?;
    writer
        .write_event(Event::End(BytesEnd::new("summary")))
        .context("Failed to write summary end")?;
    Ok(())
}

fn text_element(writer: &mut AtomWriter, name: &str, text: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .with_context(|| format!("Failed to write {name} element"))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .with_context(|| format!("Failed to write {name} text"))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("Failed to write {name} end"))?;
    Ok(())
}

/// Complete ISO-8601 UTC instant, e.g. `2024-03-01T00:30:00.000Z`.
fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
