//! Landing page rendered from a Markdown file.
//!
//! The page is built once at startup: the configured Markdown document is
//! converted to HTML with `pulldown-cmark` and wrapped in a minimal
//! class-less shell (pico.css from a CDN). The first level-1 heading
//! becomes the document title.
use anyhow::{Context, Result};
use pulldown_cmark::{html, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use quick_xml::escape::escape;
use std::path::Path;

const PICO_CSS_URL: &str = "https://unpkg.com/@picocss/pico@latest/css/pico.min.css";

/// Reads `path` and renders it as the landing page document.
pub fn load(path: &Path) -> Result<String> {
    let markdown = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read home page markdown: {}", path.display()))?;
    Ok(render(&markdown))
}

/// Renders Markdown into a complete HTML document.
pub fn render(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_SMART_PUNCTUATION;

    let mut title = first_heading(markdown, options);
    if title.is_empty() {
        title = env!("CARGO_PKG_NAME").to_owned();
    }
    let mut body = String::new();
    html::push_html(&mut body, Parser::new_ext(markdown, options));

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n\
         <link href=\"{PICO_CSS_URL}\" rel=\"stylesheet\">\n\
         </head>\n\
         <body>\n\
         <main class=\"container\">{body}</main>\n\
         </body>\n\
         </html>\n",
        title = escape(&title),
    )
}

/// Plain text of the first level-1 heading, or empty when there is none.
fn first_heading(markdown: &str, options: Options) -> String {
    let mut in_heading = false;
    let mut title = String::new();
    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_heading = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => return title,
            Event::Text(text) | Event::Code(text) if in_heading => title.push_str(&text),
            _ => {}
        }
    }
    title
}
