//! HTML extraction for loaded pages
//!
//! This module turns a loaded document into the pieces the index keeps:
//! - The page title (empty when missing)
//! - The visible text of block-level elements
//! - Outbound links, resolved to absolute URLs

use scraper::{node::Node, ElementRef, Html, Selector};
use url::Url;

/// Elements whose text forms a fragment of its own
const TEXT_BLOCKS: &[&str] = &["p", "h1", "h2", "h3", "h4", "article", "section", "div"];

/// Inline element that forms a fragment only when no text block contains it
const LOOSE_SPAN: &str = "span";

/// Elements whose content is never visible
const HIDDEN: &[&str] = &["script", "style", "noscript", "template"];

/// Text fragments must be longer than this (in characters) to be kept
const MIN_TEXT_CHARS: usize = 5;

/// Extracted information from an HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    /// The page title, or an empty string
    pub title: String,

    /// Visible block text joined by single spaces
    pub text: String,

    /// All links found on the page (absolute http(s) URLs, in document order)
    pub links: Vec<Url>,
}

/// Parses HTML content and extracts title, text and links
///
/// # Text Extraction
///
/// Each `p`, `h1`-`h4`, `article`, `section` and `div` contributes the text
/// it holds itself, inline markup included. A nested block splits its parent
/// into separate fragments, so nothing is counted twice and fragments stay in
/// document order. A `span` outside every block forms its own fragment.
/// Whitespace is collapsed, fragments of five characters or fewer are dropped
/// (icons, separators), and the survivors are joined with single spaces.
///
/// # Example
///
/// ```
/// use normativa_crawler::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title> Ley 27444 </title></head>
///     <body><p>Procedimiento administrativo general</p><a href="/anexo">Anexo</a></body></html>"#;
/// let base = Url::parse("https://www.gob.pe/normas").unwrap();
/// let parsed = parse_html(html, &base);
/// assert_eq!(parsed.title, "Ley 27444");
/// assert_eq!(parsed.text, "Procedimiento administrativo general");
/// assert_eq!(parsed.links[0].as_str(), "https://www.gob.pe/anexo");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        text: extract_text(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Extracts the visible block-level text of the document
fn extract_text(document: &Html) -> String {
    let mut fragments = Fragments::default();
    fragments.walk(document.root_element(), false);
    fragments.flush();
    fragments.kept.join(" ")
}

/// Accumulates text fragments in document order
#[derive(Default)]
struct Fragments {
    current: String,
    kept: Vec<String>,
}

impl Fragments {
    /// Visits the children of `element`; text is only collected inside a block
    fn walk(&mut self, element: ElementRef<'_>, in_block: bool) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) if in_block => self.current.push_str(text),
                Node::Element(el) => {
                    let Some(child) = ElementRef::wrap(child) else {
                        continue;
                    };
                    let name = el.name();
                    if HIDDEN.contains(&name) {
                        // keep the words on either side apart
                        self.current.push(' ');
                    } else if TEXT_BLOCKS.contains(&name) || (name == LOOSE_SPAN && !in_block) {
                        self.flush();
                        self.walk(child, true);
                        self.flush();
                    } else {
                        self.walk(child, in_block);
                    }
                }
                _ => {}
            }
        }
    }

    /// Closes the current fragment, keeping it if it is long enough
    fn flush(&mut self) {
        let fragment = self.current.split_whitespace().collect::<Vec<_>>().join(" ");
        self.current.clear();
        if fragment.chars().count() > MIN_TEXT_CHARS {
            self.kept.push(fragment);
        }
    }
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}
