//! Link extraction from fetched pages
//!
//! Anchors are selected with a compiled CSS selector and resolved against
//! the page URL. Fragments are stripped during resolution; query strings
//! survive. Targets whose path contains `cdn-cgi` are infrastructure links
//! and never enter the graph.

use scraper::{Html, Selector};
use url::Url;

/// Extracts the anchor targets of an HTML page, in document order.
///
/// Unresolvable hrefs and non-HTTP(S) schemes (`mailto:`, `javascript:`,
/// `tel:` and friends) are dropped silently.
pub fn extract_links(html: &str, page_url: &Url) -> Result<Vec<Url>, String> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse("a[href]").map_err(|e| format!("invalid anchor selector: {}", e))?;

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if let Some(link) = resolve_link(href, page_url) {
            links.push(link);
        }
    }

    Ok(links)
}

/// Resolves one href against the page URL.
fn resolve_link(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let mut resolved = page_url.join(href).ok()?;
    resolved.set_fragment(None);

    match resolved.scheme() {
        "http" | "https" => {}
        _ => return None,
    }

    if resolved.path().contains("cdn-cgi") {
        return None;
    }

    Some(resolved)
}
