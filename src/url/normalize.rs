//! URL normalization
//!
//! Normalization here is deliberately light: fragments are stripped (they
//! never change the fetched resource) while query strings and trailing-slash
//! variants are preserved as distinct URLs.

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses and normalizes a URL string.
///
/// The fragment is removed; everything else is kept as-is. Only `http` and
/// `https` schemes are accepted.
///
/// # Example
///
/// ```
/// use linkatlas::url::normalize_url;
///
/// let url = normalize_url("https://example.com/page?q=1#section").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page?q=1");
/// ```
pub fn normalize_url(raw: &str) -> UrlResult<Url> {
    let mut url = Url::parse(raw).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    url.set_fragment(None);
    Ok(url)
}

/// Returns the network location of a URL: the host, plus the port when one
/// is explicitly present.
pub fn netloc(url: &Url) -> UrlResult<String> {
    let host = url
        .host_str()
        .ok_or_else(|| UrlError::MissingHost(url.to_string()))?;

    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
