//! URL handling module for LinkAtlas
//!
//! This module provides URL normalization, network-location extraction, and
//! the exclusion-suffix matching used to keep the crawler away from binary
//! assets.

mod exclusion;
mod normalize;

pub use exclusion::ExclusionList;
pub use normalize::{netloc, normalize_url};

use url::Url;

/// Checks whether a URL belongs to the given network location.
///
/// Comparison is exact string equality on the network location, so
/// `www.example.com` and `example.com` are distinct origins.
pub fn same_origin(url: &Url, origin_netloc: &str) -> bool {
    match netloc(url) {
        Ok(n) => n == origin_netloc,
        Err(_) => false,
    }
}
