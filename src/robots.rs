//! Robots.txt handling
//!
//! One policy is fetched per crawl task and consulted for user-agent `*`.
//! A missing or unreadable robots.txt yields the permissive policy.

use robotstxt::DefaultMatcher;

use crate::crawler::ScopedClient;

/// Parsed robots.txt rules for one origin.
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    content: String,
    allow_all: bool,
}

impl RobotsPolicy {
    /// Creates a policy from raw robots.txt content.
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates the permissive policy that allows every path.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Fetches `<origin>/robots.txt` through the crawl task's client.
    ///
    /// Non-200 responses and network failures both produce the permissive
    /// policy; a site without robots rules is fully crawlable.
    pub async fn fetch(client: &ScopedClient) -> Self {
        match client.get_robots_txt().await {
            Some(content) => {
                tracing::debug!("Fetched robots.txt for {}", client.origin());
                Self::from_content(&content)
            }
            None => {
                tracing::debug!(
                    "No robots.txt for {}, allowing all paths",
                    client.origin()
                );
                Self::allow_all()
            }
        }
    }

    /// Checks whether a URL is allowed for user-agent `*`.
    pub fn allowed(&self, url: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, "*", url)
    }
}
