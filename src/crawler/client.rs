//! HTTP client scoped to one crawl task
//!
//! This module builds the HTTP client a crawl task uses for its whole
//! lifetime, including:
//! - Browser-like default headers and a versioned crawler User-Agent
//! - Automatic redirects with a 10-hop cap, HTTP/2 negotiation
//! - Retry logic for transient network failures
//! - Charset detection for bodies whose Content-Type omits one
//!
//! The client is created at task start and owned by the crawl task, so it is
//! released on every exit path.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, Version};
use std::time::Duration;
use url::Url;

use crate::config::{Config, Environment};
use crate::url::netloc;
use crate::Result;

const ACCEPT_VALUE: &str = "text/html,application/json,application/xml;q=0.9";
const MAX_REDIRECTS: usize = 10;

/// Result of fetching one page
#[derive(Debug)]
pub enum FetchOutcome {
    /// Successfully fetched an HTML page
    Html {
        /// Final URL after redirects
        final_url: Url,
        /// Decoded page body
        body: String,
    },

    /// Page is not HTML
    NotHtml { content_type: String },

    /// Response carried no Content-Type header
    MissingContentType,

    /// Non-success HTTP status
    HttpStatus { status: u16 },

    /// Network failure after retry exhaustion
    Network { error: String },
}

/// Retry policy for transient network failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff: delay = base_delay * 2^attempt
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.pow(attempt)
    }

    /// Transient network conditions are retryable; HTTP statuses are not.
    fn is_retryable(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect()
    }
}

/// An HTTP client bound to one crawl target.
///
/// Cloning is cheap (the underlying connection pool is shared); the engine
/// clones this into each fetch task.
#[derive(Debug, Clone)]
pub struct ScopedClient {
    client: Client,
    origin: String,
    base: Url,
    connection_headers: bool,
    retry: RetryPolicy,
}

impl ScopedClient {
    /// Builds the client for a crawl of `start_url`'s origin.
    ///
    /// The development profile accepts invalid TLS certificates so local
    /// targets with self-signed certs stay crawlable.
    pub fn for_origin(start_url: &Url, config: &Config, environment: Environment) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        if let Ok(lang) = HeaderValue::from_str(&config.crawler.accept_language) {
            headers.insert(ACCEPT_LANGUAGE, lang);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.header_value())
            .default_headers(headers)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .danger_accept_invalid_certs(environment == Environment::Development)
            .build()?;

        Ok(Self {
            client,
            origin: netloc(start_url)?,
            base: start_url.clone(),
            connection_headers: true,
            retry: RetryPolicy::default(),
        })
    }

    /// The network location this client is scoped to.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Stops sending connection-management headers.
    ///
    /// `Keep-Alive` and `Connection` are illegal under HTTP/2; the engine
    /// calls this once the negotiated protocol is known.
    pub fn disable_connection_headers(&mut self) {
        self.connection_headers = false;
        tracing::info!("Set up headers for http/2");
    }

    /// Per-request headers that depend on the negotiated protocol.
    fn protocol_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if self.connection_headers {
            headers.insert("Keep-Alive", HeaderValue::from_static("500"));
            headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        }
        headers
    }

    /// Issues the pre-crawl HEAD request against the start URL.
    pub async fn head(&self, url: &Url) -> reqwest::Result<reqwest::Response> {
        self.client
            .head(url.clone())
            .headers(self.protocol_headers())
            .send()
            .await
    }

    /// Returns true when the response was served over HTTP/2.
    pub fn is_http2(response: &reqwest::Response) -> bool {
        response.version() == Version::HTTP_2
    }

    /// Fetches `<origin>/robots.txt`, returning its body on a 200 response.
    pub async fn get_robots_txt(&self) -> Option<String> {
        let robots_url = self.base.join("/robots.txt").ok()?;
        let response = self
            .client
            .get(robots_url)
            .headers(self.protocol_headers())
            .send()
            .await
            .ok()?;
        if response.status().is_success() {
            response.text().await.ok()
        } else {
            None
        }
    }

    /// Fetches one page with retry on transient network failures.
    pub async fn fetch_page(&self, url: &Url) -> FetchOutcome {
        let mut attempt = 0;
        loop {
            match self.fetch_page_once(url).await {
                Ok(outcome) => return outcome,
                Err(e) => {
                    if !RetryPolicy::is_retryable(&e) || attempt >= self.retry.max_retries {
                        return FetchOutcome::Network {
                            error: e.to_string(),
                        };
                    }
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::debug!("Retry attempt {} for {}, waiting {:?}", attempt + 1, url, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn fetch_page_once(&self, url: &Url) -> reqwest::Result<FetchOutcome> {
        let response = self
            .client
            .get(url.clone())
            .headers(self.protocol_headers())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(FetchOutcome::HttpStatus {
                status: status.as_u16(),
            });
        }

        let content_type = match response.headers().get(CONTENT_TYPE) {
            Some(value) => value.to_str().unwrap_or("").to_string(),
            None => return Ok(FetchOutcome::MissingContentType),
        };

        if !content_type.contains("text/html") {
            return Ok(FetchOutcome::NotHtml { content_type });
        }

        let final_url = response.url().clone();
        let bytes = response.bytes().await?;
        let body = decode_body(&bytes, &content_type);

        Ok(FetchOutcome::Html { final_url, body })
    }
}

/// Decodes a response body, detecting the charset when the header omits one.
///
/// Resolution order: header charset, byte-order mark, `<meta charset>` in the
/// first kilobyte, then UTF-8 with lossy replacement.
pub fn decode_body(bytes: &[u8], content_type: &str) -> String {
    if let Some(charset) = charset_from_header(content_type) {
        if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
            return encoding.decode(bytes).0.into_owned();
        }
    }

    if let Some((encoding, _)) = encoding_rs::Encoding::for_bom(bytes) {
        return encoding.decode(bytes).0.into_owned();
    }

    if let Some(charset) = charset_from_meta(bytes) {
        if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
            return encoding.decode(bytes).0.into_owned();
        }
    }

    encoding_rs::UTF_8.decode(bytes).0.into_owned()
}

fn charset_from_header(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .find_map(|part| part.trim().strip_prefix("charset="))
        .map(|cs| cs.trim_matches('"').to_string())
}

/// Scans the first kilobyte for a `charset=` token in a meta tag.
fn charset_from_meta(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(1024)];
    let head = String::from_utf8_lossy(head).to_lowercase();
    let start = head.find("charset=")? + "charset=".len();
    let rest = &head[start..];
    let value: String = rest
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    (!value.is_empty()).then_some(value)
}
