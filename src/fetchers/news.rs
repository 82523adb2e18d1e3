//! RSS headline fetcher
//!
//! Pulls the top items from a fixed list of public feeds. Real-world
//! feeds are messy, so extraction is a lenient regex pass (RSS `<item>`
//! with an Atom `<entry>` fallback) rather than a strict XML parse; a
//! feed that fails to fetch or yields nothing is skipped.

use crate::fetchers::NewsFetcher;
use crate::types::{DaybriefError, RawNewsItem, Result};
use regex::Regex;
use reqwest::blocking::Client;
use std::time::Duration;

/// Default feed sources (no API key required)
pub const DEFAULT_FEEDS: [(&str, &str); 6] = [
    ("Reuters", "https://feeds.reuters.com/reuters/worldNews"),
    ("AP News", "https://apnews.com/apf-topnews?format=rss"),
    ("NPR", "https://feeds.npr.org/1001/rss.xml"),
    ("BBC", "http://feeds.bbci.co.uk/news/rss.xml"),
    ("The Guardian", "https://www.theguardian.com/world/rss"),
    ("Al Jazeera", "https://www.aljazeera.com/xml/rss/all.xml"),
];

/// Headlines taken from each feed
const ITEMS_PER_FEED: usize = 2;

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 5;

const USER_AGENT: &str = "daybrief-local-dashboard";

pub struct RssNewsFetcher {
    feeds: Vec<(String, String)>,
    client: Client,
}

impl RssNewsFetcher {
    pub fn new() -> Result<Self> {
        Self::with_feeds(
            DEFAULT_FEEDS
                .iter()
                .map(|(name, url)| (name.to_string(), url.to_string()))
                .collect(),
        )
    }

    pub fn with_feeds(feeds: Vec<(String, String)>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DaybriefError::Fetch(format!("HTTP client error: {}", e)))?;
        Ok(Self { feeds, client })
    }

    fn fetch_feed(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| DaybriefError::Fetch(format!("request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(DaybriefError::Fetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }
        response
            .text()
            .map_err(|e| DaybriefError::Fetch(format!("body read failed: {}", e)))
    }
}

impl NewsFetcher for RssNewsFetcher {
    fn headlines(&self) -> Result<Vec<RawNewsItem>> {
        let mut items = Vec::new();
        let mut any_reachable = false;

        for (source, url) in &self.feeds {
            match self.fetch_feed(url) {
                Ok(body) => {
                    any_reachable = true;
                    items.extend(parse_feed(&body, source, ITEMS_PER_FEED));
                }
                Err(e) => {
                    eprintln!("[daybrief] Warning: feed '{}' skipped: {}", source, e);
                }
            }
        }

        if !any_reachable && !self.feeds.is_empty() {
            return Err(DaybriefError::Fetch("no feed reachable".into()));
        }
        Ok(items)
    }
}

/// Extract up to `limit` headlines from one feed document.
fn parse_feed(body: &str, source: &str, limit: usize) -> Vec<RawNewsItem> {
    let rss_items = extract_rss_items(body, source, limit);
    if !rss_items.is_empty() {
        return rss_items;
    }
    extract_atom_entries(body, source, limit)
}

fn extract_rss_items(body: &str, source: &str, limit: usize) -> Vec<RawNewsItem> {
    let item_re = Regex::new(r"(?s)<item[\s>](.*?)</item>").expect("valid regex");
    let mut items = Vec::new();

    for caps in item_re.captures_iter(body).take(limit) {
        let block = &caps[1];
        // title and link are both required; pubDate is not
        let title = match tag_text(block, "title") {
            Some(t) => t,
            None => continue,
        };
        let url = match tag_text(block, "link") {
            Some(u) => u,
            None => continue,
        };
        items.push(RawNewsItem {
            title,
            source: source.to_string(),
            url,
            published: tag_text(block, "pubDate"),
        });
    }
    items
}

fn extract_atom_entries(body: &str, source: &str, limit: usize) -> Vec<RawNewsItem> {
    let entry_re = Regex::new(r"(?s)<entry[\s>](.*?)</entry>").expect("valid regex");
    let href_re = Regex::new(r#"<link[^>]*href="([^"]+)""#).expect("valid regex");
    let mut items = Vec::new();

    for caps in entry_re.captures_iter(body).take(limit) {
        let block = &caps[1];
        let title = match tag_text(block, "title") {
            Some(t) => t,
            None => continue,
        };
        let url = href_re
            .captures(block)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        items.push(RawNewsItem {
            title,
            source: source.to_string(),
            url,
            published: tag_text(block, "updated"),
        });
    }
    items
}

/// Text content of the first `<tag>` in `block`, CDATA unwrapped and
/// basic entities decoded. `None` when the tag is absent or empty.
fn tag_text(block: &str, tag: &str) -> Option<String> {
    let re = Regex::new(&format!(r"(?s)<{0}[^>]*>(.*?)</{0}>", tag)).expect("valid regex");
    let raw = re.captures(block)?.get(1)?.as_str().trim().to_string();

    let inner = raw
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(&raw)
        .trim();

    if inner.is_empty() {
        return None;
    }
    Some(decode_entities(inner))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
