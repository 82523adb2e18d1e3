//! Canvas LMS blocking HTTP client

use crate::fetchers::CanvasFetcher;
use crate::types::{AnnouncementPage, Course, DaybriefError, RawAnnouncement, RawAssignment, Result};
use regex::Regex;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default Canvas instance
const DEFAULT_BASE_URL: &str = "https://sbccd.instructure.com/api/v1";

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 10;

const USER_AGENT: &str = "daybrief-local-dashboard";

/// Blocking client for the Canvas REST API.
///
/// Announcement pagination follows RFC 5988 `Link` headers; the full
/// `rel="next"` URL is handed back to the aggregator as the opaque
/// cursor.
pub struct CanvasClient {
    base_url: String,
    client: Client,
}

impl CanvasClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DaybriefError::Fetch(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .query(query)
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
            .json()
            .map_err(|e| DaybriefError::Parse(format!("response body: {}", e)))
    }
}

impl CanvasFetcher for CanvasClient {
    fn validate_token(&self, token: &str) -> bool {
        let url = format!("{}/users/self/profile", self.base_url);
        self.client
            .get(&url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn courses(&self, token: &str) -> Result<Vec<Course>> {
        let url = format!("{}/courses", self.base_url);
        self.get_json(
            &url,
            token,
            &[("enrollment_state", "active"), ("per_page", "100")],
        )
    }

    fn assignments(&self, token: &str, course_id: u64) -> Result<Vec<RawAssignment>> {
        let url = format!("{}/courses/{}/assignments", self.base_url, course_id);
        self.get_json(&url, token, &[("per_page", "100"), ("include[]", "submission")])
    }

    fn announcements_page(
        &self,
        token: &str,
        course_id: u64,
        cursor: Option<&str>,
    ) -> Result<AnnouncementPage> {
        // The cursor is the complete next-page URL from the previous
        // Link header; query parameters only apply to the first request.
        let url = match cursor {
            Some(next) => next.to_string(),
            None => format!("{}/courses/{}/discussion_topics", self.base_url, course_id),
        };

        let mut request = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("Accept", "application/json");
        if cursor.is_none() {
            request = request.query(&[("only_announcements", "true"), ("per_page", "50")]);
        }

        let response = request
            .send()
            .map_err(|e| DaybriefError::Fetch(format!("request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(DaybriefError::Fetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        // Read the header before .json() consumes the response.
        let next_cursor = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_link);

        let items: Vec<RawAnnouncement> = response
            .json()
            .map_err(|e| DaybriefError::Parse(format!("announcement page body: {}", e)))?;

        Ok(AnnouncementPage { items, next_cursor })
    }
}

/// Extract the `rel="next"` target from an RFC 5988 `Link` header
fn parse_next_link(header: &str) -> Option<String> {
    let re = Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).expect("valid regex");
    re.captures(header).map(|caps| caps[1].to_string())
}
