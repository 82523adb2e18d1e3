//! Record types for the dashboard data sources

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw Canvas course as returned by the courses endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

impl Course {
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed Course")
    }

    /// Canvas enrollments include non-course shells (orientation programs,
    /// student organizations, guardian accounts). Those never carry
    /// assignments worth showing.
    pub fn is_academic(&self) -> bool {
        let name = self.title().to_lowercase();
        !["program", "organization", "guardian", "nextup"]
            .iter()
            .any(|k| name.contains(k))
    }
}

/// Raw assignment record from the per-course assignments endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RawAssignment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub due_at: Option<String>,
    /// Submission state passed through untouched for the display layer
    #[serde(default)]
    pub submission: Value,
}

/// Assignment shaped for display, tagged with its course display name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub course: String,
    pub name: String,
    pub due_at: Option<String>,
    #[serde(default)]
    pub submission: Value,
}

/// Raw announcement record from one discussion-topics page
#[derive(Debug, Clone, Deserialize)]
pub struct RawAnnouncement {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub posted_at: Option<String>,
}

impl RawAnnouncement {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }
}

/// One page of announcements plus the opaque next-page cursor
#[derive(Debug, Clone)]
pub struct AnnouncementPage {
    pub items: Vec<RawAnnouncement>,
    pub next_cursor: Option<String>,
}

/// Announcement shaped for display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Announcement {
    pub course: String,
    pub title: String,
    pub posted: Option<String>,
}

/// Combined Canvas payload, cached per credential
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CanvasData {
    pub assignments: Vec<Assignment>,
    pub announcements: Vec<Announcement>,
}

/// Current-conditions report; `temp: None` marks the unavailable sentinel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherReport {
    pub temp: Option<i64>,
    pub condition: String,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub timezone: Option<String>,
    pub local_time: String,
}

impl WeatherReport {
    /// Sentinel payload used instead of raising for any weather failure
    pub fn unavailable(condition: &str) -> Self {
        Self::unavailable_in(condition, None)
    }

    /// Sentinel stamped in the given IANA zone so it displays in the
    /// same local time as real reports; UTC when the zone is absent or
    /// unknown.
    pub fn unavailable_in(condition: &str, timezone: Option<&str>) -> Self {
        let local_time = match timezone.and_then(|name| name.parse::<Tz>().ok()) {
            Some(tz) => Utc::now().with_timezone(&tz).to_rfc3339(),
            None => Utc::now().to_rfc3339(),
        };
        Self {
            temp: None,
            condition: condition.to_string(),
            humidity: None,
            location: String::new(),
            timezone: timezone.map(String::from),
            local_time,
        }
    }
}

/// Headline as extracted from one feed, before ranking
#[derive(Debug, Clone, PartialEq)]
pub struct RawNewsItem {
    pub title: String,
    pub source: String,
    pub url: String,
    pub published: Option<String>,
}

/// Headline shaped for display (publish date consumed during ranking)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsDigest {
    pub updated_at: DateTime<Utc>,
    pub items: Vec<NewsItem>,
}

impl NewsDigest {
    pub fn empty() -> Self {
        Self {
            updated_at: Utc::now(),
            items: Vec::new(),
        }
    }
}

/// Unread-mail summary: sender, subject, snippet, timestamp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MailSummary {
    pub account: String,
    pub sender: String,
    pub subject: String,
    pub snippet: String,
    pub timestamp: Option<String>,
}

/// Everything the dashboard shows, in one freshness-bounded snapshot
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub canvas: CanvasData,
    pub weather: WeatherReport,
    pub news: NewsDigest,
    pub mail: Vec<MailSummary>,
}
