//! Snapshot assembly service
//!
//! Pulls every configured source through the freshness cache and shapes
//! the results for display. Each source degrades independently: a dead
//! upstream falls back to the last cached payload, then to an explicit
//! empty value, and never takes the rest of the snapshot down with it.

use crate::config::{EmailsConfig, LocationConfig, UserConfig};
use crate::fetchers::{CanvasFetcher, MailboxFetcher, NewsFetcher, WeatherFetcher};
use crate::services::aggregator::{Aggregator, PAGE_FETCH_DELAY};
use crate::services::cache::FreshnessCache;
use crate::services::shortener::shorten;
use crate::types::{
    Announcement, Assignment, CanvasData, Course, MailSummary, NewsDigest, NewsItem, Snapshot,
    WeatherReport,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Announcements kept per course after dedup and ranking
pub const ANNOUNCEMENTS_PER_COURSE: usize = 2;

/// Headlines kept in one digest
pub const MAX_HEADLINES: usize = 5;

/// Unread summaries kept per refresh
pub const MAX_MAIL_ITEMS: usize = 5;

const WEATHER_KEY: &str = "weather";
const NEWS_KEY: &str = "news";
const MAIL_KEY: &str = "emails";

pub struct DashboardService<'a> {
    cache: &'a FreshnessCache,
    canvas: &'a dyn CanvasFetcher,
    weather: &'a dyn WeatherFetcher,
    news: &'a dyn NewsFetcher,
    mailbox: &'a dyn MailboxFetcher,
    page_delay: Duration,
}

impl<'a> DashboardService<'a> {
    pub fn new(
        cache: &'a FreshnessCache,
        canvas: &'a dyn CanvasFetcher,
        weather: &'a dyn WeatherFetcher,
        news: &'a dyn NewsFetcher,
        mailbox: &'a dyn MailboxFetcher,
    ) -> Self {
        Self {
            cache,
            canvas,
            weather,
            news,
            mailbox,
            page_delay: PAGE_FETCH_DELAY,
        }
    }

    /// Override the inter-page pause (tests run with zero)
    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Full dashboard refresh honoring the per-source enabled toggles
    pub fn snapshot(&self, config: &UserConfig) -> Snapshot {
        let canvas = if config.canvas.enabled {
            self.canvas_data(&config.canvas.token, &config.canvas.course_aliases)
        } else {
            CanvasData::default()
        };
        let weather = if config.weather.enabled {
            self.weather(&config.location)
        } else {
            WeatherReport::unavailable("Disabled")
        };
        let news = if config.news.enabled {
            self.news()
        } else {
            NewsDigest::empty()
        };
        let mail = self.unread_mail(&config.emails);

        Snapshot {
            canvas,
            weather,
            news,
            mail,
        }
    }

    /// Assignments and announcements across every academic course.
    ///
    /// A missing or rejected token yields the empty value without
    /// caching it. Per-course fetch failures skip that course's slice
    /// and keep going; only a failed course-list fetch falls back to
    /// stale data.
    pub fn canvas_data(&self, token: &str, aliases: &HashMap<String, String>) -> CanvasData {
        let token = token.trim();
        if token.is_empty() {
            return CanvasData::default();
        }

        let key = format!("canvas:{}", token);
        if let Some(cached) = self.read_cache::<CanvasData>(&key) {
            return cached;
        }

        if !self.canvas.validate_token(token) {
            eprintln!("[daybrief] Warning: Canvas token rejected");
            return CanvasData::default();
        }

        let courses = match self.canvas.courses(token) {
            Ok(courses) => courses,
            Err(e) => {
                eprintln!("[daybrief] Warning: course list fetch failed: {}", e);
                return self.stale_or(&key, CanvasData::default());
            }
        };

        let mut data = CanvasData::default();
        for course in courses.iter().filter(|c| c.is_academic()) {
            let display = display_name(course, aliases);

            match self.canvas.assignments(token, course.id) {
                Ok(raw) => {
                    for assignment in raw {
                        data.assignments.push(Assignment {
                            course: display.clone(),
                            name: assignment
                                .name
                                .unwrap_or_else(|| "Unnamed Assignment".to_string()),
                            due_at: assignment.due_at,
                            submission: assignment.submission,
                        });
                    }
                }
                Err(e) => {
                    eprintln!(
                        "[daybrief] Warning: assignments for '{}' skipped: {}",
                        display, e
                    );
                }
            }

            let gathered = Aggregator::collect_paginated(
                |cursor| self.canvas.announcements_page(token, course.id, cursor),
                self.page_delay,
            );
            for raw in Aggregator::latest_first(
                gathered,
                ANNOUNCEMENTS_PER_COURSE,
                |a| a.id,
                |a| a.posted_at.as_deref(),
            ) {
                data.announcements.push(Announcement {
                    course: display.clone(),
                    title: raw.title().to_string(),
                    posted: raw.posted_at,
                });
            }
        }

        data.assignments = Aggregator::rank_ascending(data.assignments, |a| a.due_at.as_deref());

        self.write_cache(&key, &data);
        data
    }

    /// Current conditions for the configured location
    pub fn weather(&self, location: &LocationConfig) -> WeatherReport {
        if location_unset(location) {
            return WeatherReport::unavailable_in(
                "No location set",
                self.last_weather_zone().as_deref(),
            );
        }
        if let Some(cached) = self.read_cache(WEATHER_KEY) {
            return cached;
        }

        match self.weather.current(location) {
            Ok(report) => {
                self.write_cache(WEATHER_KEY, &report);
                report
            }
            Err(e) => {
                eprintln!("[daybrief] Warning: weather fetch failed: {}", e);
                self.stale_or(
                    WEATHER_KEY,
                    WeatherReport::unavailable_in(
                        "Unable to fetch weather",
                        self.last_weather_zone().as_deref(),
                    ),
                )
            }
        }
    }

    /// Timezone of the last cached report, fresh or stale, so failure
    /// sentinels stay stamped in the location's local time
    fn last_weather_zone(&self) -> Option<String> {
        self.cache
            .get_stale(WEATHER_KEY)
            .and_then(|value| serde_json::from_value::<WeatherReport>(value).ok())
            .and_then(|report| report.timezone)
    }

    /// Most recent headlines, bounded to [`MAX_HEADLINES`]
    pub fn news(&self) -> NewsDigest {
        if let Some(cached) = self.read_cache(NEWS_KEY) {
            return cached;
        }

        match self.news.headlines() {
            Ok(raw) => {
                let items = Aggregator::rank_descending(raw, |i| i.published.as_deref())
                    .into_iter()
                    .take(MAX_HEADLINES)
                    .map(|i| NewsItem {
                        title: i.title,
                        source: i.source,
                        url: i.url,
                    })
                    .collect();
                let digest = NewsDigest {
                    updated_at: Utc::now(),
                    items,
                };
                self.write_cache(NEWS_KEY, &digest);
                digest
            }
            Err(e) => {
                eprintln!("[daybrief] Warning: news fetch failed: {}", e);
                self.stale_or(NEWS_KEY, NewsDigest::empty())
            }
        }
    }

    /// Unread summaries across every configured account, bounded to
    /// [`MAX_MAIL_ITEMS`]. Disabled or account-less mail yields the
    /// empty list without touching the cache.
    pub fn unread_mail(&self, emails: &EmailsConfig) -> Vec<MailSummary> {
        if !emails.enabled || emails.accounts.is_empty() {
            return Vec::new();
        }
        if let Some(cached) = self.read_cache(MAIL_KEY) {
            return cached;
        }

        let mut summaries = Vec::new();
        for account in &emails.accounts {
            summaries.extend(self.mailbox.unread(account, MAX_MAIL_ITEMS));
        }
        summaries.truncate(MAX_MAIL_ITEMS);

        self.write_cache(MAIL_KEY, &summaries);
        summaries
    }

    fn read_cache<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.cache
            .get(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    fn write_cache<T: Serialize>(&self, key: &str, value: &T) {
        if let Ok(payload) = serde_json::to_value(value) {
            self.cache.set(key, payload);
        }
    }

    /// Expired cache entry if one exists, otherwise `fallback`
    fn stale_or<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        self.cache
            .get_stale(key)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or(fallback)
    }
}

/// Alias lookup first, shortening heuristic second
fn display_name(course: &Course, aliases: &HashMap<String, String>) -> String {
    if let Some(alias) = aliases.get(&course.id.to_string()) {
        let alias = alias.trim();
        if !alias.is_empty() {
            return alias.to_string();
        }
    }
    shorten(course.title())
}

fn location_unset(location: &LocationConfig) -> bool {
    location.zip_code.trim().is_empty()
        && (location.lat.trim().is_empty() || location.lon.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmailAccount;
    use crate::services::cache::DEFAULT_TTL_SECS;
    use crate::types::{
        AnnouncementPage, DaybriefError, RawAnnouncement, RawAssignment, RawNewsItem, Result,
    };
    use serde_json::json;
    use std::cell::Cell;

    // ========== fakes ==========

    #[derive(Default)]
    struct FakeCanvas {
        courses: Vec<Course>,
        assignments: HashMap<u64, Vec<RawAssignment>>,
        announcement_pages: HashMap<u64, Vec<AnnouncementPage>>,
        reject_token: bool,
        fail_courses: bool,
        fail_assignments: bool,
        fail_after_first_page: bool,
        course_calls: Cell<usize>,
    }

    impl CanvasFetcher for FakeCanvas {
        fn validate_token(&self, _token: &str) -> bool {
            !self.reject_token
        }

        fn courses(&self, _token: &str) -> Result<Vec<Course>> {
            self.course_calls.set(self.course_calls.get() + 1);
            if self.fail_courses {
                return Err(DaybriefError::Fetch("HTTP 500".into()));
            }
            Ok(self.courses.clone())
        }

        fn assignments(&self, _token: &str, course_id: u64) -> Result<Vec<RawAssignment>> {
            if self.fail_assignments {
                return Err(DaybriefError::Fetch("timeout".into()));
            }
            Ok(self.assignments.get(&course_id).cloned().unwrap_or_default())
        }

        fn announcements_page(
            &self,
            _token: &str,
            course_id: u64,
            cursor: Option<&str>,
        ) -> Result<AnnouncementPage> {
            let index: usize = match cursor {
                None => 0,
                Some(c) => c.parse().unwrap(),
            };
            if index > 0 && self.fail_after_first_page {
                return Err(DaybriefError::Fetch("HTTP 502".into()));
            }
            let pages = self.announcement_pages.get(&course_id);
            Ok(pages
                .and_then(|p| p.get(index))
                .cloned()
                .unwrap_or(AnnouncementPage {
                    items: Vec::new(),
                    next_cursor: None,
                }))
        }
    }

    struct FakeWeather {
        report: Result<WeatherReport>,
        calls: Cell<usize>,
    }

    impl FakeWeather {
        fn ok(temp: i64) -> Self {
            Self {
                report: Ok(WeatherReport {
                    temp: Some(temp),
                    condition: "Clear sky".into(),
                    humidity: Some(40.0),
                    location: "Redlands".into(),
                    timezone: Some("America/Los_Angeles".into()),
                    local_time: "2024-02-05T08:00:00-08:00".into(),
                }),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                report: Err(DaybriefError::Fetch("unreachable".into())),
                calls: Cell::new(0),
            }
        }
    }

    impl WeatherFetcher for FakeWeather {
        fn current(&self, _location: &LocationConfig) -> Result<WeatherReport> {
            self.calls.set(self.calls.get() + 1);
            match &self.report {
                Ok(report) => Ok(report.clone()),
                Err(_) => Err(DaybriefError::Fetch("unreachable".into())),
            }
        }
    }

    struct FakeNews {
        items: Vec<RawNewsItem>,
        fail: bool,
    }

    impl NewsFetcher for FakeNews {
        fn headlines(&self) -> Result<Vec<RawNewsItem>> {
            if self.fail {
                return Err(DaybriefError::Fetch("no feed reachable".into()));
            }
            Ok(self.items.clone())
        }
    }

    #[derive(Default)]
    struct FakeMailbox {
        per_account: usize,
    }

    impl MailboxFetcher for FakeMailbox {
        fn unread(&self, account: &EmailAccount, limit: usize) -> Vec<MailSummary> {
            (0..self.per_account.min(limit))
                .map(|i| MailSummary {
                    account: account.display_label().to_string(),
                    sender: format!("sender{}@example.com", i),
                    subject: format!("Subject {}", i),
                    snippet: String::new(),
                    timestamp: None,
                })
                .collect()
        }
    }

    fn course(id: u64, name: &str) -> Course {
        Course {
            id,
            name: Some(name.to_string()),
        }
    }

    fn raw_assignment(name: &str, due_at: Option<&str>) -> RawAssignment {
        RawAssignment {
            name: Some(name.to_string()),
            due_at: due_at.map(String::from),
            submission: json!({}),
        }
    }

    fn ann(id: u64, title: &str, posted_at: &str) -> RawAnnouncement {
        RawAnnouncement {
            id: Some(id),
            title: Some(title.to_string()),
            posted_at: Some(posted_at.to_string()),
        }
    }

    fn service<'a>(
        cache: &'a FreshnessCache,
        canvas: &'a FakeCanvas,
        weather: &'a FakeWeather,
        news: &'a FakeNews,
        mailbox: &'a FakeMailbox,
    ) -> DashboardService<'a> {
        DashboardService::new(cache, canvas, weather, news, mailbox)
            .with_page_delay(Duration::ZERO)
    }

    fn quiet_news() -> FakeNews {
        FakeNews {
            items: Vec::new(),
            fail: false,
        }
    }

    fn location() -> LocationConfig {
        LocationConfig {
            zip_code: "92374".into(),
            lat: String::new(),
            lon: String::new(),
        }
    }

    // ========== canvas_data ==========

    #[test]
    fn test_canvas_empty_token_short_circuits() {
        let cache = FreshnessCache::default();
        let canvas = FakeCanvas {
            courses: vec![course(1, "Biology")],
            ..Default::default()
        };
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        assert_eq!(svc.canvas_data("  ", &HashMap::new()), CanvasData::default());
        assert_eq!(canvas.course_calls.get(), 0);
    }

    #[test]
    fn test_canvas_rejected_token_yields_empty() {
        let cache = FreshnessCache::default();
        let canvas = FakeCanvas {
            reject_token: true,
            courses: vec![course(1, "Biology")],
            ..Default::default()
        };
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        assert_eq!(svc.canvas_data("tok", &HashMap::new()), CanvasData::default());
        // an empty result from a bad token must not be cached as fresh
        assert!(cache.get("canvas:tok").is_none());
    }

    #[test]
    fn test_canvas_assignments_ranked_undated_first() {
        let cache = FreshnessCache::default();
        let mut assignments = HashMap::new();
        assignments.insert(
            1,
            vec![
                raw_assignment("Essay", Some("2024-01-05T00:00:00Z")),
                raw_assignment("Reading", None),
                raw_assignment("Quiz", Some("2024-01-01T00:00:00Z")),
            ],
        );
        let canvas = FakeCanvas {
            courses: vec![course(1, "BIOL-101 Introduction to Biology")],
            assignments,
            ..Default::default()
        };
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let data = svc.canvas_data("tok", &HashMap::new());
        let names: Vec<&str> = data.assignments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Reading", "Quiz", "Essay"]);
        assert!(data.assignments.iter().all(|a| a.course == "BIOL 101"));
    }

    #[test]
    fn test_canvas_alias_beats_shortener() {
        let cache = FreshnessCache::default();
        let mut assignments = HashMap::new();
        assignments.insert(1, vec![raw_assignment("Quiz", None)]);
        let canvas = FakeCanvas {
            courses: vec![course(1, "BIOL-101 Introduction to Biology")],
            assignments,
            ..Default::default()
        };
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let mut aliases = HashMap::new();
        aliases.insert("1".to_string(), "Bio".to_string());
        let data = svc.canvas_data("tok", &aliases);
        assert_eq!(data.assignments[0].course, "Bio");
    }

    #[test]
    fn test_canvas_blank_alias_falls_through() {
        let cache = FreshnessCache::default();
        let mut assignments = HashMap::new();
        assignments.insert(1, vec![raw_assignment("Quiz", None)]);
        let canvas = FakeCanvas {
            courses: vec![course(1, "BIOL-101 Introduction to Biology")],
            assignments,
            ..Default::default()
        };
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let mut aliases = HashMap::new();
        aliases.insert("1".to_string(), "   ".to_string());
        let data = svc.canvas_data("tok", &aliases);
        assert_eq!(data.assignments[0].course, "BIOL 101");
    }

    #[test]
    fn test_canvas_non_academic_courses_filtered() {
        let cache = FreshnessCache::default();
        let mut assignments = HashMap::new();
        assignments.insert(1, vec![raw_assignment("Quiz", None)]);
        assignments.insert(2, vec![raw_assignment("Orientation", None)]);
        let canvas = FakeCanvas {
            courses: vec![course(1, "Biology"), course(2, "Student Program Shell")],
            assignments,
            ..Default::default()
        };
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let data = svc.canvas_data("tok", &HashMap::new());
        assert_eq!(data.assignments.len(), 1);
        assert_eq!(data.assignments[0].name, "Quiz");
    }

    #[test]
    fn test_canvas_announcements_capped_and_deduped() {
        let cache = FreshnessCache::default();
        let mut pages = HashMap::new();
        pages.insert(
            1,
            vec![
                AnnouncementPage {
                    items: vec![
                        ann(10, "Welcome", "2024-01-01T00:00:00Z"),
                        ann(11, "Midterm moved", "2024-02-01T00:00:00Z"),
                    ],
                    next_cursor: Some("1".into()),
                },
                AnnouncementPage {
                    // 11 repeats across the page boundary
                    items: vec![
                        ann(11, "Midterm moved", "2024-02-01T00:00:00Z"),
                        ann(12, "Office hours", "2024-03-01T00:00:00Z"),
                    ],
                    next_cursor: None,
                },
            ],
        );
        let canvas = FakeCanvas {
            courses: vec![course(1, "Biology")],
            announcement_pages: pages,
            ..Default::default()
        };
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let data = svc.canvas_data("tok", &HashMap::new());
        assert_eq!(data.announcements.len(), 2);
        assert_eq!(data.announcements[0].title, "Office hours");
        assert_eq!(data.announcements[1].title, "Midterm moved");
    }

    #[test]
    fn test_canvas_page_failure_keeps_first_page() {
        let cache = FreshnessCache::default();
        let mut pages = HashMap::new();
        pages.insert(
            1,
            vec![AnnouncementPage {
                items: vec![ann(10, "Survivor", "2024-01-01T00:00:00Z")],
                next_cursor: Some("1".into()),
            }],
        );
        let canvas = FakeCanvas {
            courses: vec![course(1, "Biology")],
            announcement_pages: pages,
            fail_after_first_page: true,
            ..Default::default()
        };
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let data = svc.canvas_data("tok", &HashMap::new());
        assert_eq!(data.announcements.len(), 1);
        assert_eq!(data.announcements[0].title, "Survivor");
    }

    #[test]
    fn test_canvas_assignment_failure_skips_course_slice() {
        let cache = FreshnessCache::default();
        let mut pages = HashMap::new();
        pages.insert(
            1,
            vec![AnnouncementPage {
                items: vec![ann(10, "Still here", "2024-01-01T00:00:00Z")],
                next_cursor: None,
            }],
        );
        let canvas = FakeCanvas {
            courses: vec![course(1, "Biology")],
            announcement_pages: pages,
            fail_assignments: true,
            ..Default::default()
        };
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let data = svc.canvas_data("tok", &HashMap::new());
        assert!(data.assignments.is_empty());
        assert_eq!(data.announcements.len(), 1);
    }

    #[test]
    fn test_canvas_fresh_cache_skips_fetch() {
        let cache = FreshnessCache::default();
        let mut assignments = HashMap::new();
        assignments.insert(1, vec![raw_assignment("Quiz", None)]);
        let canvas = FakeCanvas {
            courses: vec![course(1, "Biology")],
            assignments,
            ..Default::default()
        };
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let first = svc.canvas_data("tok", &HashMap::new());
        let second = svc.canvas_data("tok", &HashMap::new());
        assert_eq!(first, second);
        assert_eq!(canvas.course_calls.get(), 1);
    }

    #[test]
    fn test_canvas_course_failure_falls_back_to_stale() {
        let cache = FreshnessCache::default();
        let stale = CanvasData {
            assignments: vec![Assignment {
                course: "BIOL 101".into(),
                name: "Old quiz".into(),
                due_at: None,
                submission: json!({}),
            }],
            announcements: Vec::new(),
        };
        let expired = Utc::now().timestamp() - DEFAULT_TTL_SECS - 60;
        cache.set_at(
            "canvas:tok",
            serde_json::to_value(&stale).unwrap(),
            expired,
        );

        let canvas = FakeCanvas {
            fail_courses: true,
            ..Default::default()
        };
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let data = svc.canvas_data("tok", &HashMap::new());
        assert_eq!(data.assignments[0].name, "Old quiz");
    }

    #[test]
    fn test_canvas_course_failure_without_stale_is_empty() {
        let cache = FreshnessCache::default();
        let canvas = FakeCanvas {
            fail_courses: true,
            ..Default::default()
        };
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        assert_eq!(svc.canvas_data("tok", &HashMap::new()), CanvasData::default());
    }

    // ========== weather ==========

    #[test]
    fn test_weather_no_location_skips_fetch() {
        let cache = FreshnessCache::default();
        let canvas = FakeCanvas::default();
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let report = svc.weather(&LocationConfig::default());
        assert_eq!(report.condition, "No location set");
        assert_eq!(weather.calls.get(), 0);
    }

    #[test]
    fn test_weather_sentinel_keeps_last_known_zone() {
        let cache = FreshnessCache::default();
        let previous = WeatherReport {
            temp: Some(61),
            condition: "Overcast".into(),
            humidity: None,
            location: "Redlands".into(),
            timezone: Some("America/Los_Angeles".into()),
            local_time: "2024-02-04T08:00:00-08:00".into(),
        };
        let expired = Utc::now().timestamp() - DEFAULT_TTL_SECS - 60;
        cache.set_at(WEATHER_KEY, serde_json::to_value(&previous).unwrap(), expired);

        let canvas = FakeCanvas::default();
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let report = svc.weather(&LocationConfig::default());
        assert_eq!(report.condition, "No location set");
        assert_eq!(report.timezone.as_deref(), Some("America/Los_Angeles"));
        assert!(!report.local_time.ends_with("+00:00") && !report.local_time.ends_with('Z'));
    }

    #[test]
    fn test_weather_explicit_coordinates_count_as_location() {
        let cache = FreshnessCache::default();
        let canvas = FakeCanvas::default();
        let (weather, news, mailbox) = (FakeWeather::ok(68), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let loc = LocationConfig {
            zip_code: String::new(),
            lat: "34.05".into(),
            lon: "-117.18".into(),
        };
        assert_eq!(svc.weather(&loc).temp, Some(68));
    }

    #[test]
    fn test_weather_fresh_cache_skips_fetch() {
        let cache = FreshnessCache::default();
        let canvas = FakeCanvas::default();
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        svc.weather(&location());
        svc.weather(&location());
        assert_eq!(weather.calls.get(), 1);
    }

    #[test]
    fn test_weather_failure_falls_back_to_stale() {
        let cache = FreshnessCache::default();
        let stale = WeatherReport {
            temp: Some(61),
            condition: "Overcast".into(),
            humidity: None,
            location: "Redlands".into(),
            timezone: None,
            local_time: "2024-02-04T08:00:00+00:00".into(),
        };
        let expired = Utc::now().timestamp() - DEFAULT_TTL_SECS - 60;
        cache.set_at(WEATHER_KEY, serde_json::to_value(&stale).unwrap(), expired);

        let canvas = FakeCanvas::default();
        let (weather, news, mailbox) =
            (FakeWeather::failing(), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        assert_eq!(svc.weather(&location()).temp, Some(61));
    }

    #[test]
    fn test_weather_failure_without_stale_is_unavailable() {
        let cache = FreshnessCache::default();
        let canvas = FakeCanvas::default();
        let (weather, news, mailbox) =
            (FakeWeather::failing(), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let report = svc.weather(&location());
        assert_eq!(report.condition, "Unable to fetch weather");
        assert!(report.temp.is_none());
    }

    // ========== news ==========

    fn headline(title: &str, published: Option<&str>) -> RawNewsItem {
        RawNewsItem {
            title: title.to_string(),
            source: "Example".to_string(),
            url: format!("https://news.example/{}", title.len()),
            published: published.map(String::from),
        }
    }

    #[test]
    fn test_news_ranked_newest_first_and_capped() {
        let cache = FreshnessCache::default();
        let canvas = FakeCanvas::default();
        let items: Vec<RawNewsItem> = (1..=7)
            .map(|d| {
                headline(
                    &format!("Day {}", d),
                    Some(&format!("2024-02-0{}T00:00:00Z", d)),
                )
            })
            .collect();
        let news = FakeNews { items, fail: false };
        let (weather, mailbox) = (FakeWeather::ok(70), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let digest = svc.news();
        assert_eq!(digest.items.len(), MAX_HEADLINES);
        assert_eq!(digest.items[0].title, "Day 7");
        assert_eq!(digest.items[4].title, "Day 3");
    }

    #[test]
    fn test_news_failure_falls_back_to_stale() {
        let cache = FreshnessCache::default();
        let stale = NewsDigest {
            updated_at: Utc::now(),
            items: vec![NewsItem {
                title: "Yesterday's lead".into(),
                source: "Example".into(),
                url: "https://news.example/old".into(),
            }],
        };
        let expired = Utc::now().timestamp() - DEFAULT_TTL_SECS - 60;
        cache.set_at(NEWS_KEY, serde_json::to_value(&stale).unwrap(), expired);

        let canvas = FakeCanvas::default();
        let news = FakeNews {
            items: Vec::new(),
            fail: true,
        };
        let (weather, mailbox) = (FakeWeather::ok(70), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let digest = svc.news();
        assert_eq!(digest.items[0].title, "Yesterday's lead");
    }

    #[test]
    fn test_news_failure_without_stale_is_empty() {
        let cache = FreshnessCache::default();
        let canvas = FakeCanvas::default();
        let news = FakeNews {
            items: Vec::new(),
            fail: true,
        };
        let (weather, mailbox) = (FakeWeather::ok(70), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        assert!(svc.news().items.is_empty());
    }

    // ========== unread_mail ==========

    fn mail_config(accounts: usize) -> EmailsConfig {
        EmailsConfig {
            enabled: true,
            accounts: (0..accounts)
                .map(|i| EmailAccount {
                    label: format!("Account {}", i),
                    email: format!("user{}@example.com", i),
                    app_password: "secret".into(),
                    imap_host: "imap.example.com".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_mail_disabled_yields_empty() {
        let cache = FreshnessCache::default();
        let canvas = FakeCanvas::default();
        let (weather, news) = (FakeWeather::ok(70), quiet_news());
        let mailbox = FakeMailbox { per_account: 3 };
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let mut config = mail_config(1);
        config.enabled = false;
        assert!(svc.unread_mail(&config).is_empty());
        assert!(cache.get(MAIL_KEY).is_none());
    }

    #[test]
    fn test_mail_capped_across_accounts() {
        let cache = FreshnessCache::default();
        let canvas = FakeCanvas::default();
        let (weather, news) = (FakeWeather::ok(70), quiet_news());
        let mailbox = FakeMailbox { per_account: 4 };
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let summaries = svc.unread_mail(&mail_config(3));
        assert_eq!(summaries.len(), MAX_MAIL_ITEMS);
        assert_eq!(summaries[0].account, "Account 0");
    }

    // ========== snapshot ==========

    #[test]
    fn test_snapshot_honors_toggles() {
        let cache = FreshnessCache::default();
        let canvas = FakeCanvas {
            courses: vec![course(1, "Biology")],
            ..Default::default()
        };
        let (weather, news, mailbox) = (FakeWeather::ok(70), quiet_news(), FakeMailbox::default());
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let mut config = UserConfig::default();
        config.canvas.enabled = false;
        config.canvas.token = "tok".into();
        config.weather.enabled = false;
        config.news.enabled = false;
        config.location = location();

        let snapshot = svc.snapshot(&config);
        assert_eq!(snapshot.canvas, CanvasData::default());
        assert_eq!(snapshot.weather.condition, "Disabled");
        assert!(snapshot.news.items.is_empty());
        assert!(snapshot.mail.is_empty());
        assert_eq!(canvas.course_calls.get(), 0);
        assert_eq!(weather.calls.get(), 0);
    }

    #[test]
    fn test_snapshot_each_source_degrades_independently() {
        let cache = FreshnessCache::default();
        let mut assignments = HashMap::new();
        assignments.insert(1, vec![raw_assignment("Quiz", None)]);
        let canvas = FakeCanvas {
            courses: vec![course(1, "Biology")],
            assignments,
            ..Default::default()
        };
        let weather = FakeWeather::failing();
        let news = FakeNews {
            items: Vec::new(),
            fail: true,
        };
        let mailbox = FakeMailbox::default();
        let svc = service(&cache, &canvas, &weather, &news, &mailbox);

        let mut config = UserConfig::default();
        config.canvas.enabled = true;
        config.canvas.token = "tok".into();
        config.location = location();

        let snapshot = svc.snapshot(&config);
        assert_eq!(snapshot.canvas.assignments.len(), 1);
        assert_eq!(snapshot.weather.condition, "Unable to fetch weather");
        assert!(snapshot.news.items.is_empty());
    }
}
