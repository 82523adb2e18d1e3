//! External fetch collaborators
//!
//! The aggregation core never talks to the network directly; every
//! upstream goes through one of these traits. The concrete blocking
//! clients live alongside them, and tests substitute in-memory fakes.

mod canvas;
mod mail;
mod news;
mod weather;

pub use canvas::CanvasClient;
pub use mail::ImapMailFetcher;
pub use news::RssNewsFetcher;
pub use weather::OpenMeteoClient;

use crate::config::{EmailAccount, LocationConfig};
use crate::types::{
    AnnouncementPage, Course, MailSummary, RawAssignment, RawNewsItem, Result, WeatherReport,
};

/// Course, assignment, and announcement access for one LMS instance
pub trait CanvasFetcher {
    /// Whether the credential is currently accepted by the upstream
    fn validate_token(&self, token: &str) -> bool;

    /// Active-enrollment courses for the credential's user
    fn courses(&self, token: &str) -> Result<Vec<Course>>;

    /// All assignments for one course
    fn assignments(&self, token: &str, course_id: u64) -> Result<Vec<RawAssignment>>;

    /// One page of announcements; `cursor` is the opaque next-page value
    /// returned by the previous call, `None` for the first page.
    fn announcements_page(
        &self,
        token: &str,
        course_id: u64,
        cursor: Option<&str>,
    ) -> Result<AnnouncementPage>;
}

/// Current-conditions lookup for a configured location
pub trait WeatherFetcher {
    fn current(&self, location: &LocationConfig) -> Result<WeatherReport>;
}

/// Raw headlines, already capped per feed. Individual feed failures are
/// absorbed; an error means no feed was reachable at all.
pub trait NewsFetcher {
    fn headlines(&self) -> Result<Vec<RawNewsItem>>;
}

/// Unread-message summaries for one account.
///
/// Returns up to `limit` most-recent summaries, or an empty list on any
/// failure; mailbox trouble must never break the snapshot.
pub trait MailboxFetcher {
    fn unread(&self, account: &EmailAccount, limit: usize) -> Vec<MailSummary>;
}
