//! IMAP unread-mail fetcher
//!
//! Connects per account over IMAPS, searches INBOX for unseen messages,
//! and summarizes the newest few (sender, subject, snippet, timestamp).
//! Any failure, from login to a single bad message, degrades to an
//! empty or shorter list; mail trouble never surfaces as an error.

use crate::config::EmailAccount;
use crate::fetchers::MailboxFetcher;
use crate::types::{DaybriefError, MailSummary, Result};
use chrono::DateTime;
use mailparse::{DispositionType, MailHeaderMap, ParsedMail};
use native_tls::TlsConnector;

/// Fallback host for accounts that configure only an address
const DEFAULT_IMAP_HOST: &str = "imap.gmail.com";

const IMAPS_PORT: u16 = 993;

/// Longest snippet carried into a summary
const SNIPPET_LEN: usize = 140;

pub struct ImapMailFetcher;

impl ImapMailFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl MailboxFetcher for ImapMailFetcher {
    fn unread(&self, account: &EmailAccount, limit: usize) -> Vec<MailSummary> {
        if account.email.trim().is_empty() || account.app_password.trim().is_empty() {
            return Vec::new();
        }
        match fetch_unread(account, limit) {
            Ok(summaries) => summaries,
            Err(e) => {
                eprintln!(
                    "[daybrief] Warning: mailbox '{}' skipped: {}",
                    account.display_label(),
                    e
                );
                Vec::new()
            }
        }
    }
}

fn fetch_unread(account: &EmailAccount, limit: usize) -> Result<Vec<MailSummary>> {
    let host = if account.imap_host.trim().is_empty() {
        DEFAULT_IMAP_HOST
    } else {
        account.imap_host.trim()
    };

    let tls = TlsConnector::builder()
        .build()
        .map_err(|e| DaybriefError::Fetch(format!("TLS setup failed: {}", e)))?;
    let client = imap::connect((host, IMAPS_PORT), host, &tls)
        .map_err(|e| DaybriefError::Fetch(format!("IMAP connect failed: {}", e)))?;
    let mut session = client
        .login(account.email.trim(), account.app_password.trim())
        .map_err(|(e, _)| DaybriefError::Fetch(format!("IMAP login failed: {}", e)))?;

    session
        .select("INBOX")
        .map_err(|e| DaybriefError::Fetch(format!("INBOX select failed: {}", e)))?;
    let unseen = session
        .search("UNSEEN")
        .map_err(|e| DaybriefError::Fetch(format!("UNSEEN search failed: {}", e)))?;

    let mut summaries = Vec::new();
    for id in pick_latest(unseen.into_iter().collect(), limit) {
        let fetches = match session.fetch(id.to_string(), "(RFC822)") {
            Ok(fetches) => fetches,
            Err(e) => {
                eprintln!("[daybrief] Warning: message {} skipped: {}", id, e);
                continue;
            }
        };
        for fetched in fetches.iter() {
            if let Some(raw) = fetched.body() {
                if let Some(summary) = summarize(raw, account.display_label()) {
                    summaries.push(summary);
                }
            }
        }
    }

    session.logout().ok();
    Ok(summaries)
}

/// Newest-first slice of the unseen sequence numbers, bounded to `limit`
fn pick_latest(mut ids: Vec<u32>, limit: usize) -> Vec<u32> {
    ids.sort_unstable();
    ids.into_iter().rev().take(limit).collect()
}

/// One display summary from a raw RFC 822 message. `None` only when the
/// bytes cannot be parsed as a message at all.
fn summarize(raw: &[u8], account_label: &str) -> Option<MailSummary> {
    let parsed = mailparse::parse_mail(raw).ok()?;
    Some(MailSummary {
        account: account_label.to_string(),
        sender: parsed.headers.get_first_value("From").unwrap_or_default(),
        subject: parsed
            .headers
            .get_first_value("Subject")
            .unwrap_or_default(),
        snippet: extract_snippet(&parsed),
        timestamp: parsed.headers.get_first_value("Date").map(normalize_date),
    })
}

/// Date headers are RFC 2822; render as RFC 3339 when parseable, keep
/// the raw value otherwise.
fn normalize_date(raw: String) -> String {
    DateTime::parse_from_rfc2822(&raw)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or(raw)
}

/// Whitespace-collapsed opening of the first inline text/plain part,
/// capped to [`SNIPPET_LEN`] characters.
fn extract_snippet(mail: &ParsedMail) -> String {
    let body = match first_text_part(mail) {
        Some(text) => text,
        None => return String::new(),
    };
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(SNIPPET_LEN).collect()
}

fn first_text_part(mail: &ParsedMail) -> Option<String> {
    // A single-part message is its own body, whatever the content type.
    if mail.subparts.is_empty() {
        return mail.get_body().ok();
    }
    for part in &mail.subparts {
        if part.subparts.is_empty() {
            if part.ctype.mimetype == "text/plain"
                && part.get_content_disposition().disposition != DispositionType::Attachment
            {
                if let Ok(text) = part.get_body() {
                    return Some(text);
                }
            }
        } else if let Some(text) = first_text_part(part) {
            return Some(text);
        }
    }
    None
}
