//! Collection aggregation service
//!
//! Merges records fetched across multiple round trips: rank-only mode
//! for assignments, paginate-dedup-rank-truncate for announcements.
//! Timestamps go through the normalizer so records carrying absent,
//! naive, and offset-bearing stamps order together.

use crate::services::normalizer::normalize_or_undated;
use crate::types::{AnnouncementPage, RawAnnouncement, Result};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::thread;
use std::time::Duration;

/// Pause between successive page fetches for one collection. Politeness
/// toward the upstream API, not a correctness requirement.
pub const PAGE_FETCH_DELAY: Duration = Duration::from_millis(100);

/// Aggregator for merging, ranking, and bounding upstream collections
pub struct Aggregator;

impl Aggregator {
    /// Rank-only mode: stable ascending sort by normalized timestamp.
    ///
    /// Undated and unparseable records take the minimum-instant sentinel
    /// and therefore sort first. Ties preserve input order. Nothing is
    /// deduplicated or truncated.
    pub fn rank_ascending<T, F>(mut items: Vec<T>, raw_timestamp: F) -> Vec<T>
    where
        F: Fn(&T) -> Option<&str>,
    {
        items.sort_by_key(|item| normalize_or_undated(raw_timestamp(item)));
        items
    }

    /// Stable most-recent-first sort by normalized timestamp. Undated
    /// and unparseable records sink to the end.
    pub fn rank_descending<T, F>(mut items: Vec<T>, raw_timestamp: F) -> Vec<T>
    where
        F: Fn(&T) -> Option<&str>,
    {
        items.sort_by_key(|item| Reverse(normalize_or_undated(raw_timestamp(item))));
        items
    }

    /// Dedup-rank-truncate mode: keep the first-seen record per
    /// aggregation key, sort most-recent-first, bound to `max`.
    ///
    /// Records without a key cannot be identified across pages and are
    /// skipped.
    pub fn latest_first<T, K, F>(items: Vec<T>, max: usize, key: K, raw_timestamp: F) -> Vec<T>
    where
        K: Fn(&T) -> Option<u64>,
        F: Fn(&T) -> Option<&str>,
    {
        let mut seen: HashSet<u64> = HashSet::new();
        let mut deduped: Vec<T> = Vec::with_capacity(items.len());
        for item in items {
            if let Some(id) = key(&item) {
                if seen.insert(id) {
                    deduped.push(item);
                }
            }
        }

        let mut ranked = Self::rank_descending(deduped, raw_timestamp);
        ranked.truncate(max);
        ranked
    }

    /// Drive an opaque next-cursor pagination loop until the cursor is
    /// exhausted or a fetch fails.
    ///
    /// A mid-pagination failure is not fatal: it terminates this one
    /// collection and keeps everything gathered so far. `page_delay` is
    /// applied between successive fetches (zero in tests).
    pub fn collect_paginated<F>(mut fetch_page: F, page_delay: Duration) -> Vec<RawAnnouncement>
    where
        F: FnMut(Option<&str>) -> Result<AnnouncementPage>,
    {
        let mut collected = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = match fetch_page(cursor.as_deref()) {
                Ok(page) => page,
                Err(e) => {
                    eprintln!("[daybrief] Warning: pagination stopped early: {}", e);
                    break;
                }
            };
            collected.extend(page.items);

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
            if !page_delay.is_zero() {
                thread::sleep(page_delay);
            }
        }

        collected
    }
}
