//! Aggregation core: normalization, shortening, caching, and snapshot
//! assembly

mod aggregator;
mod cache;
mod dashboard;
mod normalizer;
mod shortener;

pub use aggregator::Aggregator;
pub use cache::FreshnessCache;
pub use dashboard::DashboardService;
pub use normalizer::{normalize, normalize_or_undated, UNDATED};
pub use shortener::shorten;
