//! URL handling module for Ripple-Crawl
//!
//! This module provides URL normalization (the dedup key of the frontier)
//! and origin extraction (the key of per-domain politeness state).

mod domain;
mod normalize;

pub use domain::{extract_origin, robots_url};
pub use normalize::normalize_url;
