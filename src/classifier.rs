//! Stream playability rules
//!
//! The player surface only handles plain HTTP(S) media it can fetch without
//! extra request headers. Everything here is pure and never fails: a record
//! with missing or odd fields is simply not playable.

use crate::models::Stream;

/// Substrings a playable URL must contain at least one of
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    ".m3u8", ".mp4", ".mp3", ".aac", ".flv", ".ogg", ".opus", ".ts",
];

/// Substrings that disqualify a URL outright (DASH manifests)
pub const BLOCKED_EXTENSIONS: &[&str] = &[".mpd"];

/// Directory status values that mark a stream as dead or restricted
pub const REJECTED_STATUSES: &[&str] = &["error", "blocked", "timeout", "geo-blocked", "not-24/7"];

/// URL-only part of the check
pub fn looks_playable(url: &str) -> bool {
    let normalized = url.trim().to_lowercase();
    if normalized.is_empty() || !normalized.starts_with("http") {
        return false;
    }
    // Block-list wins over the allow-list
    if BLOCKED_EXTENSIONS.iter().any(|ext| normalized.contains(ext)) {
        return false;
    }
    ALLOWED_EXTENSIONS.iter().any(|ext| normalized.contains(ext))
}

pub fn is_playable(stream: &Stream) -> bool {
    if !looks_playable(&stream.url) {
        return false;
    }
    if is_set(&stream.http_referrer) || is_set(&stream.user_agent) {
        return false;
    }
    if stream.headers.as_ref().is_some_and(|h| !h.is_empty()) {
        return false;
    }
    match stream.status.as_deref() {
        Some(status) => !REJECTED_STATUSES.contains(&status),
        None => true,
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}
