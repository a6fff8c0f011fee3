//! Human-readable formatting helpers for sizes and timestamps.

use bytesize::ByteSize;
use chrono::{DateTime, Local};

/// Byte count rendered for display ("30 B", "1.5 MiB").
#[inline]
#[must_use]
pub fn size_human(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Render a backend timestamp string in local time.
///
/// Backends report ISO-8601; anything unparsable is shown as-is rather than
/// dropped, since the raw string is still meaningful to the user.
#[must_use]
pub fn modified_local(modified: &str) -> String {
    match DateTime::parse_from_rfc3339(modified) {
        Ok(ts) => ts
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => modified.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_render_with_units() {
        assert!(size_human(30).contains('B'));
        assert!(size_human(3 * 1024 * 1024).starts_with('3'));
    }

    #[test]
    fn unparsable_timestamps_pass_through() {
        assert_eq!(modified_local("not-a-date"), "not-a-date");
        assert_eq!(modified_local(""), "");
    }

    #[test]
    fn rfc3339_timestamps_parse() {
        // Output depends on the local timezone, so only assert it re-formats.
        let rendered = modified_local("2024-06-01T12:00:00Z");
        assert_ne!(rendered, "2024-06-01T12:00:00Z");
        assert!(rendered.starts_with("2024-06-01") || rendered.starts_with("2024-06-02"));
    }
}
