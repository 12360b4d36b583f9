//! Display helpers for playback positions

/// Format milliseconds as `m:ss` for progress labels
///
/// Minutes are not wrapped into hours: a 75 minute mix reads `75:00`.
pub fn format_millis(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_millis(0), "0:00");
        assert_eq!(format_millis(999), "0:00");
        assert_eq!(format_millis(9_500), "0:09");
        assert_eq!(format_millis(61_000), "1:01");
        assert_eq!(format_millis(4_500_000), "75:00");
    }
}
