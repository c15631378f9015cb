//! Countdown display formatting

/// Format a remaining duration as `mm:ss`, truncating to whole seconds.
///
/// Negative input is shown as `00:00`.
pub fn format_remaining(milliseconds: i64) -> String {
    let total_seconds = milliseconds.max(0) / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_remaining(300_000), "05:00");
        assert_eq!(format_remaining(299_999), "04:59");
        assert_eq!(format_remaining(61_000), "01:01");
        assert_eq!(format_remaining(999), "00:00");
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(-20), "00:00");
    }

    #[test]
    fn minutes_are_not_capped_at_an_hour() {
        assert_eq!(format_remaining(125 * 60 * 1000), "125:00");
    }
}
