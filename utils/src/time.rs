//! Time formatting helpers.

/// Format a duration in seconds for log lines (`"2m 0s"`, `"1d 3h"`).
pub fn format_duration(secs: u64) -> String {
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3_599 => format!("{}m {}s", secs / 60, secs % 60),
        3_600..=86_399 => format!("{}h {}m", secs / 3_600, (secs % 3_600) / 60),
        _ => format!("{}d {}h", secs / 86_400, (secs % 86_400) / 3_600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_coarsest_two_units() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(120), "2m 0s");
        assert_eq!(format_duration(1_201), "20m 1s");
        assert_eq!(format_duration(7_260), "2h 1m");
        assert_eq!(format_duration(90_000), "1d 1h");
    }
}
