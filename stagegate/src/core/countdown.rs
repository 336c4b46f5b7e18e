//! Pure countdown arithmetic.
//!
//! Remaining time is always derived from the absolute expiry, never from
//! locally elapsed time, so a reload or a second page agrees on the clock.

/// Whole seconds left until `expiry_ms`, clamped at zero.
pub fn remaining_secs(expiry_ms: i64, now_ms: i64) -> u64 {
    let left_ms = expiry_ms.saturating_sub(now_ms);
    if left_ms <= 0 {
        return 0;
    }
    (left_ms / 1000) as u64
}

/// Format seconds as `MM:SS`. Minutes are not wrapped at 60.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn is_warning(remaining_secs: u64, threshold_secs: u64) -> bool {
    remaining_secs <= threshold_secs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_floors_partial_seconds() {
        assert_eq!(remaining_secs(10_999, 0), 10);
        assert_eq!(remaining_secs(1_000, 1), 0);
    }

    #[test]
    fn remaining_clamps_past_expiry_to_zero() {
        assert_eq!(remaining_secs(1_000, 2_000), 0);
        assert_eq!(remaining_secs(i64::MIN, i64::MAX), 0);
    }

    #[test]
    fn remaining_is_non_increasing_and_hits_zero_once() {
        let expiry = 5_000;
        let samples: Vec<u64> = (0..=7_000)
            .step_by(500)
            .map(|now| remaining_secs(expiry, now))
            .collect();
        assert!(samples.windows(2).all(|pair| pair[0] >= pair[1]));
        let first_zero = samples.iter().position(|s| *s == 0).expect("zero");
        assert!(samples[first_zero..].iter().all(|s| *s == 0));
        assert!(samples[..first_zero].iter().all(|s| *s > 0));
    }

    #[test]
    fn format_clock_pads_minutes_and_seconds() {
        assert_eq!(format_clock(2700), "45:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(6000), "100:00");
    }

    #[test]
    fn warning_starts_at_threshold() {
        assert!(is_warning(300, 300));
        assert!(!is_warning(301, 300));
    }
}
