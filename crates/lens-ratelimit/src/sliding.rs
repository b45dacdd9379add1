//! Sliding-window counter math
//!
//! Rather than a sorted set per request (one `ZADD` per call, unbounded
//! memory under load), each window class keeps `PRECISION` fixed-size
//! integer sub-window counters. The current count is a weighted blend of
//! the current and immediately prior sub-window, which approximates a
//! true sliding window within a bounded error and O(1) storage.

use lens_types::domain::WindowClass;

/// Number of sub-windows per full window.
pub const PRECISION: u32 = 10;

/// Width of one sub-window, in seconds, for `class`.
pub fn sub_window_span_secs(class: WindowClass) -> f64 {
    class.span_secs() as f64 / PRECISION as f64
}

/// Index of the sub-window containing unix time `t`.
pub fn sub_window_index(class: WindowClass, t: i64) -> i64 {
    (t as f64 / sub_window_span_secs(class)).floor() as i64
}

/// Blended count at time `t`, given the current and previous sub-window's
/// raw counters. Weights the previous sub-window down linearly as `t`
/// moves across the current one, so the estimate degrades smoothly
/// instead of jumping at sub-window boundaries.
pub fn blended_count(class: WindowClass, t: i64, current: i64, previous: i64) -> i64 {
    let sub_span = sub_window_span_secs(class);
    let phase = (t as f64).rem_euclid(sub_span);
    let weight_previous = 1.0 - phase / sub_span;
    (current as f64 + previous as f64 * weight_previous).round() as i64
}

/// Unix time at which the current full window rolls over.
pub fn next_window_reset(class: WindowClass, t: i64) -> i64 {
    let span = class.span_secs();
    ((t / span) + 1) * span
}

/// TTL (seconds) applied to each sub-window counter key — two full
/// windows, so both the current and previous sub-window a query might
/// reference are always still live.
pub fn counter_ttl_secs(class: WindowClass) -> u64 {
    (class.span_secs() * 2) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_window_span_divides_the_full_window_by_precision() {
        assert_eq!(sub_window_span_secs(WindowClass::Minute), 6.0);
        assert_eq!(sub_window_span_secs(WindowClass::Hour), 360.0);
    }

    #[test]
    fn blended_count_is_full_weight_at_the_start_of_a_sub_window() {
        // t is exactly on a sub-window boundary: phase == 0, so the
        // previous sub-window counts at full weight.
        let t = sub_window_index(WindowClass::Minute, 0) * 6;
        let count = blended_count(WindowClass::Minute, t, 0, 10);
        assert_eq!(count, 10);
    }

    #[test]
    fn blended_count_decays_previous_window_linearly() {
        let t0 = 0;
        let at_half = blended_count(WindowClass::Minute, t0 + 3, 0, 10);
        assert_eq!(at_half, 5);
    }

    #[test]
    fn blended_count_ignores_previous_at_the_end_of_the_sub_window() {
        let just_before_next = blended_count(WindowClass::Minute, 5, 0, 10);
        assert!(just_before_next <= 2);
    }

    #[test]
    fn next_window_reset_is_always_in_the_future() {
        let t = 12345;
        let reset = next_window_reset(WindowClass::Minute, t);
        assert!(reset > t);
        assert!(reset - t <= WindowClass::Minute.span_secs());
    }

    #[test]
    fn counter_ttl_is_twice_the_full_window_span() {
        assert_eq!(counter_ttl_secs(WindowClass::Hour), 7200);
    }
}
