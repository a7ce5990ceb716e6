//! Billing-period window math.
//!
//! A billing period is the half-open interval `[period_start, period_end)`.
//! The functions here are pure; persisting an advanced window (and the
//! associated usage-counter reset) is the storage layer's job, performed as a
//! single conditional update keyed on the previously observed `period_end`.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Window length used when a subscription has been dormant past the
/// catch-up bound, or when a one-off window must be opened "from now".
pub const DEFAULT_PERIOD_DAYS: i64 = 30;

/// Upper bound on month-stepping during catch-up. A subscription dormant for
/// longer than this simply gets a fresh window anchored at `now`.
pub const MAX_CATCH_UP_MONTHS: u32 = 60;

/// A half-open billing window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingWindow {
    /// Inclusive start of the window.
    pub start: DateTime<Utc>,
    /// Exclusive end of the window.
    pub end: DateTime<Utc>,
}

impl BillingWindow {
    /// Create a window `[start, start + 1 month)`.
    #[must_use]
    pub fn monthly_from(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: add_one_month(start),
        }
    }

    /// Create a window `[start, start + days)`.
    #[must_use]
    pub fn days_from(start: DateTime<Utc>, days: i64) -> Self {
        Self {
            start,
            end: start + Duration::days(days),
        }
    }

    /// Whether the instant falls inside the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// Advance a timestamp by one calendar month.
///
/// Falls back to a fixed 30-day step on calendar overflow (dates past
/// year 262143, which cannot occur with real clocks).
#[must_use]
pub fn add_one_month(at: DateTime<Utc>) -> DateTime<Utc> {
    at.checked_add_months(Months::new(1))
        .unwrap_or(at + Duration::days(DEFAULT_PERIOD_DAYS))
}

/// Compute the up-to-date billing window for a subscription.
///
/// Returns `Some(window)` when the stored window must change (legacy
/// initialization or rollover), `None` when the stored window already
/// contains `now`. Catch-up steps month by month from the stored window,
/// bounded by [`MAX_CATCH_UP_MONTHS`]; past the bound the window is anchored
/// at `now` instead, so the cost of a refresh never grows with dormancy.
#[must_use]
pub fn catch_up(
    period_start: Option<DateTime<Utc>>,
    period_end: Option<DateTime<Utc>>,
    start_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<BillingWindow> {
    let (initialized, mut window) = match (period_start, period_end) {
        (Some(start), Some(end)) => (false, BillingWindow { start, end }),
        // Legacy record without a window: derive one from the start date.
        _ => (true, BillingWindow::monthly_from(start_date)),
    };

    if !initialized && window.contains(now) {
        return None;
    }

    let mut steps = 0;
    while now >= window.end && steps < MAX_CATCH_UP_MONTHS {
        window = BillingWindow {
            start: window.end,
            end: add_one_month(window.end),
        };
        steps += 1;
    }

    if now >= window.end {
        // Dormant past the bound: open a fresh window from now.
        window = BillingWindow::days_from(now, DEFAULT_PERIOD_DAYS);
    }

    Some(window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn current_window_is_left_alone() {
        let start = at(2026, 3, 1);
        let end = at(2026, 4, 1);
        let now = at(2026, 3, 20);
        assert_eq!(catch_up(Some(start), Some(end), start, now), None);
    }

    #[test]
    fn legacy_record_gets_window_from_start_date() {
        let start_date = at(2026, 3, 5);
        let now = at(2026, 3, 10);
        let window = catch_up(None, None, start_date, now).unwrap();
        assert_eq!(window.start, start_date);
        assert_eq!(window.end, at(2026, 4, 5));
        assert!(window.contains(now));
    }

    #[test]
    fn expired_window_advances_one_month() {
        let start = at(2026, 3, 1);
        let end = at(2026, 4, 1);
        let now = at(2026, 4, 15);
        let window = catch_up(Some(start), Some(end), start, now).unwrap();
        assert_eq!(window.start, end);
        assert_eq!(window.end, at(2026, 5, 1));
        assert!(window.contains(now));
    }

    #[test]
    fn three_months_dormant_lands_on_one_future_window() {
        let start = at(2026, 1, 1);
        let end = at(2026, 2, 1);
        let now = at(2026, 5, 10);
        let window = catch_up(Some(start), Some(end), start, now).unwrap();
        assert!(window.contains(now));
        assert_eq!(window.start, at(2026, 5, 1));
        assert_eq!(window.end, at(2026, 6, 1));
    }

    #[test]
    fn dormancy_past_bound_anchors_at_now() {
        let start = at(2010, 1, 1);
        let end = at(2010, 2, 1);
        let now = at(2026, 5, 10);
        let window = catch_up(Some(start), Some(end), start, now).unwrap();
        assert_eq!(window.start, now);
        assert_eq!(window.end, now + Duration::days(DEFAULT_PERIOD_DAYS));
    }

    #[test]
    fn window_bounds_are_half_open() {
        let window = BillingWindow::days_from(at(2026, 3, 1), 30);
        assert!(window.contains(window.start));
        assert!(!window.contains(window.end));
    }

    #[test]
    fn month_end_dates_stay_valid() {
        // Jan 31 + 1 month clamps to Feb 28/29 rather than overflowing.
        let end = add_one_month(at(2026, 1, 31));
        assert_eq!(end, at(2026, 2, 28));
    }
}
