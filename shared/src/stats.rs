//! Dashboard statistics math
//!
//! Pure functions used by the dashboard service and the browser bindings.
//! Every ratio guards its denominator so callers never see `NaN` or infinity.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Number of days in the trailing windows used by the client dashboard
pub const MONTH_WINDOW_DAYS: i64 = 30;
pub const WEEK_WINDOW_DAYS: i64 = 7;

/// Month-over-month growth in percent
///
/// Returns 0 when there were no items last month.
pub fn growth_rate(this_month: i64, last_month: i64) -> f64 {
    if last_month == 0 {
        return 0.0;
    }
    (this_month - last_month) as f64 / last_month as f64 * 100.0
}

/// Completion percentage rounded to the nearest integer, 0 when `total == 0`
pub fn completion_rate(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as i64
}

/// Page count for a result set; an empty set has zero pages
pub fn total_pages(total_items: i64, per_page: i64) -> i64 {
    if per_page <= 0 || total_items <= 0 {
        return 0;
    }
    (total_items + per_page - 1) / per_page
}

/// Row offset for a 1-based page number, saturating at `i64::MAX`
pub fn page_offset(page: i64, per_page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(per_page.max(0))
}

/// First instant of the month containing `now`
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    month_start(now.year(), now.month())
}

/// First instant of the month before the one containing `now`
pub fn start_of_previous_month(now: DateTime<Utc>) -> DateTime<Utc> {
    if now.month() == 1 {
        month_start(now.year() - 1, 12)
    } else {
        month_start(now.year(), now.month() - 1)
    }
}

fn month_start(year: i32, month: u32) -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Start of a trailing window of `days` ending at `now`
pub fn trailing_window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

/// Day-of-week index where 1 is Sunday and 7 is Saturday
pub fn day_of_week_index(date: DateTime<Utc>) -> i32 {
    date.weekday().num_days_from_sunday() as i32 + 1
}

/// English label for a 1-based (Sunday first) day index
pub fn day_of_week_label(index: i32) -> Option<&'static str> {
    const LABELS: [&str; 7] = [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ];
    usize::try_from(index - 1)
        .ok()
        .and_then(|i| LABELS.get(i).copied())
}
