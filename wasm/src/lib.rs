//! FitPro WASM Module
//!
//! Browser bindings for the dashboard math in `fitpro_shared::stats`, so the
//! front end renders the same percentages the API reports.

use fitpro_shared::stats;
use wasm_bindgen::prelude::*;

/// Month-over-month growth in percent, 0 when last month was empty
#[wasm_bindgen(js_name = growthRate)]
pub fn growth_rate(this_month: f64, last_month: f64) -> f64 {
    stats::growth_rate(this_month as i64, last_month as i64)
}

/// Rounded completion percentage, 0 when there is nothing to complete
#[wasm_bindgen(js_name = completionRate)]
pub fn completion_rate(completed: f64, total: f64) -> f64 {
    stats::completion_rate(completed as i64, total as i64) as f64
}

/// Label for a dashboard weekday bucket (1 = Sunday)
#[wasm_bindgen(js_name = dayOfWeekLabel)]
pub fn day_of_week_label(index: i32) -> Option<String> {
    stats::day_of_week_label(index).map(str::to_string)
}

/// Total page count for a paginated listing
#[wasm_bindgen(js_name = totalPages)]
pub fn total_pages(total_items: f64, per_page: f64) -> f64 {
    stats::total_pages(total_items as i64, per_page as i64) as f64
}

/// Average completion over a progress log, 0 for an empty log
#[wasm_bindgen(js_name = averageCompletion)]
pub fn average_completion(completions: &[i32]) -> f64 {
    if completions.is_empty() {
        return 0.0;
    }
    let sum: i64 = completions.iter().map(|&c| i64::from(c)).sum();
    sum as f64 / completions.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_rate() {
        assert_eq!(growth_rate(15.0, 10.0), 50.0);
        assert_eq!(growth_rate(3.0, 0.0), 0.0);
    }

    #[test]
    fn test_completion_rate() {
        assert_eq!(completion_rate(2.0, 3.0), 67.0);
        assert_eq!(completion_rate(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_day_labels() {
        assert_eq!(day_of_week_label(1).as_deref(), Some("Sunday"));
        assert_eq!(day_of_week_label(9), None);
    }

    #[test]
    fn test_average_completion() {
        assert_eq!(average_completion(&[]), 0.0);
        assert_eq!(average_completion(&[80, 90, 100]), 90.0);
    }
}
