//! Divergence detector: finds maximal contiguous windows in a
//! time-aligned spread series where `|spread| > threshold` and the
//! window's duration meets a minimum. The final window, if still open
//! at the end of the series, is flagged as ongoing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivergenceWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: f64,
    pub max_abs_spread: f64,
    pub mean_spread: f64,
    pub ongoing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DivergenceResult {
    pub windows: Vec<DivergenceWindow>,
    pub active: bool,
    pub error: Option<String>,
}

/// `series` must be sorted ascending by timestamp. `spread_pct` is
/// `(A - B) / mid * 100`, already computed by the caller.
pub fn detect_divergence(
    series: &[(DateTime<Utc>, f64)],
    threshold_pct: f64,
    min_duration_minutes: f64,
) -> DivergenceResult {
    if series.is_empty() {
        return DivergenceResult::default();
    }

    let mut windows = Vec::new();
    let mut run_start: Option<usize> = None;

    for i in 0..series.len() {
        let over = series[i].1.abs() > threshold_pct;
        if over && run_start.is_none() {
            run_start = Some(i);
        }
        let is_last = i == series.len() - 1;
        let ends_here = !over || is_last;
        if let Some(start) = run_start {
            if ends_here {
                // If the current point is itself over threshold (only
                // true when `is_last`), include it in the run.
                let end_idx = if over { i } else { i - 1 };
                if end_idx >= start {
                    push_window(&mut windows, series, start, end_idx, min_duration_minutes, is_last && over);
                }
                run_start = None;
            }
        }
    }

    let active = windows.last().map(|w| w.ongoing).unwrap_or(false);

    DivergenceResult {
        windows,
        active,
        error: None,
    }
}

fn push_window(
    windows: &mut Vec<DivergenceWindow>,
    series: &[(DateTime<Utc>, f64)],
    start: usize,
    end: usize,
    min_duration_minutes: f64,
    ongoing: bool,
) {
    let start_ts = series[start].0;
    let end_ts = series[end].0;
    let duration_minutes = (end_ts - start_ts).num_seconds() as f64 / 60.0;
    if duration_minutes < min_duration_minutes {
        return;
    }
    let slice = &series[start..=end];
    let max_abs_spread = slice.iter().map(|(_, v)| v.abs()).fold(0.0, f64::max);
    let mean_spread = slice.iter().map(|(_, v)| v).sum::<f64>() / slice.len() as f64;
    windows.push(DivergenceWindow {
        start: start_ts,
        end: end_ts,
        duration_minutes,
        max_abs_spread,
        mean_spread,
        ongoing,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minute)
    }

    #[test]
    fn no_alerts_when_threshold_never_exceeded() {
        let series = vec![(at(0), 0.1), (at(1), 0.2), (at(2), -0.1)];
        let result = detect_divergence(&series, 1.0, 1.0);
        assert!(result.windows.is_empty());
        assert!(!result.active);
    }

    #[test]
    fn detects_a_sustained_window_and_flags_ongoing() {
        let series = vec![
            (at(0), 0.1),
            (at(1), 2.0),
            (at(2), 2.5),
            (at(3), 2.2),
        ];
        let result = detect_divergence(&series, 1.0, 1.0);
        assert_eq!(result.windows.len(), 1);
        assert!(result.windows[0].ongoing);
        assert!(result.active);
    }

    #[test]
    fn short_spikes_below_min_duration_are_dropped() {
        let series = vec![(at(0), 0.1), (at(1), 5.0), (at(2), 0.1)];
        let result = detect_divergence(&series, 1.0, 5.0);
        assert!(result.windows.is_empty());
    }

    #[test]
    fn a_window_that_closes_before_series_end_is_not_ongoing() {
        let series = vec![
            (at(0), 2.0),
            (at(1), 2.5),
            (at(2), 0.1),
            (at(3), 0.1),
        ];
        let result = detect_divergence(&series, 1.0, 1.0);
        assert_eq!(result.windows.len(), 1);
        assert!(!result.windows[0].ongoing);
        assert!(!result.active);
    }
}
