//! UTC clock helpers shared across the snapshot store, event bus, and
//! risk engine. Kept tiny and dependency-free beyond `chrono` so analytics
//! modules (which must stay synchronous) can call into it freely.

use chrono::{DateTime, NaiveDate, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn today_utc_date_string() -> String {
    Utc::now().date_naive().to_string()
}

pub fn date_string_of(ts: DateTime<Utc>) -> String {
    ts.date_naive().to_string()
}

pub fn is_new_utc_day(last_reset: &str, now: DateTime<Utc>) -> bool {
    match NaiveDate::parse_from_str(last_reset, "%Y-%m-%d") {
        Ok(last) => now.date_naive() > last,
        Err(_) => true,
    }
}

pub fn age_seconds(ts: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - ts).num_seconds()
}

pub fn to_iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn detects_day_rollover() {
        let last = "2026-07-27";
        let same_day = Utc.with_ymd_and_hms(2026, 7, 27, 23, 59, 0).unwrap();
        let next_day = Utc.with_ymd_and_hms(2026, 7, 28, 0, 0, 1).unwrap();
        assert!(!is_new_utc_day(last, same_day));
        assert!(is_new_utc_day(last, next_day));
    }

    #[test]
    fn age_seconds_is_nonnegative_for_past_timestamps() {
        let past = Utc::now() - chrono::Duration::seconds(10);
        assert!(age_seconds(past, Utc::now()) >= 10);
    }
}
