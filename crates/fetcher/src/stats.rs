//! Small numeric and calendar helpers shared by the fetchers.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use ecopulse_store::BucketCount;

/// Median of a slice; `None` when empty. Input order is irrelevant.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Calendar-day key, `YYYY-MM-DD` in UTC.
pub fn day_key(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Inclusive list of day keys from `start` to `end`.
pub fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<String> {
    let mut days = Vec::new();
    let mut current = start.date_naive();
    let last = end.date_naive();

    while current <= last {
        days.push(current.format("%Y-%m-%d").to_string());
        current += Duration::days(1);
    }

    days
}

/// Monday of the date's week. Sunday belongs to the week that started six
/// days earlier, so it maps to the previous Monday.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let days_from_monday = date.weekday().num_days_from_monday() as i64;
    date - Duration::days(days_from_monday)
}

/// An upper-bound histogram bucket; `f64::INFINITY` for the open tail.
pub struct Bucket {
    pub label: &'static str,
    pub max: f64,
}

/// Each value lands in the first bucket whose upper bound exceeds it.
pub fn bucketize(values: &[f64], buckets: &[Bucket]) -> Vec<BucketCount> {
    let mut counts: Vec<BucketCount> = buckets
        .iter()
        .map(|b| BucketCount {
            bucket: b.label.to_string(),
            count: 0,
        })
        .collect();

    for &value in values {
        for (i, bucket) in buckets.iter().enumerate() {
            if value < bucket.max {
                counts[i].count += 1;
                break;
            }
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn median_of_empty_is_none() {
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn median_of_single_value() {
        assert_eq!(median(&[7.5]), Some(7.5));
    }

    #[test]
    fn median_of_even_length_averages_middle_pair() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
    }

    #[test]
    fn median_ignores_input_order() {
        assert_eq!(median(&[9.0, 1.0, 5.0]), Some(5.0));
        assert_eq!(median(&[5.0, 9.0, 1.0]), Some(5.0));
    }

    #[test]
    fn week_start_is_monday() {
        // 2024-06-12 is a Wednesday.
        let wed = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        assert_eq!(week_start(wed), NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(week_start(wed).weekday(), Weekday::Mon);
    }

    #[test]
    fn week_start_maps_sunday_to_previous_monday() {
        // 2024-06-16 is a Sunday; its week began on 2024-06-10.
        let sun = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();
        assert_eq!(week_start(sun), NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    }

    #[test]
    fn week_start_is_idempotent_on_mondays() {
        let mon = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(week_start(mon), mon);
    }

    #[test]
    fn bucketize_uses_first_matching_upper_bound() {
        let buckets = [
            Bucket { label: "<1h", max: 1.0 },
            Bucket { label: "1-4h", max: 4.0 },
            Bucket { label: ">4h", max: f64::INFINITY },
        ];

        let counts = bucketize(&[0.5, 1.0, 3.9, 100.0], &buckets);
        assert_eq!(counts[0].count, 1); // 0.5
        assert_eq!(counts[1].count, 2); // 1.0 (not < 1.0) and 3.9
        assert_eq!(counts[2].count, 1); // 100.0
    }

    #[test]
    fn days_between_is_inclusive() {
        let start = "2024-06-10T08:00:00Z".parse().unwrap();
        let end = "2024-06-12T23:00:00Z".parse().unwrap();
        assert_eq!(days_between(start, end), ["2024-06-10", "2024-06-11", "2024-06-12"]);
    }
}
