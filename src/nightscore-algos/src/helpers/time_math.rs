use chrono::{NaiveTime, TimeDelta, Timelike as _};

const SECONDS_PER_DAY: i64 = 86400;

/// Seconds from midnight, with afternoon and evening times mapped to negative offsets so that
/// clock times around midnight average correctly.
pub fn map_time(time: &NaiveTime) -> i64 {
    let mut h = time.hour() as i64;
    if h > 12 {
        h -= 24;
    }
    let m = time.minute() as i64;
    let s = time.second() as i64;
    h * 3600 + m * 60 + s
}

fn time_from_seconds(seconds: i64) -> NaiveTime {
    let seconds = seconds.rem_euclid(SECONDS_PER_DAY) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or_default()
}

pub fn std_time(times: &[NaiveTime], mean: &NaiveTime) -> NaiveTime {
    if times.is_empty() {
        NaiveTime::default()
    } else {
        let mean = map_time(mean);
        let variance = times
            .iter()
            .map(map_time)
            .map(|x| (x - mean).pow(2))
            .sum::<i64>()
            / times.len() as i64;

        time_from_seconds(variance.isqrt())
    }
}

pub fn mean_time(times: &[NaiveTime]) -> NaiveTime {
    if times.is_empty() {
        NaiveTime::default()
    } else {
        let mean = times.iter().map(map_time).sum::<i64>() / times.len() as i64;
        time_from_seconds(mean)
    }
}

pub fn mean_deltas(durations: &[TimeDelta]) -> TimeDelta {
    if durations.is_empty() {
        TimeDelta::default()
    } else {
        durations.iter().sum::<TimeDelta>() / durations.len() as i32
    }
}

/// Median duration, the mean of the two middle values for an even count.
pub fn median_deltas(durations: &[TimeDelta]) -> TimeDelta {
    if durations.is_empty() {
        return TimeDelta::default();
    }

    let mut sorted = durations.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2
    } else {
        sorted[mid]
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0_f64
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0_f64;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub fn hours(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 3_600_000.0
}

pub fn minutes(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 60_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_time_morning() {
        // 08:30:00 -> 8*3600 + 30*60 = 30600
        let t = NaiveTime::from_hms_opt(8, 30, 0).unwrap();
        assert_eq!(map_time(&t), 30600);
    }

    #[test]
    fn map_time_evening_wraps_negative() {
        // 22:00:00 -> (22-24)*3600 = -7200
        let t = NaiveTime::from_hms_opt(22, 0, 0).unwrap();
        assert_eq!(map_time(&t), -7200);
    }

    #[test]
    fn mean_time_across_midnight() {
        let times = vec![
            NaiveTime::from_hms_opt(23, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(0, 30, 0).unwrap(),
        ];
        assert_eq!(mean_time(&times), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn mean_time_evening_average() {
        let times = vec![
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
        ];
        // mapped: -7200, -3600 -> mean = -5400 -> 81000 -> 22:30:00
        assert_eq!(
            mean_time(&times),
            NaiveTime::from_hms_opt(22, 30, 0).unwrap()
        );
    }

    #[test]
    fn std_time_identical_values() {
        let t = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        assert_eq!(std_time(&[t, t, t], &t), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn std_time_half_hour_spread() {
        let times = vec![
            NaiveTime::from_hms_opt(23, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(0, 30, 0).unwrap(),
        ];
        let mean = mean_time(&times);
        assert_eq!(std_time(&times, &mean), NaiveTime::from_hms_opt(0, 30, 0).unwrap());
    }

    #[test]
    fn mean_deltas_basic() {
        let durations = vec![TimeDelta::hours(6), TimeDelta::hours(10)];
        assert_eq!(mean_deltas(&durations), TimeDelta::hours(8));
    }

    #[test]
    fn median_deltas_even_and_odd() {
        let odd = vec![TimeDelta::hours(9), TimeDelta::hours(6), TimeDelta::hours(7)];
        assert_eq!(median_deltas(&odd), TimeDelta::hours(7));
        let even = vec![TimeDelta::hours(6), TimeDelta::hours(7)];
        assert_eq!(median_deltas(&even), TimeDelta::minutes(390));
        assert_eq!(median_deltas(&[]), TimeDelta::default());
    }

    #[test]
    fn median_values() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn mean_basic() {
        assert_eq!(mean(&[2.0, 4.0, 6.0]), 4.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn safe_div_by_zero() {
        assert_eq!(safe_div(5.0, 0.0), 0.0);
        assert_eq!(safe_div(5.0, 2.0), 2.5);
    }

    #[test]
    fn duration_units() {
        assert_eq!(hours(TimeDelta::minutes(90)), 1.5);
        assert_eq!(minutes(TimeDelta::seconds(90)), 1.5);
    }
}
