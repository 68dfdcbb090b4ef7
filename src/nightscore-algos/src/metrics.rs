use chrono::TimeDelta;
use nightscore_types::{DiarySchedule, EpochSignal, SleepMetrics, Unscorable};

use crate::{
    DetectedNight, ScoringConfig, SleepWindowDetector,
    helpers::time_math::{hours, safe_div},
};

/// Scores one night. Unscorable nights are logged and returned, never raised.
pub fn compute_night_metrics(
    signal: &EpochSignal,
    schedule: &DiarySchedule,
    config: &ScoringConfig,
) -> Result<SleepMetrics, Unscorable> {
    if signal.is_empty() {
        warn!("night of {}: no signal", schedule.date);
        return Err(Unscorable::EmptySignal);
    }

    let night = SleepWindowDetector::new(config.smoothing)
        .detect(signal, schedule)
        .inspect_err(|e| warn!("night of {}: unscorable ({e})", schedule.date))?;

    Ok(MetricsCalculator::new(config).calculate(&night, schedule, signal.cadence()))
}

pub struct MetricsCalculator<'a> {
    config: &'a ScoringConfig,
}

impl<'a> MetricsCalculator<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    pub fn calculate(
        &self,
        night: &DetectedNight,
        schedule: &DiarySchedule,
        cadence: TimeDelta,
    ) -> SleepMetrics {
        let window = night.window;
        let trace = night.trace.fine_between(window.onset, window.offset);

        let tib = schedule.time_in_bed();
        let tst = window.duration();
        let wake_epochs = trace.iter().filter(|s| s.is_wake()).count();
        let waso = (cadence * wake_epochs as i32).min(tst);

        let sleep_ms = (tst - waso).num_milliseconds() as f64;
        let se = (100.0 * safe_div(sleep_ms, tst.num_milliseconds() as f64)).clamp(0.0, 100.0);

        let wb = self.config.wake_bouts.count(trace);
        let sf = safe_div(f64::from(wb), hours(tst));

        SleepMetrics {
            window,
            detected: night.detected,
            tib,
            sol: (window.onset - schedule.t1).max(TimeDelta::zero()),
            waso,
            wasf: (schedule.t4 - window.offset).max(TimeDelta::zero()),
            tst,
            wb,
            awk5plus: self.config.awakening.count(trace, cadence),
            se,
            sf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AwakeningPolicy, PrecedingSleep, WakeBoutConvention};
    use chrono::{NaiveDate, NaiveDateTime};
    use nightscore_types::WakeInterval;
    use rand::Rng;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn schedule(wake_intervals: Vec<WakeInterval>) -> DiarySchedule {
        DiarySchedule::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            [at(1, 22, 0), at(1, 22, 10), at(2, 6, 50), at(2, 7, 0)],
            wake_intervals,
        )
        .unwrap()
    }

    /// 30 s signal over `[start, end]`, asleep except during `wakes`.
    fn signal_with_wakes(
        start: NaiveDateTime,
        end: NaiveDateTime,
        wakes: &[(NaiveDateTime, NaiveDateTime)],
    ) -> EpochSignal {
        let cadence = TimeDelta::seconds(30);
        let n = ((end - start).num_seconds() / 30) as i32 + 1;
        EpochSignal::from_values(
            start,
            cadence,
            (0..n).map(|i| {
                let t = start + cadence * i;
                if wakes.iter().any(|&(from, to)| t >= from && t < to) {
                    0.0
                } else {
                    1.0
                }
            }),
        )
        .unwrap()
    }

    #[test]
    fn all_sleep_night() {
        let signal = signal_with_wakes(at(1, 22, 0), at(2, 7, 0), &[]);
        let metrics =
            compute_night_metrics(&signal, &schedule(vec![]), &ScoringConfig::default()).unwrap();

        assert_eq!(metrics.waso, TimeDelta::zero());
        assert_eq!(metrics.wb, 0);
        assert_eq!(metrics.se, 100.0);
        assert_eq!(metrics.awk5plus, 0);
        assert_eq!(metrics.tib, TimeDelta::hours(9));
        assert_eq!(metrics.sol, TimeDelta::seconds(150));
        assert_eq!(metrics.wasf, TimeDelta::zero());
        assert_eq!(metrics.tst, TimeDelta::hours(9) - TimeDelta::seconds(150));
        assert_eq!(metrics.sf, 0.0);
    }

    #[test]
    fn long_awakening_between_sleep() {
        let wake = (at(2, 1, 57), at(2, 2, 5));
        let diary = WakeInterval::new(at(2, 2, 0), at(2, 2, 6));
        let signal = signal_with_wakes(at(1, 22, 0), at(2, 7, 0), &[wake]);
        let metrics = compute_night_metrics(&signal, &schedule(vec![diary]), &ScoringConfig::default())
            .unwrap();

        assert_eq!(metrics.awk5plus, 1);
        assert_eq!(metrics.wb, 1);
        // 16 raw wake epochs show up as 11 fine-pass wake epochs
        assert_eq!(metrics.waso, TimeDelta::seconds(330));
        assert!(metrics.se < 100.0 && metrics.se > 98.0);
        assert!(metrics.sf > 0.0);
    }

    // the trailing 300 s window shortens a 12-epoch raw wake to 7 fine-pass epochs
    #[test]
    fn six_minute_raw_wake_is_a_bout_but_not_a_long_awakening() {
        let wake = (at(2, 2, 0), at(2, 2, 6));
        let signal = signal_with_wakes(at(1, 22, 0), at(2, 7, 0), &[wake]);
        let metrics =
            compute_night_metrics(&signal, &schedule(vec![]), &ScoringConfig::default()).unwrap();
        assert_eq!(metrics.wb, 1);
        assert_eq!(metrics.awk5plus, 0);
        assert_eq!(metrics.waso, TimeDelta::seconds(210));
    }

    #[test]
    fn awakening_policy_is_configurable() {
        let wake = (at(2, 2, 0), at(2, 2, 6));
        let signal = signal_with_wakes(at(1, 22, 0), at(2, 7, 0), &[wake]);
        let config = ScoringConfig {
            awakening: AwakeningPolicy {
                min_wake: TimeDelta::minutes(3),
                preceding_sleep: PrecedingSleep::NotRequired,
            },
            wake_bouts: WakeBoutConvention::TransitionsMinusOne,
            ..Default::default()
        };
        let metrics = compute_night_metrics(&signal, &schedule(vec![]), &config).unwrap();
        assert_eq!(metrics.awk5plus, 1);
        assert_eq!(metrics.wb, 0);
    }

    #[test]
    fn empty_signal_is_unscorable() {
        let signal = EpochSignal::new(TimeDelta::seconds(30), vec![]).unwrap();
        let result = compute_night_metrics(&signal, &schedule(vec![]), &ScoringConfig::default());
        assert_eq!(result.unwrap_err(), Unscorable::EmptySignal);
    }

    #[test]
    fn zero_length_window_has_zero_efficiency() {
        // a single coarse sleep epoch right at get-up time
        let start = at(2, 6, 57) + TimeDelta::seconds(30);
        let signal = EpochSignal::from_values(start, TimeDelta::seconds(30), [1.0; 6]).unwrap();
        let metrics =
            compute_night_metrics(&signal, &schedule(vec![]), &ScoringConfig::default()).unwrap();
        assert_eq!(metrics.tst, TimeDelta::zero());
        assert_eq!(metrics.se, 0.0);
        assert_eq!(metrics.sf, 0.0);
    }

    #[test]
    fn sleep_only_before_bed_scores_zero_sleep() {
        let signal = signal_with_wakes(at(1, 21, 0), at(2, 8, 0), &[(at(1, 21, 58), at(2, 8, 1))]);
        let metrics =
            compute_night_metrics(&signal, &schedule(vec![]), &ScoringConfig::default()).unwrap();
        assert_eq!(metrics.window.onset, at(1, 22, 0));
        assert_eq!(metrics.tst, TimeDelta::zero());
        assert_eq!(metrics.se, 0.0);
        assert_eq!(metrics.sol, TimeDelta::zero());
        assert_eq!(metrics.wasf, TimeDelta::hours(9));
        assert_eq!(metrics.waso, TimeDelta::zero());
    }

    #[test]
    fn scoring_is_idempotent() {
        let signal = signal_with_wakes(at(1, 21, 30), at(2, 7, 30), &[(at(2, 3, 0), at(2, 3, 20))]);
        let config = ScoringConfig::default();
        let first = compute_night_metrics(&signal, &schedule(vec![]), &config);
        let second = compute_night_metrics(&signal, &schedule(vec![]), &config);
        assert_eq!(first, second);
    }

    #[test]
    fn random_nights_respect_invariants() {
        let mut rng = rand::rng();
        let config = ScoringConfig::default();
        let schedule = schedule(vec![]);

        for _ in 0..50 {
            let start = at(1, 21, 30);
            let values = (0..1140)
                .map(|_| if rng.random_bool(0.7) { 1.0 } else { 0.0 })
                .collect::<Vec<_>>();
            let signal = EpochSignal::from_values(start, TimeDelta::seconds(30), values).unwrap();

            let Ok(metrics) = compute_night_metrics(&signal, &schedule, &config) else {
                continue;
            };
            assert!(metrics.window.onset <= metrics.window.offset);
            assert!(metrics.tib >= metrics.tst);
            assert!(metrics.tst >= TimeDelta::zero());
            assert!((0.0..=100.0).contains(&metrics.se));
            assert!(metrics.waso <= metrics.tst);

            let shift = TimeDelta::minutes(rng.random_range(-600..600));
            let shifted = compute_night_metrics(
                &signal.shifted(shift),
                &schedule.shifted(shift),
                &config,
            )
            .unwrap();
            assert_eq!(shifted.wb, metrics.wb);
            assert_eq!(shifted.tst, metrics.tst);
            assert_eq!(shifted.awk5plus, metrics.awk5plus);
        }
    }
}
