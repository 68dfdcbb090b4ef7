use std::collections::BTreeMap;

use chrono::{NaiveTime, TimeDelta};
use nightscore_types::{NightKey, NormMetric, SleepMetrics, Unscorable};
use serde::Serialize;

use crate::{
    NormAssessment,
    helpers::time_math::{mean, mean_deltas, mean_time, median, median_deltas, std_time},
};

/// Outcome of scoring one night.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredNight {
    pub key: NightKey,
    pub metrics: Result<SleepMetrics, Unscorable>,
    pub norms: Option<NormAssessment>,
}

/// One statistic of every metric across a subject's nights.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricSummary {
    pub tib: TimeDelta,
    pub sol: TimeDelta,
    pub waso: TimeDelta,
    pub wasf: TimeDelta,
    pub tst: TimeDelta,
    pub wb: f64,
    pub awk5plus: f64,
    pub se: f64,
    pub sf: f64,
}

impl MetricSummary {
    fn of(
        nights: &[&SleepMetrics],
        deltas: fn(&[TimeDelta]) -> TimeDelta,
        values: fn(&[f64]) -> f64,
    ) -> Self {
        let delta = |f: fn(&SleepMetrics) -> TimeDelta| {
            deltas(&nights.iter().map(|m| f(m)).collect::<Vec<_>>())
        };
        let value = |f: fn(&SleepMetrics) -> f64| {
            values(&nights.iter().map(|m| f(m)).collect::<Vec<_>>())
        };

        Self {
            tib: delta(|m| m.tib),
            sol: delta(|m| m.sol),
            waso: delta(|m| m.waso),
            wasf: delta(|m| m.wasf),
            tst: delta(|m| m.tst),
            wb: value(|m| f64::from(m.wb)),
            awk5plus: value(|m| f64::from(m.awk5plus)),
            se: value(|m| m.se),
            sf: value(|m| m.sf),
        }
    }
}

/// Statistic of the numeric band values (1, 0, -1) per metric.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct NormSummary {
    pub sol: f64,
    pub waso: f64,
    pub awk5plus: f64,
    pub se: f64,
}

impl NormSummary {
    fn of(norms: &[NormAssessment], values: fn(&[f64]) -> f64) -> Self {
        let value = |metric: NormMetric| {
            values(
                &norms
                    .iter()
                    .map(|n| f64::from(n.get(metric).value()))
                    .collect::<Vec<_>>(),
            )
        };

        Self {
            sol: value(NormMetric::Sol),
            waso: value(NormMetric::Waso),
            awk5plus: value(NormMetric::Awk5plus),
            se: value(NormMetric::Se),
        }
    }
}

/// Mean and spread of a clock time, averaged across midnight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClockSummary {
    pub mean: NaiveTime,
    pub std: NaiveTime,
}

impl ClockSummary {
    fn of(times: &[NaiveTime]) -> Self {
        let mean = mean_time(times);
        Self {
            mean,
            std: std_time(times, &mean),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubjectSummary {
    pub subject: String,
    pub nights_evaluated: usize,
    pub nights_unscorable: usize,
    pub mean: MetricSummary,
    pub median: MetricSummary,
    pub norms_mean: Option<NormSummary>,
    pub norms_median: Option<NormSummary>,
    pub onset: ClockSummary,
    pub offset: ClockSummary,
}

pub struct NightAggregator;

impl NightAggregator {
    /// Per-subject summaries in subject order. Unscorable nights are counted but never
    /// enter a statistic. A subject with no scorable night still gets a row.
    pub fn aggregate(nights: &[ScoredNight]) -> Vec<SubjectSummary> {
        let mut by_subject = BTreeMap::<&str, Vec<&ScoredNight>>::new();
        for night in nights {
            by_subject.entry(night.key.subject.as_str()).or_default().push(night);
        }

        by_subject
            .into_iter()
            .map(|(subject, mut nights)| {
                nights.sort_by(|a, b| a.key.cmp(&b.key));
                Self::summarize(subject, &nights)
            })
            .collect()
    }

    fn summarize(subject: &str, nights: &[&ScoredNight]) -> SubjectSummary {
        let scored = nights
            .iter()
            .filter_map(|n| n.metrics.as_ref().ok().map(|m| (m, n.norms)))
            .collect::<Vec<_>>();
        let metrics = scored.iter().map(|(m, _)| *m).collect::<Vec<_>>();
        let norms = scored.iter().filter_map(|(_, n)| *n).collect::<Vec<_>>();

        let onsets = metrics
            .iter()
            .map(|m| m.window.onset.time())
            .collect::<Vec<_>>();
        let offsets = metrics
            .iter()
            .map(|m| m.window.offset.time())
            .collect::<Vec<_>>();

        let summary = SubjectSummary {
            subject: subject.to_string(),
            nights_evaluated: metrics.len(),
            nights_unscorable: nights.len() - metrics.len(),
            mean: MetricSummary::of(&metrics, mean_deltas, mean),
            median: MetricSummary::of(&metrics, median_deltas, median),
            norms_mean: (!norms.is_empty()).then(|| NormSummary::of(&norms, mean)),
            norms_median: (!norms.is_empty()).then(|| NormSummary::of(&norms, median)),
            onset: ClockSummary::of(&onsets),
            offset: ClockSummary::of(&offsets),
        };
        debug!(
            "{subject}: {} nights evaluated, {} unscorable",
            summary.nights_evaluated, summary.nights_unscorable
        );
        summary
    }
}
