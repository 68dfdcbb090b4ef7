use std::fmt::Display;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use nightscore_algos::{
    DiaryMetrics, MetricSummary, NightTally, NormAssessment, NormSummary, ScoredNight,
    SubjectSummary, SweepReport, helpers::time_math::minutes,
};
use nightscore_types::{ConfusionTally, SleepMetrics, ThresholdResult};
use serde::Serialize;

use crate::{dataset::NightInput, helpers::format_hm::FormatHM};

/// Scored night metrics, durations in minutes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsRow {
    pub onset: NaiveDateTime,
    pub offset: NaiveDateTime,
    pub detected_onset: NaiveDateTime,
    pub detected_offset: NaiveDateTime,
    pub tib: f64,
    pub sol: f64,
    pub waso: f64,
    pub wasf: f64,
    pub tst: f64,
    pub wb: u32,
    pub awk5plus: u32,
    pub se: f64,
    pub sf: f64,
}

impl From<&SleepMetrics> for MetricsRow {
    fn from(m: &SleepMetrics) -> Self {
        Self {
            onset: m.window.onset,
            offset: m.window.offset,
            detected_onset: m.detected.onset,
            detected_offset: m.detected.offset,
            tib: minutes(m.tib),
            sol: minutes(m.sol),
            waso: minutes(m.waso),
            wasf: minutes(m.wasf),
            tst: minutes(m.tst),
            wb: m.wb,
            awk5plus: m.awk5plus,
            se: m.se,
            sf: m.sf,
        }
    }
}

/// The subject's own account of the night, durations in minutes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiaryRow {
    pub tib: f64,
    pub sol: f64,
    pub waso: f64,
    pub wasf: f64,
    pub tst: f64,
    pub dtst: f64,
    pub wb: u32,
    pub awk5plus: u32,
    pub se: f64,
    pub sf: f64,
}

impl From<&DiaryMetrics> for DiaryRow {
    fn from(d: &DiaryMetrics) -> Self {
        Self {
            tib: minutes(d.tib),
            sol: minutes(d.sol),
            waso: minutes(d.waso),
            wasf: minutes(d.wasf),
            tst: minutes(d.tst),
            dtst: minutes(d.dtst),
            wb: d.wb,
            awk5plus: d.awk5plus,
            se: d.se,
            sf: d.sf,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NightRow {
    pub subject: String,
    pub date: NaiveDate,
    /// `scored`, or why the night could not be scored.
    pub status: String,
    pub metrics: Option<MetricsRow>,
    pub norms: Option<NormAssessment>,
    pub diary: Option<DiaryRow>,
}

impl NightRow {
    pub fn new(input: &NightInput, scored: &ScoredNight) -> Self {
        Self {
            subject: scored.key.subject.clone(),
            date: scored.key.date,
            status: match &scored.metrics {
                Ok(_) => "scored".to_string(),
                Err(e) => e.to_string(),
            },
            metrics: scored.metrics.as_ref().ok().map(MetricsRow::from),
            norms: scored.norms,
            diary: input
                .schedule
                .as_ref()
                .map(|s| DiaryRow::from(&DiaryMetrics::from_schedule(s))),
        }
    }
}

impl Display for NightRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Some(m) = &self.metrics else {
            return write!(f, "{} {}: {}", self.subject, self.date, self.status);
        };

        f.write_fmt(format_args!(
            "{} {}: {} - {}, tib {}, sol {}, waso {}, wasf {}, tst {}",
            self.subject,
            self.date,
            m.onset.time().format_hm(),
            m.offset.time().format_hm(),
            m.tib.format_hm(),
            m.sol.format_hm(),
            m.waso.format_hm(),
            m.wasf.format_hm(),
            m.tst.format_hm(),
        ))?;
        f.write_fmt(format_args!(
            ", wb {}, awk5+ {}, se {:.1}%, sf {:.2}/h",
            m.wb, m.awk5plus, m.se, m.sf
        ))?;
        if let Some(norms) = &self.norms {
            f.write_fmt(format_args!(
                "\n\tnorms: sol {:?}, waso {:?}, awk5+ {:?}, se {:?}",
                norms.sol, norms.waso, norms.awk5plus, norms.se
            ))?;
        }
        if let Some(d) = &self.diary {
            f.write_fmt(format_args!(
                "\n\tdiary: tst {}, dtst {}, waso {}, wb {}, se {:.1}%",
                d.tst.format_hm(),
                d.dtst.format_hm(),
                d.waso.format_hm(),
                d.wb,
                d.se
            ))?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SummaryRow {
    pub tib: f64,
    pub sol: f64,
    pub waso: f64,
    pub wasf: f64,
    pub tst: f64,
    pub wb: f64,
    pub awk5plus: f64,
    pub se: f64,
    pub sf: f64,
}

impl From<&MetricSummary> for SummaryRow {
    fn from(s: &MetricSummary) -> Self {
        Self {
            tib: minutes(s.tib),
            sol: minutes(s.sol),
            waso: minutes(s.waso),
            wasf: minutes(s.wasf),
            tst: minutes(s.tst),
            wb: s.wb,
            awk5plus: s.awk5plus,
            se: s.se,
            sf: s.sf,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubjectRow {
    pub subject: String,
    pub nights_evaluated: usize,
    pub nights_unscorable: usize,
    pub mean: SummaryRow,
    pub median: SummaryRow,
    pub norms_mean: Option<NormSummary>,
    pub norms_median: Option<NormSummary>,
    pub onset_mean: NaiveTime,
    pub onset_std: NaiveTime,
    pub offset_mean: NaiveTime,
    pub offset_std: NaiveTime,
}

impl From<&SubjectSummary> for SubjectRow {
    fn from(s: &SubjectSummary) -> Self {
        Self {
            subject: s.subject.clone(),
            nights_evaluated: s.nights_evaluated,
            nights_unscorable: s.nights_unscorable,
            mean: SummaryRow::from(&s.mean),
            median: SummaryRow::from(&s.median),
            norms_mean: s.norms_mean,
            norms_median: s.norms_median,
            onset_mean: s.onset.mean,
            onset_std: s.onset.std,
            offset_mean: s.offset.mean,
            offset_std: s.offset.std,
        }
    }
}

impl Display for SubjectRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{}: {} nights evaluated, {} unscorable\n",
            self.subject, self.nights_evaluated, self.nights_unscorable
        ))?;
        f.write_fmt(format_args!(
            "\tOnset: {} (± {})\n\tOffset: {} (± {})\n",
            self.onset_mean.format_hm(),
            self.onset_std.format_hm(),
            self.offset_mean.format_hm(),
            self.offset_std.format_hm(),
        ))?;
        f.write_fmt(format_args!(
            "\tMean: tst {}, waso {}, sol {}, se {:.1}%, wb {:.1}\n",
            self.mean.tst.format_hm(),
            self.mean.waso.format_hm(),
            self.mean.sol.format_hm(),
            self.mean.se,
            self.mean.wb,
        ))?;
        f.write_fmt(format_args!(
            "\tMedian: tst {}, waso {}, sol {}, se {:.1}%, wb {:.1}",
            self.median.tst.format_hm(),
            self.median.waso.format_hm(),
            self.median.sol.format_hm(),
            self.median.se,
            self.median.wb,
        ))?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsReport {
    pub nights: Vec<NightRow>,
    pub subjects: Vec<SubjectRow>,
}

impl MetricsReport {
    /// `inputs` and `scored` are index-aligned.
    pub fn new(inputs: &[NightInput], scored: &[ScoredNight], subjects: &[SubjectSummary]) -> Self {
        Self {
            nights: inputs
                .iter()
                .zip(scored)
                .map(|(input, scored)| NightRow::new(input, scored))
                .collect(),
            subjects: subjects.iter().map(SubjectRow::from).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NightTallyRow {
    pub subject: String,
    pub date: NaiveDate,
    pub tally: ConfusionTally,
    pub accuracy: f64,
    pub sensitivity: f64,
    pub specificity: f64,
}

impl From<&NightTally> for NightTallyRow {
    fn from(n: &NightTally) -> Self {
        Self {
            subject: n.key.subject.clone(),
            date: n.key.date,
            tally: n.tally,
            accuracy: n.tally.accuracy(),
            sensitivity: n.tally.sensitivity(),
            specificity: n.tally.specificity(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SweepRows {
    pub results: Vec<ThresholdResult>,
    pub best: Option<ThresholdResult>,
    pub per_night: Vec<NightTallyRow>,
}

impl From<&SweepReport> for SweepRows {
    fn from(report: &SweepReport) -> Self {
        Self {
            results: report.results.clone(),
            best: report.best,
            per_night: report.per_night.iter().map(NightTallyRow::from).collect(),
        }
    }
}

impl Display for SweepRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "threshold  accuracy  sensitivity  specificity      mcc  nights")?;
        for r in &self.results {
            writeln!(
                f,
                "{:>9.2}  {:>8.4}  {:>11.4}  {:>11.4}  {:>7.4}  {:>6}",
                r.threshold, r.accuracy, r.sensitivity, r.specificity, r.mcc, r.nights_evaluated
            )?;
        }
        match &self.best {
            Some(best) => write!(
                f,
                "Best threshold: {:.2} (accuracy {:.4})",
                best.threshold, best.accuracy
            ),
            None => write!(f, "No thresholds evaluated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use nightscore_algos::{ScoringConfig, ThresholdSweep};
    use nightscore_types::{DiarySchedule, EpochSignal, NightKey, Unscorable};

    use crate::batch::score_night;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn input(signal: bool) -> NightInput {
        let schedule = DiarySchedule::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            [at(1, 22, 0), at(1, 22, 30), at(2, 6, 30), at(2, 7, 0)],
            vec![],
        )
        .unwrap();
        NightInput {
            key: NightKey::new("S01", schedule.date),
            age: 30.0,
            signal: signal.then(|| {
                EpochSignal::from_values(at(1, 22, 0), TimeDelta::seconds(30), vec![1.0; 1081])
                    .unwrap()
            }),
            schedule: Some(schedule),
        }
    }

    #[test]
    fn night_rows_serialize_in_minutes() {
        let input = input(true);
        let scored = score_night(&input, &ScoringConfig::default());
        let row = NightRow::new(&input, &scored);

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["status"], "scored");
        assert_eq!(json["metrics"]["tib"], 540.0);
        assert_eq!(json["metrics"]["sol"], 2.5);
        assert_eq!(json["metrics"]["onset"], "2025-01-01T22:02:30");
        assert_eq!(json["norms"]["se"], "Appropriate");
        assert_eq!(json["diary"]["tst"], 480.0);

        let text = row.to_string();
        assert!(text.starts_with("S01 2025-01-01: 22:02 - 07:00, tib 09:00"));
    }

    #[test]
    fn unscorable_rows_carry_the_reason() {
        let input = input(false);
        let scored = score_night(&input, &ScoringConfig::default());
        let row = NightRow::new(&input, &scored);
        assert_eq!(row.status, Unscorable::MissingSignal.to_string());
        assert!(row.metrics.is_none());
        assert!(row.diary.is_some());
        assert_eq!(row.to_string(), "S01 2025-01-01: MissingSignal");
    }

    #[test]
    fn sweep_rows_use_fn_for_false_negatives() {
        let night = input(true).validation_night();
        let report = ThresholdSweep::default().run(&[night]);
        let rows = SweepRows::from(&report);

        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json["results"].as_array().unwrap().len(), 10);
        assert!(json["results"][0]["tally"]["fn"].is_number());
        // everything predicted asleep, so no correlation
        assert_eq!(json["results"][0]["mcc"], 0.0);
        assert_eq!(json["per_night"][0]["subject"], "S01");
        assert!(rows.to_string().contains("Best threshold: 0.10"));
    }
}
