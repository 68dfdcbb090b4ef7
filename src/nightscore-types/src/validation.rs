use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::SleepState;

/// Confusion counts of predicted vs. diary sleep, Sleep being the positive class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfusionTally {
    pub tp: u64,
    pub fp: u64,
    pub tn: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
}

impl ConfusionTally {
    pub fn record(&mut self, truth: SleepState, predicted: SleepState) {
        match (truth, predicted) {
            (SleepState::Sleep, SleepState::Sleep) => self.tp += 1,
            (SleepState::Sleep, SleepState::Wake) => self.fn_ += 1,
            (SleepState::Wake, SleepState::Wake) => self.tn += 1,
            (SleepState::Wake, SleepState::Sleep) => self.fp += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.tp + self.fp + self.tn + self.fn_
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    pub fn sensitivity(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn f1(&self) -> f64 {
        ratio(2 * self.tp, 2 * self.tp + self.fp + self.fn_)
    }

    /// Matthews correlation coefficient, 0 when any marginal is empty.
    pub fn mcc(&self) -> f64 {
        let [tp, fp, tn, fn_] = [self.tp, self.fp, self.tn, self.fn_].map(|c| c as f64);
        let denominator = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
        if denominator == 0.0 {
            0.0
        } else {
            (tp * tn - fp * fn_) / denominator
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl Add for ConfusionTally {
    type Output = ConfusionTally;

    fn add(self, rhs: Self) -> Self::Output {
        ConfusionTally {
            tp: self.tp + rhs.tp,
            fp: self.fp + rhs.fp,
            tn: self.tn + rhs.tn,
            fn_: self.fn_ + rhs.fn_,
        }
    }
}

impl AddAssign for ConfusionTally {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for ConfusionTally {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(ConfusionTally::default(), Add::add)
    }
}

impl<'a> Sum<&'a ConfusionTally> for ConfusionTally {
    fn sum<I: Iterator<Item = &'a ConfusionTally>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Global tally of one decision threshold across all evaluated nights.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResult {
    pub threshold: f64,
    pub tally: ConfusionTally,
    pub accuracy: f64,
    pub sensitivity: f64,
    pub specificity: f64,
    pub precision: f64,
    pub f1: f64,
    pub mcc: f64,
    pub nights_evaluated: usize,
}

impl ThresholdResult {
    pub fn new(threshold: f64, tally: ConfusionTally, nights_evaluated: usize) -> Self {
        Self {
            threshold,
            tally,
            accuracy: tally.accuracy(),
            sensitivity: tally.sensitivity(),
            specificity: tally.specificity(),
            precision: tally.precision(),
            f1: tally.f1(),
            mcc: tally.mcc(),
            nights_evaluated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tally_has_zero_ratios() {
        let tally = ConfusionTally::default();
        assert_eq!(tally.accuracy(), 0.0);
        assert_eq!(tally.sensitivity(), 0.0);
        assert_eq!(tally.specificity(), 0.0);
        assert_eq!(tally.f1(), 0.0);
        assert_eq!(tally.mcc(), 0.0);
    }

    #[test]
    fn record_maps_outcomes() {
        let mut tally = ConfusionTally::default();
        tally.record(SleepState::Sleep, SleepState::Sleep);
        tally.record(SleepState::Sleep, SleepState::Wake);
        tally.record(SleepState::Wake, SleepState::Wake);
        tally.record(SleepState::Wake, SleepState::Wake);
        tally.record(SleepState::Wake, SleepState::Sleep);
        assert_eq!(
            tally,
            ConfusionTally {
                tp: 1,
                fp: 1,
                tn: 2,
                fn_: 1
            }
        );
        assert_eq!(tally.accuracy(), 0.6);
        assert_eq!(tally.sensitivity(), 0.5);
        assert!((tally.specificity() - 2.0 / 3.0).abs() < 1e-12);
        // (1 * 2 - 1 * 1) / sqrt(2 * 2 * 3 * 3)
        assert!((tally.mcc() - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn mcc_spans_perfect_to_inverted() {
        let perfect = ConfusionTally {
            tp: 5,
            fp: 0,
            tn: 3,
            fn_: 0,
        };
        assert_eq!(perfect.mcc(), 1.0);

        let inverted = ConfusionTally {
            tp: 0,
            fp: 3,
            tn: 0,
            fn_: 5,
        };
        assert_eq!(inverted.mcc(), -1.0);

        // only one class predicted
        let constant = ConfusionTally {
            tp: 5,
            fp: 3,
            tn: 0,
            fn_: 0,
        };
        assert_eq!(constant.mcc(), 0.0);
        assert_eq!(ThresholdResult::new(0.5, perfect, 1).mcc, 1.0);
    }

    #[test]
    fn tallies_sum() {
        let a = ConfusionTally {
            tp: 1,
            fp: 2,
            tn: 3,
            fn_: 4,
        };
        let total: ConfusionTally = [a, a].iter().sum();
        assert_eq!(total.total(), 20);
        assert_eq!(total.fn_, 8);
    }

    #[test]
    fn serializes_false_negatives_as_fn() {
        let json = serde_json::to_value(ConfusionTally::default()).unwrap();
        assert!(json.get("fn").is_some());
    }
}
