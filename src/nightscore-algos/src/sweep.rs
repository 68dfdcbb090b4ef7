use nightscore_types::{ConfusionTally, NightKey, ThresholdResult};

use crate::ValidationNight;

/// `0.1, 0.2, ..., 1.0`.
pub fn default_grid() -> Vec<f64> {
    (1..=10).map(|i| f64::from(i) / 10.0).collect()
}

fn is_valid_threshold(threshold: f64) -> bool {
    threshold > 0.0 && threshold <= 1.0
}

/// Valid thresholds in ascending order, invalid ones logged and dropped.
pub fn threshold_grid(thresholds: &[f64]) -> Vec<f64> {
    let mut grid = thresholds
        .iter()
        .copied()
        .filter(|&t| {
            let valid = is_valid_threshold(t);
            if !valid {
                warn!("threshold {t} outside (0, 1], skipped");
            }
            valid
        })
        .collect::<Vec<_>>();
    grid.sort_by(f64::total_cmp);
    grid.dedup();
    grid
}

/// Global tally per threshold, ascending. Nights missing data are excluded and not counted.
pub fn sweep_thresholds(nights: &[ValidationNight], thresholds: &[f64]) -> Vec<ThresholdResult> {
    let grid = threshold_grid(thresholds);
    let per_night = nights
        .iter()
        .filter_map(|night| match night.tallies(&grid) {
            Ok(tallies) => Some(tallies),
            Err(e) => {
                warn!("{}: excluded from validation ({e})", night.key);
                None
            }
        })
        .collect::<Vec<_>>();

    reduce(&grid, &per_night)
}

/// Sums per-night tallies, each row of `per_night` aligned with `grid`.
pub fn reduce(grid: &[f64], per_night: &[Vec<ConfusionTally>]) -> Vec<ThresholdResult> {
    grid.iter()
        .enumerate()
        .map(|(i, &threshold)| {
            let tally = per_night.iter().map(|row| row[i]).sum();
            ThresholdResult::new(threshold, tally, per_night.len())
        })
        .collect()
}

/// Highest accuracy, the smaller threshold on ties.
pub fn best_threshold(results: &[ThresholdResult]) -> Option<&ThresholdResult> {
    results.iter().fold(None, |best, result| match best {
        Some(b)
            if b.accuracy > result.accuracy
                || (b.accuracy == result.accuracy && b.threshold <= result.threshold) =>
        {
            Some(b)
        }
        _ => Some(result),
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct NightTally {
    pub key: NightKey,
    pub tally: ConfusionTally,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepReport {
    /// One row per valid threshold, ascending.
    pub results: Vec<ThresholdResult>,
    pub best: Option<ThresholdResult>,
    /// Tallies of the evaluated nights at the best threshold.
    pub per_night: Vec<NightTally>,
}

pub struct ThresholdSweep {
    thresholds: Vec<f64>,
}

impl ThresholdSweep {
    pub fn new(thresholds: Vec<f64>) -> Self {
        Self { thresholds }
    }

    pub fn run(&self, nights: &[ValidationNight]) -> SweepReport {
        let results = sweep_thresholds(nights, &self.thresholds);
        let Some(best) = best_threshold(&results).copied() else {
            return SweepReport {
                results,
                ..Default::default()
            };
        };

        info!(
            "best threshold {} with accuracy {:.4} over {} nights",
            best.threshold, best.accuracy, best.nights_evaluated
        );
        let per_night = Self::per_night(nights, best.threshold);

        SweepReport {
            results,
            best: Some(best),
            per_night,
        }
    }

    /// Re-runs one threshold night by night.
    pub fn per_night(nights: &[ValidationNight], threshold: f64) -> Vec<NightTally> {
        nights
            .iter()
            .filter_map(|night| {
                let tally = night.validate(threshold).ok()?;
                info!(
                    "{}: accuracy {:.4}, sensitivity {:.4}, specificity {:.4}",
                    night.key,
                    tally.accuracy(),
                    tally.sensitivity(),
                    tally.specificity()
                );
                Some(NightTally {
                    key: night.key.clone(),
                    tally,
                })
            })
            .collect()
    }
}

impl Default for ThresholdSweep {
    fn default() -> Self {
        Self::new(default_grid())
    }
}
