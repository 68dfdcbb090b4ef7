use std::sync::Arc;

use futures::{StreamExt as _, stream};
use indicatif::{ProgressBar, ProgressStyle};
use nightscore_algos::{
    NormAssessment, ScoredNight, ScoringConfig, SweepReport, ThresholdSweep, ValidationNight,
    best_threshold, compute_night_metrics, reduce, threshold_grid,
};
use nightscore_types::Unscorable;

use crate::{dataset::NightInput, helpers::format_hm::FormatHM};

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>12} [{wide_bar:.cyan/dim}] {pos}/{len} nights ({elapsed})")
        .map(|style| style.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Scores one night. Missing inputs make the night unscorable, they never fail the batch.
pub fn score_night(night: &NightInput, config: &ScoringConfig) -> ScoredNight {
    let metrics = match (&night.signal, &night.schedule) {
        (_, None) => Err(Unscorable::MissingSchedule),
        (None, _) => Err(Unscorable::MissingSignal),
        (Some(signal), Some(schedule)) => compute_night_metrics(signal, schedule, config),
    };

    match &metrics {
        Ok(m) => info!(
            "{}: onset {}, offset {}, tst {}, waso {}, se {:.1}",
            night.key,
            m.window.onset.time().format_hm(),
            m.window.offset.time().format_hm(),
            m.tst.format_hm(),
            m.waso.format_hm(),
            m.se
        ),
        Err(e @ (Unscorable::MissingSchedule | Unscorable::MissingSignal)) => {
            warn!("{}: unscorable ({e})", night.key)
        }
        Err(_) => {}
    }

    ScoredNight {
        key: night.key.clone(),
        norms: metrics
            .as_ref()
            .ok()
            .map(|m| NormAssessment::for_metrics(night.age, m)),
        metrics,
    }
}

/// Runs independent per-night jobs on a fixed number of blocking workers.
pub struct NightPool {
    workers: usize,
}

impl NightPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Results come back in input order whatever order the workers finish in.
    pub async fn run<T, R, F>(&self, label: &str, items: Vec<T>, job: F) -> anyhow::Result<Vec<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let job = Arc::new(job);
        let pb = ProgressBar::new(items.len() as u64);
        pb.set_style(bar_style());
        pb.set_prefix(label.to_string());

        let mut results = stream::iter(items.into_iter().enumerate())
            .map(|(i, item)| {
                let job = job.clone();
                tokio::task::spawn_blocking(move || (i, job(item)))
            })
            .buffer_unordered(self.workers)
            .inspect(|_| pb.inc(1))
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        pb.finish();

        results.sort_by_key(|(i, _)| *i);
        Ok(results.into_iter().map(|(_, r)| r).collect())
    }

    pub async fn score(
        &self,
        nights: Vec<NightInput>,
        config: ScoringConfig,
    ) -> anyhow::Result<Vec<ScoredNight>> {
        self.run("scoring", nights, move |night| score_night(&night, &config))
            .await
    }

    /// Threshold sweep with the per-night tallies computed on the pool. Reduction waits for
    /// every night.
    pub async fn sweep(
        &self,
        nights: Vec<ValidationNight>,
        thresholds: &[f64],
    ) -> anyhow::Result<SweepReport> {
        let grid = Arc::new(threshold_grid(thresholds));
        let job_grid = grid.clone();
        let tallies = self
            .run("validating", nights.clone(), move |night| {
                let tallies = night.tallies(&job_grid);
                (night.key, tallies)
            })
            .await?;

        let per_night = tallies
            .into_iter()
            .filter_map(|(key, tallies)| {
                tallies
                    .inspect_err(|e| warn!("{key}: excluded from validation ({e})"))
                    .ok()
            })
            .collect::<Vec<_>>();

        let results = reduce(&grid, &per_night);
        let Some(best) = best_threshold(&results).copied() else {
            return Ok(SweepReport {
                results,
                ..Default::default()
            });
        };

        info!(
            "best threshold {} with accuracy {:.4} over {} nights",
            best.threshold, best.accuracy, best.nights_evaluated
        );
        Ok(SweepReport {
            per_night: ThresholdSweep::per_night(&nights, best.threshold),
            best: Some(best),
            results,
        })
    }
}
