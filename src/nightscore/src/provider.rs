use std::collections::BTreeMap;

use chrono::{NaiveDateTime, SubsecRound as _, TimeDelta};
use nightscore_algos::{epochs_in, helpers::time_math::median};
use nightscore_types::{Epoch, EpochSignal};

use crate::{
    config::SignalSource,
    dataset::{AccelSample, Recording},
};

/// Supplies the per-epoch signal of a recording between `start` and `end`, inclusive.
/// `Ok(None)` when the recording has nothing for that range.
pub trait EpochSignalProvider: Send + Sync {
    fn read(
        &self,
        recording: &Recording,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> anyhow::Result<Option<EpochSignal>>;
}

pub fn provider_for(source: SignalSource, angle: AngleConfig) -> Box<dyn EpochSignalProvider> {
    match source {
        SignalSource::Classifier => Box::new(ClassifierSignalProvider),
        SignalSource::Angle => Box::new(AngleSignalProvider::new(angle)),
    }
}

/// Reads stored classifier probabilities.
pub struct ClassifierSignalProvider;

impl EpochSignalProvider for ClassifierSignalProvider {
    fn read(
        &self,
        recording: &Recording,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> anyhow::Result<Option<EpochSignal>> {
        let Some(track) = &recording.predictions else {
            return Ok(None);
        };

        let signal = track.to_signal()?;
        let epochs = signal.range_inclusive(start, end);
        if epochs.is_empty() {
            return Ok(None);
        }

        Ok(Some(EpochSignal::new(signal.cadence(), epochs.to_vec())?))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AngleConfig {
    /// Largest epoch-to-epoch change of the arm angle, degrees, still counted as still.
    pub angle_threshold: f64,
    /// Stillness needed to mark sleep.
    pub window: TimeDelta,
    /// Stillness needed before the first sleep epoch of the night.
    pub first_window: TimeDelta,
}

impl AngleConfig {
    pub const EPOCH: TimeDelta = TimeDelta::seconds(5);
    pub const ANGLE_THRESHOLD: f64 = 5.0;
    pub const WINDOW: TimeDelta = TimeDelta::minutes(5);
    pub const FIRST_WINDOW: TimeDelta = TimeDelta::minutes(10);
}

impl Default for AngleConfig {
    fn default() -> Self {
        Self {
            angle_threshold: Self::ANGLE_THRESHOLD,
            window: Self::WINDOW,
            first_window: Self::FIRST_WINDOW,
        }
    }
}

/// Labels 5 s epochs from raw accelerometer samples: sleep is a long enough stretch in which the
/// arm's z-angle barely changes.
pub struct AngleSignalProvider {
    config: AngleConfig,
}

impl AngleSignalProvider {
    pub fn new(config: AngleConfig) -> Self {
        Self { config }
    }

    /// Per-axis medians of the samples falling into each 5 s epoch.
    fn epoch_medians(samples: &[AccelSample]) -> Vec<(NaiveDateTime, f64, f64, f64)> {
        let step = AngleConfig::EPOCH.num_seconds();
        let mut bins = BTreeMap::<NaiveDateTime, [Vec<f64>; 3]>::new();
        for sample in samples {
            let time = sample.time.trunc_subsecs(0);
            let time = time - TimeDelta::seconds(time.and_utc().timestamp().rem_euclid(step));
            let bin = bins.entry(time).or_default();
            bin[0].push(sample.x);
            bin[1].push(sample.y);
            bin[2].push(sample.z);
        }

        bins.into_iter()
            .map(|(time, [x, y, z])| (time, median(&x), median(&y), median(&z)))
            .collect()
    }

    /// Arm elevation in degrees.
    pub fn z_angle(x: f64, y: f64, z: f64) -> f64 {
        z.atan2((x * x + y * y).sqrt()).to_degrees()
    }

    pub fn label(&self, angles: &[f64]) -> Vec<f64> {
        let window = epochs_in(self.config.window, AngleConfig::EPOCH);
        let first_window = epochs_in(self.config.first_window, AngleConfig::EPOCH);

        let mut still = 0_u32;
        let mut slept = false;
        let mut previous: Option<f64> = None;

        angles
            .iter()
            .map(|&angle| {
                still += 1;
                let moved = previous.is_some_and(|p| (angle - p).abs() > self.config.angle_threshold);
                previous = Some(angle);

                if moved {
                    still = 0;
                    0.0
                } else if (slept && still > window) || (!slept && still > first_window) {
                    slept = true;
                    1.0
                } else {
                    0.0
                }
            })
            .collect()
    }
}

impl EpochSignalProvider for AngleSignalProvider {
    fn read(
        &self,
        recording: &Recording,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> anyhow::Result<Option<EpochSignal>> {
        let samples = recording
            .accelerometer
            .iter()
            .filter(|s| s.time >= start && s.time <= end)
            .copied()
            .collect::<Vec<_>>();
        if samples.is_empty() {
            return Ok(None);
        }

        let epochs = Self::epoch_medians(&samples);
        let angles = epochs
            .iter()
            .map(|&(_, x, y, z)| Self::z_angle(x, y, z))
            .collect::<Vec<_>>();
        let labels = self.label(&angles);
        trace!(
            "{}: {} angle epochs, {} still",
            recording.name,
            labels.len(),
            labels.iter().filter(|l| **l > 0.0).count()
        );

        let epochs = epochs
            .iter()
            .zip(labels)
            .map(|(&(time, ..), value)| Epoch::new(time, value))
            .collect();
        Ok(Some(EpochSignal::new(AngleConfig::EPOCH, epochs)?))
    }
}
