use nightscore_types::{ConfusionTally, DiarySchedule, EpochSignal, NightKey, Unscorable};

use crate::{DiaryPartitioner, NightPartition};

/// Tally of one night at `threshold`, the diary being ground truth.
pub fn validate_threshold(
    signal: &EpochSignal,
    schedule: &DiarySchedule,
    threshold: f64,
) -> ConfusionTally {
    let partition = DiaryPartitioner::partition(signal, schedule);
    tally_partition(&partition, signal, threshold)
}

pub fn tally_partition(
    partition: &NightPartition,
    signal: &EpochSignal,
    threshold: f64,
) -> ConfusionTally {
    let epochs = signal.epochs();
    let mut tally = ConfusionTally::default();
    for segment in &partition.segments {
        let truth = segment.truth();
        for &i in &segment.epochs {
            tally.record(truth, epochs[i].state(threshold));
        }
    }
    tally
}

/// A night offered for validation. Either input may be missing, such nights are excluded.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationNight {
    pub key: NightKey,
    pub signal: Option<EpochSignal>,
    pub schedule: Option<DiarySchedule>,
}

impl ValidationNight {
    pub fn new(key: NightKey, signal: Option<EpochSignal>, schedule: Option<DiarySchedule>) -> Self {
        Self {
            key,
            signal,
            schedule,
        }
    }

    pub fn validate(&self, threshold: f64) -> Result<ConfusionTally, Unscorable> {
        Ok(self.tallies(&[threshold])?.remove(0))
    }

    /// One tally per threshold, the night being partitioned once.
    pub fn tallies(&self, thresholds: &[f64]) -> Result<Vec<ConfusionTally>, Unscorable> {
        let signal = self.signal.as_ref().ok_or(Unscorable::MissingSignal)?;
        let schedule = self.schedule.as_ref().ok_or(Unscorable::MissingSchedule)?;

        let partition = DiaryPartitioner::partition(signal, schedule);
        if partition.epoch_count() == 0 {
            return Err(Unscorable::EmptySignal);
        }

        Ok(thresholds
            .iter()
            .map(|&threshold| tally_partition(&partition, signal, threshold))
            .collect())
    }
}
