use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::SignalError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SleepState {
    #[serde(rename = "W")]
    Wake,
    #[serde(rename = "S")]
    Sleep,
}

impl SleepState {
    /// Label used by thresholding a sleep probability: `Sleep` when `value >= threshold`.
    pub fn from_probability(value: f64, threshold: f64) -> Self {
        if value >= threshold {
            Self::Sleep
        } else {
            Self::Wake
        }
    }

    pub fn is_sleep(self) -> bool {
        matches!(self, Self::Sleep)
    }

    pub fn is_wake(self) -> bool {
        matches!(self, Self::Wake)
    }
}

/// One classified epoch. `value` is a sleep label (0 or 1) or a sleep probability in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Epoch {
    pub time: NaiveDateTime,
    pub value: f64,
}

impl Epoch {
    pub fn new(time: NaiveDateTime, value: f64) -> Self {
        Self { time, value }
    }

    pub fn state(&self, threshold: f64) -> SleepState {
        SleepState::from_probability(self.value, threshold)
    }
}

/// Per-epoch sleep signal at a fixed cadence with strictly increasing timestamps.
#[derive(Clone, Debug, PartialEq)]
pub struct EpochSignal {
    cadence: TimeDelta,
    epochs: Vec<Epoch>,
}

impl EpochSignal {
    pub fn new(cadence: TimeDelta, epochs: Vec<Epoch>) -> Result<Self, SignalError> {
        if cadence <= TimeDelta::zero() {
            return Err(SignalError::InvalidCadence(cadence.num_milliseconds()));
        }

        for (index, epoch) in epochs.iter().enumerate() {
            if !(0.0..=1.0).contains(&epoch.value) {
                return Err(SignalError::ValueOutOfRange {
                    index,
                    value: epoch.value,
                });
            }
        }

        if let Some(index) = epochs.windows(2).position(|w| w[1].time <= w[0].time) {
            return Err(SignalError::NonIncreasingTimestamps { index: index + 1 });
        }

        Ok(Self { cadence, epochs })
    }

    /// Builds a contiguous signal from consecutive values starting at `start`.
    pub fn from_values(
        start: NaiveDateTime,
        cadence: TimeDelta,
        values: impl IntoIterator<Item = f64>,
    ) -> Result<Self, SignalError> {
        let epochs = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| Epoch::new(start + cadence * i as i32, value))
            .collect();
        Self::new(cadence, epochs)
    }

    pub fn cadence(&self) -> TimeDelta {
        self.cadence
    }

    pub fn epochs(&self) -> &[Epoch] {
        &self.epochs
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.epochs.first().map(|e| e.time)
    }

    /// Index of the first epoch at or after `time`.
    pub fn lower_bound(&self, time: NaiveDateTime) -> usize {
        self.epochs.partition_point(|e| e.time < time)
    }

    /// Epochs with `start <= time <= end`.
    pub fn range_inclusive(&self, start: NaiveDateTime, end: NaiveDateTime) -> &[Epoch] {
        let from = self.lower_bound(start);
        let to = self.epochs.partition_point(|e| e.time <= end);
        if from >= to { &[] } else { &self.epochs[from..to] }
    }

    /// Epochs with `start <= time < end`.
    pub fn range(&self, start: NaiveDateTime, end: NaiveDateTime) -> &[Epoch] {
        let from = self.lower_bound(start);
        let to = self.lower_bound(end);
        if from >= to { &[] } else { &self.epochs[from..to] }
    }

    /// Same values, every timestamp moved by `offset`.
    pub fn shifted(&self, offset: TimeDelta) -> Self {
        Self {
            cadence: self.cadence,
            epochs: self
                .epochs
                .iter()
                .map(|e| Epoch::new(e.time + offset, e.value))
                .collect(),
        }
    }

    /// Concatenates two signals of the same cadence, `other` must start after `self` ends.
    pub fn concat(&self, other: &EpochSignal) -> Result<Self, SignalError> {
        let epochs = self
            .epochs
            .iter()
            .chain(other.epochs.iter())
            .copied()
            .collect();
        Self::new(self.cadence, epochs)
    }
}
