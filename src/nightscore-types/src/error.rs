use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SignalError {
    #[error("cadence must be positive, got {0} ms")]
    InvalidCadence(i64),
    #[error("epoch {index} has value {value} outside [0, 1]")]
    ValueOutOfRange { index: usize, value: f64 },
    #[error("epoch {index} does not come after its predecessor")]
    NonIncreasingTimestamps { index: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiaryError {
    #[error("diary anchors must satisfy t1 <= t2 <= t3 <= t4")]
    AnchorsOutOfOrder,
    #[error("clock time {0} cannot be placed on the diary date")]
    UnresolvableTime(String),
}

/// Why a night produced no metrics. Never fatal for a batch.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{self:?}")]
pub enum Unscorable {
    MissingSignal,
    MissingSchedule,
    EmptySignal,
    NoSleepDetected,
}
