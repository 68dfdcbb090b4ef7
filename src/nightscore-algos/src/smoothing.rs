use chrono::{NaiveDateTime, TimeDelta};
use nightscore_types::{Epoch, SleepState};

/// Rolling-window constants. Thresholds are sleep-epoch counts for a window of
/// `reference_epochs` epochs and scale with the actual number of epochs in `window`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothingConfig {
    pub window: TimeDelta,
    /// Coarse pass: Sleep when the rolling sum exceeds this.
    pub coarse_threshold: f64,
    /// Fine pass: Sleep when the rolling sum exceeds this.
    pub fine_threshold: f64,
    pub reference_epochs: u32,
    /// Search range around the diary's time in bed.
    pub search_margin: TimeDelta,
    /// Probability at or above which an input epoch counts as sleep-labelled.
    pub label_threshold: f64,
}

impl SmoothingConfig {
    pub const WINDOW: TimeDelta = TimeDelta::seconds(300);
    pub const COARSE_THRESHOLD: f64 = 5.0;
    pub const FINE_THRESHOLD: f64 = 2.0;
    pub const REFERENCE_EPOCHS: u32 = 10;
    pub const SEARCH_MARGIN: TimeDelta = TimeDelta::minutes(30);
    pub const LABEL_THRESHOLD: f64 = 0.5;

    /// Number of epochs of `cadence` that fit in the window.
    pub fn window_epochs(&self, cadence: TimeDelta) -> f64 {
        let cadence = cadence.num_milliseconds();
        if cadence <= 0 {
            return 0.0;
        }
        self.window.num_milliseconds() as f64 / cadence as f64
    }

    fn scale(&self, cadence: TimeDelta) -> f64 {
        if self.reference_epochs == 0 {
            return 1.0;
        }
        self.window_epochs(cadence) / f64::from(self.reference_epochs)
    }

    pub fn coarse_limit(&self, cadence: TimeDelta) -> f64 {
        self.coarse_threshold * self.scale(cadence)
    }

    pub fn fine_limit(&self, cadence: TimeDelta) -> f64 {
        self.fine_threshold * self.scale(cadence)
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window: Self::WINDOW,
            coarse_threshold: Self::COARSE_THRESHOLD,
            fine_threshold: Self::FINE_THRESHOLD,
            reference_epochs: Self::REFERENCE_EPOCHS,
            search_margin: Self::SEARCH_MARGIN,
            label_threshold: Self::LABEL_THRESHOLD,
        }
    }
}

/// Output of both passes, index-aligned with the input epochs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SmoothedTrace {
    pub times: Vec<NaiveDateTime>,
    pub sums: Vec<u32>,
    pub coarse: Vec<SleepState>,
    pub fine: Vec<SleepState>,
}

impl SmoothedTrace {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Indices of the first and last coarse Sleep epoch.
    pub fn coarse_sleep_bounds(&self) -> Option<(usize, usize)> {
        let first = self.coarse.iter().position(|s| s.is_sleep())?;
        let last = self.coarse.iter().rposition(|s| s.is_sleep())?;
        Some((first, last))
    }

    /// Fine-pass states of the epochs with `onset <= time <= offset`.
    pub fn fine_between(&self, onset: NaiveDateTime, offset: NaiveDateTime) -> &[SleepState] {
        let from = self.times.partition_point(|t| *t < onset);
        let to = self.times.partition_point(|t| *t <= offset);
        if from >= to { &[] } else { &self.fine[from..to] }
    }
}

/// Two rolling-sum passes over a trailing time window `(t - window, t]`.
pub struct WindowSmoother {
    config: SmoothingConfig,
}

impl WindowSmoother {
    pub fn new(config: SmoothingConfig) -> Self {
        Self { config }
    }

    pub fn smooth(&self, epochs: &[Epoch], cadence: TimeDelta) -> SmoothedTrace {
        let sums = self.rolling_sums(epochs);
        let coarse_limit = self.config.coarse_limit(cadence);
        let fine_limit = self.config.fine_limit(cadence);
        trace!(
            "smoothing {} epochs, coarse > {coarse_limit}, fine > {fine_limit}",
            epochs.len()
        );

        let classify = |limit: f64| {
            sums.iter()
                .map(|&sum| {
                    if f64::from(sum) > limit {
                        SleepState::Sleep
                    } else {
                        SleepState::Wake
                    }
                })
                .collect::<Vec<_>>()
        };

        SmoothedTrace {
            times: epochs.iter().map(|e| e.time).collect(),
            coarse: classify(coarse_limit),
            fine: classify(fine_limit),
            sums,
        }
    }

    fn rolling_sums(&self, epochs: &[Epoch]) -> Vec<u32> {
        let labels = epochs
            .iter()
            .map(|e| u32::from(e.state(self.config.label_threshold).is_sleep()))
            .collect::<Vec<_>>();

        let mut sums = Vec::with_capacity(epochs.len());
        let mut start = 0;
        let mut sum = 0_u32;

        for (i, epoch) in epochs.iter().enumerate() {
            sum += labels[i];
            while start <= i && epochs[start].time <= epoch.time - self.config.window {
                sum -= labels[start];
                start += 1;
            }
            sums.push(sum);
        }

        sums
    }
}
