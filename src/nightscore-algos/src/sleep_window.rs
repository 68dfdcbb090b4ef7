use chrono::NaiveDateTime;
use nightscore_types::{DiarySchedule, EpochSignal, SleepWindow, Unscorable};

use crate::{SmoothedTrace, SmoothingConfig, WindowSmoother};

/// A night bounded by the coarse pass, ready for metric computation.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedNight {
    /// First and last coarse Sleep epoch inside the search range.
    pub detected: SleepWindow,
    /// `detected` clamped to the diary's time in bed. Sleep found only outside the time in bed
    /// leaves a zero-length window at the nearer anchor.
    pub window: SleepWindow,
    pub trace: SmoothedTrace,
}

pub struct SleepWindowDetector {
    config: SmoothingConfig,
}

impl SleepWindowDetector {
    pub fn new(config: SmoothingConfig) -> Self {
        Self { config }
    }

    /// `[t1 - margin, t4 + margin]`.
    pub fn search_range(&self, schedule: &DiarySchedule) -> (NaiveDateTime, NaiveDateTime) {
        (
            schedule.t1 - self.config.search_margin,
            schedule.t4 + self.config.search_margin,
        )
    }

    pub fn detect(
        &self,
        signal: &EpochSignal,
        schedule: &DiarySchedule,
    ) -> Result<DetectedNight, Unscorable> {
        let (start, end) = self.search_range(schedule);
        let epochs = signal.range_inclusive(start, end);
        if epochs.is_empty() {
            return Err(Unscorable::EmptySignal);
        }

        let trace = WindowSmoother::new(self.config).smooth(epochs, signal.cadence());
        let (first, last) = trace
            .coarse_sleep_bounds()
            .ok_or(Unscorable::NoSleepDetected)?;

        let detected = SleepWindow::new(trace.times[first], trace.times[last]);
        let window = detected
            .clamp(schedule.t1, schedule.t4)
            .unwrap_or_else(|| {
                let anchor = if detected.offset < schedule.t1 {
                    schedule.t1
                } else {
                    schedule.t4
                };
                debug!("night of {}: no sleep in bed, window collapsed to {anchor}", schedule.date);
                SleepWindow::new(anchor, anchor)
            });
        debug!(
            "night of {}: detected {} - {}, in bed {} - {}",
            schedule.date, detected.onset, detected.offset, window.onset, window.offset
        );

        Ok(DetectedNight {
            detected,
            window,
            trace,
        })
    }
}
