use chrono::{NaiveDateTime, TimeDelta};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SleepWindow {
    pub onset: NaiveDateTime,
    pub offset: NaiveDateTime,
}

impl SleepWindow {
    pub fn new(onset: NaiveDateTime, offset: NaiveDateTime) -> Self {
        Self { onset, offset }
    }

    pub fn duration(&self) -> TimeDelta {
        self.offset - self.onset
    }

    /// Restricts the window to `[start, end]`, `None` when nothing is left.
    pub fn clamp(&self, start: NaiveDateTime, end: NaiveDateTime) -> Option<SleepWindow> {
        let onset = self.onset.max(start);
        let offset = self.offset.min(end);
        (onset <= offset).then_some(SleepWindow { onset, offset })
    }
}

/// Clinical outcome measures of one night.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SleepMetrics {
    /// Window the metrics were computed on, clamped to the time in bed.
    pub window: SleepWindow,
    /// Window as found by the coarse pass, before clamping.
    pub detected: SleepWindow,
    pub tib: TimeDelta,
    pub sol: TimeDelta,
    pub waso: TimeDelta,
    pub wasf: TimeDelta,
    pub tst: TimeDelta,
    pub wb: u32,
    pub awk5plus: u32,
    /// Sleep efficiency in percent.
    pub se: f64,
    /// Wake bouts per hour of sleep.
    pub sf: f64,
}
