use chrono::{NaiveDateTime, TimeDelta};
use nightscore_types::{DiarySchedule, EpochSignal, SleepState, WakeInterval};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    /// `[t1, t2)`, trying to fall asleep.
    BeforeOnset,
    /// A reported wake interval, by position among the accepted intervals.
    ReportedWake(usize),
    /// `[t3, t4)`, awake in bed.
    AfterWake,
    /// Whatever is left of `[t1, t4)`.
    Sleep,
}

impl SegmentKind {
    pub fn truth(self) -> SleepState {
        match self {
            Self::Sleep => SleepState::Sleep,
            _ => SleepState::Wake,
        }
    }
}

/// One sub-interval of the night with the signal epochs assigned to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Length of time the segment claims from the night.
    pub duration: TimeDelta,
    /// Indices into the signal's epochs.
    pub epochs: Vec<usize>,
}

impl Segment {
    pub fn truth(&self) -> SleepState {
        self.kind.truth()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NightPartition {
    pub segments: Vec<Segment>,
}

impl NightPartition {
    pub fn duration(&self) -> TimeDelta {
        self.segments.iter().map(|s| s.duration).sum()
    }

    pub fn epoch_count(&self) -> usize {
        self.segments.iter().map(|s| s.epochs.len()).sum()
    }
}

/// Splits `[t1, t4)` into diary-defined ground truth segments. Segments are taken in order from
/// what is left of the night, so every epoch lands in exactly one.
pub struct DiaryPartitioner;

impl DiaryPartitioner {
    /// Reported wake intervals clipped to `[t2, t3]`, sorted, with empty and overlapping ones
    /// dropped.
    pub fn resolve_wake_intervals(schedule: &DiarySchedule) -> Vec<WakeInterval> {
        let mut sorted = schedule.wake_intervals.clone();
        sorted.sort_by_key(|w| (w.start, w.end));

        let mut accepted: Vec<WakeInterval> = Vec::with_capacity(sorted.len());
        for interval in sorted {
            let clipped = WakeInterval::new(
                interval.start.max(schedule.t2),
                interval.end.min(schedule.t3),
            );
            if clipped != interval {
                warn!(
                    "night of {}: wake interval {} - {} clipped to the sleep period",
                    schedule.date, interval.start, interval.end
                );
            }
            if clipped.start >= clipped.end {
                warn!(
                    "night of {}: wake interval {} - {} is empty, skipped",
                    schedule.date, interval.start, interval.end
                );
                continue;
            }
            if accepted.last().is_some_and(|last| last.overlaps(&clipped)) {
                warn!(
                    "night of {}: wake interval {} - {} overlaps the previous one, skipped",
                    schedule.date, interval.start, interval.end
                );
                continue;
            }
            accepted.push(clipped);
        }

        accepted
    }

    pub fn partition(signal: &EpochSignal, schedule: &DiarySchedule) -> NightPartition {
        let mut pool = Pool::new(signal, schedule.t1, schedule.t4);
        let mut segments = Vec::new();

        segments.push(pool.take(SegmentKind::BeforeOnset, schedule.t1, schedule.t2));
        for (i, wake) in Self::resolve_wake_intervals(schedule).iter().enumerate() {
            segments.push(pool.take(SegmentKind::ReportedWake(i), wake.start, wake.end));
        }
        segments.push(pool.take(SegmentKind::AfterWake, schedule.t3, schedule.t4));

        let claimed = segments.iter().map(|s| s.duration).sum::<TimeDelta>();
        segments.push(Segment {
            kind: SegmentKind::Sleep,
            duration: schedule.time_in_bed() - claimed,
            epochs: pool.rest(),
        });

        NightPartition { segments }
    }
}

/// Epochs of `[start, end)` not yet assigned to a segment.
struct Pool<'a> {
    signal: &'a EpochSignal,
    first: usize,
    taken: Vec<bool>,
}

impl<'a> Pool<'a> {
    fn new(signal: &'a EpochSignal, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        let first = signal.lower_bound(start);
        let last = signal.lower_bound(end).max(first);
        Self {
            signal,
            first,
            taken: vec![false; last - first],
        }
    }

    fn take(&mut self, kind: SegmentKind, start: NaiveDateTime, end: NaiveDateTime) -> Segment {
        let from = self.signal.lower_bound(start).max(self.first) - self.first;
        let to = (self.signal.lower_bound(end).max(self.first) - self.first).min(self.taken.len());

        let mut epochs = Vec::new();
        for i in from..to.max(from) {
            if !self.taken[i] {
                self.taken[i] = true;
                epochs.push(self.first + i);
            }
        }

        Segment {
            kind,
            duration: (end - start).max(TimeDelta::zero()),
            epochs,
        }
    }

    fn rest(self) -> Vec<usize> {
        self.taken
            .iter()
            .enumerate()
            .filter(|(_, taken)| !**taken)
            .map(|(i, _)| self.first + i)
            .collect()
    }
}
