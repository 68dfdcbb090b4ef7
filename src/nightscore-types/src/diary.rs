use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike as _};
use serde::{Deserialize, Serialize};

use crate::DiaryError;

/// A wake period reported in the diary, `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl WakeInterval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &WakeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Diary page as the subject fills it in: clock times only, anchored to the evening's date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub date: NaiveDate,
    /// Time the subject tried to fall asleep.
    pub sleep_time: NaiveTime,
    /// Time the subject expects to have fallen asleep.
    pub expected_onset: NaiveTime,
    /// Final wake up.
    pub wake_time: NaiveTime,
    pub get_up_time: NaiveTime,
    #[serde(default)]
    pub wake_intervals: Vec<ClockInterval>,
}

impl DiaryEntry {
    /// Places the clock times on the calendar. Times before noon belong to the next day and
    /// every anchor is rolled forward a day if it would precede the one before it.
    pub fn resolve(&self) -> Result<DiarySchedule, DiaryError> {
        let t1 = self.on_night(self.sleep_time)?;
        let t2 = self.after(self.expected_onset, t1)?;
        let t3 = self.after(self.wake_time, t2)?;
        let t4 = self.after(self.get_up_time, t3)?;

        let wake_intervals = self
            .wake_intervals
            .iter()
            .map(|interval| {
                let start = self.after(interval.start, t2)?;
                let end = self.after(interval.end, start)?;
                Ok(WakeInterval::new(start, end))
            })
            .collect::<Result<Vec<_>, DiaryError>>()?;

        DiarySchedule::new(self.date, [t1, t2, t3, t4], wake_intervals)
    }

    fn on_night(&self, time: NaiveTime) -> Result<NaiveDateTime, DiaryError> {
        if time.hour() < 12 {
            next_day(self.date, time)
        } else {
            Ok(self.date.and_time(time))
        }
    }

    fn after(&self, time: NaiveTime, previous: NaiveDateTime) -> Result<NaiveDateTime, DiaryError> {
        let maybe = self.on_night(time)?;
        if maybe < previous {
            next_day(maybe.date(), time)
        } else {
            Ok(maybe)
        }
    }
}

fn next_day(date: NaiveDate, time: NaiveTime) -> Result<NaiveDateTime, DiaryError> {
    date.checked_add_days(Days::new(1))
        .map(|d| d.and_time(time))
        .ok_or_else(|| DiaryError::UnresolvableTime(time.to_string()))
}

/// One night of the diary with its four anchors placed on the calendar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiarySchedule {
    pub date: NaiveDate,
    /// Intended sleep time.
    pub t1: NaiveDateTime,
    /// Expected sleep onset.
    pub t2: NaiveDateTime,
    /// Reported final wake.
    pub t3: NaiveDateTime,
    /// Get-up time.
    pub t4: NaiveDateTime,
    pub wake_intervals: Vec<WakeInterval>,
}

impl DiarySchedule {
    pub fn new(
        date: NaiveDate,
        [t1, t2, t3, t4]: [NaiveDateTime; 4],
        wake_intervals: Vec<WakeInterval>,
    ) -> Result<Self, DiaryError> {
        if !(t1 <= t2 && t2 <= t3 && t3 <= t4) {
            return Err(DiaryError::AnchorsOutOfOrder);
        }

        Ok(Self {
            date,
            t1,
            t2,
            t3,
            t4,
            wake_intervals,
        })
    }

    pub fn time_in_bed(&self) -> TimeDelta {
        self.t4 - self.t1
    }

    /// Same schedule, every timestamp moved by `offset`.
    pub fn shifted(&self, offset: TimeDelta) -> Self {
        Self {
            date: (self.t1 + offset).date(),
            t1: self.t1 + offset,
            t2: self.t2 + offset,
            t3: self.t3 + offset,
            t4: self.t4 + offset,
            wake_intervals: self
                .wake_intervals
                .iter()
                .map(|w| WakeInterval::new(w.start + offset, w.end + offset))
                .collect(),
        }
    }
}
