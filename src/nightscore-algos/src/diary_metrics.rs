use chrono::TimeDelta;
use nightscore_types::DiarySchedule;

use crate::{
    DiaryPartitioner,
    helpers::time_math::{hours, safe_div},
};

/// The night as the subject reported it, in the same parameters as the scored night. Wake
/// intervals go through the same clipping and overlap rules as validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiaryMetrics {
    pub tib: TimeDelta,
    pub sol: TimeDelta,
    pub waso: TimeDelta,
    pub wasf: TimeDelta,
    pub tst: TimeDelta,
    /// Reported sleep period less reported wake, `(t3 - t2) - waso`.
    pub dtst: TimeDelta,
    pub wb: u32,
    pub awk5plus: u32,
    pub se: f64,
    pub sf: f64,
}

impl DiaryMetrics {
    pub const MIN_WAKE_INTERVAL: TimeDelta = TimeDelta::minutes(1);
    pub const LONG_AWAKENING: TimeDelta = TimeDelta::minutes(5);

    pub fn from_schedule(schedule: &DiarySchedule) -> Self {
        let tib = schedule.time_in_bed();
        let sol = schedule.t2 - schedule.t1;
        let wasf = schedule.t4 - schedule.t3;

        let wakes = DiaryPartitioner::resolve_wake_intervals(schedule)
            .iter()
            .map(|w| w.duration().max(Self::MIN_WAKE_INTERVAL))
            .collect::<Vec<_>>();
        let waso = wakes.iter().sum::<TimeDelta>();
        let wb = wakes.len() as u32;
        let awk5plus = wakes.iter().filter(|d| **d >= Self::LONG_AWAKENING).count() as u32;

        let tst = (tib - sol - waso - wasf).max(TimeDelta::zero());
        let dtst = (schedule.t3 - schedule.t2 - waso).max(TimeDelta::zero());

        Self {
            tib,
            sol,
            waso,
            wasf,
            tst,
            dtst,
            wb,
            awk5plus,
            se: 100.0 * safe_div(tst.num_milliseconds() as f64, tib.num_milliseconds() as f64),
            sf: safe_div(f64::from(wb), hours(tst)),
        }
    }
}
