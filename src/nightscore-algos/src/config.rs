use chrono::TimeDelta;
use nightscore_types::SleepState;

use crate::SmoothingConfig;

/// What must come before a wake run for it to count as a long awakening.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrecedingSleep {
    /// An unbroken sleep run of at least this long directly before the wake run.
    Consecutive(TimeDelta),
    /// At least this much sleep since the last credited awakening, short wakes in between allowed.
    Cumulative(TimeDelta),
    NotRequired,
}

/// Rules for counting awakenings longer than five minutes on the fine-pass trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AwakeningPolicy {
    pub min_wake: TimeDelta,
    pub preceding_sleep: PrecedingSleep,
}

impl AwakeningPolicy {
    pub const MIN_WAKE: TimeDelta = TimeDelta::minutes(5);
    pub const MIN_PRECEDING_SLEEP: TimeDelta = TimeDelta::minutes(5);

    /// Counts maximal wake runs of at least `min_wake`, each credited once, when the
    /// preceding-sleep rule holds at the moment the run reaches `min_wake`.
    pub fn count(&self, trace: &[SleepState], cadence: TimeDelta) -> u32 {
        let min_wake = epochs_in(self.min_wake, cadence);
        let (required, cumulative) = match self.preceding_sleep {
            PrecedingSleep::Consecutive(d) => (epochs_in(d, cadence), false),
            PrecedingSleep::Cumulative(d) => (epochs_in(d, cadence), true),
            PrecedingSleep::NotRequired => (0, false),
        };

        let mut count = 0;
        let mut sleep_run = 0_u32;
        let mut wake_run = 0_u32;
        let mut sleep_before = 0_u32;

        for state in trace {
            match state {
                SleepState::Sleep => {
                    sleep_run += 1;
                    wake_run = 0;
                }
                SleepState::Wake => {
                    if wake_run == 0 {
                        sleep_before = sleep_run;
                        if !cumulative {
                            sleep_run = 0;
                        }
                    }
                    wake_run += 1;
                    if wake_run == min_wake && sleep_before >= required {
                        count += 1;
                        sleep_run = 0;
                    }
                }
            }
        }

        count
    }
}

impl Default for AwakeningPolicy {
    fn default() -> Self {
        Self {
            min_wake: Self::MIN_WAKE,
            preceding_sleep: PrecedingSleep::Consecutive(Self::MIN_PRECEDING_SLEEP),
        }
    }
}

/// Whole epochs needed to cover `duration`, at least one.
pub fn epochs_in(duration: TimeDelta, cadence: TimeDelta) -> u32 {
    let cadence = cadence.num_milliseconds().max(1);
    let duration = duration.num_milliseconds().max(0);
    ((duration + cadence - 1) / cadence).max(1) as u32
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WakeBoutConvention {
    /// Every Sleep to Wake transition is a bout.
    #[default]
    Transitions,
    /// Transitions less one, never below zero.
    TransitionsMinusOne,
}

impl WakeBoutConvention {
    pub fn count(self, trace: &[SleepState]) -> u32 {
        let transitions = trace
            .windows(2)
            .filter(|w| w[0].is_sleep() && w[1].is_wake())
            .count() as u32;

        match self {
            Self::Transitions => transitions,
            Self::TransitionsMinusOne => transitions.saturating_sub(1),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoringConfig {
    pub smoothing: SmoothingConfig,
    pub awakening: AwakeningPolicy,
    pub wake_bouts: WakeBoutConvention,
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightscore_types::SleepState::{Sleep as S, Wake as W};

    const EPOCH: TimeDelta = TimeDelta::seconds(30);

    fn trace(runs: &[(SleepState, usize)]) -> Vec<SleepState> {
        runs.iter()
            .flat_map(|&(state, n)| std::iter::repeat_n(state, n))
            .collect()
    }

    #[test]
    fn epochs_in_rounds_up() {
        assert_eq!(epochs_in(TimeDelta::minutes(5), EPOCH), 10);
        assert_eq!(epochs_in(TimeDelta::seconds(31), EPOCH), 2);
        assert_eq!(epochs_in(TimeDelta::minutes(5), TimeDelta::seconds(5)), 60);
        assert_eq!(epochs_in(TimeDelta::zero(), EPOCH), 1);
    }

    #[test]
    fn long_wake_after_sleep_is_credited_once() {
        let t = trace(&[(S, 20), (W, 12), (S, 20)]);
        assert_eq!(AwakeningPolicy::default().count(&t, EPOCH), 1);
    }

    #[test]
    fn nine_wake_epochs_are_not_enough() {
        let t = trace(&[(S, 20), (W, 9), (S, 20)]);
        assert_eq!(AwakeningPolicy::default().count(&t, EPOCH), 0);
    }

    #[test]
    fn consecutive_rule_requires_unbroken_sleep() {
        let t = trace(&[(S, 6), (W, 1), (S, 6), (W, 10)]);
        assert_eq!(AwakeningPolicy::default().count(&t, EPOCH), 0);

        let cumulative = AwakeningPolicy {
            preceding_sleep: PrecedingSleep::Cumulative(AwakeningPolicy::MIN_PRECEDING_SLEEP),
            ..Default::default()
        };
        assert_eq!(cumulative.count(&t, EPOCH), 1);
    }

    #[test]
    fn cumulative_counter_resets_after_credit() {
        let policy = AwakeningPolicy {
            preceding_sleep: PrecedingSleep::Cumulative(AwakeningPolicy::MIN_PRECEDING_SLEEP),
            ..Default::default()
        };
        let t = trace(&[(S, 10), (W, 10), (S, 5), (W, 10), (S, 5), (W, 10)]);
        assert_eq!(policy.count(&t, EPOCH), 2);
    }

    #[test]
    fn wake_at_start_needs_no_sleep_when_not_required() {
        let t = trace(&[(W, 10), (S, 20)]);
        assert_eq!(AwakeningPolicy::default().count(&t, EPOCH), 0);

        let policy = AwakeningPolicy {
            preceding_sleep: PrecedingSleep::NotRequired,
            ..Default::default()
        };
        assert_eq!(policy.count(&t, EPOCH), 1);
    }

    #[test]
    fn wake_bouts_count_transitions() {
        let t = trace(&[(W, 2), (S, 5), (W, 1), (S, 5), (W, 3), (S, 1)]);
        assert_eq!(WakeBoutConvention::Transitions.count(&t), 2);
        assert_eq!(WakeBoutConvention::TransitionsMinusOne.count(&t), 1);
        assert_eq!(WakeBoutConvention::TransitionsMinusOne.count(&[]), 0);
    }
}
