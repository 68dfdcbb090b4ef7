use chrono::TimeDelta;
use clap::Args;
use nightscore_algos::{
    AwakeningPolicy, PrecedingSleep, ScoringConfig, SmoothingConfig, WakeBoutConvention,
};
use strum::{Display, EnumString};

use crate::provider::AngleConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum SignalSource {
    /// Per-epoch sleep probabilities from an external classifier
    #[default]
    Classifier,
    /// Z-angle inactivity labels computed from raw accelerometer samples
    Angle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PrecedingSleepMode {
    #[default]
    Consecutive,
    Cumulative,
    NotRequired,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum WakeBouts {
    #[default]
    Transitions,
    TransitionsMinusOne,
}

#[derive(Args, Clone, Debug)]
pub struct ScoringArgs {
    /// Rolling window in seconds
    #[arg(env, long, default_value_t = 300)]
    pub window_secs: i64,
    /// Sleep epochs per reference window above which the coarse pass marks sleep
    #[arg(env, long, default_value_t = SmoothingConfig::COARSE_THRESHOLD)]
    pub coarse_threshold: f64,
    /// Sleep epochs per reference window above which the fine pass marks sleep
    #[arg(env, long, default_value_t = SmoothingConfig::FINE_THRESHOLD)]
    pub fine_threshold: f64,
    #[arg(env, long, default_value_t = SmoothingConfig::REFERENCE_EPOCHS)]
    pub reference_epochs: u32,
    /// Minutes searched before going to bed and after getting up
    #[arg(env, long, default_value_t = 30)]
    pub search_margin_minutes: i64,
    /// Probability at which a classifier epoch counts as sleep
    #[arg(env, long, default_value_t = SmoothingConfig::LABEL_THRESHOLD)]
    pub label_threshold: f64,
    /// Shortest wake run counted as a long awakening, minutes
    #[arg(env, long, default_value_t = 5)]
    pub min_wake_minutes: i64,
    #[arg(env, long, default_value_t = PrecedingSleepMode::Consecutive)]
    pub preceding_sleep: PrecedingSleepMode,
    #[arg(env, long, default_value_t = 5)]
    pub preceding_sleep_minutes: i64,
    #[arg(env, long, default_value_t = WakeBouts::Transitions)]
    pub wake_bouts: WakeBouts,
    #[arg(env, long, default_value_t = SignalSource::Classifier)]
    pub signal_source: SignalSource,
    /// Largest angle change in degrees still counted as inactivity
    #[arg(env, long, default_value_t = AngleConfig::ANGLE_THRESHOLD)]
    pub angle_threshold: f64,
    /// Inactivity needed to mark sleep, seconds
    #[arg(env, long, default_value_t = 300)]
    pub angle_window_secs: i64,
    /// Inactivity needed before the first sleep epoch, seconds
    #[arg(env, long, default_value_t = 600)]
    pub angle_first_window_secs: i64,
    /// Nights scored concurrently
    #[arg(env, long, default_value_t = 4)]
    pub workers: usize,
}

impl ScoringArgs {
    pub fn scoring_config(&self) -> ScoringConfig {
        let preceding = TimeDelta::minutes(self.preceding_sleep_minutes);
        ScoringConfig {
            smoothing: SmoothingConfig {
                window: TimeDelta::seconds(self.window_secs),
                coarse_threshold: self.coarse_threshold,
                fine_threshold: self.fine_threshold,
                reference_epochs: self.reference_epochs,
                search_margin: TimeDelta::minutes(self.search_margin_minutes),
                label_threshold: self.label_threshold,
            },
            awakening: AwakeningPolicy {
                min_wake: TimeDelta::minutes(self.min_wake_minutes),
                preceding_sleep: match self.preceding_sleep {
                    PrecedingSleepMode::Consecutive => PrecedingSleep::Consecutive(preceding),
                    PrecedingSleepMode::Cumulative => PrecedingSleep::Cumulative(preceding),
                    PrecedingSleepMode::NotRequired => PrecedingSleep::NotRequired,
                },
            },
            wake_bouts: match self.wake_bouts {
                WakeBouts::Transitions => WakeBoutConvention::Transitions,
                WakeBouts::TransitionsMinusOne => WakeBoutConvention::TransitionsMinusOne,
            },
        }
    }

    pub fn angle_config(&self) -> AngleConfig {
        AngleConfig {
            angle_threshold: self.angle_threshold,
            window: TimeDelta::seconds(self.angle_window_secs),
            first_window: TimeDelta::seconds(self.angle_first_window_secs),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        scoring: ScoringArgs,
    }

    #[test]
    fn defaults_match_clinical_constants() {
        let cli = Cli::parse_from(["nightscore"]);
        assert_eq!(cli.scoring.scoring_config(), ScoringConfig::default());
        assert_eq!(cli.scoring.angle_config(), AngleConfig::default());
        assert_eq!(cli.scoring.signal_source, SignalSource::Classifier);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "nightscore",
            "--preceding-sleep",
            "cumulative",
            "--preceding-sleep-minutes",
            "10",
            "--wake-bouts",
            "transitions-minus-one",
            "--signal-source",
            "angle",
            "--workers",
            "0",
        ]);
        let config = cli.scoring.scoring_config();
        assert_eq!(
            config.awakening.preceding_sleep,
            PrecedingSleep::Cumulative(TimeDelta::minutes(10))
        );
        assert_eq!(config.wake_bouts, WakeBoutConvention::TransitionsMinusOne);
        assert_eq!(cli.scoring.signal_source, SignalSource::Angle);
        assert_eq!(cli.scoring.workers(), 1);
    }
}
