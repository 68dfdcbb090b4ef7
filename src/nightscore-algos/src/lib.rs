#[macro_use]
extern crate log;

pub(crate) mod smoothing;
pub use smoothing::{SmoothedTrace, SmoothingConfig, WindowSmoother};

pub(crate) mod sleep_window;
pub use sleep_window::{DetectedNight, SleepWindowDetector};

pub(crate) mod config;
pub use config::{AwakeningPolicy, PrecedingSleep, ScoringConfig, WakeBoutConvention, epochs_in};

pub(crate) mod metrics;
pub use metrics::{MetricsCalculator, compute_night_metrics};

pub(crate) mod diary_metrics;
pub use diary_metrics::DiaryMetrics;

pub(crate) mod norms;
pub use norms::{NormAssessment, NormClassifier, classify_norm};

pub(crate) mod partition;
pub use partition::{DiaryPartitioner, NightPartition, Segment, SegmentKind};

pub(crate) mod validation;
pub use validation::{ValidationNight, tally_partition, validate_threshold};

pub(crate) mod sweep;
pub use sweep::{
    NightTally, SweepReport, ThresholdSweep, best_threshold, default_grid, reduce,
    sweep_thresholds, threshold_grid,
};

pub(crate) mod aggregate;
pub use aggregate::{ClockSummary, MetricSummary, NightAggregator, NormSummary, ScoredNight, SubjectSummary};

pub mod helpers;
