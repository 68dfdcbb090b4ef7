#[macro_use]
extern crate log;

pub mod batch;
pub mod config;
pub mod dataset;
pub mod helpers;
pub mod provider;
pub mod report;

pub use batch::{NightPool, score_night};
pub use config::{ScoringArgs, SignalSource};
pub use dataset::{Dataset, NightInput};
pub use provider::{
    AngleConfig, AngleSignalProvider, ClassifierSignalProvider, EpochSignalProvider, provider_for,
};
