mod error;
pub use error::{DiaryError, SignalError, Unscorable};

mod signal;
pub use signal::{Epoch, EpochSignal, SleepState};

mod diary;
pub use diary::{ClockInterval, DiaryEntry, DiarySchedule, WakeInterval};

mod metrics;
pub use metrics::{SleepMetrics, SleepWindow};

mod norms;
pub use norms::{AgeBracket, NormBand, NormMetric};

mod validation;
pub use validation::{ConfusionTally, ThresholdResult};

mod subject;
pub use subject::{NightKey, Sex, Subject};
