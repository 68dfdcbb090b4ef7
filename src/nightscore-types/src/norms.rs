use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Age-adjusted appropriateness of a sleep metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormBand {
    Appropriate = 1,
    Uncertain = 0,
    Inappropriate = -1,
}

impl NormBand {
    pub fn value(self) -> i8 {
        self as i8
    }
}

/// Metrics that have published norms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum NormMetric {
    /// Sleep onset latency, minutes.
    Sol,
    /// Wake after sleep onset, minutes.
    Waso,
    /// Awakenings longer than five minutes, count.
    Awk5plus,
    /// Sleep efficiency, percent.
    Se,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeBracket {
    Toddler,
    Preschool,
    SchoolAge,
    Teenager,
    YoungAdult,
    Adult,
    OlderAdult,
}

impl AgeBracket {
    pub const PRESCHOOL: f64 = 3.0;
    pub const SCHOOL_AGE: f64 = 6.0;
    pub const TEENAGER: f64 = 14.0;
    pub const YOUNG_ADULT: f64 = 18.0;
    pub const ADULT: f64 = 26.0;
    pub const OLDER_ADULT: f64 = 65.0;

    pub fn from_age(age: f64) -> Self {
        match age {
            a if a >= Self::OLDER_ADULT => Self::OlderAdult,
            a if a >= Self::ADULT => Self::Adult,
            a if a >= Self::YOUNG_ADULT => Self::YoungAdult,
            a if a >= Self::TEENAGER => Self::Teenager,
            a if a >= Self::SCHOOL_AGE => Self::SchoolAge,
            a if a >= Self::PRESCHOOL => Self::Preschool,
            _ => Self::Toddler,
        }
    }
}
