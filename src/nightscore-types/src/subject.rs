use std::fmt::Display;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub code: String,
    /// Years.
    pub age: f64,
    #[serde(default)]
    pub sex: Option<Sex>,
}

/// Identifies a night: subject code and the diary date the night starts on.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NightKey {
    pub subject: String,
    pub date: NaiveDate,
}

impl NightKey {
    pub fn new(subject: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            subject: subject.into(),
            date,
        }
    }
}

impl Display for NightKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.subject, self.date)
    }
}
