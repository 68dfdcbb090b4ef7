use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use chrono::{NaiveDateTime, TimeDelta};
use nightscore_algos::ValidationNight;
use nightscore_types::{
    DiaryEntry, DiarySchedule, EpochSignal, NightKey, SignalError, Subject,
};
use serde::{Deserialize, Serialize};

use crate::provider::EpochSignalProvider;

/// Classifier output, one probability per epoch from `start`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionTrack {
    pub start: NaiveDateTime,
    pub cadence_secs: i64,
    pub values: Vec<f64>,
}

impl PredictionTrack {
    pub fn to_signal(&self) -> Result<EpochSignal, SignalError> {
        EpochSignal::from_values(
            self.start,
            TimeDelta::seconds(self.cadence_secs),
            self.values.iter().copied(),
        )
    }
}

/// Raw wrist accelerometer sample, in g.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccelSample {
    pub time: NaiveDateTime,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub name: String,
    #[serde(default)]
    pub predictions: Option<PredictionTrack>,
    #[serde(default)]
    pub accelerometer: Vec<AccelSample>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    #[serde(flatten)]
    pub subject: Subject,
    #[serde(default)]
    pub recordings: Vec<Recording>,
    #[serde(default)]
    pub diary: Vec<DiaryEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub subjects: Vec<SubjectRecord>,
}

/// Everything needed to score or validate one night.
#[derive(Clone, Debug, PartialEq)]
pub struct NightInput {
    pub key: NightKey,
    pub age: f64,
    pub schedule: Option<DiarySchedule>,
    pub signal: Option<EpochSignal>,
}

impl NightInput {
    pub fn validation_night(&self) -> ValidationNight {
        ValidationNight::new(self.key.clone(), self.signal.clone(), self.schedule.clone())
    }
}

impl Dataset {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// One input per diary entry, sorted by night. The signal covers `[t1 - margin, t4 + margin]`
    /// and comes from the first recording with data inside the time in bed.
    pub fn nights(&self, provider: &dyn EpochSignalProvider, margin: TimeDelta) -> Vec<NightInput> {
        let mut nights = self
            .subjects
            .iter()
            .flat_map(|record| {
                record.diary.iter().map(move |entry| {
                    let key = NightKey::new(&record.subject.code, entry.date);
                    let schedule = entry
                        .resolve()
                        .inspect_err(|e| warn!("{key}: diary skipped ({e})"))
                        .ok();
                    let signal = schedule
                        .as_ref()
                        .and_then(|s| Self::match_recording(record, s, provider, margin, &key));

                    NightInput {
                        age: record.subject.age,
                        key,
                        schedule,
                        signal,
                    }
                })
            })
            .collect::<Vec<_>>();

        nights.sort_by(|a, b| a.key.cmp(&b.key));
        nights
    }

    fn match_recording(
        record: &SubjectRecord,
        schedule: &DiarySchedule,
        provider: &dyn EpochSignalProvider,
        margin: TimeDelta,
        key: &NightKey,
    ) -> Option<EpochSignal> {
        for recording in &record.recordings {
            match provider.read(recording, schedule.t1 - margin, schedule.t4 + margin) {
                Ok(Some(signal)) if !signal.range_inclusive(schedule.t1, schedule.t4).is_empty() => {
                    debug!("{key}: using recording {}", recording.name);
                    return Some(signal);
                }
                Ok(_) => {}
                Err(e) => warn!("{key}: recording {} unreadable ({e:#})", recording.name),
            }
        }

        debug!("{key}: no recording covers the night");
        None
    }
}
