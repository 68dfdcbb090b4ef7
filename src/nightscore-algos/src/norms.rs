use nightscore_types::{AgeBracket, NormBand, NormMetric, SleepMetrics};
use serde::{Deserialize, Serialize};

use crate::helpers::time_math::minutes;

/// Age-adjusted band of one metric. `sol` and `waso` in minutes, `se` in percent.
pub fn classify_norm(age: f64, metric: NormMetric, value: f64) -> NormBand {
    let bracket = AgeBracket::from_age(age);
    match metric {
        NormMetric::Sol => NormClassifier::sol(bracket, value),
        NormMetric::Waso => NormClassifier::waso(bracket, value),
        NormMetric::Awk5plus => NormClassifier::awk5plus(bracket, value),
        NormMetric::Se => NormClassifier::se(bracket, value),
    }
}

/// Cut-points from the National Sleep Foundation sleep quality recommendations.
pub struct NormClassifier;

impl NormClassifier {
    pub const SOL_APPROPRIATE: f64 = 30.0;
    pub const SOL_UNCERTAIN: f64 = 45.0;
    pub const SOL_UNCERTAIN_OLDER: f64 = 60.0;

    pub const WASO_APPROPRIATE: f64 = 20.0;
    pub const WASO_APPROPRIATE_OLDER: f64 = 30.0;
    pub const WASO_UNCERTAIN: f64 = 40.0;
    pub const WASO_UNCERTAIN_WIDE: f64 = 50.0;

    pub const SE_APPROPRIATE: f64 = 85.0;
    pub const SE_UNCERTAIN: f64 = 75.0;
    pub const SE_UNCERTAIN_YOUNG_ADULT: f64 = 65.0;

    fn sol(bracket: AgeBracket, value: f64) -> NormBand {
        let uncertain = match bracket {
            AgeBracket::OlderAdult => Self::SOL_UNCERTAIN_OLDER,
            _ => Self::SOL_UNCERTAIN,
        };

        if value <= Self::SOL_APPROPRIATE {
            NormBand::Appropriate
        } else if value <= uncertain {
            NormBand::Uncertain
        } else {
            NormBand::Inappropriate
        }
    }

    fn awk5plus(bracket: AgeBracket, value: f64) -> NormBand {
        let (appropriate, uncertain) = match bracket {
            AgeBracket::OlderAdult => (3.0, 4.0),
            AgeBracket::Teenager => (2.0, 3.0),
            _ => (2.0, 4.0),
        };

        if value < appropriate {
            NormBand::Appropriate
        } else if value < uncertain {
            NormBand::Uncertain
        } else {
            NormBand::Inappropriate
        }
    }

    fn waso(bracket: AgeBracket, value: f64) -> NormBand {
        if value <= Self::WASO_APPROPRIATE {
            return NormBand::Appropriate;
        }

        // older adults have no inappropriate band
        if bracket == AgeBracket::OlderAdult {
            return if value <= Self::WASO_APPROPRIATE_OLDER {
                NormBand::Appropriate
            } else {
                NormBand::Uncertain
            };
        }

        let uncertain = match bracket {
            AgeBracket::Toddler | AgeBracket::Preschool | AgeBracket::Teenager => {
                Self::WASO_UNCERTAIN_WIDE
            }
            _ => Self::WASO_UNCERTAIN,
        };

        if value <= uncertain {
            NormBand::Uncertain
        } else {
            NormBand::Inappropriate
        }
    }

    fn se(bracket: AgeBracket, value: f64) -> NormBand {
        let uncertain = match bracket {
            AgeBracket::YoungAdult => Self::SE_UNCERTAIN_YOUNG_ADULT,
            _ => Self::SE_UNCERTAIN,
        };

        if value >= Self::SE_APPROPRIATE {
            NormBand::Appropriate
        } else if value >= uncertain {
            NormBand::Uncertain
        } else {
            NormBand::Inappropriate
        }
    }
}

/// The four norm bands of one scored night.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormAssessment {
    pub sol: NormBand,
    pub waso: NormBand,
    pub awk5plus: NormBand,
    pub se: NormBand,
}

impl NormAssessment {
    pub fn for_metrics(age: f64, metrics: &SleepMetrics) -> Self {
        Self {
            sol: classify_norm(age, NormMetric::Sol, minutes(metrics.sol)),
            waso: classify_norm(age, NormMetric::Waso, minutes(metrics.waso)),
            awk5plus: classify_norm(age, NormMetric::Awk5plus, f64::from(metrics.awk5plus)),
            se: classify_norm(age, NormMetric::Se, metrics.se),
        }
    }

    pub fn get(&self, metric: NormMetric) -> NormBand {
        match metric {
            NormMetric::Sol => self.sol,
            NormMetric::Waso => self.waso,
            NormMetric::Awk5plus => self.awk5plus,
            NormMetric::Se => self.se,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use NormBand::*;
    use chrono::{NaiveDate, TimeDelta};
    use nightscore_types::SleepWindow;

    #[test]
    fn waso_older_adult_band_is_wider() {
        assert_eq!(classify_norm(70.0, NormMetric::Waso, 25.0), Appropriate);
        assert_eq!(classify_norm(20.0, NormMetric::Waso, 25.0), Uncertain);
    }

    #[test]
    fn waso_bands() {
        assert_eq!(classify_norm(40.0, NormMetric::Waso, 20.0), Appropriate);
        assert_eq!(classify_norm(40.0, NormMetric::Waso, 40.0), Uncertain);
        assert_eq!(classify_norm(40.0, NormMetric::Waso, 45.0), Inappropriate);
        assert_eq!(classify_norm(15.0, NormMetric::Waso, 45.0), Uncertain);
        assert_eq!(classify_norm(4.0, NormMetric::Waso, 50.0), Uncertain);
        assert_eq!(classify_norm(8.0, NormMetric::Waso, 45.0), Inappropriate);
        assert_eq!(classify_norm(15.0, NormMetric::Waso, 51.0), Inappropriate);
        assert_eq!(classify_norm(80.0, NormMetric::Waso, 120.0), Uncertain);
    }

    #[test]
    fn sol_bands() {
        assert_eq!(classify_norm(30.0, NormMetric::Sol, 30.0), Appropriate);
        assert_eq!(classify_norm(30.0, NormMetric::Sol, 45.0), Uncertain);
        assert_eq!(classify_norm(30.0, NormMetric::Sol, 50.0), Inappropriate);
        assert_eq!(classify_norm(65.0, NormMetric::Sol, 50.0), Uncertain);
        assert_eq!(classify_norm(65.0, NormMetric::Sol, 61.0), Inappropriate);
    }

    #[test]
    fn awk5plus_bands() {
        assert_eq!(classify_norm(30.0, NormMetric::Awk5plus, 1.0), Appropriate);
        assert_eq!(classify_norm(30.0, NormMetric::Awk5plus, 3.0), Uncertain);
        assert_eq!(classify_norm(30.0, NormMetric::Awk5plus, 4.0), Inappropriate);
        assert_eq!(classify_norm(16.0, NormMetric::Awk5plus, 2.0), Uncertain);
        assert_eq!(classify_norm(16.0, NormMetric::Awk5plus, 3.0), Inappropriate);
        assert_eq!(classify_norm(70.0, NormMetric::Awk5plus, 2.0), Appropriate);
        assert_eq!(classify_norm(70.0, NormMetric::Awk5plus, 3.0), Uncertain);
    }

    #[test]
    fn se_bands() {
        assert_eq!(classify_norm(40.0, NormMetric::Se, 85.0), Appropriate);
        assert_eq!(classify_norm(40.0, NormMetric::Se, 80.0), Uncertain);
        assert_eq!(classify_norm(40.0, NormMetric::Se, 70.0), Inappropriate);
        assert_eq!(classify_norm(20.0, NormMetric::Se, 70.0), Uncertain);
        assert_eq!(classify_norm(20.0, NormMetric::Se, 60.0), Inappropriate);
    }

    #[test]
    fn never_panics_on_odd_input() {
        for value in [f64::NAN, f64::INFINITY, -1.0] {
            for age in [f64::NAN, -3.0, 200.0] {
                let _ = classify_norm(age, NormMetric::Se, value);
                let _ = classify_norm(age, NormMetric::Waso, value);
            }
        }
    }

    #[test]
    fn assessment_uses_minutes() {
        let t = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        let window = SleepWindow::new(t, t + TimeDelta::hours(8));
        let metrics = SleepMetrics {
            window,
            detected: window,
            tib: TimeDelta::hours(9),
            sol: TimeDelta::minutes(40),
            waso: TimeDelta::minutes(25),
            wasf: TimeDelta::minutes(20),
            tst: TimeDelta::hours(8),
            wb: 3,
            awk5plus: 1,
            se: 94.0,
            sf: 0.375,
        };
        let norms = NormAssessment::for_metrics(70.0, &metrics);
        assert_eq!(norms.sol, Uncertain);
        assert_eq!(norms.waso, Appropriate);
        assert_eq!(norms.awk5plus, Appropriate);
        assert_eq!(norms.get(NormMetric::Se), Appropriate);
    }
}
