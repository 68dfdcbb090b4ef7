use chrono::{NaiveTime, TimeDelta, Timelike as _};

/// `HH:MM` rendering for durations and clock times.
pub trait FormatHM {
    fn format_hm(&self) -> String;
}

impl FormatHM for TimeDelta {
    fn format_hm(&self) -> String {
        (self.num_seconds() as f64 / 60.0).format_hm()
    }
}

/// Minutes.
impl FormatHM for f64 {
    fn format_hm(&self) -> String {
        if !self.is_finite() {
            return "--:--".to_string();
        }
        let sign = if *self < 0.0 { "-" } else { "" };
        let minutes = self.abs().round() as i64;
        format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60)
    }
}

impl FormatHM for NaiveTime {
    fn format_hm(&self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }
}

impl<T: FormatHM> FormatHM for Option<T> {
    fn format_hm(&self) -> String {
        self.as_ref()
            .map_or_else(|| "--:--".to_string(), FormatHM::format_hm)
    }
}
