//! Upload window policy
//!
//! Restricts when reporters may upload, evaluated against UTC wall-clock.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// When uploads are accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadWindow {
    /// No restriction.
    #[default]
    Always,
    /// Only on `day`, for hours in `[start_hour, end_hour)`.
    Weekly {
        day: Weekday,
        start_hour: u32,
        end_hour: u32,
    },
    /// Every hour except one.
    ExceptHour(u32),
}

impl UploadWindow {
    pub fn allows(&self, now: DateTime<Utc>) -> bool {
        match *self {
            UploadWindow::Always => true,
            UploadWindow::Weekly {
                day,
                start_hour,
                end_hour,
            } => now.weekday() == day && (start_hour..end_hour).contains(&now.hour()),
            UploadWindow::ExceptHour(hour) => now.hour() != hour,
        }
    }
}
