//! Expiration choices offered to the person creating an item.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Upper bound for raw second selections (100 years).
const MAX_SECONDS: i64 = 100 * 365 * 86_400;

/// An enumerated expiry selection, resolved to an absolute time on submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiration {
    /// One hour.
    OneHour,
    /// Eight hours.
    EightHours,
    /// One day.
    OneDay,
    /// Seven days.
    SevenDays,
    /// Fourteen days.
    FourteenDays,
    /// An arbitrary number of seconds.
    Seconds(u64),
    /// Never expires; `expires_at` is omitted.
    Permanent,
}

impl Default for Expiration {
    fn default() -> Self {
        Self::SevenDays
    }
}

impl Expiration {
    /// Length of the selection, `None` for [`Expiration::Permanent`].
    pub fn duration(&self) -> Option<Duration> {
        let seconds = match self {
            Self::OneHour => 3_600,
            Self::EightHours => 28_800,
            Self::OneDay => 86_400,
            Self::SevenDays => 604_800,
            Self::FourteenDays => 1_209_600,
            Self::Seconds(s) => i64::try_from(*s).unwrap_or(MAX_SECONDS).min(MAX_SECONDS),
            Self::Permanent => return None,
        };
        Some(Duration::seconds(seconds))
    }

    /// Absolute expiry for a submission made at `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.duration().and_then(|d| now.checked_add_signed(d))
    }
}

impl FromStr for Expiration {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1h" => Ok(Self::OneHour),
            "8h" => Ok(Self::EightHours),
            "1d" => Ok(Self::OneDay),
            "7d" => Ok(Self::SevenDays),
            "14d" => Ok(Self::FourteenDays),
            "permanent" | "never" => Ok(Self::Permanent),
            other => match other.parse::<u64>() {
                Ok(0) => Err(AppError::validation("Expiration must be positive")),
                Ok(seconds) => Ok(Self::Seconds(seconds)),
                Err(_) => Err(AppError::validation(format!(
                    "Unknown expiration '{s}' (use 1h, 8h, 1d, 7d, 14d, permanent, or seconds)"
                ))),
            },
        }
    }
}
