use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Request-rate label written on every request log row.
///
/// Derived solely from the device's requests in the trailing hour
/// (`rn_ph`, which includes the request being logged).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    #[default]
    Normal,
    Busy,
    #[serde(rename = "Very Busy")]
    VeryBusy,
    Abnormal,
}

pub const BUSY_THRESHOLD: i64 = 50;
pub const VERY_BUSY_THRESHOLD: i64 = 100;
pub const ABNORMAL_THRESHOLD: i64 = 500;

impl RequestStatus {
    pub fn classify(requests_last_hour: i64) -> Self {
        if requests_last_hour < BUSY_THRESHOLD {
            Self::Normal
        } else if requests_last_hour < VERY_BUSY_THRESHOLD {
            Self::Busy
        } else if requests_last_hour < ABNORMAL_THRESHOLD {
            Self::VeryBusy
        } else {
            Self::Abnormal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Busy => "Busy",
            Self::VeryBusy => "Very Busy",
            Self::Abnormal => "Abnormal",
        }
    }

    /// Background color used wherever the status is rendered.
    pub fn color(self) -> &'static str {
        match self {
            Self::Normal => "#06d6a0",
            Self::Busy => "#ffba08",
            Self::VeryBusy => "#f48c06",
            Self::Abnormal => "#d00000",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" => Ok(Self::Normal),
            "Busy" => Ok(Self::Busy),
            "Very Busy" => Ok(Self::VeryBusy),
            "Abnormal" => Ok(Self::Abnormal),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}
