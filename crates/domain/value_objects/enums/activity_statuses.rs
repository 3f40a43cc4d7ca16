use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Primary,
    Secondary,
    Tertiary,
    Success,
    Warning,
    Error,
    Surface,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Primary => "primary",
            ActivityStatus::Secondary => "secondary",
            ActivityStatus::Tertiary => "tertiary",
            ActivityStatus::Success => "success",
            ActivityStatus::Warning => "warning",
            ActivityStatus::Error => "error",
            ActivityStatus::Surface => "surface",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "primary" => Some(ActivityStatus::Primary),
            "secondary" => Some(ActivityStatus::Secondary),
            "tertiary" => Some(ActivityStatus::Tertiary),
            "success" => Some(ActivityStatus::Success),
            "warning" => Some(ActivityStatus::Warning),
            "error" => Some(ActivityStatus::Error),
            "surface" => Some(ActivityStatus::Surface),
            _ => None,
        }
    }
}

impl Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_round_trips_through_its_column_value() {
        for status in [
            ActivityStatus::Primary,
            ActivityStatus::Secondary,
            ActivityStatus::Tertiary,
            ActivityStatus::Success,
            ActivityStatus::Warning,
            ActivityStatus::Error,
            ActivityStatus::Surface,
        ] {
            assert_eq!(ActivityStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!(ActivityStatus::from_str("Success"), None);
        assert_eq!(ActivityStatus::from_str(""), None);
    }
}
