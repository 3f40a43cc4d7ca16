use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlatformName {
    TikTok,
    YouTube,
}

impl PlatformName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformName::TikTok => "tiktok",
            PlatformName::YouTube => "youtube",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "tiktok" => Some(PlatformName::TikTok),
            "youtube" => Some(PlatformName::YouTube),
            _ => None,
        }
    }
}

impl Display for PlatformName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
