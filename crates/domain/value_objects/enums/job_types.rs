use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobType {
    TikTokTokenExchange,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::TikTokTokenExchange => "TikTokTokenExchange",
        }
    }
}

impl Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
