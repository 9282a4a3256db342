use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter};

use crate::error::QueryError;

/// Solar plant (site). The set of plants is closed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Plant {
    Plant1,
    Plant2,
}

impl Plant {
    /// Numeric identifier used by the HTTP API (`plant=1`).
    pub fn number(self) -> u8 {
        match self {
            Plant::Plant1 => 1,
            Plant::Plant2 => 2,
        }
    }
}

impl FromStr for Plant {
    type Err = QueryError;

    /// Accepts `1`, `2`, `plant1`, `Plant2` (any case).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        match lower.strip_prefix("plant").unwrap_or(&lower) {
            "1" => Ok(Plant::Plant1),
            "2" => Ok(Plant::Plant2),
            _ => Err(QueryError::InvalidPlant(trimmed.to_string())),
        }
    }
}
