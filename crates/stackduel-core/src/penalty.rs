use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a clear reported by one player turns into penalty rows for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyPolicy {
    /// Single clears send nothing; `n >= 2` cleared rows send `n / 2`.
    #[default]
    Halved,
    /// Every positive clear is forwarded unchanged.
    Raw,
}

impl PenaltyPolicy {
    /// Penalty rows owed to the opponent for `cleared` rows, or `None` when
    /// the clear earns nothing.
    pub fn penalty_for(self, cleared: u32) -> Option<u32> {
        let count = match self {
            Self::Halved if cleared < 2 => 0,
            Self::Halved => cleared / 2,
            Self::Raw => cleared,
        };
        (count > 0).then_some(count)
    }
}

impl FromStr for PenaltyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "halved" => Ok(Self::Halved),
            "raw" => Ok(Self::Raw),
            other => Err(format!("unknown penalty policy: {other}")),
        }
    }
}
