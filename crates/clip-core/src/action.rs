//! Acciones invocables del pipeline.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Freeze,
    Review,
    Payout,
    CheckThrottle,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Freeze, Action::Review, Action::Payout, Action::CheckThrottle];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Freeze => "freeze",
            Action::Review => "review",
            Action::Payout => "payout",
            Action::CheckThrottle => "check_throttle",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = PipelineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL.iter()
                   .copied()
                   .find(|a| a.as_str() == s)
                   .ok_or_else(|| PipelineError::UnknownAction(s.to_string()))
    }
}
