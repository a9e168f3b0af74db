//! Cuerpos de respuesta de cada etapa.

use clip_domain::{EngagementMetrics, WeekKey};
use clip_policies::ThrottleTransition;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::Action;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreezeReport {
    pub action: Action,
    pub week_key: WeekKey,
    /// Usuarios con registro `frozen` escrito en esta corrida.
    pub users: usize,
    /// Clips evaluados.
    pub clips: usize,
    /// Usuarios cuyo registro ya estaba finalizado y no se tocó.
    pub skipped_finalized: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewReport {
    pub action: Action,
    pub week_key: WeekKey,
    pub reviewed: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldReason {
    pub user_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutReport {
    pub action: Action,
    pub week_key: WeekKey,
    pub paid: usize,
    pub held: usize,
    #[serde(rename = "heldReasons")]
    pub held_reasons: Vec<HeldReason>,
    pub paid_cents: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrottleReport {
    pub action: Action,
    /// `true` cuando la muestra no alcanzó el mínimo y no se evaluó.
    pub skipped: bool,
    pub samples: usize,
    pub is_active: bool,
    pub metrics_low: bool,
    pub consecutive_low_days: i32,
    pub consecutive_recovery_days: i32,
    pub transition: Option<ThrottleTransition>,
    pub rpm_override: Option<f64>,
    pub averages: Option<EngagementMetrics>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageReport {
    Freeze(FreezeReport),
    Review(ReviewReport),
    Payout(PayoutReport),
    Throttle(ThrottleReport),
}

impl StageReport {
    pub fn action(&self) -> Action {
        match self {
            StageReport::Freeze(r) => r.action,
            StageReport::Review(r) => r.action,
            StageReport::Payout(r) => r.action,
            StageReport::Throttle(r) => r.action,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            StageReport::Freeze(r) => &r.message,
            StageReport::Review(r) => &r.message,
            StageReport::Payout(r) => &r.message,
            StageReport::Throttle(r) => &r.message,
        }
    }
}
