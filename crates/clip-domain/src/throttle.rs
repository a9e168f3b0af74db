//! Estado singleton del modo protección (risk throttle).
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fila única `clipper_risk_throttle`.
///
/// `version` es el token de concurrencia optimista: cada guardado exitoso lo
/// incrementa y un guardado con versión obsoleta se rechaza.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskThrottleState {
    pub is_active: bool,
    pub current_avg_ctr: f64,
    pub current_avg_reg_rate: f64,
    pub current_avg_day1_post_rate: f64,
    pub consecutive_low_days: i32,
    pub consecutive_recovery_days: i32,
    /// RPM en USD por 1000 vistas mientras la protección está activa.
    pub rpm_override: Option<f64>,
    pub activated_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i64,
}
