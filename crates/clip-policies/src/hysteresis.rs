//! Máquina de estados del modo protección.
//!
//! Dos estados (`Normal`, `Protection`) y dos contadores que actúan como
//! guardas de transición:
//! - `consecutive_low_days` sube con cada día de métricas bajas y vuelve a 0
//!   en cualquier día que no lo sea.
//! - `consecutive_recovery_days` sube sólo estando en `Protection` con
//!   métricas no bajas; en otro caso vuelve a 0.
//!
//! `Normal -> Protection` cuando `consecutive_low_days >= HYSTERESIS_DAYS`.
//! `Protection -> Normal` cuando `consecutive_recovery_days >= HYSTERESIS_DAYS`;
//! la entrada a `Normal` reinicia el contador de recuperación.

use chrono::{DateTime, Utc};
use clip_domain::{EngagementMetrics, RiskThrottleState};
use serde::{Deserialize, Serialize};

use crate::constants::{HYSTERESIS_DAYS, PROTECTION_CTR, PROTECTION_DAY1_POST_RATE, PROTECTION_REG_RATE};
use crate::earnings::Rpm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThrottleMode {
    Normal,
    Protection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThrottleTransition {
    Activated,
    Deactivated,
}

/// Las tres métricas promedio por debajo de su umbral de protección a la vez.
pub fn metrics_low(avg: &EngagementMetrics) -> bool {
    avg.ctr < PROTECTION_CTR && avg.reg_rate < PROTECTION_REG_RATE && avg.day1_post_rate < PROTECTION_DAY1_POST_RATE
}

/// Media aritmética sin ponderar; `None` si la muestra está vacía.
pub fn average_metrics(samples: &[EngagementMetrics]) -> Option<EngagementMetrics> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let sum = samples.iter().fold(EngagementMetrics::default(), |acc, m| EngagementMetrics {
        ctr: acc.ctr + m.ctr,
        reg_rate: acc.reg_rate + m.reg_rate,
        day1_post_rate: acc.day1_post_rate + m.day1_post_rate,
    });
    Some(EngagementMetrics { ctr: sum.ctr / n,
                             reg_rate: sum.reg_rate / n,
                             day1_post_rate: sum.day1_post_rate / n })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HysteresisCounters {
    pub mode: ThrottleMode,
    pub consecutive_low_days: i32,
    pub consecutive_recovery_days: i32,
}

impl HysteresisCounters {
    pub fn from_state(state: &RiskThrottleState) -> Self {
        Self { mode: if state.is_active { ThrottleMode::Protection } else { ThrottleMode::Normal },
               consecutive_low_days: state.consecutive_low_days,
               consecutive_recovery_days: state.consecutive_recovery_days }
    }

    /// Avanza un día de evaluación.
    pub fn step(self, low: bool) -> (Self, Option<ThrottleTransition>) {
        let consecutive_low_days = if low { self.consecutive_low_days + 1 } else { 0 };
        let consecutive_recovery_days = if self.mode == ThrottleMode::Protection && !low {
            self.consecutive_recovery_days + 1
        } else {
            0
        };
        let next = Self { mode: self.mode,
                          consecutive_low_days,
                          consecutive_recovery_days };
        match self.mode {
            ThrottleMode::Normal if consecutive_low_days >= HYSTERESIS_DAYS => {
                (Self { mode: ThrottleMode::Protection, ..next }, Some(ThrottleTransition::Activated))
            }
            ThrottleMode::Protection if consecutive_recovery_days >= HYSTERESIS_DAYS => {
                (Self { mode: ThrottleMode::Normal,
                        consecutive_recovery_days: 0,
                        ..next },
                 Some(ThrottleTransition::Deactivated))
            }
            _ => (next, None),
        }
    }
}

/// Resultado de aplicar un día de muestra al singleton.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrottleStep {
    pub state: RiskThrottleState,
    pub metrics_low: bool,
    pub transition: Option<ThrottleTransition>,
}

impl ThrottleStep {
    /// Calcula el nuevo estado del singleton. `version` no se toca: lo
    /// gestiona el guardado optimista del store.
    pub fn apply(prev: &RiskThrottleState, avg: EngagementMetrics, now: DateTime<Utc>) -> Self {
        let low = metrics_low(&avg);
        let (counters, transition) = HysteresisCounters::from_state(prev).step(low);
        let is_active = counters.mode == ThrottleMode::Protection;
        let mut state = RiskThrottleState { is_active,
                                            current_avg_ctr: avg.ctr,
                                            current_avg_reg_rate: avg.reg_rate,
                                            current_avg_day1_post_rate: avg.day1_post_rate,
                                            consecutive_low_days: counters.consecutive_low_days,
                                            consecutive_recovery_days: counters.consecutive_recovery_days,
                                            rpm_override: is_active.then(|| Rpm::PROTECTION.as_usd()),
                                            updated_at: Some(now),
                                            ..prev.clone() };
        match transition {
            Some(ThrottleTransition::Activated) => state.activated_at = Some(now),
            Some(ThrottleTransition::Deactivated) => state.deactivated_at = Some(now),
            None => {}
        }
        Self { state,
               metrics_low: low,
               transition }
    }
}
