//! Registro de pago semanal por (usuario, semana ISO).
//!
//! Ciclo de vida: `frozen` -> `reviewing` -> `approved` | `held`. Las dos
//! últimas son terminales: ninguna etapa reescribe un registro finalizado.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::WeekKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Frozen,
    Reviewing,
    Approved,
    Held,
}

text_enum!(PayoutStatus {
    Frozen => "frozen",
    Reviewing => "reviewing",
    Approved => "approved",
    Held => "held",
});

impl PayoutStatus {
    /// Estados que la etapa de payout todavía puede procesar.
    pub const OPEN: [PayoutStatus; 2] = [PayoutStatus::Frozen, PayoutStatus::Reviewing];

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }
}

/// Agregado por usuario calculado en freeze/review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayoutTotals {
    pub clips_count: i32,
    pub total_net_views: i64,
    pub base_earnings_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRecord {
    pub user_id: Uuid,
    pub week_key: WeekKey,
    pub clips_count: i32,
    pub total_net_views: i64,
    pub base_earnings_cents: i64,
    pub bonus_cents: i64,
    pub total_cents: i64,
    pub status: PayoutStatus,
    pub notes: Option<String>,
    pub frozen_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl PayoutRecord {
    /// Registro recién congelado; `total_cents` refleja sólo la base hasta
    /// que el payout lo finalice.
    pub fn frozen(user_id: Uuid, week_key: WeekKey, totals: PayoutTotals, now: DateTime<Utc>) -> Self {
        Self { user_id,
               week_key,
               clips_count: totals.clips_count,
               total_net_views: totals.total_net_views,
               base_earnings_cents: totals.base_earnings_cents,
               bonus_cents: 0,
               total_cents: totals.base_earnings_cents,
               status: PayoutStatus::Frozen,
               notes: None,
               frozen_at: now,
               reviewed_at: None,
               paid_at: None }
    }

    pub fn totals(&self) -> PayoutTotals {
        PayoutTotals { clips_count: self.clips_count,
                       total_net_views: self.total_net_views,
                       base_earnings_cents: self.base_earnings_cents }
    }
}
