//! Presupuestos: ciclo global, segmentos de creadores y su ledger por ciclo.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Estado de aprobación compartido por `BudgetCycle` y `BudgetSegmentCycle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleStatus {
    Pending,
    Approved,
    Killed,
}

text_enum!(CycleStatus {
    Pending => "pending",
    Approved => "approved",
    Killed => "killed",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetCycle {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CycleStatus,
    pub global_weekly_limit_cents: i64,
    pub global_monthly_limit_cents: i64,
    pub max_payout_per_clipper_week_cents: i64,
    pub max_payout_per_clip_cents: i64,
}

/// Cohorte de creadores con techo propio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSegment {
    pub id: Uuid,
    pub name: String,
    pub weekly_limit_cents: i64,
    pub monthly_limit_cents: i64,
}

/// Ledger de un segmento dentro de un ciclo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSegmentCycle {
    pub id: Uuid,
    pub segment_id: Uuid,
    pub cycle_id: Uuid,
    pub status: CycleStatus,
    pub spent_cents: i64,
    pub remaining_cents: i64,
}

/// Pertenencia de un usuario a un segmento. Relación univaluada: a lo sumo un
/// segmento activo por usuario (PK = user_id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMembership {
    pub user_id: Uuid,
    pub segment_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}
