//! Bono mensual por vistas acumuladas.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::MonthKey;

/// Niveles de bono; el orden de declaración es el orden de jerarquía.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BonusTier {
    None,
    Verified,
    Proven,
    Super,
}

text_enum!(BonusTier {
    None => "none",
    Verified => "verified",
    Proven => "proven",
    Super => "super",
});

/// Fila `clipper_monthly_bonuses`, única por (usuario, mes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBonus {
    pub user_id: Uuid,
    pub month_key: MonthKey,
    pub monthly_views: i64,
    /// Nivel más alto alcanzado en el mes.
    pub bonus_tier: BonusTier,
    /// Bono acumulado ya pagado en el mes.
    pub bonus_cents: i64,
    pub paid: bool,
    pub updated_at: DateTime<Utc>,
}
