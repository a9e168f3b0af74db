//! Contrato de almacenamiento del pipeline y backend en memoria.

mod memory;

pub use memory::{InMemoryPayoutStore, MemoryStageLock};

use chrono::{DateTime, Utc};
use clip_domain::{BudgetCycle, BudgetSegment, BudgetSegmentCycle, ClipEvaluation, ClipSubmission, MonthKey, MonthlyBonus,
                  PayoutRecord, PayoutStatus, PayoutTotals, RiskThrottleState, WeekKey, WeekWindow};
use clip_policies::ApprovedPayout;
use uuid::Uuid;

use crate::action::Action;
use crate::errors::StoreError;

/// Almacenamiento de clips, registros de pago, presupuestos y throttle.
///
/// Contrato de concurrencia:
/// - `try_lock_stage` devuelve un guard exclusivo por `(action, scope)` o
///   `None` si otra corrida lo tiene; se libera al hacer drop.
/// - Las transiciones de estado son condicionales y devuelven `false` cuando
///   el registro ya no estaba en un estado elegible (0 filas afectadas).
/// - `approve_payout` carga `total_cents` al ledger del segmento en la misma
///   unidad de trabajo que la transición, como incremento atómico en el
///   backend; una corrida interrumpida nunca deja pagos aprobados sin gasto.
/// - `save_throttle` es optimista sobre `state.version`.
pub trait PayoutStore {
    type StageLock;

    fn try_lock_stage(&self, action: Action, scope: &str) -> Result<Option<Self::StageLock>, StoreError>;

    /// Clips con `submitted_at` en `[from, to)`.
    fn clips_submitted_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ClipSubmission>, StoreError>;
    fn clips_for_payout_week(&self, user_id: Uuid, week: &WeekKey) -> Result<Vec<ClipSubmission>, StoreError>;
    fn clips_for_user_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<Vec<ClipSubmission>, StoreError>;
    /// Clips `verified` con `submitted_at` en `[from, to]`.
    fn verified_clips_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ClipSubmission>, StoreError>;
    fn record_clip_evaluations(&mut self, evaluations: &[ClipEvaluation]) -> Result<(), StoreError>;

    /// Upsert por (user_id, week_key). Sólo sobrescribe filas abiertas
    /// (`frozen`/`reviewing`) y conserva `frozen_at` original; devuelve
    /// `false` si la fila existente ya estaba finalizada.
    fn upsert_frozen_payout(&mut self, record: &PayoutRecord) -> Result<bool, StoreError>;
    fn payouts_for_week(&self, week: &WeekKey, statuses: &[PayoutStatus]) -> Result<Vec<PayoutRecord>, StoreError>;
    /// `frozen -> reviewing` con totales recalculados.
    fn mark_reviewing(&mut self,
                      user_id: Uuid,
                      week: &WeekKey,
                      totals: PayoutTotals,
                      at: DateTime<Utc>)
                      -> Result<bool, StoreError>;
    /// `frozen|reviewing -> approved`, upsert del bono mensual y cargo de
    /// `approved.total_cents` al ledger `approved.segment_cycle_id`, todo en la
    /// misma unidad de trabajo. Un ledger inexistente es error y no se
    /// aplica nada.
    fn approve_payout(&mut self,
                      week: &WeekKey,
                      approved: &ApprovedPayout,
                      bonus: &MonthlyBonus,
                      at: DateTime<Utc>)
                      -> Result<bool, StoreError>;
    /// `frozen|reviewing -> held`; `total_cents` no se modifica.
    fn hold_payout(&mut self, user_id: Uuid, week: &WeekKey, reason: &str) -> Result<bool, StoreError>;
    /// Suma de `total_cents` aprobados con `paid_at >= since`.
    fn approved_cents_since(&self, since: DateTime<Utc>) -> Result<i64, StoreError>;

    /// Ciclo cuyo `start_date` cae dentro de la ventana.
    fn budget_cycle_starting_in(&self, window: &WeekWindow) -> Result<Option<BudgetCycle>, StoreError>;
    fn segment_for_user(&self, user_id: Uuid) -> Result<Option<BudgetSegment>, StoreError>;
    fn segment_cycle(&self, segment_id: Uuid, cycle_id: Uuid) -> Result<Option<BudgetSegmentCycle>, StoreError>;

    fn monthly_bonus(&self, user_id: Uuid, month: &MonthKey) -> Result<Option<MonthlyBonus>, StoreError>;

    fn load_throttle(&self) -> Result<RiskThrottleState, StoreError>;
    /// Guarda si la versión persistida coincide con `state.version` y la
    /// incrementa; `false` si otra corrida la cambió.
    fn save_throttle(&mut self, state: &RiskThrottleState) -> Result<bool, StoreError>;
}
