use chrono::{DateTime, Utc};
use clip_core::{Action, PayoutStore, StoreError};
use clip_domain::{BudgetCycle, BudgetSegment, BudgetSegmentCycle, ClipEvaluation, ClipStatus, ClipSubmission, MonthKey,
                  MonthlyBonus, PayoutRecord, PayoutStatus, PayoutTotals, RiskThrottleState, WeekKey, WeekWindow};
use clip_policies::ApprovedPayout;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text, Timestamptz, Uuid as SqlUuid};
use diesel::upsert::excluded;
use log::debug;
use uuid::Uuid;

use super::lock::{advisory_key, PgStageLock};
use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::models::{BudgetCycleRow, BudgetSegmentCycleRow, BudgetSegmentRow, ClipRow, MonthlyBonusRow,
                    NewMonthlyBonusRow, PayoutRow, ThrottleChanges, ThrottleRow, THROTTLE_ROW_ID};
use crate::schema::{budget_cycles, budget_segment_cycles, budget_segments, clip_submissions, clipper_monthly_bonuses,
                    clipper_payouts, clipper_risk_throttle, clipper_segment_membership};

const OPEN: [&str; 2] = ["frozen", "reviewing"];

// Upsert condicional: en conflicto sólo reescribe filas abiertas y conserva
// `frozen_at`. 0 filas afectadas => la fila existente está finalizada.
const UPSERT_FROZEN_SQL: &str = "INSERT INTO clipper_payouts \
     (user_id, week_key, clips_count, total_net_views, base_earnings_cents, bonus_cents, total_cents, status, frozen_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
     ON CONFLICT (user_id, week_key) DO UPDATE SET \
       clips_count = EXCLUDED.clips_count, \
       total_net_views = EXCLUDED.total_net_views, \
       base_earnings_cents = EXCLUDED.base_earnings_cents, \
       bonus_cents = EXCLUDED.bonus_cents, \
       total_cents = EXCLUDED.total_cents, \
       status = EXCLUDED.status, \
       notes = NULL, \
       reviewed_at = NULL, \
       paid_at = NULL \
     WHERE clipper_payouts.status IN ('frozen', 'reviewing')";

#[derive(QueryableByName)]
struct CentsTotal {
    #[diesel(sql_type = BigInt)]
    total: i64,
}

/// `PayoutStore` sobre Postgres. Cada operación es una unidad de trabajo
/// con reintento ante errores transitorios; las que escriben varias filas
/// corren en una transacción.
pub struct PgPayoutStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgPayoutStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    fn run<T, F>(&self, mut f: F) -> Result<T, StoreError>
        where F: FnMut(&mut PgConnection) -> Result<T, PersistenceError>
    {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            f(&mut conn)
        }).map_err(StoreError::from)
    }

    fn clips_from_rows(rows: Vec<ClipRow>) -> Result<Vec<ClipSubmission>, StoreError> {
        rows.into_iter().map(ClipSubmission::try_from).collect()
    }

    /// Inserta clips tal cual (carga de datos y tests).
    pub fn insert_clips(&self, clips: &[ClipSubmission]) -> Result<usize, StoreError> {
        let rows: Vec<crate::models::NewClipRow<'_>> = clips.iter().map(Into::into).collect();
        self.run(|conn| {
                diesel::insert_into(clip_submissions::table).values(&rows)
                                                            .execute(conn)
                                                            .map_err(PersistenceError::from)
            })
    }

    pub fn insert_budget_cycle(&self, cycle: &BudgetCycle) -> Result<(), StoreError> {
        let row = BudgetCycleRow::from(cycle);
        self.run(|conn| {
                diesel::insert_into(budget_cycles::table).values(&row)
                                                         .execute(conn)
                                                         .map(|_| ())
                                                         .map_err(PersistenceError::from)
            })
    }

    /// Alta de un segmento con su ledger para `cycle_id` y la membresía de
    /// `members` (reemplaza la membresía previa de cada usuario).
    pub fn insert_segment(&self,
                          segment: &BudgetSegment,
                          ledger: &BudgetSegmentCycle,
                          members: &[Uuid],
                          at: DateTime<Utc>)
                          -> Result<(), StoreError> {
        let segment_row = BudgetSegmentRow { id: segment.id,
                                             name: segment.name.clone(),
                                             weekly_limit_cents: segment.weekly_limit_cents,
                                             monthly_limit_cents: segment.monthly_limit_cents };
        let ledger_row = BudgetSegmentCycleRow { id: ledger.id,
                                                 segment_id: ledger.segment_id,
                                                 cycle_id: ledger.cycle_id,
                                                 status: ledger.status.as_str().to_string(),
                                                 spent_cents: ledger.spent_cents,
                                                 remaining_cents: ledger.remaining_cents };
        self.run(|conn| {
                conn.transaction(|tx| {
                        diesel::insert_into(budget_segments::table).values(&segment_row).execute(tx)?;
                        diesel::insert_into(budget_segment_cycles::table).values(&ledger_row).execute(tx)?;
                        for user_id in members {
                            diesel::insert_into(clipper_segment_membership::table)
                                .values((clipper_segment_membership::user_id.eq(*user_id),
                                         clipper_segment_membership::segment_id.eq(segment.id),
                                         clipper_segment_membership::assigned_at.eq(at)))
                                .on_conflict(clipper_segment_membership::user_id)
                                .do_update()
                                .set((clipper_segment_membership::segment_id.eq(segment.id),
                                      clipper_segment_membership::assigned_at.eq(at)))
                                .execute(tx)?;
                        }
                        Ok::<(), diesel::result::Error>(())
                    })
                    .map_err(PersistenceError::from)
            })
    }

    /// Lee un registro de pago por su clave natural.
    pub fn payout(&self, user_id: Uuid, week: &WeekKey) -> Result<Option<PayoutRecord>, StoreError> {
        let row: Option<PayoutRow> = self.run(|conn| {
                                             clipper_payouts::table.filter(clipper_payouts::user_id.eq(user_id))
                                                                   .filter(clipper_payouts::week_key.eq(week.as_str()))
                                                                   .select(PayoutRow::as_select())
                                                                   .first(conn)
                                                                   .optional()
                                                                   .map_err(PersistenceError::from)
                                         })?;
        row.map(PayoutRecord::try_from).transpose()
    }

    pub fn segment_cycle_by_id(&self, id: Uuid) -> Result<Option<BudgetSegmentCycle>, StoreError> {
        let row: Option<BudgetSegmentCycleRow> = self.run(|conn| {
                                                         budget_segment_cycles::table.find(id)
                                                                                     .select(BudgetSegmentCycleRow::as_select())
                                                                                     .first(conn)
                                                                                     .optional()
                                                                                     .map_err(PersistenceError::from)
                                                     })?;
        row.map(BudgetSegmentCycle::try_from).transpose()
    }
}

impl<P: ConnectionProvider> PayoutStore for PgPayoutStore<P> {
    type StageLock = PgStageLock;

    fn try_lock_stage(&self, action: Action, scope: &str) -> Result<Option<Self::StageLock>, StoreError> {
        let key = advisory_key(action, scope);
        with_retry(|| PgStageLock::try_acquire(self.provider.connection()?, key)).map_err(StoreError::from)
    }

    fn clips_submitted_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ClipSubmission>, StoreError> {
        let rows: Vec<ClipRow> = self.run(|conn| {
                           clip_submissions::table.filter(clip_submissions::submitted_at.ge(from))
                                                  .filter(clip_submissions::submitted_at.lt(to))
                                                  .order((clip_submissions::user_id.asc(), clip_submissions::submitted_at.asc()))
                                                  .select(ClipRow::as_select())
                                                  .load(conn)
                                                  .map_err(PersistenceError::from)
                       })?;
        Self::clips_from_rows(rows)
    }

    fn clips_for_payout_week(&self, user_id: Uuid, week: &WeekKey) -> Result<Vec<ClipSubmission>, StoreError> {
        let rows: Vec<ClipRow> = self.run(|conn| {
                           clip_submissions::table.filter(clip_submissions::user_id.eq(user_id))
                                                  .filter(clip_submissions::payout_week.eq(week.as_str()))
                                                  .order(clip_submissions::submitted_at.asc())
                                                  .select(ClipRow::as_select())
                                                  .load(conn)
                                                  .map_err(PersistenceError::from)
                       })?;
        Self::clips_from_rows(rows)
    }

    fn clips_for_user_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<Vec<ClipSubmission>, StoreError> {
        let rows: Vec<ClipRow> = self.run(|conn| {
                           clip_submissions::table.filter(clip_submissions::user_id.eq(user_id))
                                                  .filter(clip_submissions::submitted_at.ge(since))
                                                  .select(ClipRow::as_select())
                                                  .load(conn)
                                                  .map_err(PersistenceError::from)
                       })?;
        Self::clips_from_rows(rows)
    }

    fn verified_clips_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ClipSubmission>, StoreError> {
        let rows: Vec<ClipRow> = self.run(|conn| {
                           clip_submissions::table.filter(clip_submissions::status.eq(ClipStatus::Verified.as_str()))
                                                  .filter(clip_submissions::submitted_at.ge(from))
                                                  .filter(clip_submissions::submitted_at.le(to))
                                                  .select(ClipRow::as_select())
                                                  .load(conn)
                                                  .map_err(PersistenceError::from)
                       })?;
        Self::clips_from_rows(rows)
    }

    fn record_clip_evaluations(&mut self, evaluations: &[ClipEvaluation]) -> Result<(), StoreError> {
        if evaluations.is_empty() {
            return Ok(());
        }
        self.run(|conn| {
                conn.transaction(|tx| {
                        for e in evaluations {
                            diesel::update(clip_submissions::table.find(e.clip_id))
                                .set((clip_submissions::is_activated.eq(e.is_activated),
                                      clip_submissions::net_views.eq(e.net_views),
                                      clip_submissions::payout_week.eq(Some(e.payout_week.as_str()))))
                                .execute(tx)?;
                        }
                        Ok::<(), diesel::result::Error>(())
                    })
                    .map_err(PersistenceError::from)
            })?;
        debug!("recorded {} clip evaluations", evaluations.len());
        Ok(())
    }

    fn upsert_frozen_payout(&mut self, record: &PayoutRecord) -> Result<bool, StoreError> {
        let affected = self.run(|conn| {
                               diesel::sql_query(UPSERT_FROZEN_SQL).bind::<SqlUuid, _>(record.user_id)
                                                                   .bind::<Text, _>(record.week_key.as_str())
                                                                   .bind::<Integer, _>(record.clips_count)
                                                                   .bind::<BigInt, _>(record.total_net_views)
                                                                   .bind::<BigInt, _>(record.base_earnings_cents)
                                                                   .bind::<BigInt, _>(record.bonus_cents)
                                                                   .bind::<BigInt, _>(record.total_cents)
                                                                   .bind::<Text, _>(record.status.as_str())
                                                                   .bind::<Timestamptz, _>(record.frozen_at)
                                                                   .execute(conn)
                                                                   .map_err(PersistenceError::from)
                           })?;
        Ok(affected > 0)
    }

    fn payouts_for_week(&self, week: &WeekKey, statuses: &[PayoutStatus]) -> Result<Vec<PayoutRecord>, StoreError> {
        let statuses: Vec<&str> = statuses.iter().map(PayoutStatus::as_str).collect();
        let rows: Vec<PayoutRow> = self.run(|conn| {
                                           clipper_payouts::table.filter(clipper_payouts::week_key.eq(week.as_str()))
                                                                 .filter(clipper_payouts::status.eq_any(statuses.iter().copied()))
                                                                 .order(clipper_payouts::user_id.asc())
                                                                 .select(PayoutRow::as_select())
                                                                 .load(conn)
                                                                 .map_err(PersistenceError::from)
                                       })?;
        rows.into_iter().map(PayoutRecord::try_from).collect()
    }

    fn mark_reviewing(&mut self,
                      user_id: Uuid,
                      week: &WeekKey,
                      totals: PayoutTotals,
                      at: DateTime<Utc>)
                      -> Result<bool, StoreError> {
        let affected = self.run(|conn| {
                               diesel::update(clipper_payouts::table.filter(clipper_payouts::user_id.eq(user_id))
                                                                    .filter(clipper_payouts::week_key.eq(week.as_str()))
                                                                    .filter(clipper_payouts::status.eq(PayoutStatus::Frozen.as_str())))
                                   .set((clipper_payouts::clips_count.eq(totals.clips_count),
                                         clipper_payouts::total_net_views.eq(totals.total_net_views),
                                         clipper_payouts::base_earnings_cents.eq(totals.base_earnings_cents),
                                         clipper_payouts::total_cents.eq(clipper_payouts::bonus_cents + totals.base_earnings_cents),
                                         clipper_payouts::status.eq(PayoutStatus::Reviewing.as_str()),
                                         clipper_payouts::reviewed_at.eq(Some(at))))
                                   .execute(conn)
                                   .map_err(PersistenceError::from)
                           })?;
        Ok(affected > 0)
    }

    fn approve_payout(&mut self,
                      week: &WeekKey,
                      approved: &ApprovedPayout,
                      bonus: &MonthlyBonus,
                      at: DateTime<Utc>)
                      -> Result<bool, StoreError> {
        let bonus_row = NewMonthlyBonusRow::from(bonus);
        self.run(|conn| {
                conn.transaction(|tx| {
                        let n = diesel::update(clipper_payouts::table.filter(clipper_payouts::user_id.eq(approved.user_id))
                                                                     .filter(clipper_payouts::week_key.eq(week.as_str()))
                                                                     .filter(clipper_payouts::status.eq_any(OPEN)))
                            .set((clipper_payouts::base_earnings_cents.eq(approved.base_earnings_cents),
                                  clipper_payouts::bonus_cents.eq(approved.bonus_cents),
                                  clipper_payouts::total_cents.eq(approved.total_cents),
                                  clipper_payouts::status.eq(PayoutStatus::Approved.as_str()),
                                  clipper_payouts::paid_at.eq(Some(at))))
                            .execute(tx)?;
                        if n == 0 {
                            return Ok(false);
                        }
                        if let Some(id) = approved.segment_cycle_id {
                            let delta = approved.total_cents;
                            let charged = diesel::update(budget_segment_cycles::table.find(id))
                                .set((budget_segment_cycles::spent_cents.eq(budget_segment_cycles::spent_cents + delta),
                                      budget_segment_cycles::remaining_cents
                                          .eq(budget_segment_cycles::remaining_cents - delta)))
                                .execute(tx)?;
                            // sin ledger no hay aprobación: rollback
                            if charged == 0 {
                                return Err(diesel::result::Error::NotFound);
                            }
                        }
                        diesel::insert_into(clipper_monthly_bonuses::table)
                            .values(&bonus_row)
                            .on_conflict((clipper_monthly_bonuses::user_id, clipper_monthly_bonuses::month_key))
                            .do_update()
                            .set((clipper_monthly_bonuses::monthly_views.eq(excluded(clipper_monthly_bonuses::monthly_views)),
                                  clipper_monthly_bonuses::bonus_tier.eq(excluded(clipper_monthly_bonuses::bonus_tier)),
                                  clipper_monthly_bonuses::bonus_cents.eq(excluded(clipper_monthly_bonuses::bonus_cents)),
                                  clipper_monthly_bonuses::paid.eq(excluded(clipper_monthly_bonuses::paid)),
                                  clipper_monthly_bonuses::updated_at.eq(excluded(clipper_monthly_bonuses::updated_at))))
                            .execute(tx)?;
                        Ok::<bool, diesel::result::Error>(true)
                    })
                    .map_err(PersistenceError::from)
            })
    }

    fn hold_payout(&mut self, user_id: Uuid, week: &WeekKey, reason: &str) -> Result<bool, StoreError> {
        let affected = self.run(|conn| {
                               diesel::update(clipper_payouts::table.filter(clipper_payouts::user_id.eq(user_id))
                                                                    .filter(clipper_payouts::week_key.eq(week.as_str()))
                                                                    .filter(clipper_payouts::status.eq_any(OPEN)))
                                   .set((clipper_payouts::status.eq(PayoutStatus::Held.as_str()),
                                         clipper_payouts::notes.eq(Some(reason))))
                                   .execute(conn)
                                   .map_err(PersistenceError::from)
                           })?;
        Ok(affected > 0)
    }

    fn approved_cents_since(&self, since: DateTime<Utc>) -> Result<i64, StoreError> {
        let row: CentsTotal = self.run(|conn| {
                                      diesel::sql_query("SELECT COALESCE(SUM(total_cents), 0)::BIGINT AS total \
                                                         FROM clipper_payouts WHERE status = 'approved' AND paid_at >= $1")
                                          .bind::<Timestamptz, _>(since)
                                          .get_result(conn)
                                          .map_err(PersistenceError::from)
                                  })?;
        Ok(row.total)
    }

    fn budget_cycle_starting_in(&self, window: &WeekWindow) -> Result<Option<BudgetCycle>, StoreError> {
        let (from, to) = (window.start.date_naive(), window.end.date_naive());
        let row: Option<BudgetCycleRow> = self.run(|conn| {
                                                  budget_cycles::table.filter(budget_cycles::start_date.ge(from))
                                                                      .filter(budget_cycles::start_date.lt(to))
                                                                      .order((budget_cycles::start_date.asc(), budget_cycles::id.asc()))
                                                                      .select(BudgetCycleRow::as_select())
                                                                      .first(conn)
                                                                      .optional()
                                                                      .map_err(PersistenceError::from)
                                              })?;
        row.map(BudgetCycle::try_from).transpose()
    }

    fn segment_for_user(&self, user_id: Uuid) -> Result<Option<BudgetSegment>, StoreError> {
        let row: Option<BudgetSegmentRow> = self.run(|conn| {
                                                    clipper_segment_membership::table
                                                        .inner_join(budget_segments::table)
                                                        .filter(clipper_segment_membership::user_id.eq(user_id))
                                                        .select(BudgetSegmentRow::as_select())
                                                        .first(conn)
                                                        .optional()
                                                        .map_err(PersistenceError::from)
                                                })?;
        Ok(row.map(BudgetSegment::from))
    }

    fn segment_cycle(&self, segment_id: Uuid, cycle_id: Uuid) -> Result<Option<BudgetSegmentCycle>, StoreError> {
        let row: Option<BudgetSegmentCycleRow> =
            self.run(|conn| {
                    budget_segment_cycles::table.filter(budget_segment_cycles::segment_id.eq(segment_id))
                                                .filter(budget_segment_cycles::cycle_id.eq(cycle_id))
                                                .select(BudgetSegmentCycleRow::as_select())
                                                .first(conn)
                                                .optional()
                                                .map_err(PersistenceError::from)
                })?;
        row.map(BudgetSegmentCycle::try_from).transpose()
    }

    fn monthly_bonus(&self, user_id: Uuid, month: &MonthKey) -> Result<Option<MonthlyBonus>, StoreError> {
        let row: Option<MonthlyBonusRow> =
            self.run(|conn| {
                    clipper_monthly_bonuses::table.find((user_id, month.as_str()))
                                                  .select(MonthlyBonusRow::as_select())
                                                  .first(conn)
                                                  .optional()
                                                  .map_err(PersistenceError::from)
                })?;
        row.map(|r| r.into_domain(month)).transpose()
    }

    fn load_throttle(&self) -> Result<RiskThrottleState, StoreError> {
        let row: Option<ThrottleRow> = self.run(|conn| {
                                               clipper_risk_throttle::table.find(THROTTLE_ROW_ID)
                                                                           .select(ThrottleRow::as_select())
                                                                           .first(conn)
                                                                           .optional()
                                                                           .map_err(PersistenceError::from)
                                           })?;
        row.map(RiskThrottleState::from)
           .ok_or_else(|| StoreError::Corrupt("clipper_risk_throttle: singleton row missing".into()))
    }

    fn save_throttle(&mut self, state: &RiskThrottleState) -> Result<bool, StoreError> {
        let changes = ThrottleChanges::from(state);
        let affected = self.run(|conn| {
                               diesel::update(clipper_risk_throttle::table.filter(clipper_risk_throttle::id.eq(THROTTLE_ROW_ID))
                                                                          .filter(clipper_risk_throttle::version.eq(state.version)))
                                   .set((&changes, clipper_risk_throttle::version.eq(clipper_risk_throttle::version + 1)))
                                   .execute(conn)
                                   .map_err(PersistenceError::from)
                           })?;
        Ok(affected > 0)
    }
}
