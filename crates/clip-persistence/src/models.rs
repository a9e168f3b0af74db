//! Filas Diesel y mapeo fila ↔ dominio.
//!
//! Los estados se guardan como texto en minúsculas; un texto desconocido al
//! leer se reporta como `StoreError::Corrupt` en lugar de descartarse.

use chrono::{DateTime, NaiveDate, Utc};
use clip_core::StoreError;
use clip_domain::{BudgetCycle, BudgetSegment, BudgetSegmentCycle, ClipSubmission, MonthKey, MonthlyBonus, PayoutRecord,
                  RiskThrottleState, WeekKey};
use diesel::prelude::*;
use std::str::FromStr;
use uuid::Uuid;

use crate::schema::{budget_cycles, budget_segment_cycles, budget_segments, clip_submissions, clipper_monthly_bonuses,
                    clipper_payouts, clipper_risk_throttle};

/// Id fijo de la fila singleton del throttle.
pub const THROTTLE_ROW_ID: i32 = 1;

fn parse_text<T: FromStr>(table: &str, raw: &str) -> Result<T, StoreError> {
    raw.parse().map_err(|_| StoreError::Corrupt(format!("{table}: unexpected value '{raw}'")))
}

fn parse_week(table: &str, raw: &str) -> Result<WeekKey, StoreError> {
    WeekKey::parse(raw).map_err(|e| StoreError::Corrupt(format!("{table}: {e}")))
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = clip_submissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ClipRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub view_count: i64,
    pub baseline_view_count: i64,
    pub ctr: f64,
    pub reg_rate: f64,
    pub day1_post_rate: f64,
    pub status: String,
    pub is_activated: bool,
    pub net_views: i64,
    pub payout_week: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl TryFrom<ClipRow> for ClipSubmission {
    type Error = StoreError;

    fn try_from(row: ClipRow) -> Result<Self, Self::Error> {
        Ok(ClipSubmission { id: row.id,
                            user_id: row.user_id,
                            view_count: row.view_count,
                            baseline_view_count: row.baseline_view_count,
                            ctr: row.ctr,
                            reg_rate: row.reg_rate,
                            day1_post_rate: row.day1_post_rate,
                            status: parse_text("clip_submissions.status", &row.status)?,
                            is_activated: row.is_activated,
                            net_views: row.net_views,
                            payout_week: row.payout_week
                                            .as_deref()
                                            .map(|w| parse_week("clip_submissions.payout_week", w))
                                            .transpose()?,
                            submitted_at: row.submitted_at })
    }
}

/// Inserción de clips (usada por el CLI de carga y por los tests).
#[derive(Insertable, Debug)]
#[diesel(table_name = clip_submissions)]
pub struct NewClipRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub view_count: i64,
    pub baseline_view_count: i64,
    pub ctr: f64,
    pub reg_rate: f64,
    pub day1_post_rate: f64,
    pub status: &'a str,
    pub is_activated: bool,
    pub net_views: i64,
    pub payout_week: Option<&'a str>,
    pub submitted_at: DateTime<Utc>,
}

impl<'a> From<&'a ClipSubmission> for NewClipRow<'a> {
    fn from(c: &'a ClipSubmission) -> Self {
        Self { id: c.id,
               user_id: c.user_id,
               view_count: c.view_count,
               baseline_view_count: c.baseline_view_count,
               ctr: c.ctr,
               reg_rate: c.reg_rate,
               day1_post_rate: c.day1_post_rate,
               status: c.status.as_str(),
               is_activated: c.is_activated,
               net_views: c.net_views,
               payout_week: c.payout_week.as_ref().map(WeekKey::as_str),
               submitted_at: c.submitted_at }
    }
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = clipper_payouts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PayoutRow {
    pub user_id: Uuid,
    pub week_key: String,
    pub clips_count: i32,
    pub total_net_views: i64,
    pub base_earnings_cents: i64,
    pub bonus_cents: i64,
    pub total_cents: i64,
    pub status: String,
    pub notes: Option<String>,
    pub frozen_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<PayoutRow> for PayoutRecord {
    type Error = StoreError;

    fn try_from(row: PayoutRow) -> Result<Self, Self::Error> {
        Ok(PayoutRecord { user_id: row.user_id,
                          week_key: parse_week("clipper_payouts.week_key", &row.week_key)?,
                          clips_count: row.clips_count,
                          total_net_views: row.total_net_views,
                          base_earnings_cents: row.base_earnings_cents,
                          bonus_cents: row.bonus_cents,
                          total_cents: row.total_cents,
                          status: parse_text("clipper_payouts.status", &row.status)?,
                          notes: row.notes,
                          frozen_at: row.frozen_at,
                          reviewed_at: row.reviewed_at,
                          paid_at: row.paid_at })
    }
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = clipper_monthly_bonuses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MonthlyBonusRow {
    pub user_id: Uuid,
    pub month_key: String,
    pub monthly_views: i64,
    pub bonus_tier: String,
    pub bonus_cents: i64,
    pub paid: bool,
    pub updated_at: DateTime<Utc>,
}

impl MonthlyBonusRow {
    /// `month_key` no se reparsea: la fila se lee siempre por su clave.
    pub fn into_domain(self, month: &MonthKey) -> Result<MonthlyBonus, StoreError> {
        Ok(MonthlyBonus { user_id: self.user_id,
                          month_key: month.clone(),
                          monthly_views: self.monthly_views,
                          bonus_tier: parse_text("clipper_monthly_bonuses.bonus_tier", &self.bonus_tier)?,
                          bonus_cents: self.bonus_cents,
                          paid: self.paid,
                          updated_at: self.updated_at })
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = clipper_monthly_bonuses)]
pub struct NewMonthlyBonusRow<'a> {
    pub user_id: Uuid,
    pub month_key: &'a str,
    pub monthly_views: i64,
    pub bonus_tier: &'a str,
    pub bonus_cents: i64,
    pub paid: bool,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a MonthlyBonus> for NewMonthlyBonusRow<'a> {
    fn from(b: &'a MonthlyBonus) -> Self {
        Self { user_id: b.user_id,
               month_key: b.month_key.as_str(),
               monthly_views: b.monthly_views,
               bonus_tier: b.bonus_tier.as_str(),
               bonus_cents: b.bonus_cents,
               paid: b.paid,
               updated_at: b.updated_at }
    }
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = clipper_risk_throttle)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ThrottleRow {
    pub id: i32,
    pub is_active: bool,
    pub current_avg_ctr: f64,
    pub current_avg_reg_rate: f64,
    pub current_avg_day1_post_rate: f64,
    pub consecutive_low_days: i32,
    pub consecutive_recovery_days: i32,
    pub rpm_override: Option<f64>,
    pub activated_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl From<ThrottleRow> for RiskThrottleState {
    fn from(row: ThrottleRow) -> Self {
        RiskThrottleState { is_active: row.is_active,
                            current_avg_ctr: row.current_avg_ctr,
                            current_avg_reg_rate: row.current_avg_reg_rate,
                            current_avg_day1_post_rate: row.current_avg_day1_post_rate,
                            consecutive_low_days: row.consecutive_low_days,
                            consecutive_recovery_days: row.consecutive_recovery_days,
                            rpm_override: row.rpm_override,
                            activated_at: row.activated_at,
                            deactivated_at: row.deactivated_at,
                            updated_at: row.updated_at,
                            version: row.version }
    }
}

/// Columnas que reescribe `save_throttle` (la versión se incrementa aparte).
#[derive(AsChangeset, Debug)]
#[diesel(table_name = clipper_risk_throttle)]
#[diesel(treat_none_as_null = true)]
pub struct ThrottleChanges {
    pub is_active: bool,
    pub current_avg_ctr: f64,
    pub current_avg_reg_rate: f64,
    pub current_avg_day1_post_rate: f64,
    pub consecutive_low_days: i32,
    pub consecutive_recovery_days: i32,
    pub rpm_override: Option<f64>,
    pub activated_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&RiskThrottleState> for ThrottleChanges {
    fn from(s: &RiskThrottleState) -> Self {
        Self { is_active: s.is_active,
               current_avg_ctr: s.current_avg_ctr,
               current_avg_reg_rate: s.current_avg_reg_rate,
               current_avg_day1_post_rate: s.current_avg_day1_post_rate,
               consecutive_low_days: s.consecutive_low_days,
               consecutive_recovery_days: s.consecutive_recovery_days,
               rpm_override: s.rpm_override,
               activated_at: s.activated_at,
               deactivated_at: s.deactivated_at,
               updated_at: s.updated_at }
    }
}

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = budget_cycles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BudgetCycleRow {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub global_weekly_limit_cents: i64,
    pub global_monthly_limit_cents: i64,
    pub max_payout_per_clipper_week_cents: i64,
    pub max_payout_per_clip_cents: i64,
}

impl TryFrom<BudgetCycleRow> for BudgetCycle {
    type Error = StoreError;

    fn try_from(row: BudgetCycleRow) -> Result<Self, Self::Error> {
        Ok(BudgetCycle { id: row.id,
                         start_date: row.start_date,
                         end_date: row.end_date,
                         status: parse_text("budget_cycles.status", &row.status)?,
                         global_weekly_limit_cents: row.global_weekly_limit_cents,
                         global_monthly_limit_cents: row.global_monthly_limit_cents,
                         max_payout_per_clipper_week_cents: row.max_payout_per_clipper_week_cents,
                         max_payout_per_clip_cents: row.max_payout_per_clip_cents })
    }
}

impl From<&BudgetCycle> for BudgetCycleRow {
    fn from(c: &BudgetCycle) -> Self {
        Self { id: c.id,
               start_date: c.start_date,
               end_date: c.end_date,
               status: c.status.as_str().to_string(),
               global_weekly_limit_cents: c.global_weekly_limit_cents,
               global_monthly_limit_cents: c.global_monthly_limit_cents,
               max_payout_per_clipper_week_cents: c.max_payout_per_clipper_week_cents,
               max_payout_per_clip_cents: c.max_payout_per_clip_cents }
    }
}

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = budget_segments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BudgetSegmentRow {
    pub id: Uuid,
    pub name: String,
    pub weekly_limit_cents: i64,
    pub monthly_limit_cents: i64,
}

impl From<BudgetSegmentRow> for BudgetSegment {
    fn from(row: BudgetSegmentRow) -> Self {
        BudgetSegment { id: row.id,
                        name: row.name,
                        weekly_limit_cents: row.weekly_limit_cents,
                        monthly_limit_cents: row.monthly_limit_cents }
    }
}

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = budget_segment_cycles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BudgetSegmentCycleRow {
    pub id: Uuid,
    pub segment_id: Uuid,
    pub cycle_id: Uuid,
    pub status: String,
    pub spent_cents: i64,
    pub remaining_cents: i64,
}

impl TryFrom<BudgetSegmentCycleRow> for BudgetSegmentCycle {
    type Error = StoreError;

    fn try_from(row: BudgetSegmentCycleRow) -> Result<Self, Self::Error> {
        Ok(BudgetSegmentCycle { id: row.id,
                                segment_id: row.segment_id,
                                cycle_id: row.cycle_id,
                                status: parse_text("budget_segment_cycles.status", &row.status)?,
                                spent_cents: row.spent_cents,
                                remaining_cents: row.remaining_cents })
    }
}
