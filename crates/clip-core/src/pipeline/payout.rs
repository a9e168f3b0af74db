//! Etapa de payout: gate del ciclo global, fold de presupuestos y
//! finalización condicional de cada registro.

use chrono::{DateTime, Utc};
use clip_domain::{BudgetCycle, CycleStatus, MonthKey, MonthlyBonus, PayoutRecord, PayoutStatus, WeekWindow};
use clip_policies::{settle, ApprovedPayout, CycleLimits, Decision, PayoutCandidate, SegmentAssignment, SegmentLedger};
use log::{info, warn};

use super::{HeldReason, PayoutPipeline, PayoutReport};
use crate::action::Action;
use crate::errors::PipelineError;
use crate::store::PayoutStore;

/// Motivo por el que el ciclo global bloquea toda la corrida, o `None` si
/// está aprobado.
fn cycle_block_reason(cycle: Option<&BudgetCycle>, window: &WeekWindow) -> Option<String> {
    match cycle {
        None => Some(format!("no budget cycle starts in week {}", window.key)),
        Some(c) if c.status == CycleStatus::Killed => Some(format!("budget cycle {} killed", c.id)),
        Some(c) if c.status != CycleStatus::Approved => {
            Some(format!("budget cycle {} not approved (status {})", c.id, c.status))
        }
        Some(_) => None,
    }
}

impl<S> PayoutPipeline<S> where S: PayoutStore
{
    /// Finaliza los registros abiertos de la semana anterior como `approved`
    /// o `held`. Con el ciclo global ausente o no aprobado no se paga nada y
    /// los registros quedan intactos para una corrida posterior.
    pub fn payout(&mut self, now: DateTime<Utc>) -> Result<PayoutReport, PipelineError> {
        let today = now.date_naive();
        let window = WeekWindow::previous(today)?;
        let _guard = self.lock_stage(Action::Payout, window.key.as_str())?;

        let records = self.store.payouts_for_week(&window.key, &PayoutStatus::OPEN)?;
        let mut report = PayoutReport { action: Action::Payout,
                                        week_key: window.key.clone(),
                                        paid: 0,
                                        held: 0,
                                        held_reasons: Vec::new(),
                                        paid_cents: 0,
                                        message: String::new() };
        if records.is_empty() {
            report.message = format!("no open payout records for week {}", window.key);
            return Ok(report);
        }

        let cycle = self.store.budget_cycle_starting_in(&window)?;
        let cycle = match (cycle_block_reason(cycle.as_ref(), &window), cycle) {
            (None, Some(cycle)) => cycle,
            (reason, _) => {
                let reason = reason.unwrap_or_default();
                warn!("payout {} blocked: {reason}", window.key);
                report.held = records.len();
                report.held_reasons = records.iter()
                                             .map(|r| HeldReason { user_id: r.user_id,
                                                                   reason: reason.clone() })
                                             .collect();
                report.message = format!("all payouts blocked: {reason}");
                return Ok(report);
            }
        };

        let month = MonthKey::for_date(today);
        let month_start = MonthKey::month_start(today)?;
        let limits = CycleLimits::from_cycle(&cycle, self.store.approved_cents_since(month_start)?);
        let protection = self.store.load_throttle()?.is_active;

        let mut candidates = Vec::with_capacity(records.len());
        for record in &records {
            candidates.push(self.candidate(record, &cycle, &month, month_start)?);
        }
        let settlement = settle(candidates, &limits, protection);

        for decision in &settlement.decisions {
            match decision {
                Decision::Approved(approved) => {
                    let bonus = self.next_monthly_bonus(approved, &month, now)?;
                    if !self.store.approve_payout(&window.key, approved, &bonus, now)? {
                        warn!("payout {}: {} finalized concurrently, skipped", window.key, approved.user_id);
                        continue;
                    }
                    report.paid += 1;
                    report.paid_cents += approved.total_cents;
                }
                Decision::Held(held) => {
                    if !self.store.hold_payout(held.user_id, &window.key, &held.reason)? {
                        warn!("payout {}: {} finalized concurrently, skipped", window.key, held.user_id);
                        continue;
                    }
                    info!("payout {}: held {}: {}", window.key, held.user_id, held.reason);
                    report.held += 1;
                    report.held_reasons.push(HeldReason { user_id: held.user_id,
                                                          reason: held.reason.clone() });
                }
            }
        }

        info!("payout {}: {} approved ({} cents), {} held, protection={protection}",
              window.key, report.paid, report.paid_cents, report.held);
        report.message = format!("paid {} and held {} payout records for week {}",
                                 report.paid, report.held, window.key);
        Ok(report)
    }

    fn candidate(&self,
                 record: &PayoutRecord,
                 cycle: &BudgetCycle,
                 month: &MonthKey,
                 month_start: DateTime<Utc>)
                 -> Result<PayoutCandidate, PipelineError> {
        let segment = match self.store.segment_for_user(record.user_id)? {
            Some(seg) => {
                let ledger = self.store
                                 .segment_cycle(seg.id, cycle.id)?
                                 .map(|sc| SegmentLedger { segment_cycle_id: sc.id,
                                                           status: sc.status,
                                                           spent_cents: sc.spent_cents });
                Some(SegmentAssignment { segment_id: seg.id,
                                         name: seg.name,
                                         weekly_limit_cents: seg.weekly_limit_cents,
                                         ledger })
            }
            None => None,
        };
        let monthly_views = self.store
                                .clips_for_user_since(record.user_id, month_start)?
                                .iter()
                                .map(|c| c.net_view_delta())
                                .sum();
        let bonus_paid = self.store
                             .monthly_bonus(record.user_id, month)?
                             .map_or(0, |b| b.bonus_cents);
        Ok(PayoutCandidate { user_id: record.user_id,
                             base_earnings_cents: record.base_earnings_cents,
                             segment,
                             monthly_views,
                             bonus_paid_this_month_cents: bonus_paid })
    }

    /// Fila de bono mensual tras aplicar `approved`: conserva el nivel más
    /// alto alcanzado y acumula lo pagado en el mes.
    fn next_monthly_bonus(&self,
                          approved: &ApprovedPayout,
                          month: &MonthKey,
                          now: DateTime<Utc>)
                          -> Result<MonthlyBonus, PipelineError> {
        let prev = self.store.monthly_bonus(approved.user_id, month)?;
        let (prev_tier, prev_cents) = prev.map_or((approved.bonus_tier, 0), |b| (b.bonus_tier, b.bonus_cents));
        let bonus_cents = prev_cents + approved.bonus_cents;
        Ok(MonthlyBonus { user_id: approved.user_id,
                          month_key: month.clone(),
                          monthly_views: approved.monthly_views,
                          bonus_tier: prev_tier.max(approved.bonus_tier),
                          bonus_cents,
                          paid: bonus_cents > 0,
                          updated_at: now })
    }
}
