use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clip_domain::{BudgetCycle, BudgetSegment, BudgetSegmentCycle, ClipEvaluation, ClipStatus, ClipSubmission, MonthKey,
                  MonthlyBonus, PayoutRecord, PayoutStatus, PayoutTotals, RiskThrottleState, SegmentMembership, WeekKey,
                  WeekWindow};
use clip_policies::ApprovedPayout;
use dashmap::DashSet;
use uuid::Uuid;

use super::PayoutStore;
use crate::action::Action;
use crate::errors::StoreError;

/// Backend en memoria con la misma semántica que el de Postgres.
#[derive(Default)]
pub struct InMemoryPayoutStore {
    pub clips: Vec<ClipSubmission>,
    pub payouts: BTreeMap<(Uuid, WeekKey), PayoutRecord>,
    pub cycles: Vec<BudgetCycle>,
    pub segments: Vec<BudgetSegment>,
    pub segment_cycles: Vec<BudgetSegmentCycle>,
    /// Una membresía por usuario.
    pub memberships: HashMap<Uuid, SegmentMembership>,
    pub bonuses: BTreeMap<(Uuid, MonthKey), MonthlyBonus>,
    pub throttle: RiskThrottleState,
    locks: Arc<DashSet<String>>,
}

/// Guard del lock de etapa en memoria.
pub struct MemoryStageLock {
    key: String,
    locks: Arc<DashSet<String>>,
}

impl Drop for MemoryStageLock {
    fn drop(&mut self) {
        self.locks.remove(&self.key);
    }
}

impl InMemoryPayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payout(&self, user_id: Uuid, week: &WeekKey) -> Option<&PayoutRecord> {
        self.payouts.get(&(user_id, week.clone()))
    }

    pub fn assign_segment(&mut self, user_id: Uuid, segment_id: Uuid, at: DateTime<Utc>) {
        self.memberships.insert(user_id, SegmentMembership { user_id, segment_id, assigned_at: at });
    }

    fn open_payout_mut(&mut self, user_id: Uuid, week: &WeekKey) -> Option<&mut PayoutRecord> {
        self.payouts.get_mut(&(user_id, week.clone())).filter(|p| p.status.is_open())
    }
}

impl PayoutStore for InMemoryPayoutStore {
    type StageLock = MemoryStageLock;

    fn try_lock_stage(&self, action: Action, scope: &str) -> Result<Option<Self::StageLock>, StoreError> {
        let key = format!("{action}:{scope}");
        if self.locks.insert(key.clone()) {
            Ok(Some(MemoryStageLock { key, locks: Arc::clone(&self.locks) }))
        } else {
            Ok(None)
        }
    }

    fn clips_submitted_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ClipSubmission>, StoreError> {
        Ok(self.clips.iter().filter(|c| c.submitted_at >= from && c.submitted_at < to).cloned().collect())
    }

    fn clips_for_payout_week(&self, user_id: Uuid, week: &WeekKey) -> Result<Vec<ClipSubmission>, StoreError> {
        Ok(self.clips
               .iter()
               .filter(|c| c.user_id == user_id && c.payout_week.as_ref() == Some(week))
               .cloned()
               .collect())
    }

    fn clips_for_user_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<Vec<ClipSubmission>, StoreError> {
        Ok(self.clips.iter().filter(|c| c.user_id == user_id && c.submitted_at >= since).cloned().collect())
    }

    fn verified_clips_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ClipSubmission>, StoreError> {
        Ok(self.clips
               .iter()
               .filter(|c| c.status == ClipStatus::Verified && c.submitted_at >= from && c.submitted_at <= to)
               .cloned()
               .collect())
    }

    fn record_clip_evaluations(&mut self, evaluations: &[ClipEvaluation]) -> Result<(), StoreError> {
        for eval in evaluations {
            if let Some(clip) = self.clips.iter_mut().find(|c| c.id == eval.clip_id) {
                clip.apply_evaluation(eval);
            }
        }
        Ok(())
    }

    fn upsert_frozen_payout(&mut self, record: &PayoutRecord) -> Result<bool, StoreError> {
        let key = (record.user_id, record.week_key.clone());
        match self.payouts.get_mut(&key) {
            Some(existing) if !existing.status.is_open() => Ok(false),
            Some(existing) => {
                let frozen_at = existing.frozen_at;
                *existing = PayoutRecord { frozen_at, ..record.clone() };
                Ok(true)
            }
            None => {
                self.payouts.insert(key, record.clone());
                Ok(true)
            }
        }
    }

    fn payouts_for_week(&self, week: &WeekKey, statuses: &[PayoutStatus]) -> Result<Vec<PayoutRecord>, StoreError> {
        Ok(self.payouts
               .values()
               .filter(|p| &p.week_key == week && statuses.contains(&p.status))
               .cloned()
               .collect())
    }

    fn mark_reviewing(&mut self,
                      user_id: Uuid,
                      week: &WeekKey,
                      totals: PayoutTotals,
                      at: DateTime<Utc>)
                      -> Result<bool, StoreError> {
        match self.open_payout_mut(user_id, week).filter(|p| p.status == PayoutStatus::Frozen) {
            Some(p) => {
                p.clips_count = totals.clips_count;
                p.total_net_views = totals.total_net_views;
                p.base_earnings_cents = totals.base_earnings_cents;
                p.total_cents = totals.base_earnings_cents + p.bonus_cents;
                p.status = PayoutStatus::Reviewing;
                p.reviewed_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn approve_payout(&mut self,
                      week: &WeekKey,
                      approved: &ApprovedPayout,
                      bonus: &MonthlyBonus,
                      at: DateTime<Utc>)
                      -> Result<bool, StoreError> {
        if self.open_payout_mut(approved.user_id, week).is_none() {
            return Ok(false);
        }
        let ledger = match approved.segment_cycle_id {
            Some(id) => Some(self.segment_cycles
                                 .iter()
                                 .position(|sc| sc.id == id)
                                 .ok_or_else(|| StoreError::Backend(format!("segment cycle {id} not found")))?),
            None => None,
        };
        if let Some(p) = self.open_payout_mut(approved.user_id, week) {
            p.base_earnings_cents = approved.base_earnings_cents;
            p.bonus_cents = approved.bonus_cents;
            p.total_cents = approved.total_cents;
            p.status = PayoutStatus::Approved;
            p.paid_at = Some(at);
        }
        if let Some(i) = ledger {
            let sc = &mut self.segment_cycles[i];
            sc.spent_cents += approved.total_cents;
            sc.remaining_cents -= approved.total_cents;
        }
        self.bonuses.insert((bonus.user_id, bonus.month_key.clone()), bonus.clone());
        Ok(true)
    }

    fn hold_payout(&mut self, user_id: Uuid, week: &WeekKey, reason: &str) -> Result<bool, StoreError> {
        match self.open_payout_mut(user_id, week) {
            Some(p) => {
                p.status = PayoutStatus::Held;
                p.notes = Some(reason.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn approved_cents_since(&self, since: DateTime<Utc>) -> Result<i64, StoreError> {
        Ok(self.payouts
               .values()
               .filter(|p| p.status == PayoutStatus::Approved && p.paid_at.is_some_and(|t| t >= since))
               .map(|p| p.total_cents)
               .sum())
    }

    fn budget_cycle_starting_in(&self, window: &WeekWindow) -> Result<Option<BudgetCycle>, StoreError> {
        Ok(self.cycles
               .iter()
               .filter(|c| window.contains_date(c.start_date))
               .min_by_key(|c| (c.start_date, c.id))
               .cloned())
    }

    fn segment_for_user(&self, user_id: Uuid) -> Result<Option<BudgetSegment>, StoreError> {
        Ok(self.memberships
               .get(&user_id)
               .and_then(|m| self.segments.iter().find(|s| s.id == m.segment_id))
               .cloned())
    }

    fn segment_cycle(&self, segment_id: Uuid, cycle_id: Uuid) -> Result<Option<BudgetSegmentCycle>, StoreError> {
        Ok(self.segment_cycles
               .iter()
               .find(|sc| sc.segment_id == segment_id && sc.cycle_id == cycle_id)
               .cloned())
    }

    fn monthly_bonus(&self, user_id: Uuid, month: &MonthKey) -> Result<Option<MonthlyBonus>, StoreError> {
        Ok(self.bonuses.get(&(user_id, month.clone())).cloned())
    }

    fn load_throttle(&self) -> Result<RiskThrottleState, StoreError> {
        Ok(self.throttle.clone())
    }

    fn save_throttle(&mut self, state: &RiskThrottleState) -> Result<bool, StoreError> {
        if state.version != self.throttle.version {
            return Ok(false);
        }
        self.throttle = RiskThrottleState { version: state.version + 1, ..state.clone() };
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_lock_is_exclusive_until_dropped() {
        let store = InMemoryPayoutStore::new();
        let first = store.try_lock_stage(Action::Payout, "2026-W41").unwrap();
        assert!(first.is_some());
        assert!(store.try_lock_stage(Action::Payout, "2026-W41").unwrap().is_none());
        // otra semana u otra acción no colisionan
        assert!(store.try_lock_stage(Action::Payout, "2026-W40").unwrap().is_some());
        assert!(store.try_lock_stage(Action::Freeze, "2026-W41").unwrap().is_some());
        drop(first);
        assert!(store.try_lock_stage(Action::Payout, "2026-W41").unwrap().is_some());
    }

    #[test]
    fn stale_throttle_version_is_rejected() {
        let mut store = InMemoryPayoutStore::new();
        let read = store.load_throttle().unwrap();
        assert!(store.save_throttle(&read).unwrap());
        assert_eq!(store.throttle.version, 1);
        // segunda escritura con la versión leída antes
        assert!(!store.save_throttle(&read).unwrap());
    }

    #[test]
    fn approval_charges_ledger_or_applies_nothing() {
        use clip_domain::{BonusTier, CycleStatus};
        use chrono::NaiveDate;

        let mut store = InMemoryPayoutStore::new();
        let week = WeekKey::parse("2026-W41").unwrap();
        let user = Uuid::new_v4();
        let totals = PayoutTotals { clips_count: 1,
                                    total_net_views: 50_000,
                                    base_earnings_cents: 1_100 };
        store.upsert_frozen_payout(&PayoutRecord::frozen(user, week.clone(), totals, Utc::now())).unwrap();
        let ledger = BudgetSegmentCycle { id: Uuid::new_v4(),
                                          segment_id: Uuid::new_v4(),
                                          cycle_id: Uuid::new_v4(),
                                          status: CycleStatus::Approved,
                                          spent_cents: 500,
                                          remaining_cents: 9_500 };
        store.segment_cycles.push(ledger.clone());
        let bonus = MonthlyBonus { user_id: user,
                                   month_key: MonthKey::for_date(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()),
                                   monthly_views: 50_000,
                                   bonus_tier: BonusTier::None,
                                   bonus_cents: 0,
                                   paid: false,
                                   updated_at: Utc::now() };
        let mut approved = ApprovedPayout { user_id: user,
                                            base_earnings_cents: 1_100,
                                            bonus_cents: 0,
                                            total_cents: 1_100,
                                            bonus_tier: BonusTier::None,
                                            monthly_views: 50_000,
                                            segment_cycle_id: Some(Uuid::new_v4()) };

        // ledger desconocido: error y el registro sigue abierto
        assert!(store.approve_payout(&week, &approved, &bonus, Utc::now()).is_err());
        assert_eq!(store.payout(user, &week).unwrap().status, PayoutStatus::Frozen);
        assert!(store.bonuses.is_empty());

        approved.segment_cycle_id = Some(ledger.id);
        assert!(store.approve_payout(&week, &approved, &bonus, Utc::now()).unwrap());
        assert_eq!((store.segment_cycles[0].spent_cents, store.segment_cycles[0].remaining_cents), (1_600, 8_400));
        // segunda aprobación: 0 filas, sin cargo
        assert!(!store.approve_payout(&week, &approved, &bonus, Utc::now()).unwrap());
        assert_eq!(store.segment_cycles[0].spent_cents, 1_600);
    }
}
