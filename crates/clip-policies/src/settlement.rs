//! Fold de aplicación de presupuestos de una corrida de payout.
//!
//! Entrada: candidatos (uno por registro abierto), límites del ciclo global y
//! estado del modo protección. Salida: una decisión por candidato más el
//! gasto acumulado por ledger de segmento. Es una función pura: no toca el
//! store y puede probarse sin base de datos.
//!
//! Orden de evaluación por candidato:
//! 1. techo global semanal y mensual del ciclo;
//! 2. segmento: `killed` / `pending` retienen, y el techo semanal se compara
//!    contra `spent + acumulado_de_la_corrida + base`;
//! 3. recorte al tope por clipper y semana y al tope por clip; si el recorte
//!    deja una base positiva por debajo de `MIN_PAYOUT_CENTS` el registro se
//!    retiene (la base persistida nunca queda bajo el piso);
//! 4. bono mensual (sólo sin protección y con segmento aprobado o sin ledger);
//! 5. `total = base + bono`;
//! 6. el total se suma a los acumuladores para los candidatos siguientes.
//!
//! Los candidatos se procesan en orden ascendente de `user_id`; el primero en
//! ese orden consume primero el techo del segmento.

use std::collections::BTreeMap;

use clip_domain::{BonusTier, BudgetCycle, CycleStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bonus::award_bonus;
use crate::constants::MIN_PAYOUT_CENTS;

/// Límites del ciclo global vigentes para la corrida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleLimits {
    pub global_weekly_limit_cents: i64,
    pub global_monthly_limit_cents: i64,
    pub max_payout_per_clipper_week_cents: i64,
    pub max_payout_per_clip_cents: i64,
    /// Centavos ya aprobados en el mes calendario antes de esta corrida.
    pub approved_this_month_cents: i64,
}

impl CycleLimits {
    pub fn from_cycle(cycle: &BudgetCycle, approved_this_month_cents: i64) -> Self {
        Self { global_weekly_limit_cents: cycle.global_weekly_limit_cents,
               global_monthly_limit_cents: cycle.global_monthly_limit_cents,
               max_payout_per_clipper_week_cents: cycle.max_payout_per_clipper_week_cents,
               max_payout_per_clip_cents: cycle.max_payout_per_clip_cents,
               approved_this_month_cents }
    }
}

/// Ledger del segmento en el ciclo actual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentLedger {
    pub segment_cycle_id: Uuid,
    pub status: CycleStatus,
    pub spent_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentAssignment {
    pub segment_id: Uuid,
    pub name: String,
    pub weekly_limit_cents: i64,
    /// `None` si el segmento no tiene ledger para este ciclo.
    pub ledger: Option<SegmentLedger>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutCandidate {
    pub user_id: Uuid,
    pub base_earnings_cents: i64,
    pub segment: Option<SegmentAssignment>,
    pub monthly_views: i64,
    pub bonus_paid_this_month_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedPayout {
    pub user_id: Uuid,
    pub base_earnings_cents: i64,
    pub bonus_cents: i64,
    pub total_cents: i64,
    pub bonus_tier: BonusTier,
    pub monthly_views: i64,
    pub segment_cycle_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldPayout {
    pub user_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approved(ApprovedPayout),
    Held(HeldPayout),
}

impl Decision {
    pub fn user_id(&self) -> Uuid {
        match self {
            Decision::Approved(a) => a.user_id,
            Decision::Held(h) => h.user_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub decisions: Vec<Decision>,
    /// Gasto de la corrida por `segment_cycle_id`.
    pub segment_spend: BTreeMap<Uuid, i64>,
    pub global_spend_cents: i64,
}

impl Settlement {
    pub fn approved(&self) -> impl Iterator<Item = &ApprovedPayout> {
        self.decisions.iter().filter_map(|d| match d {
            Decision::Approved(a) => Some(a),
            Decision::Held(_) => None,
        })
    }

    pub fn held(&self) -> impl Iterator<Item = &HeldPayout> {
        self.decisions.iter().filter_map(|d| match d {
            Decision::Held(h) => Some(h),
            Decision::Approved(_) => None,
        })
    }
}

pub fn settle(mut candidates: Vec<PayoutCandidate>, limits: &CycleLimits, protection_active: bool) -> Settlement {
    candidates.sort_by_key(|c| c.user_id);
    let mut out = Settlement::default();
    for c in candidates {
        let decision = decide(&c, limits, protection_active, &out);
        if let Decision::Approved(a) = &decision {
            out.global_spend_cents += a.total_cents;
            if let Some(id) = a.segment_cycle_id {
                *out.segment_spend.entry(id).or_insert(0) += a.total_cents;
            }
        }
        out.decisions.push(decision);
    }
    out
}

fn held(user_id: Uuid, reason: String) -> Decision {
    Decision::Held(HeldPayout { user_id, reason })
}

fn decide(c: &PayoutCandidate, limits: &CycleLimits, protection_active: bool, acc: &Settlement) -> Decision {
    let base = c.base_earnings_cents;

    if acc.global_spend_cents + base > limits.global_weekly_limit_cents {
        return held(c.user_id,
                    format!("global weekly budget exceeded: run {} + payout {} > limit {}",
                            acc.global_spend_cents, base, limits.global_weekly_limit_cents));
    }
    let month_total = limits.approved_this_month_cents + acc.global_spend_cents + base;
    if month_total > limits.global_monthly_limit_cents {
        return held(c.user_id,
                    format!("global monthly budget exceeded: {} > limit {}",
                            month_total, limits.global_monthly_limit_cents));
    }

    let ledger = c.segment.as_ref().and_then(|s| s.ledger.map(|l| (s, l)));
    if let Some((seg, l)) = ledger {
        match l.status {
            CycleStatus::Killed => {
                return held(c.user_id, format!("segment '{}' killed for this cycle", seg.name));
            }
            CycleStatus::Pending => {
                return held(c.user_id, format!("segment '{}' pending approval", seg.name));
            }
            CycleStatus::Approved => {
                let run = acc.segment_spend.get(&l.segment_cycle_id).copied().unwrap_or(0);
                if l.spent_cents + run + base > seg.weekly_limit_cents {
                    return held(c.user_id,
                                format!("segment '{}' weekly limit exceeded: spent {} + run {} + payout {} > limit {}",
                                        seg.name, l.spent_cents, run, base, seg.weekly_limit_cents));
                }
            }
        }
    }

    let capped = base.min(limits.max_payout_per_clipper_week_cents)
                     .min(limits.max_payout_per_clip_cents);
    if base > 0 && capped < MIN_PAYOUT_CENTS {
        return held(c.user_id,
                    format!("payout cap {} below minimum payout {MIN_PAYOUT_CENTS}: earnings {base}",
                            capped.max(0)));
    }

    let segment_ok = ledger.map_or(true, |(_, l)| l.status == CycleStatus::Approved);
    let (bonus_tier, bonus_cents) = if !protection_active && segment_ok {
        let award = award_bonus(c.monthly_views, c.bonus_paid_this_month_cents);
        (award.tier, award.due_cents)
    } else {
        (BonusTier::None, 0)
    };

    Decision::Approved(ApprovedPayout { user_id: c.user_id,
                                        base_earnings_cents: capped,
                                        bonus_cents,
                                        total_cents: capped + bonus_cents,
                                        bonus_tier,
                                        monthly_views: c.monthly_views,
                                        segment_cycle_id: ledger.map(|(_, l)| l.segment_cycle_id) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> CycleLimits {
        CycleLimits { global_weekly_limit_cents: 1_000_000,
                      global_monthly_limit_cents: 4_000_000,
                      max_payout_per_clipper_week_cents: 50_000,
                      max_payout_per_clip_cents: 50_000,
                      approved_this_month_cents: 0 }
    }

    fn user(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn cand(n: u128, base: i64, segment: Option<SegmentAssignment>) -> PayoutCandidate {
        PayoutCandidate { user_id: user(n),
                          base_earnings_cents: base,
                          segment,
                          monthly_views: 0,
                          bonus_paid_this_month_cents: 0 }
    }

    fn segment(status: CycleStatus, spent: i64, limit: i64) -> SegmentAssignment {
        SegmentAssignment { segment_id: user(900),
                            name: "new creators".into(),
                            weekly_limit_cents: limit,
                            ledger: Some(SegmentLedger { segment_cycle_id: user(901),
                                                         status,
                                                         spent_cents: spent }) }
    }

    #[test]
    fn segment_ceiling_is_first_come_first_served_by_user_id() {
        let seg = segment(CycleStatus::Approved, 1_000, 3_000);
        // insertados fuera de orden: el fold ordena por user_id
        let cands = vec![cand(3, 1_000, Some(seg.clone())),
                         cand(1, 1_200, Some(seg.clone())),
                         cand(2, 700, Some(seg.clone()))];
        let s = settle(cands, &limits(), false);
        let ids: Vec<Uuid> = s.decisions.iter().map(|d| d.user_id()).collect();
        assert_eq!(ids, vec![user(1), user(2), user(3)]);
        // 1000 + 1200 = 2200 <= 3000; +700 = 2900 <= 3000; +1000 = 3900 > 3000
        assert!(matches!(s.decisions[0], Decision::Approved(_)));
        assert!(matches!(s.decisions[1], Decision::Approved(_)));
        assert!(matches!(&s.decisions[2], Decision::Held(h) if h.reason.contains("new creators")));
        assert_eq!(s.segment_spend.get(&user(901)), Some(&1_900));
    }

    #[test]
    fn killed_and_pending_segments_hold() {
        let s = settle(vec![cand(1, 500, Some(segment(CycleStatus::Killed, 0, 10_000))),
                            cand(2, 500, Some(segment(CycleStatus::Pending, 0, 10_000)))],
                       &limits(),
                       false);
        let reasons: Vec<&str> = s.held().map(|h| h.reason.as_str()).collect();
        assert_eq!(reasons.len(), 2);
        assert!(reasons[0].contains("killed") && reasons[0].contains("new creators"));
        assert!(reasons[1].contains("pending"));
        assert!(s.segment_spend.is_empty());
    }

    #[test]
    fn both_caps_clamp_and_tighter_binds() {
        let mut l = limits();
        l.max_payout_per_clipper_week_cents = 5_000;
        l.max_payout_per_clip_cents = 3_000;
        let s = settle(vec![cand(1, 9_000, None)], &l, false);
        let a = s.approved().next().unwrap();
        assert_eq!(a.base_earnings_cents, 3_000);
        assert_eq!(a.total_cents, 3_000);
    }

    #[test]
    fn bonus_added_after_caps_and_suppressed_in_protection() {
        let mut c = cand(1, 2_000, None);
        c.monthly_views = 600_000;
        let s = settle(vec![c.clone()], &limits(), false);
        let a = s.approved().next().unwrap();
        assert_eq!(a.bonus_tier, BonusTier::Proven);
        assert_eq!(a.total_cents, 2_000 + 44_400);

        let s = settle(vec![c], &limits(), true);
        let a = s.approved().next().unwrap();
        assert_eq!(a.bonus_cents, 0);
        assert_eq!(a.total_cents, 2_000);
    }

    #[test]
    fn bonus_counts_towards_segment_spend() {
        let seg = segment(CycleStatus::Approved, 0, 20_000);
        let mut first = cand(1, 1_000, Some(seg.clone()));
        first.monthly_views = 100_000;
        let second = cand(2, 8_000, Some(seg));
        let s = settle(vec![first, second], &limits(), false);
        // 1000 + 11100 = 12100 acumulado; 12100 + 8000 = 20100 > 20000
        assert_eq!(s.approved().count(), 1);
        assert_eq!(s.held().count(), 1);
    }

    #[test]
    fn segment_without_ledger_is_not_checked() {
        let seg = SegmentAssignment { segment_id: user(900),
                                      name: "top tier".into(),
                                      weekly_limit_cents: 0,
                                      ledger: None };
        let s = settle(vec![cand(1, 4_000, Some(seg))], &limits(), false);
        let a = s.approved().next().unwrap();
        assert_eq!(a.segment_cycle_id, None);
        assert!(s.segment_spend.is_empty());
    }

    #[test]
    fn global_weekly_limit_holds_overflow() {
        let mut l = limits();
        l.global_weekly_limit_cents = 2_500;
        let s = settle(vec![cand(1, 2_000, None), cand(2, 1_000, None)], &l, false);
        assert_eq!(s.approved().count(), 1);
        assert!(s.held().next().unwrap().reason.contains("global weekly"));
        assert_eq!(s.global_spend_cents, 2_000);
    }

    #[test]
    fn cap_below_minimum_payout_holds_instead_of_approving() {
        let mut l = limits();
        l.max_payout_per_clip_cents = 100;
        let s = settle(vec![cand(1, 1_100, None), cand(2, 0, None)], &l, false);
        let reason = &s.held().next().unwrap().reason;
        assert!(reason.contains("below minimum payout 222"), "{reason}");
        // una base de cero no se recorta ni se retiene
        let a = s.approved().next().unwrap();
        assert_eq!((a.user_id, a.base_earnings_cents), (user(2), 0));
        assert_eq!(s.global_spend_cents, 0);

        // el tope exactamente en el piso todavía paga
        l.max_payout_per_clipper_week_cents = MIN_PAYOUT_CENTS;
        l.max_payout_per_clip_cents = 50_000;
        let s = settle(vec![cand(1, 1_100, None)], &l, false);
        assert_eq!(s.approved().next().unwrap().base_earnings_cents, MIN_PAYOUT_CENTS);
    }

    #[test]
    fn global_monthly_limit_counts_prior_approvals_and_run() {
        let mut l = limits();
        l.global_monthly_limit_cents = 10_000;
        l.approved_this_month_cents = 7_000;
        let s = settle(vec![cand(1, 1_500, None), cand(2, 1_500, None), cand(3, 1_000, None)], &l, false);
        // 7000 + 1500 = 8500; + 1500 = 10000 <= 10000; + 1000 = 11000 > 10000
        assert_eq!(s.approved().count(), 2);
        let held: Vec<&HeldPayout> = s.held().collect();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].user_id, user(3));
        assert!(held[0].reason.contains("global monthly budget exceeded: 11000 > limit 10000"));
        assert_eq!(s.global_spend_cents, 3_000);
    }
}
