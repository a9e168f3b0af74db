//! Ganancias base a partir de vistas netas.
//!
//! Todo se calcula en centavos enteros: el RPM se expresa en centavos por
//! cada 1000 vistas y el redondeo es half-up, equivalente a
//! `round(views / 1000 * rpm_usd * 100)` sin error de punto flotante.

use clip_domain::{ClipEvaluation, ClipSubmission, PayoutTotals, WeekKey};
use serde::{Deserialize, Serialize};

use crate::activation::evaluate_clip;
use crate::constants::{MIN_PAYOUT_CENTS, RPM_NORMAL_CENTS_PER_MILLE, RPM_PROTECTION_CENTS_PER_MILLE};

/// Revenue per mille vigente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rpm {
    cents_per_mille: i64,
}

impl Rpm {
    pub const NORMAL: Rpm = Rpm { cents_per_mille: RPM_NORMAL_CENTS_PER_MILLE };
    pub const PROTECTION: Rpm = Rpm { cents_per_mille: RPM_PROTECTION_CENTS_PER_MILLE };

    pub fn for_protection(active: bool) -> Self {
        if active {
            Self::PROTECTION
        } else {
            Self::NORMAL
        }
    }

    pub fn cents_per_mille(&self) -> i64 {
        self.cents_per_mille
    }

    /// Valor en USD (forma persistida en `rpm_override`).
    pub fn as_usd(&self) -> f64 {
        self.cents_per_mille as f64 / 100.0
    }
}

/// Ganancia base en centavos con piso `MIN_PAYOUT_CENTS`.
///
/// Cero vistas pagan exactamente cero; cualquier resultado positivo menor al
/// piso se eleva al piso.
pub fn base_earnings_cents(total_net_views: i64, rpm: Rpm) -> i64 {
    if total_net_views <= 0 {
        return 0;
    }
    let raw = total_net_views.saturating_mul(rpm.cents_per_mille)
                             .saturating_add(500)
                             / 1000;
    if raw > 0 && raw < MIN_PAYOUT_CENTS {
        MIN_PAYOUT_CENTS
    } else {
        raw
    }
}

/// Resultado de evaluar todos los clips de un usuario en una semana.
#[derive(Debug, Clone, PartialEq)]
pub struct UserWeek {
    pub totals: PayoutTotals,
    pub evaluations: Vec<ClipEvaluation>,
}

/// Reevalúa cada clip y suma vistas netas sólo de los activados.
/// `clips_count` cuenta todos los clips registrados en la semana.
pub fn aggregate_user_week(clips: &[ClipSubmission], week: &WeekKey, rpm: Rpm) -> UserWeek {
    let evaluations: Vec<ClipEvaluation> = clips.iter().map(|c| evaluate_clip(c, week)).collect();
    let total_net_views: i64 = evaluations.iter()
                                          .filter(|e| e.is_activated)
                                          .map(|e| e.net_views)
                                          .sum();
    let totals = PayoutTotals { clips_count: evaluations.len() as i32,
                                total_net_views,
                                base_earnings_cents: base_earnings_cents(total_net_views, rpm) };
    UserWeek { totals, evaluations }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_rpm_earnings() {
        assert_eq!(base_earnings_cents(5_000, Rpm::NORMAL), 110);
        assert_eq!(base_earnings_cents(50_000, Rpm::NORMAL), 1_100);
        assert_eq!(base_earnings_cents(50_000, Rpm::PROTECTION), 900);
    }

    #[test]
    fn positive_earnings_are_floored_zero_is_not() {
        assert_eq!(base_earnings_cents(100, Rpm::NORMAL), MIN_PAYOUT_CENTS);
        assert_eq!(base_earnings_cents(1_000, Rpm::NORMAL), MIN_PAYOUT_CENTS);
        assert_eq!(base_earnings_cents(0, Rpm::NORMAL), 0);
        assert_eq!(base_earnings_cents(-40, Rpm::NORMAL), 0);
    }

    #[test]
    fn floor_invariant_holds_across_range() {
        for views in (0..200_000).step_by(137) {
            let cents = base_earnings_cents(views, Rpm::NORMAL);
            assert!(cents == 0 || cents >= MIN_PAYOUT_CENTS, "views={views} cents={cents}");
        }
    }

    #[test]
    fn rounding_is_half_up() {
        // 25_000 * 18 / 1000 = 450 exacto; 25_028 * 18 / 1000 = 450.504 -> 451
        assert_eq!(base_earnings_cents(25_000, Rpm::PROTECTION), 450);
        assert_eq!(base_earnings_cents(25_028, Rpm::PROTECTION), 451);
    }

    #[test]
    fn rpm_usd_form() {
        assert!((Rpm::PROTECTION.as_usd() - 0.18).abs() < 1e-9);
        assert_eq!(Rpm::for_protection(false), Rpm::NORMAL);
    }
}
