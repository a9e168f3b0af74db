//! Bono mensual por niveles.
//!
//! Se recorre super -> proven -> verified y gana el primero cuyo umbral se
//! cumple; los niveles no se suman. Lo ya pagado en el mes se descuenta para
//! que un mismo nivel no se cobre cada semana: subir de nivel paga sólo la
//! diferencia.

use clip_domain::BonusTier;
use serde::{Deserialize, Serialize};

use crate::constants::BONUS_TIERS;

/// Nivel y monto (centavos) correspondientes a las vistas del mes.
pub fn select_tier(monthly_views: i64) -> (BonusTier, i64) {
    BONUS_TIERS.iter()
               .find(|(_, min_views, _)| monthly_views >= *min_views)
               .map(|(tier, _, cents)| (*tier, *cents))
               .unwrap_or((BonusTier::None, 0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusAward {
    pub tier: BonusTier,
    /// Monto total del nivel alcanzado.
    pub tier_cents: i64,
    /// Parte a pagar en esta corrida.
    pub due_cents: i64,
}

pub fn award_bonus(monthly_views: i64, already_paid_cents: i64) -> BonusAward {
    let (tier, tier_cents) = select_tier(monthly_views);
    BonusAward { tier,
                 tier_cents,
                 due_cents: (tier_cents - already_paid_cents).max(0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_qualifying_tier_wins() {
        assert_eq!(select_tier(600_000), (BonusTier::Proven, 44_400));
        assert_eq!(select_tier(1_000_000), (BonusTier::Super, 111_100));
        assert_eq!(select_tier(100_000), (BonusTier::Verified, 11_100));
        assert_eq!(select_tier(99_999), (BonusTier::None, 0));
    }

    #[test]
    fn already_paid_is_deducted() {
        let a = award_bonus(150_000, 11_100);
        assert_eq!(a.tier, BonusTier::Verified);
        assert_eq!(a.due_cents, 0);
        let up = award_bonus(520_000, 11_100);
        assert_eq!(up.tier, BonusTier::Proven);
        assert_eq!(up.due_cents, 33_300);
    }
}
