//! Constantes de política del programa de clippers.
//!
//! Los umbrales de protección son deliberadamente más laxos que el gate de
//! activación por clip: entre ambos queda una franja en la que un clip puede
//! no activarse sin que el sistema entre en modo protección.

use clip_domain::BonusTier;

/// Gate de activación por clip.
pub const ACTIVATION_MIN_NET_VIEWS: i64 = 1_000;
pub const ACTIVATION_MIN_CTR: f64 = 0.01;
pub const ACTIVATION_MIN_REG_RATE: f64 = 0.15;
pub const ACTIVATION_MIN_DAY1_POST_RATE: f64 = 0.25;

/// Piso de pago: una base positiva nunca queda por debajo de $2.22.
pub const MIN_PAYOUT_CENTS: i64 = 222;

/// RPM en centavos por cada 1000 vistas netas.
pub const RPM_NORMAL_CENTS_PER_MILLE: i64 = 22;
pub const RPM_PROTECTION_CENTS_PER_MILLE: i64 = 18;

/// Umbrales del promedio de 24h por debajo de los cuales las métricas son "bajas".
pub const PROTECTION_CTR: f64 = 0.008;
pub const PROTECTION_REG_RATE: f64 = 0.12;
pub const PROTECTION_DAY1_POST_RATE: f64 = 0.20;

/// Días consecutivos necesarios para cambiar de modo, en cualquier dirección.
pub const HYSTERESIS_DAYS: i32 = 3;

/// Muestra mínima para evaluar el throttle.
pub const THROTTLE_MIN_SAMPLES: usize = 5;
pub const THROTTLE_LOOKBACK_HOURS: i64 = 24;

/// Niveles de bono mensual en orden de evaluación (mayor primero):
/// (nivel, vistas mínimas del mes, monto en centavos).
pub const BONUS_TIERS: [(BonusTier, i64, i64); 3] = [(BonusTier::Super, 1_000_000, 111_100),
                                                      (BonusTier::Proven, 500_000, 44_400),
                                                      (BonusTier::Verified, 100_000, 11_100)];
