//! clip-policies – reglas numéricas del programa de clippers
//!
//! Funciones puras, sin I/O, compartidas por todas las etapas del pipeline:
//! - `activation`: gate de activación por clip.
//! - `earnings`: RPM, cálculo de ganancias base con piso mínimo y agregación
//!   semanal por usuario.
//! - `bonus`: niveles de bono mensual (sin acumulación entre niveles).
//! - `settlement`: fold de aplicación de presupuestos sobre los candidatos de
//!   una corrida de payout.
//! - `hysteresis`: máquina de estados del modo protección.

pub mod activation;
pub mod bonus;
pub mod constants;
pub mod earnings;
pub mod hysteresis;
pub mod settlement;

pub use activation::{evaluate_clip, is_activated};
pub use bonus::{award_bonus, select_tier, BonusAward};
pub use earnings::{aggregate_user_week, base_earnings_cents, Rpm, UserWeek};
pub use hysteresis::{average_metrics, metrics_low, HysteresisCounters, ThrottleMode, ThrottleStep, ThrottleTransition};
pub use settlement::{settle, ApprovedPayout, CycleLimits, Decision, HeldPayout, PayoutCandidate, SegmentAssignment, SegmentLedger, Settlement};
