// clip-domain library entry point
#[macro_use]
mod text_enum;

pub mod bonus;
pub mod budget;
pub mod calendar;
pub mod clip;
pub mod error;
pub mod payout;
pub mod throttle;

pub use bonus::{BonusTier, MonthlyBonus};
pub use budget::{BudgetCycle, BudgetSegment, BudgetSegmentCycle, CycleStatus, SegmentMembership};
pub use calendar::{MonthKey, WeekKey, WeekWindow};
pub use clip::{ClipEvaluation, ClipStatus, ClipSubmission, EngagementMetrics};
pub use error::DomainError;
pub use payout::{PayoutRecord, PayoutStatus, PayoutTotals};
pub use throttle::RiskThrottleState;
