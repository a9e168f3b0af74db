//! clip-core: pipeline semanal de pagos a clippers
//!
//! Cuatro etapas invocadas por `Action`, cada una función del estado
//! almacenado:
//! - `freeze`: congela la semana anterior en registros `frozen`.
//! - `review`: reevalúa activación a mitad de semana (`frozen -> reviewing`).
//! - `payout`: aplica la jerarquía de presupuestos y finaliza `approved`/`held`.
//! - `check_throttle`: monitor de salud que conmuta el modo protección.
//!
//! El almacenamiento se abstrae con `PayoutStore`; `InMemoryPayoutStore` es la
//! implementación de referencia usada en tests.
pub mod action;
pub mod errors;
pub mod pipeline;
pub mod store;

pub use action::Action;
pub use errors::{PipelineError, StoreError};
pub use pipeline::{ActionRunner, FreezeReport, HeldReason, PayoutPipeline, PayoutReport, ReviewReport, StageReport, ThrottleReport};
pub use store::{InMemoryPayoutStore, MemoryStageLock, PayoutStore};
