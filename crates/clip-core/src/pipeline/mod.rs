//! Orquestación de las cuatro etapas sobre un `PayoutStore`.

mod freeze;
mod payout;
mod report;
mod review;
mod throttle;

pub use report::{FreezeReport, HeldReason, PayoutReport, ReviewReport, StageReport, ThrottleReport};

use chrono::{DateTime, Utc};
use log::info;

use crate::action::Action;
use crate::errors::PipelineError;
use crate::store::PayoutStore;

/// Scope fijo del lock de la etapa `check_throttle`.
pub const THROTTLE_LOCK_SCOPE: &str = "throttle";

/// Pipeline semanal de pagos. Cada invocación de `run` ejecuta una etapa
/// completa bajo su lock de etapa.
pub struct PayoutPipeline<S>
    where S: PayoutStore
{
    store: S,
}

impl<S> PayoutPipeline<S> where S: PayoutStore
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Ejecuta `action` tomando `now` como instante del servidor.
    pub fn run(&mut self, action: Action, now: DateTime<Utc>) -> Result<StageReport, PipelineError> {
        info!("stage {action} starting at {now}");
        let report = match action {
            Action::Freeze => StageReport::Freeze(self.freeze(now)?),
            Action::Review => StageReport::Review(self.review(now)?),
            Action::Payout => StageReport::Payout(self.payout(now)?),
            Action::CheckThrottle => StageReport::Throttle(self.check_throttle(now)?),
        };
        info!("stage {action} finished: {}", report.message());
        Ok(report)
    }

    /// Toma el lock `(action, scope)` o falla con `StageLocked`.
    fn lock_stage(&self, action: Action, scope: &str) -> Result<S::StageLock, PipelineError> {
        self.store
            .try_lock_stage(action, scope)?
            .ok_or_else(|| PipelineError::StageLocked { action,
                                                        scope: scope.to_string() })
    }
}

/// Frontera objeto-segura usada por los binarios para ejecutar una acción
/// sin conocer el backend concreto.
pub trait ActionRunner: Send {
    fn run_action(&mut self, action: Action, now: DateTime<Utc>) -> Result<StageReport, PipelineError>;
}

impl<S> ActionRunner for PayoutPipeline<S> where S: PayoutStore + Send
{
    fn run_action(&mut self, action: Action, now: DateTime<Utc>) -> Result<StageReport, PipelineError> {
        self.run(action, now)
    }
}
