//! Errores del pipeline y de la frontera con el almacenamiento.

use clip_domain::DomainError;
use thiserror::Error;

use crate::action::Action;

/// Error de un `PayoutStore`. Las implementaciones concretas mapean sus
/// errores nativos a estas variantes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("transient backend error: {0}")]
    Transient(String),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown action '{0}': expected one of freeze, review, payout, check_throttle")]
    UnknownAction(String),
    #[error("stage '{action}' already running for {scope}")]
    StageLocked { action: Action, scope: String },
    #[error("risk throttle state changed concurrently (read version {expected})")]
    ThrottleConflict { expected: i64 },
    #[error("domain: {0}")]
    Domain(#[from] DomainError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
}
