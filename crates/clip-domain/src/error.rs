use thiserror::Error;

/// Errores del dominio de pagos a clippers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Error de validación: {0}")]
    ValidationError(String),

    #[error("Fecha fuera de rango: {0}")]
    InvalidDate(String),
}
