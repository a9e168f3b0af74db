use clip_persistence::PersistenceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Error interno: {0}")]
    Internal(String),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error de persistencia: {0}")]
    Persistence(PersistenceError),
}

impl From<PersistenceError> for CoreError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Config(msg) => CoreError::Config(msg),
            other => CoreError::Persistence(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_variant_from() {
        let io_err = std::io::Error::other("falló IO");
        let err: CoreError = io_err.into();
        assert_eq!(err.to_string(), "Error en IO: falló IO");
    }

    #[test]
    fn missing_database_url_is_a_config_error() {
        let err: CoreError = PersistenceError::Config("DATABASE_URL no definido".into()).into();
        assert!(matches!(err, CoreError::Config(_)));
        assert_eq!(err.to_string(), "Error de configuración: DATABASE_URL no definido");
    }

    #[test]
    fn other_persistence_errors_are_wrapped() {
        let err: CoreError = PersistenceError::TransientIo("pool".into()).into();
        assert!(matches!(err, CoreError::Persistence(_)));
    }
}
