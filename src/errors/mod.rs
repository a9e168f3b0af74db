//! Errores de nivel aplicación: arranque/configuración (`CoreError`) y
//! mapeo HTTP (`ApiError`).

pub mod api_error;
pub mod core_error;

pub use api_error::{ApiError, ApiResult, ErrorResponse};
pub use core_error::CoreError;
