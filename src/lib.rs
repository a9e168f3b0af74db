//! clipflow
//!
//! Servicio HTTP del pipeline semanal de pagos a clippers:
//! - `api`: router axum (`/process-weekly-payout`, `/health`).
//! - `config`: configuración desde entorno.
//! - `errors`: errores de arranque y mapeo HTTP.
//!
//! La lógica vive en los crates `clip-*`; este crate sólo los cablea.

pub mod api;
pub mod config;
pub mod errors;

pub use api::{create_router, AppState};
pub use config::{config, AppConfig};
pub use errors::{ApiError, CoreError};
