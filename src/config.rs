//! Configuración central del servicio.
//! Carga variables de entorno (.env) una sola vez y expone `AppConfig`.

use clip_persistence::DbConfig;
use once_cell::sync::OnceCell;
use std::env;

use crate::errors::CoreError;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_LOG_FILTER: &str = "info";

static CONFIG: OnceCell<AppConfig> = OnceCell::new();

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: String,
    pub log_filter: String,
    pub database: DbConfig,
}

impl AppConfig {
    /// Lee el entorno; `DATABASE_URL` ausente es un error de configuración.
    pub fn from_env() -> Result<Self, CoreError> {
        clip_persistence::init_dotenv();
        Ok(Self { listen_addr: env::var("CLIPFLOW_LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string()),
                  log_filter: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
                  database: DbConfig::from_env()? })
    }
}

/// Instancia global perezosa, evaluada una sola vez.
pub fn config() -> Result<&'static AppConfig, CoreError> {
    CONFIG.get_or_try_init(AppConfig::from_env)
}
