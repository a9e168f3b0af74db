//! clip-persistence
//!
//! Implementación Postgres (Diesel + r2d2) de `PayoutStore`, con paridad
//! semántica respecto a `InMemoryPayoutStore`.
//!
//! Módulos:
//! - `pg`: pool, proveedor de conexiones, reintentos, locks de etapa y el
//!   store.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel declaradas a mano.
//! - `models`: filas Diesel y su mapeo a tipos de dominio.

pub mod config;
pub mod error;
pub mod migrations;
pub mod models;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_pool, build_pool_from_env, ConnectionProvider, PgPayoutStore, PgPool, PgStageLock, PoolProvider};
