use clip_core::Action;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool};
use log::{debug, warn};
use sha2::{Digest, Sha256};

use super::PgPooledConnection;
use crate::error::PersistenceError;

/// Clave del advisory lock: primeros 8 bytes de SHA-256(`"<action>:<scope>"`).
pub fn advisory_key(action: Action, scope: &str) -> i64 {
    let digest = Sha256::digest(format!("{action}:{scope}").as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(bytes)
}

#[derive(QueryableByName)]
struct LockResult {
    #[diesel(sql_type = Bool)]
    acquired: bool,
}

/// Lock de etapa de sesión. Retiene su propia conexión del pool mientras
/// vive; se libera en `drop`.
pub struct PgStageLock {
    key: i64,
    conn: PgPooledConnection,
}

impl PgStageLock {
    /// `None` si otra sesión ya tiene el lock.
    pub(crate) fn try_acquire(mut conn: PgPooledConnection, key: i64) -> Result<Option<Self>, PersistenceError> {
        let res: LockResult = diesel::sql_query("SELECT pg_try_advisory_lock($1) AS acquired").bind::<BigInt, _>(key)
                                                                                             .get_result(&mut conn)?;
        debug!("advisory lock {key}: acquired={}", res.acquired);
        if res.acquired {
            Ok(Some(Self { key, conn }))
        } else {
            Ok(None)
        }
    }

    pub fn key(&self) -> i64 {
        self.key
    }
}

impl Drop for PgStageLock {
    fn drop(&mut self) {
        if let Err(e) = diesel::sql_query("SELECT pg_advisory_unlock($1)").bind::<BigInt, _>(self.key)
                                                                           .execute(&mut self.conn)
        {
            warn!("advisory unlock {} failed: {e}", self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_depends_on_action_and_scope() {
        let a = advisory_key(Action::Payout, "2026-W41");
        assert_eq!(a, advisory_key(Action::Payout, "2026-W41"));
        assert_ne!(a, advisory_key(Action::Freeze, "2026-W41"));
        assert_ne!(a, advisory_key(Action::Payout, "2026-W42"));
    }
}
