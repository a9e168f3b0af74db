use clip_core::ActionRunner;
use std::sync::{Arc, Mutex};

/// Estado compartido del router. El runner se serializa con un mutex: dentro
/// del proceso las etapas corren de a una; entre procesos las protegen los
/// locks de etapa del store.
pub struct AppState {
    pub runner: Arc<Mutex<Box<dyn ActionRunner>>>,
    pub version: &'static str,
}

impl AppState {
    pub fn new(runner: Box<dyn ActionRunner>) -> Self {
        Self { runner: Arc::new(Mutex::new(runner)),
               version: env!("CARGO_PKG_VERSION") }
    }
}
