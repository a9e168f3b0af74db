use clip_core::StageReport;
use serde::{Deserialize, Serialize};

/// Cuerpo de invocación. La acción se valida a mano para devolver el error
/// enumerado en lugar del mensaje genérico de serde.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessRequest {
    pub action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub report: StageReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
