use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Name of the loaded feature extractor
    pub model: String,
    /// Build timestamp
    pub built_at: String,
    /// Server start time
    pub started_at: DateTime<Utc>,
}

impl HealthResponse {
    /// Health report for a running server
    pub fn ok(model: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            status: "ok".to_string(),
            version: crate::built_info::PKG_VERSION.to_string(),
            model: model.to_string(),
            built_at: crate::built_info::BUILT_TIME_UTC.to_string(),
            started_at,
        }
    }
}
