//! Liveness endpoint
//!
//! Reports which build is running. It needs no identity and never touches
//! the database, so it stays cheap enough for frequent liveness checks.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Name reported in health responses and startup logs
pub const SERVICE_NAME: &str = "shelf-catalog";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    /// Short commit hash stamped by build.rs, `unknown` outside git
    pub git_hash: &'static str,
    pub build_profile: &'static str,
}

impl HealthResponse {
    /// Identity of the running binary
    pub fn current() -> Self {
        Self {
            status: "ok",
            module: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            git_hash: env!("GIT_HASH"),
            build_profile: env!("BUILD_PROFILE"),
        }
    }
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::current())
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_stamps_present() {
        let health = HealthResponse::current();
        assert_eq!(health.module, "shelf-catalog");
        assert!(!health.git_hash.is_empty());
        assert!(!health.build_profile.is_empty());
    }
}
