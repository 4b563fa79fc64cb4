use crate::{GIT_COMMIT_HASH, gateway::Gateway};
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    database: String,
}

impl Health {
    fn new(database_ok: bool) -> Self {
        Self {
            commit: GIT_COMMIT_HASH.to_string(),
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: if database_ok { "ok" } else { "error" }.to_string(),
        }
    }

    /// `name:version:short-commit`
    fn app_header(&self) -> Option<HeaderValue> {
        let short_hash = self.commit.get(0..7).unwrap_or("");
        format!("{}:{}:{}", self.name, self.version, short_hash)
            .parse::<HeaderValue>()
            .map_err(|err| error!("Failed to build X-App header: {err}"))
            .ok()
    }
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "User store is reachable", body = Health),
        (status = 503, description = "User store is unreachable", body = Health)
    ),
    tag= "health"
)]
pub async fn health(gateway: Extension<Arc<Gateway>>) -> impl IntoResponse {
    let database_ok = match gateway.ping().await {
        Ok(()) => true,
        Err(err) => {
            error!("Failed to ping user store: {err}");
            false
        }
    };

    let health = Health::new(database_ok);

    let mut headers = HeaderMap::new();
    if let Some(value) = health.app_header() {
        headers.insert("X-App", value);
    }

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    debug!(%status, "health check");

    (status, headers, Json(health))
}
