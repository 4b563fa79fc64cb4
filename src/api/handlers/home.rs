use super::render;
use crate::{api::flash::Flash, gateway::Gateway};
use axum::{extract::Extension, http::HeaderMap, response::Response};
use std::sync::Arc;

#[utoipa::path(
    get,
    path= "/home",
    responses (
        (status = 200, description = "Home page", body = String, content_type = "text/html"),
    ),
    tag= "home"
)]
pub async fn home(
    headers: HeaderMap,
    gateway: Extension<Arc<Gateway>>,
    flash: Extension<Arc<Flash>>,
) -> Response {
    let transition = gateway.home();
    render(&flash, &headers, transition.target)
}
