use super::{missing_form_fields, redirect, render, unexpected};
use crate::{
    api::flash::Flash,
    gateway::{Gateway, Page},
};
use axum::{
    Form,
    extract::{Extension, rejection::FormRejection},
    http::HeaderMap,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[utoipa::path(
    get,
    path= "/login",
    responses (
        (status = 200, description = "Login page", body = String, content_type = "text/html"),
    ),
    tag= "login"
)]
pub async fn login_form(headers: HeaderMap, flash: Extension<Arc<Flash>>) -> Response {
    render(&flash, &headers, Page::Login)
}

#[utoipa::path(
    post,
    path= "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses (
        (status = 303, description = "Redirect to /home on success, back to /login otherwise",
            headers(("location" = String, description = "Next page"))),
        (status = 400, description = "Missing form fields", body = String),
    ),
    tag= "login"
)]
#[instrument(skip_all)]
pub async fn login(
    gateway: Extension<Arc<Gateway>>,
    flash: Extension<Arc<Flash>>,
    payload: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let Ok(Form(form)) = payload else {
        return missing_form_fields();
    };

    debug!("form: {:?}", form);

    match gateway.login(&form.username, &form.password).await {
        Ok(transition) => redirect(&flash, &transition),
        Err(err) => unexpected(&flash, Page::Login, &err),
    }
}
