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
pub struct RegisterForm {
    username: String,
    password: String,
    #[serde(rename = "confirm-password")]
    confirm_password: String,
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("username", &self.username)
            .field("password", &"***")
            .field("confirm_password", &"***")
            .finish()
    }
}

#[utoipa::path(
    get,
    path= "/register",
    responses (
        (status = 200, description = "Registration page", body = String, content_type = "text/html"),
    ),
    tag= "register"
)]
pub async fn register_form(headers: HeaderMap, flash: Extension<Arc<Flash>>) -> Response {
    render(&flash, &headers, Page::Register)
}

#[utoipa::path(
    post,
    path= "/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses (
        (status = 303, description = "Redirect to /login on success, back to /register on mismatch or duplicate username",
            headers(("location" = String, description = "Next page"))),
        (status = 400, description = "Missing form fields", body = String),
    ),
    tag= "register"
)]
#[instrument(skip_all)]
pub async fn register(
    gateway: Extension<Arc<Gateway>>,
    flash: Extension<Arc<Flash>>,
    payload: Result<Form<RegisterForm>, FormRejection>,
) -> Response {
    let Ok(Form(form)) = payload else {
        return missing_form_fields();
    };

    debug!("form: {:?}", form);

    match gateway
        .register(&form.username, &form.password, &form.confirm_password)
        .await
    {
        Ok(transition) => redirect(&flash, &transition),
        Err(err) => unexpected(&flash, Page::Register, &err),
    }
}
