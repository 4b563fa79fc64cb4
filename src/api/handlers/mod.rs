//! Route handlers and the response helpers they share.
//!
//! Form handlers never answer with an error page for the cases users can cause:
//! every outcome is a `303` redirect with a one-shot status.

pub mod health;
pub mod home;
pub mod login;
pub mod register;

use crate::{
    api::{flash::Flash, views},
    gateway::{MSG_UNEXPECTED, Page, Status, Transition},
    storage::StoreError,
};
use axum::{
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::error;

pub(crate) const MISSING_FORM_FIELDS: &str = "Missing form fields";

/// Redirect to the transition target, attaching its status as a flash cookie.
pub(crate) fn redirect(flash: &Flash, transition: &Transition) -> Response {
    let mut response = Redirect::to(transition.target.path()).into_response();

    if let Some(status) = &transition.status {
        match flash.set_cookie(status) {
            Ok(cookie) => {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            Err(err) => error!("Failed to build flash cookie: {err}"),
        }
    }

    response
}

/// Render `page`, consuming any pending status from the request cookies.
pub(crate) fn render(flash: &Flash, headers: &HeaderMap, page: Page) -> Response {
    let (status, present) = flash.take(headers);
    let mut response = Html(views::render(page, status.as_ref())).into_response();

    if present {
        match flash.clear_cookie() {
            Ok(cookie) => {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            Err(err) => error!("Failed to clear flash cookie: {err}"),
        }
    }

    response
}

/// Log an unexpected storage failure and send the user back to `origin`.
pub(crate) fn unexpected(flash: &Flash, origin: Page, err: &StoreError) -> Response {
    error!("Unexpected storage failure: {err}");

    redirect(
        flash,
        &Transition {
            target: origin,
            status: Some(Status::danger(MSG_UNEXPECTED)),
        },
    )
}

pub(crate) fn missing_form_fields() -> Response {
    (StatusCode::BAD_REQUEST, MISSING_FORM_FIELDS).into_response()
}
