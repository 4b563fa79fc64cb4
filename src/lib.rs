//! # Portier (registration and login gateway)
//!
//! `portier` fronts a landing page with two HTML forms: registration and login.
//! Credentials are stored in a single `users` table and every request is routed
//! to one of three pages with a one-shot status message.
//!
//! ## Layers
//!
//! - **Storage:** [`storage::UserStore`] is the only way to reach persisted users.
//!   Duplicate usernames are a first-class [`storage::InsertOutcome`], not an error.
//! - **Gateway:** [`gateway::Gateway`] decides where a request goes next and with
//!   which status, independent of HTTP.
//! - **API:** axum handlers translate form posts into gateway calls and gateway
//!   transitions into `303` redirects carrying a signed flash cookie.
//!
//! ## Passwords
//!
//! Passwords are hashed with Argon2id before they reach the database. Login still
//! requires an exact, case-sensitive match of both username and password.

pub mod api;
pub mod cli;
pub mod gateway;
pub mod password;
pub mod storage;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
