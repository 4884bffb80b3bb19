//! # cpanel (Control Panel Backend)
//!
//! `cpanel` serves a small browser-facing control panel: an operator signs in
//! against stored credentials, protected pages sit behind a session check, and
//! every page is rendered from composed HTML templates.
//!
//! ## Sessions
//!
//! Each client carries a `cpanel_session` cookie pointing at server-side
//! session data: string keys mapped to values plus a one-shot flash queue.
//! The `uid` key is the only authentication signal; it is set by the login
//! flow and trusted for the lifetime of the session.
//!
//! ## Views
//!
//! Views are addressed by composite keys such as `layout:cp_dashboard`. The
//! first identifier is the entry template, the rest are fragments made
//! available to it. Compiled views are cached for the lifetime of the process
//! and never invalidated, so keys must come from a small fixed set.
//!
//! ## Authentication
//!
//! Passwords are stored as `base64(sha256(username || 0x00 || password))`.
//! Failed logins re-render the login form with a localized message; they are
//! never surfaced as server errors.

pub mod api;
pub mod auth;
pub mod cli;
pub mod dao;
pub mod i18n;
pub mod session;
pub mod views;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
