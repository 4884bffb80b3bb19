//! Operator authentication: password digests, the login pipeline, and the
//! guard in front of protected routes.
//!
//! A session is either anonymous or authenticated. The only transition is
//! anonymous to authenticated, made by [`flow::LoginFlow`] after a digest
//! match. The guard trusts any non-empty `uid` for the rest of the session:
//! there is no expiry, re-validation against the store, or token rotation.

pub mod credentials;
pub mod flow;
pub mod gate;

pub use flow::{LoginError, LoginFlow, LoginForm};
pub use gate::{AuthStatus, require_auth};
