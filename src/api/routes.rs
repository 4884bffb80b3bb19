//! Named routes and URL reversal.

use axum::{
    http::{HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use std::str::FromStr;
use tracing::error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteName {
    Home,
    CpLogin,
    CpLoginSubmit,
    /// Reserved; no handler is mounted for it.
    CpLogout,
    CpDashboard,
}

impl RouteName {
    pub const ALL: [Self; 5] = [
        Self::Home,
        Self::CpLogin,
        Self::CpLoginSubmit,
        Self::CpLogout,
        Self::CpDashboard,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::CpLogin => "cp_login",
            Self::CpLoginSubmit => "cp_login_submit",
            Self::CpLogout => "cp_logout",
            Self::CpDashboard => "cp_dashboard",
        }
    }

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::CpLogin | Self::CpLoginSubmit => "/cp/login",
            Self::CpLogout => "/cp/logout",
            Self::CpDashboard => "/cp",
        }
    }
}

impl FromStr for RouteName {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|route| route.as_str() == name)
            .ok_or_else(|| format!("unknown route: {name}"))
    }
}

/// Path of the route called `name`, or an empty string for unknown names.
#[must_use]
pub fn reverse(name: &str) -> String {
    name.parse::<RouteName>()
        .map(|route| route.path().to_string())
        .unwrap_or_default()
}

/// `302 Found` pointing at `location`.
#[must_use]
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(err) => {
            error!("Invalid redirect location {location}: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
