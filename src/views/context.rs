//! Typed data handed to every view.

use serde::Serialize;

/// Application metadata exposed to views as `app_info`.
#[derive(Clone, Debug, Serialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub build: String,
}

/// Shared fields merged with the page data for one render.
///
/// Page fields are flattened next to the shared ones, so templates read
/// `{{ cdn_mode }}` and `{{ error }}` alike. The `static` prefix is not part
/// of it: it is a trusted environment global, exempt from HTML escaping.
#[derive(Debug, Serialize)]
pub struct RenderContext<'a, T: Serialize> {
    pub cdn_mode: bool,
    pub app_info: &'a AppInfo,
    /// First pending flash message, if any.
    pub flash: Option<String>,
    /// Authenticated username, if any.
    pub uid: Option<String>,
    #[serde(flatten)]
    pub page: &'a T,
}

/// Page data for views that need nothing beyond the shared fields.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EmptyPage {}
