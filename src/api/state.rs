use std::{path::PathBuf, sync::Arc};

use crate::{auth::LoginFlow, i18n::Localizer, session::Sessions, views::ViewComposer};

/// Shared handler state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<Sessions>,
    pub views: Arc<ViewComposer>,
    pub login: Arc<LoginFlow>,
    pub localizer: Arc<dyn Localizer>,
    /// URL prefix static assets are mounted under, e.g. `/static_v0.1.0`.
    pub static_path: String,
    pub static_dir: PathBuf,
}
