use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_VIEWS_DIR: &str = "views-dir";
pub const ARG_VIEWS_SUFFIX: &str = "views-suffix";
pub const ARG_I18N: &str = "i18n";
pub const ARG_STATIC_DIR: &str = "static-dir";
pub const ARG_APP_NAME: &str = "app-name";
pub const ARG_APP_VERSION: &str = "app-version";
pub const ARG_APP_DESCRIPTION: &str = "app-description";
pub const ARG_CDN_MODE: &str = "cdn-mode";

/// Template, asset and application metadata settings.
#[derive(Clone, Debug)]
pub struct Options {
    pub views_dir: String,
    pub views_suffix: String,
    pub i18n: String,
    pub static_dir: String,
    pub app_name: String,
    pub app_version: String,
    pub app_description: String,
    pub cdn_mode: bool,
}

impl Options {
    /// # Errors
    /// Returns an error if a required argument is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let read_required = |id: &str| -> anyhow::Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            views_dir: read_required(ARG_VIEWS_DIR)?,
            views_suffix: read_required(ARG_VIEWS_SUFFIX)?,
            i18n: read_required(ARG_I18N)?,
            static_dir: read_required(ARG_STATIC_DIR)?,
            app_name: read_required(ARG_APP_NAME)?,
            app_version: read_required(ARG_APP_VERSION)?,
            app_description: matches
                .get_one::<String>(ARG_APP_DESCRIPTION)
                .cloned()
                .unwrap_or_default(),
            cdn_mode: matches.get_flag(ARG_CDN_MODE),
        })
    }

    /// URL prefix the static directory is served under.
    #[must_use]
    pub fn static_path(&self) -> String {
        format!("/static_v{}", self.app_version)
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VIEWS_DIR)
                .long(ARG_VIEWS_DIR)
                .help("Directory holding the view templates")
                .env("CPANEL_VIEWS_DIR")
                .default_value("./views/cpanel"),
        )
        .arg(
            Arg::new(ARG_VIEWS_SUFFIX)
                .long(ARG_VIEWS_SUFFIX)
                .help("File suffix appended to every template identifier")
                .env("CPANEL_VIEWS_SUFFIX")
                .default_value(".html"),
        )
        .arg(
            Arg::new(ARG_I18N)
                .long(ARG_I18N)
                .help("Localization catalog (JSON object of key to message)")
                .env("CPANEL_I18N")
                .default_value("./config/i18n_cpanel.json"),
        )
        .arg(
            Arg::new(ARG_STATIC_DIR)
                .long(ARG_STATIC_DIR)
                .help("Directory served under /static_v<app-version>")
                .env("CPANEL_STATIC_DIR")
                .default_value("public"),
        )
        .arg(
            Arg::new(ARG_APP_NAME)
                .long(ARG_APP_NAME)
                .help("Application name shown in views")
                .env("CPANEL_APP_NAME")
                .default_value(env!("CARGO_PKG_NAME")),
        )
        .arg(
            Arg::new(ARG_APP_VERSION)
                .long(ARG_APP_VERSION)
                .help("Application version shown in views and used in the static path")
                .env("CPANEL_APP_VERSION")
                .default_value(env!("CARGO_PKG_VERSION")),
        )
        .arg(
            Arg::new(ARG_APP_DESCRIPTION)
                .long(ARG_APP_DESCRIPTION)
                .help("Application description shown in views")
                .env("CPANEL_APP_DESCRIPTION")
                .default_value("Control panel"),
        )
        .arg(
            Arg::new(ARG_CDN_MODE)
                .long(ARG_CDN_MODE)
                .help("Load third party assets from a CDN")
                .env("CPANEL_CDN_MODE")
                .action(ArgAction::SetTrue),
        )
}
