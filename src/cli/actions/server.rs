use crate::{
    api::{self, AppState, routes},
    auth::LoginFlow,
    cli::commands::{session, views},
    dao::{SqliteGroupDao, SqliteUserDao, bootstrap, sqlite},
    i18n::{Catalog, Localizer},
    session::{MemorySessionStore, SessionConfig, Sessions},
    views::{AppInfo, ViewComposer, ViewConfig, ViewGlobals},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub admin_password: SecretString,
    pub views: views::Options,
    pub session: session::Options,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database, catalog or provisioning fail, or the
/// server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let pool = sqlite::connect(&args.dsn)
        .await
        .context("Failed to open user database")?;
    let groups = SqliteGroupDao::new(pool.clone());
    let users = Arc::new(SqliteUserDao::new(pool));

    bootstrap::provision(&groups, users.as_ref(), &args.admin_password)
        .await
        .context("Failed to provision system accounts")?;

    let state = app_state(&args.views, args.session, users)?;

    api::new(args.port, state).await
}

fn app_state(
    options: &views::Options,
    session: session::Options,
    users: Arc<SqliteUserDao>,
) -> Result<AppState> {
    let catalog = Catalog::load(&PathBuf::from(&options.i18n))?;
    let localizer: Arc<dyn Localizer> = Arc::new(catalog);

    let sessions = Arc::new(Sessions::new(
        Arc::new(MemorySessionStore::new(Duration::from_secs(
            session.ttl_seconds,
        ))),
        SessionConfig::new()
            .with_ttl_seconds(session.ttl_seconds)
            .with_secure_cookie(session.secure_cookie),
    ));

    let static_path = options.static_path();
    let composer = ViewComposer::new(
        ViewConfig::new(&options.views_dir).with_suffix(&options.views_suffix),
        ViewGlobals {
            cdn_mode: options.cdn_mode,
            static_path: static_path.clone(),
            app_info: AppInfo {
                name: options.app_name.clone(),
                version: options.app_version.clone(),
                description: options.app_description.clone(),
                build: crate::GIT_COMMIT_HASH.to_string(),
            },
            localizer: Arc::clone(&localizer),
            reverse: Arc::new(routes::reverse),
        },
        Arc::clone(&sessions),
    );

    let login = LoginFlow::new(users, Arc::clone(&sessions), Arc::clone(&localizer));

    Ok(AppState {
        sessions,
        views: Arc::new(composer),
        login: Arc::new(login),
        localizer,
        static_path,
        static_dir: PathBuf::from(&options.static_dir),
    })
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", args.dsn.clone()),
        ("views", format!("{}/*{}", args.views.views_dir, args.views.views_suffix)),
        ("i18n", args.views.i18n.clone()),
        (
            "static",
            format!("{} -> {}", args.views.static_path(), args.views.static_dir),
        ),
        ("cdn_mode", args.views.cdn_mode.to_string()),
        ("session_ttl", format!("{}s", args.session.ttl_seconds)),
        ("secure_cookie", args.session.secure_cookie.to_string()),
    ];
    log_entries("Startup configuration", &entries);
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\n{title}:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::sqlite::tests::memory_pool;
    use std::path::Path;

    fn options(i18n: &Path) -> views::Options {
        views::Options {
            views_dir: "./views/cpanel".to_string(),
            views_suffix: ".html".to_string(),
            i18n: i18n.display().to_string(),
            static_dir: "public".to_string(),
            app_name: "cpanel".to_string(),
            app_version: "1.0.0".to_string(),
            app_description: String::new(),
            cdn_mode: false,
        }
    }

    #[test]
    fn short_commit_truncates() {
        assert_eq!(short_commit("0123456789abcdef"), "0123456");
        assert_eq!(short_commit(" abc "), "abc");
    }

    #[tokio::test]
    async fn app_state_uses_versioned_static_path() -> Result<()> {
        let i18n = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/i18n_cpanel.json");
        let users = Arc::new(SqliteUserDao::new(memory_pool().await?));
        let session = session::Options {
            ttl_seconds: 60,
            secure_cookie: true,
        };

        let state = app_state(&options(&i18n), session, users)?;

        assert_eq!(state.static_path, "/static_v1.0.0");
        assert!(state.sessions.config().secure_cookie());
        assert_eq!(state.sessions.config().ttl_seconds(), 60);
        Ok(())
    }

    #[tokio::test]
    async fn app_state_requires_catalog() -> Result<()> {
        let users = Arc::new(SqliteUserDao::new(memory_pool().await?));
        let session = session::Options {
            ttl_seconds: 60,
            secure_cookie: false,
        };

        let result = app_state(&options(Path::new("/nonexistent/i18n.json")), session, users);

        assert!(result.is_err());
        Ok(())
    }
}
