//! Map parsed CLI arguments to the action the binary runs.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_ADMIN_PASSWORD, ARG_DSN, ARG_PORT, session, views};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    let admin_password = matches
        .get_one::<String>(ARG_ADMIN_PASSWORD)
        .cloned()
        .filter(|password| !password.is_empty())
        .map(SecretString::from)
        .context("missing required argument: --admin-password")?;

    Ok(Action::Server(Args {
        port,
        dsn,
        admin_password,
        views: views::Options::parse(matches)?,
        session: session::Options::parse(matches)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn dispatch(args: &[&str]) -> Result<Action> {
        temp_env::with_vars(
            [
                ("CPANEL_ADMIN_PASSWORD", None::<&str>),
                ("CPANEL_APP_VERSION", None),
                ("CPANEL_SESSION_TTL", None),
                ("CPANEL_VIEWS_SUFFIX", None),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(args);
                handler(&matches)
            },
        )
    }

    #[test]
    fn server_action_carries_configuration() -> Result<()> {
        let Action::Server(args) = dispatch(&[
            "cpanel",
            "--port",
            "9000",
            "--admin-password",
            "changeme",
            "--app-version",
            "1.2.3",
        ])?;

        assert_eq!(args.port, 9000);
        assert_eq!(args.admin_password.expose_secret(), "changeme");
        assert_eq!(args.views.static_path(), "/static_v1.2.3");
        assert_eq!(args.session.ttl_seconds, 2_592_000);
        Ok(())
    }

    #[test]
    fn zero_session_ttl_is_rejected() {
        let result = dispatch(&["cpanel", "--session-ttl", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn blank_views_suffix_is_rejected() {
        let result = dispatch(&["cpanel", "--views-suffix", " "]);
        assert!(
            result
                .err()
                .is_some_and(|err| err.to_string().contains("--views-suffix"))
        );
    }

    #[test]
    fn empty_admin_password_is_rejected() {
        let result = dispatch(&["cpanel", "--admin-password", ""]);
        assert!(result.is_err());
    }
}
