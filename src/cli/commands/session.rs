use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_SESSION_TTL: &str = "session-ttl";
pub const ARG_SECURE_COOKIE: &str = "secure-cookie";

#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub ttl_seconds: u64,
    pub secure_cookie: bool,
}

impl Options {
    /// # Errors
    /// Returns an error if the TTL is missing or zero.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let ttl_seconds = matches
            .get_one::<u64>(ARG_SESSION_TTL)
            .copied()
            .filter(|ttl| *ttl > 0)
            .ok_or_else(|| anyhow::anyhow!("--{ARG_SESSION_TTL} must be greater than zero"))?;

        Ok(Self {
            ttl_seconds,
            secure_cookie: matches.get_flag(ARG_SECURE_COOKIE),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_TTL)
                .long(ARG_SESSION_TTL)
                .help("Session lifetime in seconds (cookie Max-Age and store retention)")
                .env("CPANEL_SESSION_TTL")
                .default_value("2592000")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIE)
                .long(ARG_SECURE_COOKIE)
                .help("Mark the session cookie Secure (HTTPS only)")
                .env("CPANEL_SECURE_COOKIE")
                .action(ArgAction::SetTrue),
        )
}
