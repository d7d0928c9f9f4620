use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    let command = with_token_args(command);
    with_session_args(command)
}

fn with_token_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .help("Public base URL used to build verification links")
                .env("LYCHGATE_BASE_URL")
                .default_value("http://localhost:8080"),
        )
        .arg(
            Arg::new("token-ttl-minutes")
                .long("token-ttl-minutes")
                .help("Magic link token TTL in minutes")
                .env("LYCHGATE_TOKEN_TTL_MINUTES")
                .default_value("15")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("rate-limit-per-hour")
                .long("rate-limit-per-hour")
                .help("Magic link requests allowed per client IP per hour")
                .env("LYCHGATE_RATE_LIMIT_PER_HOUR")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("session-timeout-days")
                .long("session-timeout-days")
                .help("Sliding session timeout in days, measured from last access")
                .env("LYCHGATE_SESSION_TIMEOUT_DAYS")
                .default_value("7")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("session-retention-days")
                .long("session-retention-days")
                .help("Absolute session age ceiling in days, measured from creation")
                .env("LYCHGATE_SESSION_RETENTION_DAYS")
                .default_value("30")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("cookie-secure")
                .long("cookie-secure")
                .help("Force the Secure attribute on the session cookie")
                .env("LYCHGATE_COOKIE_SECURE")
                .action(clap::ArgAction::SetTrue),
        )
}
