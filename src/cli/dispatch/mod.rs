//! Command-line argument dispatch.
//!
//! This module maps validated CLI arguments to the appropriate action:
//! running the gateway server or performing a one-shot retention sweep.

use crate::cli::actions::{server, sweep, Action};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let db_path = matches
        .get_one::<String>("db-path")
        .cloned()
        .map(PathBuf::from)
        .context("missing required argument: --db-path")?;

    let retention_days = matches
        .get_one::<i64>("session-retention-days")
        .copied()
        .unwrap_or(30);

    if matches.subcommand_matches("sweep").is_some() {
        return Ok(Action::Sweep(sweep::Args {
            db_path,
            retention_days,
        }));
    }

    let base_url = matches
        .get_one::<String>("base-url")
        .cloned()
        .context("missing required argument: --base-url")?;

    Ok(Action::Server(server::Args {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        db_path,
        base_url,
        public_dir: matches
            .get_one::<String>("public-dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("public")),
        content_dir: matches
            .get_one::<String>("content-dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("content")),
        site_title: matches
            .get_one::<String>("site-title")
            .cloned()
            .unwrap_or_else(|| "My Blog".to_string()),
        token_ttl_minutes: matches
            .get_one::<i64>("token-ttl-minutes")
            .copied()
            .unwrap_or(15),
        session_timeout_days: matches
            .get_one::<i64>("session-timeout-days")
            .copied()
            .unwrap_or(7),
        session_retention_days: retention_days,
        rate_limit_per_hour: matches
            .get_one::<u32>("rate-limit-per-hour")
            .copied()
            .unwrap_or(5),
        cookie_secure: matches.get_flag("cookie-secure"),
        mailgun_domain: matches.get_one::<String>("mailgun-domain").cloned(),
        mailgun_api_key: matches
            .get_one::<String>("mailgun-api-key")
            .cloned()
            .map(SecretString::from),
        from_email: matches
            .get_one::<String>("from-email")
            .cloned()
            .unwrap_or_else(|| "noreply@example.com".to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn dispatches_server_by_default() {
        temp_env::with_vars([("LYCHGATE_BASE_URL", Some("https://notes.example.com"))], || {
            let matches = commands::new().get_matches_from(vec!["lychgate"]);
            let action = handler(&matches).expect("dispatch");
            match action {
                Action::Server(args) => {
                    assert_eq!(args.port, 8080);
                    assert_eq!(args.base_url, "https://notes.example.com");
                    assert_eq!(args.token_ttl_minutes, 15);
                    assert_eq!(args.session_timeout_days, 7);
                    assert_eq!(args.session_retention_days, 30);
                }
                Action::Sweep(_) => panic!("expected server action"),
            }
        });
    }

    #[test]
    fn dispatches_sweep_subcommand() {
        let matches = commands::new().get_matches_from(vec![
            "lychgate",
            "--session-retention-days",
            "45",
            "sweep",
        ]);
        let action = handler(&matches).expect("dispatch");
        match action {
            Action::Sweep(args) => {
                assert_eq!(args.db_path, PathBuf::from("lychgate.db"));
                assert_eq!(args.retention_days, 45);
            }
            Action::Server(_) => panic!("expected sweep action"),
        }
    }
}
