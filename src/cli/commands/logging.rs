use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Parser for `LYCHGATE_LOG_LEVEL`: accepts a level name or a digit
/// equivalent to that many `-v` flags (0 through 4).
#[must_use]
pub fn log_level_parser() -> ValueParser {
    ValueParser::from(|value: &str| -> std::result::Result<u8, String> {
        match value.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            other => match other.parse::<u8>() {
                Ok(count) if count <= 4 => Ok(count),
                _ => Err(format!("invalid log level: {value}")),
            },
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log verbosity; repeat (-vv) or set error|warn|info|debug|trace")
            .env("LYCHGATE_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(log_level_parser()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_command() -> Command {
        Command::new("test").arg(
            Arg::new("level")
                .long("level")
                .value_parser(log_level_parser())
                .action(ArgAction::Set),
        )
    }

    #[test]
    fn level_names_and_digits_map_to_counts() {
        for (value, expected) in [
            ("error", 0u8),
            ("warn", 1),
            ("info", 2),
            ("debug", 3),
            ("trace", 4),
            ("0", 0),
            ("3", 3),
        ] {
            let matches = level_command().get_matches_from(vec!["test", "--level", value]);
            assert_eq!(matches.get_one::<u8>("level").copied(), Some(expected));
        }
    }

    #[test]
    fn out_of_range_levels_rejected() {
        for value in ["loud", "5", "255", ""] {
            let result = level_command().try_get_matches_from(vec!["test", "--level", value]);
            assert!(result.is_err(), "{value} should be rejected");
        }
    }
}
