use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;
use tracing::Level;

/// Parse the command line, bring up logging, and resolve which action the
/// binary should run. Kept separate from `execute` so argument handling
/// stays testable without side effects.
///
/// # Errors
///
/// Returns an error when logging cannot be initialized or the arguments do
/// not form a runnable action.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let verbosity = matches
        .get_one::<u8>(commands::logging::ARG_VERBOSITY)
        .copied()
        .unwrap_or(0);
    telemetry::init(verbosity_to_level(verbosity))?;

    dispatch::handler(&matches)
}

/// `-v` repetitions (or a named `LYCHGATE_LOG_LEVEL`) to a tracing level.
/// Zero means only errors; anything past `-vvvv` stays at TRACE.
const fn verbosity_to_level(verbosity: u8) -> Option<Level> {
    match verbosity {
        0 => None,
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}
