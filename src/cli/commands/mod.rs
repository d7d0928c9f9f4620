pub mod auth;
pub mod logging;
pub mod mailer;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("lychgate")
        .about("Magic-link authentication gateway for a static note garden")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("LYCHGATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("db-path")
                .short('d')
                .long("db-path")
                .help("Path to the SQLite database; created on first start")
                .env("LYCHGATE_DB_PATH")
                .default_value("lychgate.db"),
        )
        .arg(
            Arg::new("public-dir")
                .long("public-dir")
                .help("Directory of built site files served to authenticated visitors")
                .env("LYCHGATE_PUBLIC_DIR")
                .default_value("public"),
        )
        .arg(
            Arg::new("content-dir")
                .long("content-dir")
                .help("Directory of Markdown sources scanned for orphaned pages")
                .env("LYCHGATE_CONTENT_DIR")
                .default_value("content"),
        )
        .arg(
            Arg::new("site-title")
                .long("site-title")
                .help("Site title used in login emails and pages")
                .env("LYCHGATE_SITE_TITLE")
                .default_value("My Blog"),
        )
        .subcommand(
            Command::new("sweep")
                .about("Purge expired magic link tokens and sessions past the retention ceiling"),
        );

    let command = auth::with_args(command);
    let command = mailer::with_args(command);
    logging::with_args(command)
}
