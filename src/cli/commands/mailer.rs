use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("mailgun-domain")
                .long("mailgun-domain")
                .help("Mailgun sending domain; when unset, emails are logged instead of sent")
                .env("LYCHGATE_MAILGUN_DOMAIN"),
        )
        .arg(
            Arg::new("mailgun-api-key")
                .long("mailgun-api-key")
                .help("Mailgun API key")
                .env("LYCHGATE_MAILGUN_API_KEY"),
        )
        .arg(
            Arg::new("from-email")
                .long("from-email")
                .help("Sender address for magic link emails")
                .env("LYCHGATE_FROM_EMAIL")
                .default_value("noreply@example.com"),
        )
}
