use clap::{Arg, ArgAction, Command};

pub const ARG_PORT: &str = "port";
pub const ARG_BANK_PATH: &str = "bank-path";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_COOKIE_SECURE: &str = "cookie-secure";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("QUIZDESK_PORT")
                .global(true)
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_BANK_PATH)
                .long("bank-path")
                .help("Path of the flashcard bank JSON document")
                .long_help(
                    "Path of the flashcard bank JSON document. Created with the built-in topics if it does not exist.",
                )
                .default_value("questions.json")
                .env("QUIZDESK_BANK_PATH")
                .global(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long("session-ttl-seconds")
                .help("Lifetime of a login session in seconds")
                .default_value("86400")
                .env("QUIZDESK_SESSION_TTL_SECONDS")
                .global(true)
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_COOKIE_SECURE)
                .long("cookie-secure")
                .help("Mark the session cookie Secure (serve behind HTTPS)")
                .env("QUIZDESK_COOKIE_SECURE")
                .global(true)
                .action(ArgAction::SetTrue),
        )
}
