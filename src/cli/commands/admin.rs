use clap::{Arg, Command};

pub const SUBCOMMAND: &str = "create-admin";
pub const ARG_NAME: &str = "name";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";

/// `create-admin`: seed an administrator account without going through the
/// web registration form.
#[must_use]
pub fn subcommand() -> Command {
    Command::new(SUBCOMMAND)
        .about("Create an administrator account")
        .arg(
            Arg::new(ARG_NAME)
                .long("name")
                .help("Display name")
                .env("QUIZDESK_ADMIN_NAME")
                .required(true),
        )
        .arg(
            Arg::new(ARG_EMAIL)
                .long("email")
                .help("Login email")
                .env("QUIZDESK_ADMIN_EMAIL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .long("password")
                .help("Initial password")
                .env("QUIZDESK_ADMIN_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}
