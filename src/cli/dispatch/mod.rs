//! Map validated CLI matches to the action the binary executes.

use crate::cli::{
    actions::{create_admin, server, Action},
    commands::{self, admin, server as server_args},
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;

/// # Errors
/// Returns an error if required arguments are missing or the subcommand is unknown.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let dsn = matches
        .get_one::<String>(commands::ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;

    match matches.subcommand() {
        Some((commands::SUBCOMMAND_SERVE, _)) => Ok(Action::Server(server::Args {
            port: matches
                .get_one::<u16>(server_args::ARG_PORT)
                .copied()
                .unwrap_or(8080),
            dsn,
            bank_path: matches
                .get_one::<String>(server_args::ARG_BANK_PATH)
                .map(PathBuf::from)
                .context("missing required argument: --bank-path")?,
            session_ttl_seconds: matches
                .get_one::<i64>(server_args::ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(60 * 60 * 24),
            cookie_secure: matches.get_flag(server_args::ARG_COOKIE_SECURE),
        })),
        Some((admin::SUBCOMMAND, sub_m)) => {
            let arg = |id: &str| {
                sub_m
                    .get_one::<String>(id)
                    .cloned()
                    .with_context(|| format!("missing required argument: --{id}"))
            };
            Ok(Action::CreateAdmin(create_admin::Args {
                dsn,
                name: arg(admin::ARG_NAME)?,
                email: arg(admin::ARG_EMAIL)?,
                password: SecretString::from(arg(admin::ARG_PASSWORD)?),
            }))
        }
        Some((other, _)) => Err(anyhow!("unknown subcommand: {other}")),
        None => Err(anyhow!("missing subcommand")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn serve_maps_to_server_action() {
        temp_env::with_vars(
            [
                ("QUIZDESK_SESSION_TTL_SECONDS", Some("120")),
                ("QUIZDESK_COOKIE_SECURE", Some("true")),
            ],
            || {
                let matches = commands::new().get_matches_from(vec![
                    "quizdesk",
                    "serve",
                    "--dsn",
                    "sqlite::memory:",
                    "--port",
                    "3000",
                ]);
                let Ok(Action::Server(args)) = handler(&matches) else {
                    panic!("expected a server action");
                };
                assert_eq!(args.port, 3000);
                assert_eq!(args.dsn, "sqlite::memory:");
                assert_eq!(args.session_ttl_seconds, 120);
                assert!(args.cookie_secure);
            },
        );
    }

    #[test]
    fn create_admin_keeps_password_secret() {
        let matches = commands::new().get_matches_from(vec![
            "quizdesk",
            "create-admin",
            "--name",
            "Root",
            "--email",
            "root@example.com",
            "--password",
            "s3cret",
        ]);
        let Ok(Action::CreateAdmin(args)) = handler(&matches) else {
            panic!("expected a create-admin action");
        };
        assert_eq!(args.email, "root@example.com");
        assert_eq!(args.password.expose_secret(), "s3cret");
        assert!(!format!("{args:?}").contains("s3cret"));
    }
}
