use crate::api::{self, handlers::session::AuthConfig};
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub bank_path: PathBuf,
    pub session_ttl_seconds: i64,
    pub cookie_secure: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if a store cannot be opened or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let auth_config = AuthConfig::new()
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_cookie_secure(args.cookie_secure);

    api::new(args.port, args.dsn, args.bank_path, auth_config).await
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(&args.dsn)),
        ("bank_path", args.bank_path.display().to_string()),
        ("session_ttl_seconds", args.session_ttl_seconds.to_string()),
        ("cookie_secure", args.cookie_secure.to_string()),
    ];
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        crate::GIT_COMMIT_HASH.get(0..7).unwrap_or(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => dsn.to_string(),
    }
}
