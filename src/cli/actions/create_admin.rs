use crate::{
    api::handlers::valid_email,
    credentials::CredentialStore,
    roles::Role,
};
use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub dsn: String,
    pub name: String,
    pub email: String,
    pub password: SecretString,
}

/// Create an administrator account directly in the credential store.
/// # Errors
/// Returns an error if the input is invalid, the email is already registered,
/// or the store cannot be opened.
pub async fn execute(args: Args) -> Result<()> {
    let name = args.name.trim();
    let email = args.email.trim();
    if name.is_empty() {
        bail!("The name must not be blank");
    }
    if !valid_email(email) {
        bail!("Invalid email address: {email}");
    }
    if args.password.expose_secret().trim().is_empty() {
        bail!("The password must not be blank");
    }

    let store = CredentialStore::connect(&args.dsn)
        .await
        .context("Failed to open credential store")?;
    let id = store
        .register(name, Role::Admin, email, args.password.expose_secret())
        .await
        .with_context(|| format!("Failed to create administrator {email}"))?;

    info!(user_id = %id, email, "administrator created");
    println!("Created administrator {email} ({id})");
    Ok(())
}
