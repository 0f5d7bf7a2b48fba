//! Session commands: status, login, logout.

use clap::Args;

use spectra_client::SpectraClient;
use spectra_core::error::AppError;
use spectra_core::result::AppResult;
use spectra_core::types::Credentials;

use crate::output::{self, OutputFormat};

/// Arguments for the login command
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Password (prompted when omitted)
    #[arg(long)]
    pub password: Option<String>,

    /// Remember the credentials for silent re-login
    #[arg(long)]
    pub remember: bool,
}

/// Print the resolved session
pub async fn status(client: &SpectraClient, format: OutputFormat) -> AppResult<()> {
    let session = client.session.snapshot();
    match format {
        OutputFormat::Json => output::print_json(&session),
        OutputFormat::Table => {
            let user = session
                .identity
                .as_ref()
                .map(|i| i.name.clone())
                .unwrap_or_else(|| "(guest)".to_string());
            output::print_kv("User", &user);
            output::print_kv(
                "Guest sharing",
                if session.guest_write_enabled { "enabled" } else { "disabled" },
            );
            output::print_kv(
                "Challenge",
                if session.gate().requires_challenge() { "required" } else { "not required" },
            );
        }
    }
    Ok(())
}

/// Log in, prompting for the password when needed
pub async fn login(args: &LoginArgs, client: &SpectraClient, format: OutputFormat) -> AppResult<()> {
    let password = match &args.password {
        Some(password) => password.clone(),
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?,
    };

    let identity = client
        .session
        .login(Credentials::new(args.email.clone(), password), args.remember)
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&identity),
        OutputFormat::Table => output::print_success(&format!("Logged in as {}", identity.name)),
    }
    Ok(())
}

/// Log out
pub async fn logout(client: &SpectraClient) -> AppResult<()> {
    client.session.logout().await?;
    output::print_success("Logged out");
    Ok(())
}
