//! CLI command definitions and dispatch.

pub mod account;
pub mod item;
pub mod share;
pub mod upload;

use clap::{Args, Parser, Subcommand};

use spectra_client::{ItemOptions, PathAllocator, SessionGate, SpectraClient};
use spectra_core::result::AppResult;
use spectra_core::types::Expiration;

use crate::output::OutputFormat;

/// Spectra: share links, pastes and files from the terminal
#[derive(Debug, Parser)]
#[command(name = "spectra", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (loads config/<env>.toml)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show who you are and what the server allows
    Status,
    /// Log in
    Login(account::LoginArgs),
    /// Log out and forget remembered credentials
    Logout,
    /// Share a link
    Link(share::LinkArgs),
    /// Share text from a file or stdin
    Paste(share::PasteArgs),
    /// Share a file
    Upload(upload::UploadArgs),
    /// List your items
    List(item::ListArgs),
    /// Show one item
    Show(item::ShowArgs),
    /// Delete one item
    Delete(item::DeleteArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, client: &SpectraClient) -> AppResult<()> {
        match &self.command {
            Commands::Login(args) => return account::login(args, client, self.format).await,
            Commands::Logout => return account::logout(client).await,
            _ => {}
        }

        client.session.refresh().await?;

        match &self.command {
            Commands::Status => account::status(client, self.format).await,
            Commands::Link(args) => share::link(args, client, self.format).await,
            Commands::Paste(args) => share::paste(args, client, self.format).await,
            Commands::Upload(args) => upload::execute(args, client, self.format).await,
            Commands::List(args) => item::list(args, client, self.format).await,
            Commands::Show(args) => item::show(args, client, self.format).await,
            Commands::Delete(args) => item::delete(args, client).await,
            Commands::Login(_) | Commands::Logout => Ok(()),
        }
    }
}

/// Options shared by every sharing command
#[derive(Debug, Clone, Args)]
pub struct ItemArgs {
    /// Custom path (default: the server picks a random one)
    #[arg(long)]
    pub path: Option<String>,

    /// Expiry: 1h, 8h, 1d, 7d, 14d, permanent, or a number of seconds
    #[arg(long, default_value = "7d")]
    pub expires: Expiration,

    /// Maximum number of visits (0 = unlimited)
    #[arg(long)]
    pub max_visits: Option<u32>,

    /// Password required to open the item
    #[arg(long)]
    pub password: Option<String>,

    /// Anti-abuse challenge token, required when sharing as a guest
    #[arg(long)]
    pub challenge_token: Option<String>,
}

impl ItemArgs {
    /// Build submission options, applying the guest path rule.
    pub fn options(&self, gate: &SessionGate) -> AppResult<ItemOptions> {
        let mut path = PathAllocator::random();
        if let Some(candidate) = &self.path {
            path.set_candidate(candidate.clone());
            path.set_use_random(false, gate)?;
        }
        Ok(ItemOptions {
            path,
            expiration: self.expires,
            max_visits: self.max_visits,
            password: self.password.clone(),
            challenge_token: self.challenge_token.clone(),
        })
    }
}
