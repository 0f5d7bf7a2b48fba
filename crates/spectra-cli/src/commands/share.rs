//! Link and paste commands.

use std::path::{Path, PathBuf};

use clap::Args;
use tokio::io::AsyncReadExt;

use spectra_client::{CodeForm, LinkForm, SpectraClient, Submission};
use spectra_core::error::AppError;
use spectra_core::result::AppResult;

use super::ItemArgs;
use crate::output::{self, OutputFormat};

/// Arguments for the link command
#[derive(Debug, Args)]
pub struct LinkArgs {
    /// Target URL
    pub target: String,

    /// Share the target even if it is not a valid URL
    #[arg(long)]
    pub force: bool,

    /// Shared item options
    #[command(flatten)]
    pub item: ItemArgs,
}

/// Arguments for the paste command
#[derive(Debug, Args)]
pub struct PasteArgs {
    /// File to read, or `-` for stdin
    pub source: PathBuf,

    /// Syntax-highlight language
    #[arg(short, long)]
    pub language: Option<String>,

    /// Shared item options
    #[command(flatten)]
    pub item: ItemArgs,
}

/// Share a link
pub async fn link(args: &LinkArgs, client: &SpectraClient, format: OutputFormat) -> AppResult<()> {
    let options = args.item.options(&client.session.gate())?;
    let form = LinkForm {
        target: args.target.clone(),
        allow_invalid: args.force,
    };
    let submission = client.submitter.submit_link(form, &options).await?;
    print_submission(&submission, format);
    Ok(())
}

/// Share pasted text
pub async fn paste(args: &PasteArgs, client: &SpectraClient, format: OutputFormat) -> AppResult<()> {
    let options = args.item.options(&client.session.gate())?;
    let content = read_source(&args.source).await?;
    let form = CodeForm {
        content,
        language: args.language.clone(),
    };
    let submission = client.submitter.submit_code(form, &options).await?;
    print_submission(&submission, format);
    Ok(())
}

/// Print a created item
pub fn print_submission(submission: &Submission, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(submission),
        OutputFormat::Table => {
            output::print_success(&format!("Shared {} '{}'", submission.kind, submission.short_path));
            output::print_kv("URL", &submission.url);
        }
    }
}

async fn read_source(source: &Path) -> AppResult<String> {
    if source.as_os_str() == "-" {
        let mut content = String::new();
        tokio::io::stdin()
            .read_to_string(&mut content)
            .await
            .map_err(|e| AppError::storage(format!("Failed to read stdin: {e}")))?;
        return Ok(content);
    }
    tokio::fs::read_to_string(source)
        .await
        .map_err(|e| AppError::storage(format!("Failed to read {}: {e}", source.display())))
}
