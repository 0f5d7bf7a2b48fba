//! File upload command with a progress line and Ctrl-C cancellation.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use spectra_client::{SpectraClient, UploadObserver, UploadPayload, UploadState};
use spectra_core::error::AppError;
use spectra_core::result::AppResult;

use super::ItemArgs;
use super::share::print_submission;
use crate::output::{self, OutputFormat};

/// Arguments for the upload command
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Path to the file to upload
    pub file: PathBuf,

    /// Override file name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Shared item options
    #[command(flatten)]
    pub item: ItemArgs,
}

/// Renders upload progress on stderr.
#[derive(Debug)]
struct ProgressLine {
    quiet: bool,
}

impl UploadObserver for ProgressLine {
    fn on_progress(&self, percent: u8) {
        if !self.quiet {
            eprint!("\rUploading... {percent:>3}%");
            let _ = std::io::stderr().flush();
        }
    }

    fn on_terminal(&self, state: UploadState) {
        if !self.quiet {
            eprintln!();
        }
        if state == UploadState::Aborted {
            output::print_warning("Upload cancelled");
        }
    }

    fn on_cleanup(&self, result: &AppResult<()>) {
        if let Err(e) = result {
            output::print_warning(&format!(
                "The partially created item could not be removed: {}",
                e.user_message()
            ));
        }
    }
}

/// Execute the upload command
pub async fn execute(args: &UploadArgs, client: &SpectraClient, format: OutputFormat) -> AppResult<()> {
    let options = args.item.options(&client.session.gate())?;

    let file_name = args.name.clone().unwrap_or_else(|| {
        args.file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string()
    });
    let content = tokio::fs::read(&args.file)
        .await
        .map_err(|e| AppError::storage(format!("Failed to read {}: {e}", args.file.display())))?;
    let payload = UploadPayload::new(file_name, content);

    let submitter = Arc::clone(&client.submitter);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            submitter.cancel_active_upload();
        }
    });

    let observer = Arc::new(ProgressLine {
        quiet: format == OutputFormat::Json,
    });
    let result = client.submitter.submit_file(payload, &options, observer).await;
    interrupt.abort();

    match result {
        Ok(submission) => {
            print_submission(&submission, format);
            Ok(())
        }
        Err(e) => {
            if let Some(path) = client.submitter.failed_upload_path() {
                offer_cleanup(client, &path, format).await;
            }
            Err(e)
        }
    }
}

/// Offer to delete the record a failed upload left behind.
async fn offer_cleanup(client: &SpectraClient, path: &str, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_warning(&format!(
            "Item '{path}' was created but has no file; run `spectra delete {path}` to remove it"
        ));
        return;
    }

    let confirmed = dialoguer::Confirm::new()
        .with_prompt(format!("Item '{path}' has no file. Remove it?"))
        .default(true)
        .interact()
        .unwrap_or(false);
    if !confirmed {
        output::print_warning(&format!("Kept '{path}'; run `spectra delete {path}` later"));
        return;
    }

    match client.submitter.discard_failed_upload().await {
        Ok(Some(deleted)) => output::print_success(&format!("Removed '{deleted}'")),
        Ok(None) => {}
        Err(e) => output::print_warning(&format!(
            "Could not remove '{path}': {}",
            e.user_message()
        )),
    }
}
