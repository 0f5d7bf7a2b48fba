//! Item listing, lookup and deletion commands.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use spectra_client::SpectraClient;
use spectra_core::error::AppError;
use spectra_core::result::AppResult;
use spectra_core::types::{ItemSummary, PageRequest};

use crate::output::{self, OutputFormat};

/// Arguments for the list command
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Number of items to skip
    #[arg(long, default_value_t = 0)]
    pub offset: u64,

    /// Page size (1-100)
    #[arg(long, default_value_t = 20)]
    pub limit: u64,
}

/// Arguments for the show command
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Item path
    pub path: String,

    /// Item password
    #[arg(long)]
    pub password: Option<String>,
}

/// Arguments for the delete command
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Item path
    pub path: String,

    /// Skip confirmation
    #[arg(long)]
    pub yes: bool,
}

/// Item display row
#[derive(Debug, Serialize, Tabled)]
struct ItemRow {
    /// Path
    path: String,
    /// Kind
    kind: String,
    /// Visits
    visits: i64,
    /// Created
    created: String,
    /// Creator
    creator: String,
}

impl From<&ItemSummary> for ItemRow {
    fn from(item: &ItemSummary) -> Self {
        Self {
            path: item.short_path.clone(),
            kind: item.item_type.to_string(),
            visits: item.visits,
            created: item.created_at.format("%Y-%m-%d %H:%M").to_string(),
            creator: output::or_dash(item.creator.as_deref()),
        }
    }
}

/// List the caller's items
pub async fn list(args: &ListArgs, client: &SpectraClient, format: OutputFormat) -> AppResult<()> {
    let items = client
        .catalog
        .list(PageRequest::new(args.offset, args.limit))
        .await?;
    match format {
        OutputFormat::Json => output::print_json(&items),
        OutputFormat::Table => {
            let rows: Vec<ItemRow> = items.iter().map(ItemRow::from).collect();
            output::print_list(&rows, format);
        }
    }
    Ok(())
}

/// Show one item
pub async fn show(args: &ShowArgs, client: &SpectraClient, format: OutputFormat) -> AppResult<()> {
    let detail = client
        .catalog
        .get(&args.path, args.password.as_deref())
        .await?;
    match format {
        OutputFormat::Json => output::print_json(&detail),
        OutputFormat::Table => {
            output::print_kv("Path", &detail.short_path);
            output::print_kv("Kind", &detail.item_type.to_string());
            output::print_kv("Data", &detail.data);
            output::print_kv("Visits", &detail.visits.to_string());
            output::print_kv("Max visits", &output::or_dash(detail.max_visits));
            output::print_kv("Expires", &output::or_dash(detail.expires_at.map(|t| t.to_rfc3339())));
            output::print_kv("Created", &detail.created_at.to_rfc3339());
            if detail.is_exhausted(chrono::Utc::now()) {
                output::print_warning("This item has expired or used up its visits");
            }
        }
    }
    Ok(())
}

/// Delete one item
pub async fn delete(args: &DeleteArgs, client: &SpectraClient) -> AppResult<()> {
    if !args.yes {
        let confirm = dialoguer::Confirm::new()
            .with_prompt(format!("Delete '{}'?", args.path))
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    client.catalog.delete(&args.path).await?;
    output::print_success(&format!("Deleted '{}'", args.path));
    Ok(())
}
