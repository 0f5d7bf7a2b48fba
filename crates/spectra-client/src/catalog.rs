//! Listing, lookup and deletion of existing items, plus change notifications.

use tokio::sync::broadcast;
use tracing::{debug, info};

use spectra_core::events::{ItemChange, ItemEvent};
use spectra_core::result::AppResult;
use spectra_core::types::{ItemDetail, ItemSummary, PageRequest};

use crate::request::ApiClient;
use crate::transport::ApiRequest;

/// Buffered item events per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 64;

/// Read and delete access to the caller's items.
#[derive(Debug)]
pub struct ItemCatalog {
    client: ApiClient,
    events: broadcast::Sender<ItemEvent>,
}

impl ItemCatalog {
    /// Create a catalog over a resilient client.
    pub fn new(client: ApiClient) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { client, events }
    }

    /// Receive `Created`/`Deleted` notifications for list refresh.
    pub fn subscribe(&self) -> broadcast::Receiver<ItemEvent> {
        self.events.subscribe()
    }

    /// One page of the caller's items.
    pub async fn list(&self, page: PageRequest) -> AppResult<Vec<ItemSummary>> {
        let mut request = ApiRequest::get(&["api", "items"]);
        for (key, value) in page.query() {
            request = request.query(key, value);
        }
        let items: Vec<ItemSummary> = self.client.execute(request).await?.into_result()?.payload()?;
        debug!(offset = page.offset, count = items.len(), "Listed items");
        Ok(items)
    }

    /// Full record for one item. Password-protected items need `password`.
    pub async fn get(&self, short_path: &str, password: Option<&str>) -> AppResult<ItemDetail> {
        let mut request = ApiRequest::get(&["api", "item", short_path]).query("detailed", "true");
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            request = request.query("password", password);
        }
        self.client.execute(request).await?.into_result()?.payload()
    }

    /// Delete an item and notify subscribers.
    pub async fn delete(&self, short_path: &str) -> AppResult<()> {
        self.client.delete_item(short_path).await?;
        info!(path = %short_path, "Item deleted");
        self.notify(ItemChange::Deleted {
            short_path: short_path.to_string(),
        });
        Ok(())
    }

    pub(crate) fn notify(&self, change: ItemChange) {
        // No subscribers is fine.
        let _ = self.events.send(ItemEvent::new(change));
    }
}
