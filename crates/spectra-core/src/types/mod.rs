//! Wire and value types shared by the Spectra client crates.

pub mod envelope;
pub mod expiration;
pub mod item;
pub mod pagination;

pub use envelope::{ApiEnvelope, Credentials, Identity, SiteConfig};
pub use expiration::Expiration;
pub use item::{CreateItemBody, CreatedItem, ItemDetail, ItemKind, ItemSummary};
pub use pagination::PageRequest;
