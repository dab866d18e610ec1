mod bucket;
mod catalog;
mod credentials;
pub mod encoding;
mod schema;

pub use bucket::{Bucket, Database, Entry, Tx};
pub use catalog::CatalogStore;
pub use credentials::AdminStore;

use std::io::Write;

use crate::error::Result;
use crate::types::Resource;

/// The resource catalog.
pub trait ResourceStore: Send + Sync {
    /// Creates or fully overwrites the resource keyed by `resource.title`.
    fn upsert_resource(&self, resource: &Resource) -> Result<()>;

    /// Saves `resource`, which was previously stored as `original_title`.
    /// When the title changed, the new entry is written before the old one
    /// is removed; the two steps are separate transactions.
    fn replace_resource(&self, original_title: &str, resource: &Resource) -> Result<()>;

    fn list_resources(&self) -> Result<Vec<Resource>>;
    fn get_resource(&self, title: &str) -> Result<Resource>;
    fn delete_resource(&self, title: &str) -> Result<()>;

    /// Writes a point-in-time copy of the whole catalog file to `sink`.
    fn export_snapshot(&self, sink: &mut dyn Write) -> Result<u64>;
}

/// The administrator accounts.
pub trait CredentialStore: Send + Sync {
    fn list_admin_emails(&self) -> Result<Vec<String>>;
    fn account_exists(&self, email: &str) -> Result<()>;
    fn verify_credentials(&self, email: &str, password: &str) -> Result<()>;
    fn upsert_account(&self, email: &str, password: &str) -> Result<()>;
    fn delete_account(&self, email: &str) -> Result<()>;

    /// True when at least one account carries a password hash.
    fn has_admin_account(&self) -> Result<bool>;
}
