//! Read interface to the asset catalogue.

use crate::error::Result;
use crate::models::{Asset, AssetFilter, FileId, Kuid};
use async_trait::async_trait;
use time::UtcDateTime;

/// Unified read interface over the asset catalogue.
///
/// The HTTP service only ever needs these queries, so this is all it gets.
/// Every listing is ordered by `username` ascending (ties broken by `id`)
/// and returns an empty vector, not an error, when nothing matches. Point
/// lookups return `None` when the key is absent.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// List assets matching the filter.
    async fn list(&self, filter: &AssetFilter) -> Result<Vec<Asset>>;

    /// Look up an asset by its kuid.
    async fn get_by_kuid(&self, kuid: &Kuid) -> Result<Option<Asset>>;

    /// Look up an asset by its file identifier.
    async fn get_by_file_id(&self, file_id: &FileId) -> Result<Option<Asset>>;

    /// The asset carrying the highest revision in the catalogue.
    async fn get_latest(&self) -> Result<Option<Asset>>;

    async fn list_all(&self) -> Result<Vec<Asset>> {
        self.list(&AssetFilter::default()).await
    }

    async fn list_with_revision_greater_than(&self, revision: i64) -> Result<Vec<Asset>> {
        self.list(&AssetFilter::revision_greater_than(revision)).await
    }

    async fn list_with_last_update_greater_than(&self, last_update: UtcDateTime) -> Result<Vec<Asset>> {
        self.list(&AssetFilter::last_update_greater_than(last_update)).await
    }
}
