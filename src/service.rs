//! Query service: turns validated request parameters into store queries and
//! response payloads.

use crate::cache::{Cached, ResponseCache};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::sync::Arc;
use time::UtcDateTime;
use trainz_config::{CombinePolicy, Config, StorageConfig};
use trainz_inspect::Measurement;
use trainz_store::{Asset, AssetFilter, Combine, Comparison, FileId, Kuid, StoreHandle};

/// Route the storage details response is cached under.
pub const DETAILS_ROUTE: &str = "/api/assets/details";

/// Listing parameters. Both bounds are optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub revision: Option<i64>,
    pub last_update: Option<UtcDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetList {
    pub assets: Vec<Asset>,
    /// Highest revision in `assets`.
    pub last_revision: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageDetails {
    /// Revision of the newest asset, `None` for an empty catalogue.
    pub current_revision: Option<i64>,
    pub full: Measurement,
    pub low: Measurement,
}

pub struct AssetService {
    store: StoreHandle,
    storage: StorageConfig,
    comparison: Comparison,
    combine: Combine,
    details: ResponseCache<StorageDetails>,
}

impl AssetService {
    pub fn new(store: StoreHandle, storage: StorageConfig, details: ResponseCache<StorageDetails>) -> Self {
        Self {
            store,
            storage,
            comparison: Comparison::default(),
            combine: Combine::default(),
            details,
        }
    }

    pub fn from_config(store: StoreHandle, config: &Config) -> Self {
        let comparison = if config.filters.inclusive { Comparison::Inclusive } else { Comparison::Strict };
        let combine = match config.filters.combine {
            CombinePolicy::All => Combine::All,
            CombinePolicy::LastWins => Combine::LastWins,
        };
        Self::new(store, config.storage.clone(), ResponseCache::new(config.cache.details_ttl()))
            .with_filters(comparison, combine)
    }

    pub fn with_filters(mut self, comparison: Comparison, combine: Combine) -> Self {
        self.comparison = comparison;
        self.combine = combine;
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// List assets newer than the given bounds, sorted by username.
    ///
    /// An empty result is [`ErrorKind::NotFound`].
    pub async fn list_assets(&self, query: ListQuery) -> Result<AssetList> {
        let filter = AssetFilter {
            revision: query.revision,
            last_update: query.last_update,
            comparison: self.comparison,
            combine: self.combine,
        };
        let assets = self.store.list(&filter).await.or_raise(|| ErrorKind::Store)?;
        let Some(last_revision) = assets.iter().map(|asset| asset.revision).max() else {
            exn::bail!(ErrorKind::NotFound);
        };
        tracing::debug!(count = assets.len(), last_revision, "listed assets");
        Ok(AssetList { assets, last_revision })
    }

    /// Look up an asset by kuid. The kuid is validated before the store is
    /// queried.
    pub async fn get_by_kuid(&self, kuid: &str) -> Result<Asset> {
        let kuid = kuid.parse::<Kuid>().or_raise(|| ErrorKind::Validation(format!("invalid kuid: {kuid}")))?;
        match self.store.get_by_kuid(&kuid).await.or_raise(|| ErrorKind::Store)? {
            Some(asset) => {
                tracing::debug!(%asset, "found asset");
                Ok(asset)
            },
            None => exn::bail!(ErrorKind::NotFound),
        }
    }

    /// Look up an asset by file id, which must be exactly 32 characters.
    pub async fn get_by_file_id(&self, file_id: &str) -> Result<Asset> {
        let file_id = file_id.parse::<FileId>().or_raise(|| {
            ErrorKind::Validation(format!("file id must be {} characters long", trainz_store::FILE_ID_LENGTH))
        })?;
        match self.store.get_by_file_id(&file_id).await.or_raise(|| ErrorKind::Store)? {
            Some(asset) => {
                tracing::debug!(%asset, "found asset");
                Ok(asset)
            },
            None => exn::bail!(ErrorKind::NotFound),
        }
    }

    /// Current revision and the size of both storage tiers, cached for the
    /// configured window.
    pub async fn storage_details(&self) -> Result<Cached<StorageDetails>> {
        let params: [(&str, Option<String>); 0] = [];
        let key = ResponseCache::<StorageDetails>::key(DETAILS_ROUTE, params);
        self.details.get_or_try_insert_with(&key, || self.compute_details()).await
    }

    async fn compute_details(&self) -> Result<StorageDetails> {
        let latest = self.store.get_latest().await.or_raise(|| ErrorKind::Store)?;
        let (full, low) = tokio::try_join!(
            trainz_inspect::measure(&self.storage.full_path),
            trainz_inspect::measure(&self.storage.low_path),
        )
        .or_raise(|| ErrorKind::Inspect)?;
        Ok(StorageDetails {
            current_revision: latest.map(|asset| asset.revision),
            full,
            low,
        })
    }
}
