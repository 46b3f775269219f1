//! In-memory asset store for testing.

use crate::error::Result;
use crate::models::{Asset, AssetFilter, FileId, Kuid};
use crate::store::AssetStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::UtcDateTime;
use tokio::sync::RwLock;

/// In-memory asset store for testing.
///
/// Assets live in a `Vec` behind a [`RwLock`]. Every trait call is counted,
/// so tests can assert that a request was (or was not) answered by the
/// store.
///
/// # Examples
///
/// ```
/// use trainz_store::{AssetStore, MockStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MockStore::default();
/// assert!(store.list_all().await.unwrap().is_empty());
/// assert_eq!(store.calls(), 1);
/// # }
/// ```
#[derive(Default)]
pub struct MockStore {
    assets: RwLock<Vec<Asset>>,
    calls: AtomicUsize,
}

impl MockStore {
    pub fn with_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        Self {
            assets: RwLock::new(assets.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Build an asset with plausible values; `id` is derived from the
    /// revision. Panics on an invalid kuid: if test setup is wrong, then the
    /// test should not pass.
    pub fn asset(username: &str, kuid: &str, file_id: &str, revision: i64, last_update: UtcDateTime) -> Asset {
        let (Ok(kuid), Ok(file_id)) = (kuid.parse::<Kuid>(), file_id.parse::<FileId>()) else {
            panic!("MockStore::asset: invalid kuid {kuid} or file id {file_id}");
        };
        Asset {
            id: revision,
            username: username.to_string(),
            kuid,
            sha1: "0".repeat(40),
            file_id,
            revision,
            last_update,
        }
    }

    /// Number of trait calls answered so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AssetStore for MockStore {
    async fn list(&self, filter: &AssetFilter) -> Result<Vec<Asset>> {
        self.record();
        let mut assets: Vec<Asset> = self.assets.read().await.iter().filter(|a| filter.matches(a)).cloned().collect();
        assets.sort_by(|a, b| a.username.cmp(&b.username).then(a.id.cmp(&b.id)));
        Ok(assets)
    }

    async fn get_by_kuid(&self, kuid: &Kuid) -> Result<Option<Asset>> {
        self.record();
        Ok(self.assets.read().await.iter().find(|a| &a.kuid == kuid).cloned())
    }

    async fn get_by_file_id(&self, file_id: &FileId) -> Result<Option<Asset>> {
        self.record();
        Ok(self.assets.read().await.iter().find(|a| &a.file_id == file_id).cloned())
    }

    async fn get_latest(&self) -> Result<Option<Asset>> {
        self.record();
        Ok(self.assets.read().await.iter().max_by_key(|a| (a.revision, a.id)).cloned())
    }
}
