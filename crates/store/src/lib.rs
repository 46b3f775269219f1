//! SQLite asset catalogue.
//!
//! This crate holds the one persistent entity of the service: an [`Asset`],
//! the current state of a tracked file identified by its [`Kuid`] and
//! [`FileId`]. Records are written by an external ingestion process and only
//! ever read by the HTTP API, which talks to them through the [`AssetStore`]
//! trait so that persistence stays swappable (and mockable in tests).

mod db;
pub mod error;
#[cfg(feature = "mock")]
mod mock;
mod models;
mod repo;
mod store;

use std::sync::Arc;

pub use crate::db::Database;
#[cfg(feature = "mock")]
pub use crate::mock::MockStore;
pub use crate::models::{
    Asset, AssetFilter, Combine, Comparison, FILE_ID_LENGTH, FileId, Kuid, NewAsset, Predicate,
};
pub use crate::repo::Repository;
pub use crate::store::AssetStore;

/// Shared, type-erased asset store, as held by request handlers.
pub type StoreHandle = Arc<dyn AssetStore>;
