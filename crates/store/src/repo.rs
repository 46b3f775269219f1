//! SQLite repository for asset records.
//!
//! The table holds exactly one row per asset: its current state. Pushing new
//! content for a kuid overwrites that row in place, so no revision history is
//! kept.

use crate::Database;
use crate::error::{ErrorKind, Result, classify_write};
use crate::models::{Asset, AssetFilter, AssetRow, FileId, Kuid, NewAsset, Predicate};
use crate::store::AssetStore;
use async_trait::async_trait;
use exn::ResultExt;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use time::UtcDateTime;
use tracing::instrument;

fn into_assets(rows: Vec<AssetRow>) -> Result<Vec<Asset>> {
    rows.into_iter().map(Asset::try_from).collect()
}

/// Repository for the `assets` table.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Insert/Update
    // =========================================================================

    /// Insert a new asset, or overwrite the stored state of an existing kuid.
    ///
    /// `last_update` is always set by the store. An update only applies when
    /// its revision is greater than the one on record; stale pushes are
    /// ignored and `false` is returned.
    ///
    /// Returns [`ErrorKind::Constraint`] if the file id already belongs to a
    /// different kuid.
    pub async fn upsert(&self, asset: &NewAsset) -> Result<bool> {
        self.upsert_at(asset, UtcDateTime::now()).await
    }

    pub(crate) async fn upsert_at(&self, asset: &NewAsset, now: UtcDateTime) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/upsert_asset.sql"))
            .bind(&asset.username)
            .bind(asset.kuid.as_str())
            .bind(&asset.sha1)
            .bind(asset.file_id.as_str())
            .bind(asset.revision)
            .bind(now.unix_timestamp())
            .execute(&self.pool)
            .await
            .map_err(|err| {
                let kind = classify_write(&err);
                exn::Exn::from(err).raise(kind)
            })?;
        let written = result.rows_affected() > 0;
        if !written {
            tracing::debug!(kuid = %asset.kuid, revision = asset.revision, "ignoring stale asset revision");
        }
        Ok(written)
    }

    fn list_query(filter: &AssetFilter) -> QueryBuilder<'static, Sqlite> {
        let mut query = QueryBuilder::new(include_str!("../queries/list_assets.sql"));
        let operator = filter.comparison.operator();
        for (i, predicate) in filter.predicates().into_iter().enumerate() {
            query.push(if i == 0 { " WHERE " } else { " AND " });
            match predicate {
                Predicate::Revision(revision) => {
                    query.push(format!("revision {operator} ")).push_bind(revision);
                },
                Predicate::LastUpdate(last_update) => {
                    query.push(format!("last_update {operator} ")).push_bind(last_update.unix_timestamp());
                },
            }
        }
        query.push(" ORDER BY username ASC, id ASC");
        query
    }
}

#[async_trait]
impl AssetStore for Repository {
    #[instrument(skip(self))]
    async fn list(&self, filter: &AssetFilter) -> Result<Vec<Asset>> {
        let rows: Vec<AssetRow> = Self::list_query(filter)
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        into_assets(rows)
    }

    async fn get_by_kuid(&self, kuid: &Kuid) -> Result<Option<Asset>> {
        let row: Option<AssetRow> = sqlx::query_as(include_str!("../queries/get_by_kuid.sql"))
            .bind(kuid.as_str())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Asset::try_from).transpose()
    }

    async fn get_by_file_id(&self, file_id: &FileId) -> Result<Option<Asset>> {
        let row: Option<AssetRow> = sqlx::query_as(include_str!("../queries/get_by_file_id.sql"))
            .bind(file_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Asset::try_from).transpose()
    }

    async fn get_latest(&self) -> Result<Option<Asset>> {
        let row: Option<AssetRow> = sqlx::query_as(include_str!("../queries/get_latest.sql"))
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Asset::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Combine, Comparison};
    use rstest::rstest;

    fn at(seconds: i64) -> UtcDateTime {
        UtcDateTime::from_unix_timestamp(1_700_000_000 + seconds).unwrap()
    }

    fn make_asset(username: &str, kuid: &str, revision: i64) -> NewAsset {
        let digits: String = kuid.chars().filter(char::is_ascii_digit).collect();
        NewAsset {
            username: username.to_string(),
            kuid: kuid.parse().unwrap(),
            sha1: format!("{digits:0>40}"),
            file_id: format!("{digits:0>32}").parse().unwrap(),
            revision,
        }
    }

    /// Three assets, inserted out of username order:
    ///
    /// | username | kuid         | revision | last_update |
    /// |----------|--------------|----------|-------------|
    /// | carol    | kuid:3:3     | 30       | +300        |
    /// | alice    | kuid:1:1     | 10       | +100        |
    /// | bob      | kuid2:2:2:2  | 20       | +200        |
    async fn seeded() -> Repository {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        repo.upsert_at(&make_asset("carol", "kuid:3:3", 30), at(300)).await.unwrap();
        repo.upsert_at(&make_asset("alice", "kuid:1:1", 10), at(100)).await.unwrap();
        repo.upsert_at(&make_asset("bob", "kuid2:2:2:2", 20), at(200)).await.unwrap();
        repo
    }

    fn usernames(assets: &[Asset]) -> Vec<&str> {
        assets.iter().map(|a| a.username.as_str()).collect()
    }

    #[tokio::test]
    async fn test_list_all_sorted_by_username() {
        let repo = seeded().await;
        let assets = repo.list_all().await.unwrap();
        assert_eq!(usernames(&assets), vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_list_empty_catalogue() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        assert!(repo.list_all().await.unwrap().is_empty());
        assert!(repo.get_latest().await.unwrap().is_none());
    }

    #[rstest]
    #[case(0, vec!["alice", "bob", "carol"])]
    #[case(10, vec!["bob", "carol"])]
    #[case(19, vec!["bob", "carol"])]
    #[case(20, vec!["carol"])]
    #[case(30, vec![])]
    #[tokio::test]
    async fn test_list_with_revision_greater_than(#[case] revision: i64, #[case] expected: Vec<&str>) {
        let repo = seeded().await;
        let assets = repo.list_with_revision_greater_than(revision).await.unwrap();
        assert!(assets.iter().all(|a| a.revision > revision));
        assert_eq!(usernames(&assets), expected);
    }

    #[rstest]
    #[case(0, vec!["alice", "bob", "carol"])]
    #[case(100, vec!["bob", "carol"])]
    #[case(250, vec!["carol"])]
    #[case(300, vec![])]
    #[tokio::test]
    async fn test_list_with_last_update_greater_than(#[case] offset: i64, #[case] expected: Vec<&str>) {
        let repo = seeded().await;
        let assets = repo.list_with_last_update_greater_than(at(offset)).await.unwrap();
        assert_eq!(usernames(&assets), expected);
    }

    #[tokio::test]
    async fn test_inclusive_comparison() {
        let repo = seeded().await;
        let filter = AssetFilter::revision_greater_than(20).with_comparison(Comparison::Inclusive);
        assert_eq!(usernames(&repo.list(&filter).await.unwrap()), vec!["bob", "carol"]);
        let filter = AssetFilter::last_update_greater_than(at(100)).with_comparison(Comparison::Inclusive);
        assert_eq!(usernames(&repo.list(&filter).await.unwrap()), vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_combined_filters() {
        let repo = seeded().await;
        // Revision excludes alice, timestamp excludes bob.
        let filter = AssetFilter { revision: Some(10), last_update: Some(at(200)), ..AssetFilter::default() };
        assert_eq!(usernames(&repo.list(&filter).await.unwrap()), vec!["carol"]);
        // Same bounds, but only the timestamp is honoured.
        let filter = filter.with_combine(Combine::LastWins);
        let filter = AssetFilter { last_update: Some(at(0)), ..filter };
        assert_eq!(usernames(&repo.list(&filter).await.unwrap()), vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_sql_and_in_memory_filters_agree() {
        let repo = seeded().await;
        let all = repo.list_all().await.unwrap();
        for revision in [0, 10, 15, 20, 30] {
            for comparison in [Comparison::Strict, Comparison::Inclusive] {
                let filter = AssetFilter::revision_greater_than(revision).with_comparison(comparison);
                let expected: Vec<_> = all.iter().filter(|a| filter.matches(a)).cloned().collect();
                assert_eq!(repo.list(&filter).await.unwrap(), expected);
            }
        }
    }

    #[tokio::test]
    async fn test_get_by_kuid() {
        let repo = seeded().await;
        let asset = repo.get_by_kuid(&"kuid2:2:2:2".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(asset.username, "bob");
        assert_eq!(asset.revision, 20);
        assert_eq!(asset.last_update, at(200));
        assert!(repo.get_by_kuid(&"kuid:9:9".parse().unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_file_id() {
        let repo = seeded().await;
        let file_id: FileId = "00000000000000000000000000000011".parse().unwrap();
        let asset = repo.get_by_file_id(&file_id).await.unwrap().unwrap();
        assert_eq!(asset.username, "alice");
        let missing: FileId = "ffffffffffffffffffffffffffffffff".parse().unwrap();
        assert!(repo.get_by_file_id(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_latest() {
        let repo = seeded().await;
        let latest = repo.get_latest().await.unwrap().unwrap();
        assert_eq!(latest.kuid.as_str(), "kuid:3:3");
        assert_eq!(latest.revision, 30);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_in_place() {
        let repo = seeded().await;
        let before = repo.get_by_kuid(&"kuid:1:1".parse().unwrap()).await.unwrap().unwrap();
        let mut update = make_asset("alice", "kuid:1:1", 11);
        update.sha1 = "a".repeat(40);
        assert!(repo.upsert_at(&update, at(400)).await.unwrap());
        let after = repo.get_by_kuid(&"kuid:1:1".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.revision, 11);
        assert_eq!(after.sha1, "a".repeat(40));
        assert_eq!(after.last_update, at(400));
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_upsert_ignores_stale_revision() {
        let repo = seeded().await;
        assert!(!repo.upsert_at(&make_asset("mallory", "kuid:3:3", 29), at(400)).await.unwrap());
        assert!(!repo.upsert_at(&make_asset("mallory", "kuid:3:3", 30), at(400)).await.unwrap());
        let asset = repo.get_by_kuid(&"kuid:3:3".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(asset.username, "carol");
        assert_eq!(asset.last_update, at(300));
    }

    #[tokio::test]
    async fn test_last_update_never_moves_backwards() {
        let repo = seeded().await;
        assert!(repo.upsert_at(&make_asset("carol", "kuid:3:3", 31), at(5)).await.unwrap());
        let asset = repo.get_by_kuid(&"kuid:3:3".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(asset.revision, 31);
        assert_eq!(asset.last_update, at(300));
    }

    #[tokio::test]
    async fn test_upsert_rejects_duplicate_file_id() {
        let repo = seeded().await;
        let mut clash = make_asset("dave", "kuid:4:4", 1);
        clash.file_id = "00000000000000000000000000000011".parse().unwrap();
        let err = repo.upsert(&clash).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Constraint));
    }
}
