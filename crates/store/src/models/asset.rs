use crate::error::{Error, ErrorKind};
use crate::models::{FileId, Kuid};
use exn::ResultExt;
use std::fmt;
use time::UtcDateTime;

/// One tracked file artifact at its latest known revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Surrogate identity assigned by the store.
    pub id: i64,
    pub username: String,
    pub kuid: Kuid,
    /// Hex-encoded SHA-1 of the current file contents.
    pub sha1: String,
    pub file_id: FileId,
    pub revision: i64,
    /// Time of the last write to this record (one-second resolution).
    pub last_update: UtcDateTime,
}

/// `username <kuid>`
impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.username, self.kuid)
    }
}

/// Asset data pushed by ingestion. Identity and `last_update` are always
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAsset {
    pub username: String,
    pub kuid: Kuid,
    pub sha1: String,
    pub file_id: FileId,
    pub revision: i64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct AssetRow {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) kuid: String,
    pub(crate) sha1: String,
    pub(crate) file_id: String,
    pub(crate) revision: i64,
    pub(crate) last_update: i64,
}

impl TryFrom<AssetRow> for Asset {
    type Error = Error;
    fn try_from(row: AssetRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            username: row.username,
            kuid: Kuid::from_trusted(row.kuid),
            sha1: row.sha1,
            file_id: FileId::from_trusted(row.file_id),
            revision: row.revision,
            last_update: UtcDateTime::from_unix_timestamp(row.last_update)
                .or_raise(|| ErrorKind::InvalidData("last update"))?,
        })
    }
}
