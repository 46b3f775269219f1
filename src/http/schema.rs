//! Wire representations of the API payloads.

use crate::service::{AssetList, ListQuery, StorageDetails};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcDateTime};
use trainz_store::Asset;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetSchema {
    #[schema(example = "auran")]
    pub username: String,
    #[schema(example = "kuid2:-3:10002:4")]
    pub kuid: String,
    #[schema(example = "2fd4e1c67a2d28fced849ee1bb76e7391b93eb12")]
    pub sha1: String,
    #[schema(example = "0123456789abcdef0123456789abcdef")]
    pub file_id: String,
    pub revision: i64,
    #[serde(serialize_with = "serialize_timestamp")]
    #[schema(value_type = String, format = DateTime, example = "2024-05-01T12:00:00Z")]
    pub last_update: UtcDateTime,
}
impl From<Asset> for AssetSchema {
    fn from(asset: Asset) -> Self {
        Self {
            username: asset.username,
            kuid: asset.kuid.to_string(),
            sha1: asset.sha1,
            file_id: asset.file_id.to_string(),
            revision: asset.revision,
            last_update: asset.last_update,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetListSchema {
    pub assets: Vec<AssetSchema>,
    /// Highest revision among the returned assets.
    pub last_revision: i64,
}
impl From<AssetList> for AssetListSchema {
    fn from(list: AssetList) -> Self {
        Self {
            assets: list.assets.into_iter().map(AssetSchema::from).collect(),
            last_revision: list.last_revision,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageDetailsSchema {
    /// Revision of the newest asset, null while the catalogue is empty.
    pub current_revision: Option<i64>,
    pub full_bytes: u64,
    #[schema(example = "1.5 GB")]
    pub full_human: String,
    pub low_bytes: u64,
    #[schema(example = "312.4 MB")]
    pub low_human: String,
}
impl From<StorageDetails> for StorageDetailsSchema {
    fn from(details: StorageDetails) -> Self {
        Self {
            current_revision: details.current_revision,
            full_bytes: details.full.bytes,
            full_human: details.full.human,
            low_bytes: details.low.bytes,
            low_human: details.low.human,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "Asset not found")]
    pub detail: String,
}

/// Filters for the asset listing. Each bound is exclusive unless the server
/// is configured otherwise.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AssetsParams {
    /// Only list assets with a revision above this one.
    pub revision: Option<i64>,
    /// Only list assets updated after this moment. RFC 3339 or Unix
    /// seconds; `last_update` is accepted too.
    #[serde(default, alias = "last_update", deserialize_with = "deserialize_timestamp")]
    #[param(value_type = Option<String>, example = "2024-05-01T12:00:00Z")]
    pub last_update: Option<UtcDateTime>,
}
impl From<AssetsParams> for ListQuery {
    fn from(params: AssetsParams) -> Self {
        Self {
            revision: params.revision,
            last_update: params.last_update,
        }
    }
}

/// Parse a timestamp given as Unix seconds or RFC 3339.
pub fn parse_timestamp(value: &str) -> Option<UtcDateTime> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<i64>() {
        return UtcDateTime::from_unix_timestamp(seconds).ok();
    }
    // An unescaped `+` in a query string arrives as a space.
    let parsed = OffsetDateTime::parse(value, &Rfc3339).or_else(|_| OffsetDateTime::parse(&value.replace(' ', "+"), &Rfc3339));
    parsed.ok().and_then(|dt| UtcDateTime::from_unix_timestamp(dt.unix_timestamp()).ok())
}

/// Format a timestamp as RFC 3339 in UTC.
pub fn format_timestamp(value: UtcDateTime) -> Result<String, time::error::Format> {
    // Stored timestamps have no sub-second component.
    let dt = OffsetDateTime::from_unix_timestamp(value.unix_timestamp()).map_err(|_| time::error::Format::InvalidComponent("unix_timestamp"))?;
    dt.format(&Rfc3339)
}

fn serialize_timestamp<S: Serializer>(value: &UtcDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    let formatted = format_timestamp(*value).map_err(S::Error::custom)?;
    serializer.serialize_str(&formatted)
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<UtcDateTime>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp `{raw}`, expected RFC 3339 or Unix seconds"))),
    }
}
