mod asset;
mod filter;
mod key;

pub use self::asset::{Asset, NewAsset};
pub(crate) use self::asset::AssetRow;
pub use self::filter::{AssetFilter, Combine, Comparison, Predicate};
pub use self::key::{FILE_ID_LENGTH, FileId, Kuid};
