//! Storage size inspection for asset tiers.
//!
//! Walks a tier directory, sums the sizes of the regular files in it and
//! renders the total for humans.

pub mod error;
mod human;
mod size;

pub use crate::human::human_readable;
pub use crate::size::directory_size;
use std::path::Path;

/// Size of a directory tree, raw and formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub bytes: u64,
    pub human: String,
}
impl From<u64> for Measurement {
    fn from(bytes: u64) -> Self {
        Self { bytes, human: human_readable(bytes) }
    }
}

/// Measure a directory tree. See [`directory_size`] for what is counted.
pub async fn measure(root: impl AsRef<Path>) -> error::Result<Measurement> {
    directory_size(root).await.map(Measurement::from)
}
