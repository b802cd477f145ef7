//! Bundle Fixtures

use serde::Deserialize;
use serde_norway::Value;
use tracing::warn;

use crate::bundles::records::BundleRecord;

/// Wrapper for bundle records in YAML
///
/// Records are kept as raw values so one badly typed record does not stop
/// the rest of the catalog from loading.
#[derive(Debug, Deserialize)]
pub struct BundlesFixture {
    /// Raw bundle records, in catalog order
    #[serde(default)]
    pub bundles: Vec<Value>,
}

impl BundlesFixture {
    /// Read every record that has the right shape, skipping the rest.
    pub fn into_records(self) -> Vec<BundleRecord> {
        self.bundles
            .into_iter()
            .enumerate()
            .filter_map(
                |(idx, value)| match serde_norway::from_value::<BundleRecord>(value) {
                    Ok(record) => Some(record),
                    Err(error) => {
                        warn!(record = idx, %error, "skipping unreadable bundle record");
                        None
                    }
                },
            )
            .collect()
    }
}
