//! Upload tokens issued by `/analyze` and redeemed by `/correct-plant`.

use crate::models::LeafMetrics;
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct UploadRecord {
    /// File name inside the upload storage.
    pub storage_key: String,
    pub mime_type: String,
    /// Heuristics computed when the image was uploaded.
    pub metrics: LeafMetrics,
}

/// Concurrent map from upload token to stored image. Entries live for the
/// lifetime of the process.
#[derive(Debug, Default)]
pub struct UploadRegistry {
    records: DashMap<Uuid, UploadRecord>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` under `id`, the token that also names the stored file.
    pub fn register(&self, id: Uuid, record: UploadRecord) {
        self.records.insert(id, record);
    }

    pub fn get(&self, id: &Uuid) -> Option<UploadRecord> {
        self.records.get(id).map(|entry| entry.value().clone())
    }

    /// Uploads registered since startup.
    pub fn len(&self) -> usize {
        self.records.len()
    }
}
