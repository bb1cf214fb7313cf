//! In-memory stores for MOCK_MODE runs and tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::archive::ObjectStore;
use crate::error::{ArchiveError, Result};
use crate::records::{Lookup, RecordStore};
use crate::types::{CameraId, CameraRecord};

#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Vec<CameraRecord>,
    unavailable: bool,
}

impl MemoryRecordStore {
    pub fn new(records: Vec<CameraRecord>) -> Self {
        Self {
            records,
            unavailable: false,
        }
    }

    /// Every lookup fails as if the table were unreachable.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Load records from a JSON array (`[{"id": .., "ip": .., ...}]`).
    pub async fn from_json_file(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        let records: Vec<CameraRecord> = serde_json::from_slice(&data)?;
        Ok(Self::new(records))
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn find_camera(&self, id: &CameraId) -> Result<Lookup> {
        if self.unavailable {
            return Err(ArchiveError::Store("record store unavailable".into()));
        }
        Ok(self
            .records
            .iter()
            .find(|r| r.id == id.as_str())
            .cloned()
            .map(Lookup::Found)
            .unwrap_or(Lookup::Missing))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
    pub tags: Vec<(String, String)>,
}

/// Clones share the same object map.
#[derive(Debug, Clone)]
pub struct MemoryObjectStore {
    bucket: String,
    objects: Arc<Mutex<BTreeMap<String, StoredObject>>>,
    failing: bool,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(Mutex::new(BTreeMap::new())),
            failing: false,
        }
    }

    /// Every upload is rejected.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        tags: &[(String, String)],
    ) -> Result<()> {
        if self.failing {
            return Err(ArchiveError::Upload(format!("{}: access denied", self.bucket)));
        }
        self.lock().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                tags: tags.to_vec(),
            },
        );
        Ok(())
    }
}
