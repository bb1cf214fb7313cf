//! Camera record lookup
//!
//! The record store maps a camera id to its address and credentials. Lookups
//! are read-only; records are maintained elsewhere.

pub mod dynamodb;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CameraId, CameraRecord};

pub use dynamodb::DynamoRecordStore;

/// Outcome of a single id lookup.
#[derive(Debug, Clone)]
pub enum Lookup {
    Found(CameraRecord),
    Missing,
    /// Matched, but the item lacks a required string attribute
    Malformed(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Exact-match lookup by id. First match wins when the table holds duplicates.
    ///
    /// An `Err` means the store itself failed and aborts the whole batch.
    async fn find_camera(&self, id: &CameraId) -> Result<Lookup>;
}

/// Ids that did not resolve to a usable record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Miss {
    NotFound,
    Malformed(String),
}

/// One requested id and what the store returned for it.
#[derive(Debug, Clone)]
pub enum Resolved {
    Camera(CameraRecord),
    Miss(CameraId, Miss),
}

/// Every requested id, hits and misses interleaved in input order.
#[derive(Debug, Default)]
pub struct Resolution {
    pub entries: Vec<Resolved>,
}

impl Resolution {
    /// Resolved records only, input order preserved.
    pub fn cameras(&self) -> impl Iterator<Item = &CameraRecord> {
        self.entries.iter().filter_map(|e| match e {
            Resolved::Camera(c) => Some(c),
            Resolved::Miss(..) => None,
        })
    }

    pub fn misses(&self) -> impl Iterator<Item = (&CameraId, &Miss)> {
        self.entries.iter().filter_map(|e| match e {
            Resolved::Miss(id, miss) => Some((id, miss)),
            Resolved::Camera(_) => None,
        })
    }
}

/// Resolve every requested id against the store.
///
/// Duplicate ids are looked up (and later archived) once per occurrence.
pub async fn resolve_cameras(store: &dyn RecordStore, ids: &[CameraId]) -> Result<Resolution> {
    let mut out = Resolution::default();

    for (i, id) in ids.iter().enumerate() {
        if ids[..i].contains(id) {
            tracing::warn!(camera_id = %id, "Camera id requested more than once");
        }

        let entry = match store.find_camera(id).await? {
            Lookup::Found(record) => {
                tracing::debug!(camera_id = %id, camera = %record.display_name, "Resolved camera");
                Resolved::Camera(record)
            }
            Lookup::Missing => {
                tracing::info!(camera_id = %id, "No camera details found");
                Resolved::Miss(id.clone(), Miss::NotFound)
            }
            Lookup::Malformed(reason) => {
                tracing::warn!(camera_id = %id, reason = %reason, "Camera record is malformed");
                Resolved::Miss(id.clone(), Miss::Malformed(reason))
            }
        };
        out.entries.push(entry);
    }

    Ok(out)
}
