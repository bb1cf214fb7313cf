//! Orchestrator - resolve once, then fetch and archive camera by camera
//!
//! Only a record store failure ends a run early. Every per-camera failure is
//! turned into an [`Outcome`] so the remaining cameras are still attempted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::archive::ArchiveWriter;
use crate::error::{ArchiveError, Result};
use crate::records::{resolve_cameras, Miss, RecordStore, Resolved};
use crate::snapshot::SnapshotFetcher;
use crate::types::{CameraRecord, TriggerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    /// scratch file write / read-back
    Staging,
    Upload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotFound,
    MalformedRecord { detail: String },
    EmptyImage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Archived { key: String, staged_file_removed: bool },
    Skipped { reason: SkipReason },
    Failed { stage: Stage, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CameraReport {
    pub camera_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub cameras: Vec<CameraReport>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            cameras: Vec::new(),
        }
    }

    pub fn archived(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Archived { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    fn count(&self, f: impl Fn(&Outcome) -> bool) -> usize {
        self.cameras.iter().filter(|c| f(&c.outcome)).count()
    }
}

pub struct Orchestrator {
    records: Arc<dyn RecordStore>,
    fetcher: SnapshotFetcher,
    writer: ArchiveWriter,
}

impl Orchestrator {
    pub fn new(records: Arc<dyn RecordStore>, fetcher: SnapshotFetcher, writer: ArchiveWriter) -> Self {
        Self {
            records,
            fetcher,
            writer,
        }
    }

    /// Run one invocation. `Err` only when the record store lookup fails.
    pub async fn run(&self, event: &TriggerEvent) -> Result<RunReport> {
        let ids = event.camera_ids();
        tracing::info!(requested = ids.len(), store = self.records.name(), "Resolving cameras");

        let resolution = resolve_cameras(self.records.as_ref(), ids).await?;
        let mut report = RunReport::new();

        for entry in &resolution.entries {
            let entry = match entry {
                Resolved::Miss(id, miss) => {
                    let reason = match miss {
                        Miss::NotFound => SkipReason::NotFound,
                        Miss::Malformed(detail) => SkipReason::MalformedRecord {
                            detail: detail.clone(),
                        },
                    };
                    CameraReport {
                        camera_id: id.to_string(),
                        camera: None,
                        outcome: Outcome::Skipped { reason },
                    }
                }
                Resolved::Camera(camera) => CameraReport {
                    camera_id: camera.id.clone(),
                    camera: Some(camera.display_name.clone()),
                    outcome: self.process(camera).await,
                },
            };
            report.cameras.push(entry);
        }

        tracing::info!(
            archived = report.archived(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Run complete"
        );
        Ok(report)
    }

    async fn process(&self, camera: &CameraRecord) -> Outcome {
        let snapshot = match self.fetcher.fetch(camera).await {
            Ok(Some(s)) => s,
            Ok(None) => {
                tracing::info!(camera = %camera.display_name, "No image found");
                return Outcome::Skipped {
                    reason: SkipReason::EmptyImage,
                };
            }
            Err(e) => return failed(camera, Stage::Fetch, e),
        };

        match self
            .writer
            .archive(&snapshot.bytes, &camera.display_name, &snapshot.captured_at)
            .await
        {
            Ok(a) => Outcome::Archived {
                key: a.key,
                staged_file_removed: a.staged_file_removed,
            },
            Err(e @ ArchiveError::Io(_)) => failed(camera, Stage::Staging, e),
            Err(e) => failed(camera, Stage::Upload, e),
        }
    }
}

fn failed(camera: &CameraRecord, stage: Stage, e: ArchiveError) -> Outcome {
    tracing::error!(
        camera = %camera.display_name,
        camera_id = %camera.id,
        stage = ?stage,
        error = %e,
        "Failed to download or upload image"
    );
    Outcome::Failed {
        stage,
        error: e.to_string(),
    }
}

/// Top-level boundary: a failed run is logged and reported as `None`.
pub async fn handle(orchestrator: &Orchestrator, event: &TriggerEvent) -> Option<RunReport> {
    match orchestrator.run(event).await {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::error!(error = %e, "Run aborted before any camera was processed");
            None
        }
    }
}
