//! Snapshot archiver
//!
//! Pulls a JPEG snapshot from each requested network camera and archives it
//! to S3 under `<camera>/Images/<date>/<camera>_<timestamp>.jpg`.

pub mod archive;
pub mod config;
pub mod error;
pub mod mock;
pub mod orchestrator;
pub mod out;
pub mod records;
pub mod snapshot;
pub mod types;

pub use error::{ArchiveError, Result};
pub use orchestrator::{CameraReport, Orchestrator, Outcome, RunReport, SkipReason, Stage};
pub use types::{CameraId, CameraRecord, TriggerEvent};
