use anyhow::Context;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_types::region::Region;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snapshot_archiver::archive::{ArchiveWriter, ObjectStore, S3ObjectStore};
use snapshot_archiver::config::{env_or, ArchiverConfig};
use snapshot_archiver::mock::{MemoryObjectStore, MemoryRecordStore};
use snapshot_archiver::orchestrator::{self, Orchestrator};
use snapshot_archiver::out::{self, OutMode};
use snapshot_archiver::records::{DynamoRecordStore, RecordStore};
use snapshot_archiver::snapshot::SnapshotFetcher;
use snapshot_archiver::TriggerEvent;

/// Usage: snapshot-archiver [EVENT_JSON_PATH]   (reads stdin when omitted)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snapshot_archiver=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = ArchiverConfig::from_env()?;
    tracing::info!(
        region = %cfg.region,
        table = %cfg.table,
        bucket = %cfg.bucket,
        timezone = %cfg.timezone,
        scratch_dir = %cfg.scratch_dir.display(),
        "Configuration loaded"
    );

    let raw = read_event().await?;
    tracing::debug!(event = %String::from_utf8_lossy(&raw), "Received event");
    let event = TriggerEvent::from_slice(&raw).context("parsing trigger event")?;

    let mut mock_objects: Option<MemoryObjectStore> = None;

    let (records, objects): (Arc<dyn RecordStore>, Arc<dyn ObjectStore>) = if std::env::var("MOCK_MODE").is_ok() {
        let objects = MemoryObjectStore::new(cfg.bucket.clone());
        mock_objects = Some(objects.clone());
        let path = PathBuf::from(env_or("MOCK_RECORDS", "mocks/cameras.json"));
        let records = MemoryRecordStore::from_json_file(&path)
            .await
            .with_context(|| format!("loading mock records from {}", path.display()))?;
        (Arc::new(records), Arc::new(objects))
    } else {
        let sdk = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(cfg.client.max_attempts()))
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(cfg.client.connect_timeout)
                    .operation_attempt_timeout(cfg.client.timeout)
                    .build(),
            )
            .load()
            .await;
        (
            Arc::new(DynamoRecordStore::new(&sdk, cfg.table.clone())),
            Arc::new(S3ObjectStore::new(&sdk, cfg.bucket.clone())),
        )
    };

    let fetcher = SnapshotFetcher::new(&cfg.client, cfg.timezone)?;
    let writer = ArchiveWriter::new(objects, cfg.scratch_dir.clone());
    let orchestrator = Orchestrator::new(records, fetcher, writer);

    if let Some(report) = orchestrator::handle(&orchestrator, &event).await {
        out::emit(OutMode::parse(&env_or("REPORT_MODE", "log")), &report)?;
    }

    if let Some(objects) = &mock_objects {
        for key in objects.keys() {
            tracing::info!(key = %key, "Mock object stored");
        }
    }

    Ok(())
}

async fn read_event() -> anyhow::Result<Vec<u8>> {
    match std::env::args().nth(1) {
        Some(path) => tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading event from {path}")),
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            Ok(buf)
        }
    }
}
