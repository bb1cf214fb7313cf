use anyhow::Result;

use crate::orchestrator::{Outcome, RunReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutMode {
    /// summary lines through tracing only
    Log,
    /// also print the full report as JSON on stdout
    Json,
}

impl OutMode {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => OutMode::Json,
            _ => OutMode::Log,
        }
    }
}

pub fn emit(mode: OutMode, report: &RunReport) -> Result<()> {
    for c in &report.cameras {
        if let Outcome::Archived {
            key,
            staged_file_removed: false,
        } = &c.outcome
        {
            tracing::warn!(camera_id = %c.camera_id, key = %key, "Archived, but staged file was left behind");
        }
    }

    tracing::info!(
        cameras = report.cameras.len(),
        archived = report.archived(),
        skipped = report.skipped(),
        failed = report.failed(),
        "Report"
    );

    if mode == OutMode::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!(OutMode::parse("JSON"), OutMode::Json);
        assert_eq!(OutMode::parse("log"), OutMode::Log);
        assert_eq!(OutMode::parse("whatever"), OutMode::Log);
    }
}
