use chrono_tz::Tz;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ArchiveError, Result};

pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_TABLE: &str = "ip_camera_details";
pub const DEFAULT_BUCKET: &str = "suiteview-storage";
pub const DEFAULT_TIMEZONE: &str = "Asia/Manila";

const DEFAULT_TIMEOUT_MS: u64 = 3000;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2000;
const DEFAULT_RETRIES: u32 = 2;
const MAX_RETRIES_LIMIT: u32 = 10;

/// Timeouts and retry bound shared by the camera HTTP client and the AWS clients.
#[derive(Debug, Clone, Copy)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// extra attempts after the first one
    pub max_retries: u32,
}

impl ClientConfig {
    /// Total attempts per AWS call (first try plus retries).
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ArchiveError::Config(format!(
                "MAX_RETRIES={} exceeds the limit of {MAX_RETRIES_LIMIT}",
                self.max_retries
            )));
        }
        if self.timeout.is_zero() || self.connect_timeout.is_zero() {
            return Err(ArchiveError::Config("timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            max_retries: DEFAULT_RETRIES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArchiverConfig {
    pub region: String,
    pub table: String,
    pub bucket: String,
    pub timezone: Tz,
    pub scratch_dir: PathBuf,
    pub client: ClientConfig,
}

impl ArchiverConfig {
    pub fn from_env() -> Result<Self> {
        let tz_name = env_or("ARCHIVE_TIMEZONE", DEFAULT_TIMEZONE);
        let timezone = parse_timezone(&tz_name)?;

        let scratch_dir = std::env::var("SCRATCH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir());

        let client = ClientConfig {
            timeout: Duration::from_millis(env_parse("HTTP_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?),
            connect_timeout: Duration::from_millis(env_parse(
                "HTTP_CONNECT_TIMEOUT_MS",
                DEFAULT_CONNECT_TIMEOUT_MS,
            )?),
            max_retries: env_parse("MAX_RETRIES", DEFAULT_RETRIES)?,
        };
        client.validate()?;

        Ok(Self {
            region: env_or("AWS_REGION", DEFAULT_REGION),
            table: env_or("CAMERA_TABLE", DEFAULT_TABLE),
            bucket: env_or("ARCHIVE_BUCKET", DEFAULT_BUCKET),
            timezone,
            scratch_dir,
            client,
        })
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| ArchiveError::Config(format!("invalid timezone {name:?}: {e}")))
}

pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|e| ArchiveError::Config(format!("{key}={v:?}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let c = ClientConfig::default();
        assert_eq!(c.timeout, Duration::from_secs(3));
        assert_eq!(c.connect_timeout, Duration::from_secs(2));
        assert_eq!(c.max_retries, 2);
    }

    #[test]
    fn test_retry_bound_is_validated() {
        let mut c = ClientConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.max_attempts(), 3);

        c.max_retries = u32::MAX;
        assert_eq!(c.max_attempts(), u32::MAX);
        assert!(matches!(c.validate(), Err(ArchiveError::Config(_))));

        c.max_retries = MAX_RETRIES_LIMIT;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let c = ClientConfig {
            timeout: Duration::ZERO,
            ..ClientConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Asia/Manila").unwrap(), chrono_tz::Asia::Manila);
        assert!(matches!(parse_timezone("Mars/Olympus"), Err(ArchiveError::Config(_))));
    }
}
