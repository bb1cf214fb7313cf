//! Snapshot fetcher - JPEG capture over the camera's ISAPI endpoint

pub mod auth;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{ArchiveError, Result};
use crate::types::CameraRecord;
use auth::Challenge;

pub const ISAPI_PICTURE_PATH: &str = "ISAPI/Streaming/channels/1/picture?snapShotImageType=JPEG&videoResolutionWidth=1280&videoResolutionHeight=720";

/// One captured image, stamped in the archival timezone.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub bytes: Vec<u8>,
    pub captured_at: DateTime<Tz>,
}

pub struct SnapshotFetcher {
    client: Client,
    max_retries: u32,
    timezone: Tz,
}

impl SnapshotFetcher {
    pub fn new(cfg: &ClientConfig, timezone: Tz) -> Result<Self> {
        // cameras sit on the local network; never route them through a proxy
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(cfg.connect_timeout)
            .timeout(cfg.timeout)
            .build()?;

        Ok(Self {
            client,
            max_retries: cfg.max_retries,
            timezone,
        })
    }

    pub fn snapshot_url(ip: &str) -> Result<Url> {
        Ok(Url::parse(&format!("http://{ip}/{ISAPI_PICTURE_PATH}"))?)
    }

    /// Fetch one snapshot.
    ///
    /// Returns `Ok(None)` when the camera answers with an empty body.
    pub async fn fetch(&self, camera: &CameraRecord) -> Result<Option<Snapshot>> {
        let password = camera.decoded_password()?;
        let url = Self::snapshot_url(&camera.ip)?;

        tracing::info!(camera = %camera.display_name, url = %url, "Downloading image");

        // credentials only go out after the camera has issued a challenge
        let mut resp = self.send(|| self.client.get(url.clone())).await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            let values: Vec<&str> = resp
                .headers()
                .get_all(WWW_AUTHENTICATE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            let challenge = Challenge::select(values)?;

            resp = match challenge {
                Challenge::Digest(d) => {
                    let uri = request_uri(&url);
                    self.send(|| {
                        let cnonce = format!("{:016x}", rand::random::<u64>());
                        let header =
                            d.authorization("GET", &uri, &camera.username, &password, &cnonce, 1);
                        self.client.get(url.clone()).header(AUTHORIZATION, header)
                    })
                    .await?
                }
                Challenge::Basic => {
                    self.send(|| {
                        self.client
                            .get(url.clone())
                            .basic_auth(&camera.username, Some(&password))
                    })
                    .await?
                }
            };
        }

        let status = resp.status();
        if !status.is_success() {
            return Err(ArchiveError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }

        tracing::debug!(camera = %camera.display_name, size = bytes.len(), "Snapshot received");

        Ok(Some(Snapshot {
            bytes: bytes.to_vec(),
            captured_at: Utc::now().with_timezone(&self.timezone),
        }))
    }

    /// Send with a bounded number of transport-level retries.
    async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match build().send().await {
                Ok(r) => return Ok(r),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(attempt, error = %e, "Camera request failed, retrying");
                    tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Request-URI as it appears in the request line (path plus query).
fn request_uri(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_url() {
        let url = SnapshotFetcher::snapshot_url("192.168.1.64:8080").unwrap();
        assert_eq!(
            url.as_str(),
            "http://192.168.1.64:8080/ISAPI/Streaming/channels/1/picture?snapShotImageType=JPEG&videoResolutionWidth=1280&videoResolutionHeight=720"
        );
        assert_eq!(
            request_uri(&url),
            "/ISAPI/Streaming/channels/1/picture?snapShotImageType=JPEG&videoResolutionWidth=1280&videoResolutionHeight=720"
        );
    }

    #[test]
    fn test_snapshot_url_rejects_garbage() {
        assert!(SnapshotFetcher::snapshot_url("bad host/").is_err());
    }
}
