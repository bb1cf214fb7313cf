use async_trait::async_trait;
use aws_sdk_s3 as s3;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

use super::ObjectStore;
use crate::error::{ArchiveError, Result};

pub struct S3ObjectStore {
    client: s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(cfg: &aws_config::SdkConfig, bucket: impl Into<String>) -> Self {
        Self {
            client: s3::Client::new(cfg),
            bucket: bucket.into(),
        }
    }
}

/// S3 expects tags as a URL query string (`k1=v1&k2=v2`).
pub fn encode_tagging(tags: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(tags)
        .finish()
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
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
        let mut req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data));
        if !tags.is_empty() {
            req = req.tagging(encode_tagging(tags));
        }

        req.send()
            .await
            .map_err(|e| ArchiveError::Upload(DisplayErrorContext(e).to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_tagging() {
        let tags = vec![("camera".to_string(), "Lobby".to_string())];
        assert_eq!(encode_tagging(&tags), "camera=Lobby");

        let tags = vec![("camera".to_string(), "Floor 2 & Gate".to_string())];
        assert_eq!(encode_tagging(&tags), "camera=Floor+2+%26+Gate");
    }
}
