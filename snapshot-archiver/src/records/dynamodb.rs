use async_trait::async_trait;
use aws_sdk_dynamodb as ddb;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

use super::{Lookup, RecordStore};
use crate::error::{ArchiveError, Result};
use crate::types::{CameraId, CameraRecord};

pub struct DynamoRecordStore {
    client: ddb::Client,
    table: String,
}

impl DynamoRecordStore {
    pub fn new(cfg: &aws_config::SdkConfig, table: impl Into<String>) -> Self {
        Self {
            client: ddb::Client::new(cfg),
            table: table.into(),
        }
    }
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    fn name(&self) -> &'static str {
        "dynamodb"
    }

    async fn find_camera(&self, id: &CameraId) -> Result<Lookup> {
        // the table is scanned with a filter; a single page may hold no match
        // even though a later one does
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let resp = self
                .client
                .scan()
                .table_name(&self.table)
                .filter_expression("id = :id")
                .expression_attribute_values(":id", AttributeValue::S(id.as_str().to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| ArchiveError::Store(DisplayErrorContext(e).to_string()))?;

            if let Some(item) = resp.items().first() {
                return Ok(match record_from_item(item) {
                    Ok(r) => Lookup::Found(r),
                    Err(reason) => Lookup::Malformed(reason),
                });
            }

            start_key = resp.last_evaluated_key().cloned();
            if start_key.is_none() {
                return Ok(Lookup::Missing);
            }
        }
    }
}

fn record_from_item(item: &HashMap<String, AttributeValue>) -> std::result::Result<CameraRecord, String> {
    Ok(CameraRecord {
        id: string_attr(item, "id")?,
        ip: string_attr(item, "ip")?,
        username: string_attr(item, "USERNAME")?,
        password: string_attr(item, "PASSWORD")?,
        display_name: string_attr(item, "camera_name")?,
    })
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> std::result::Result<String, String> {
    match item.get(name) {
        Some(v) => v
            .as_s()
            .map(|s| s.to_string())
            .map_err(|_| format!("attribute {name} is not a string")),
        None => Err(format!("attribute {name} is missing")),
    }
}
