use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::Result;

/// Stored passwords come from tooling that may drop padding or use the
/// URL-safe alphabet; both decode.
const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Camera identifier as it appears in the record store.
///
/// Trigger payloads carry ids either as JSON strings or numbers; both are
/// normalised to their string form since lookups compare by string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CameraId(String);

impl CameraId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CameraId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Num(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Str(s) => CameraId(s),
            Raw::Num(n) => CameraId(n.to_string()),
        })
    }
}

/// Connection profile for one camera, read from the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraRecord {
    pub id: String,
    /// host or host:port
    pub ip: String,
    pub username: String,
    /// base64 text, not ciphertext
    pub password: String,
    /// folder and tag name in the archive
    pub display_name: String,
}

impl CameraRecord {
    /// Plaintext password for the HTTP challenge.
    pub fn decoded_password(&self) -> Result<String> {
        let input = self.password.trim();
        let raw = match STANDARD_LENIENT.decode(input) {
            Ok(raw) => raw,
            Err(e) => URL_SAFE_LENIENT.decode(input).map_err(|_| e)?,
        };
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

/// Trigger payload: `{"detail": {"allowed_cameras": [...]}}`
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerEvent {
    pub detail: TriggerDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TriggerDetail {
    pub allowed_cameras: Vec<CameraId>,
}

impl TriggerEvent {
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(raw)?)
    }

    pub fn camera_ids(&self) -> &[CameraId] {
        &self.detail.allowed_cameras
    }
}
