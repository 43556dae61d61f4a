//! Decoded camera frame

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;

use crate::error::{ProctorError, ProctorResult};

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Container format of an encoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Sniff the format from the leading bytes
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(JPEG_MAGIC) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(PNG_MAGIC) {
            Some(ImageFormat::Png)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// An encoded image frame, cheap to clone across blocking tasks
#[derive(Debug, Clone)]
pub struct Frame {
    bytes: Arc<[u8]>,
    format: ImageFormat,
}

impl Frame {
    /// Wrap raw encoded bytes, rejecting anything that is not JPEG or PNG.
    ///
    /// Only the leading signature is checked. A truncated or corrupt image
    /// with a valid signature is accepted here; detectors see it as-is.
    pub fn from_bytes(bytes: Vec<u8>) -> ProctorResult<Self> {
        if bytes.is_empty() {
            return Err(ProctorError::EmptyFrame);
        }
        let format = ImageFormat::detect(&bytes)
            .ok_or_else(|| ProctorError::InvalidImage("not a JPEG or PNG image".to_string()))?;
        Ok(Self { bytes: bytes.into(), format })
    }

    /// Decode a base64 payload, optionally carrying a `data:...;base64,` prefix
    pub fn from_base64(payload: &str) -> ProctorResult<Self> {
        let payload = payload.trim();
        let encoded = match payload.strip_prefix("data:") {
            Some(rest) => rest
                .split_once(',')
                .map(|(_, data)| data)
                .ok_or_else(|| ProctorError::InvalidImage("malformed data URL".to_string()))?,
            None => payload,
        };
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| ProctorError::InvalidImage(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
