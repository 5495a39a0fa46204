//! Captured images.

use crate::model::error::CaptureError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;

const HEIF_BRANDS: [&[u8]; 5] = [b"heic", b"heix", b"mif1", b"msf1", b"hevc"];

/// Recognised image encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// JPEG.
    Jpeg,
    /// PNG.
    Png,
    /// WebP.
    Webp,
    /// GIF.
    Gif,
    /// HEIC/HEIF.
    Heic,
}

impl MediaType {
    /// Identify an encoding from its leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(MediaType::Jpeg);
        }
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(MediaType::Png);
        }
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            return Some(MediaType::Gif);
        }
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            return Some(MediaType::Webp);
        }
        if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
            let brand = &bytes[8..12];
            if HEIF_BRANDS.contains(&brand) {
                return Some(MediaType::Heic);
            }
        }
        None
    }

    /// MIME type string.
    pub fn mime(self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Webp => "image/webp",
            MediaType::Gif => "image/gif",
            MediaType::Heic => "image/heic",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// How an image entered the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageOrigin {
    /// Taken with the camera.
    Camera,
    /// Selected from the gallery.
    Gallery,
}

/// Source image of the active session.
///
/// Cloning is cheap: the bytes are reference counted.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    bytes: Bytes,
    media_type: MediaType,
    origin: ImageOrigin,
    captured_at: DateTime<Utc>,
}

impl CapturedImage {
    /// Wrap raw bytes, validating that they look like a supported image.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError::Empty` for zero bytes and
    /// `CaptureError::UnsupportedFormat` when the encoding is not recognised.
    pub fn from_bytes(bytes: impl Into<Bytes>, origin: ImageOrigin) -> Result<Self, CaptureError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(CaptureError::Empty);
        }
        let media_type = MediaType::sniff(&bytes).ok_or(CaptureError::UnsupportedFormat)?;
        Ok(Self {
            bytes,
            media_type,
            origin,
            captured_at: Utc::now(),
        })
    }

    /// Raw encoded bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Detected encoding.
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Where the image came from.
    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }

    /// When the image was acquired.
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: empty images are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Image bytes stay out of logs.
impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("len", &self.bytes.len())
            .field("media_type", &self.media_type)
            .field("origin", &self.origin)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// Minimal valid-looking JPEG header for tests.
#[cfg(test)]
pub(crate) const TEST_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
