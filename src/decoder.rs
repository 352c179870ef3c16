use crate::models::EncodedImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use std::fmt;
use std::io::Cursor;

pub const UPLOAD_FILENAME: &str = "generated_image.png";

/// A validated raster, re-encoded as PNG for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeFailure {
    Base64(String),
    Raster(String),
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeFailure::Base64(msg) => write!(f, "invalid base64 payload: {}", msg),
            DecodeFailure::Raster(msg) => write!(f, "invalid image data: {}", msg),
        }
    }
}

impl std::error::Error for DecodeFailure {}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl ImageDecoder {
    pub fn new() -> Self {
        ImageDecoder
    }

    /// Never panics on bad input; every failure is logged here and returned.
    pub fn decode(&self, payload: &EncodedImage) -> Result<DecodedImage, DecodeFailure> {
        let result = decode_b64_image(&payload.b64_json);
        match &result {
            Ok(image) => log::debug!(
                "🖼️  Decoded {}x{} image ({} bytes as PNG)",
                image.width,
                image.height,
                image.png.len()
            ),
            Err(e) => log::error!("❌ Error in converting base64 to image: {}", e),
        }
        result
    }

    /// Runs [`decode`](Self::decode) on the blocking pool. Large payloads
    /// take long enough to stall other events on the same worker.
    pub async fn decode_blocking(
        &self,
        payload: EncodedImage,
    ) -> Result<DecodedImage, DecodeFailure> {
        let decoder = *self;
        tokio::task::spawn_blocking(move || decoder.decode(&payload))
            .await
            .unwrap_or_else(|e| {
                log::error!("❌ Image decoding task failed: {}", e);
                Err(DecodeFailure::Raster(e.to_string()))
            })
    }
}

fn decode_b64_image(b64: &str) -> Result<DecodedImage, DecodeFailure> {
    let bytes = STANDARD
        .decode(b64.trim())
        .map_err(|e| DecodeFailure::Base64(e.to_string()))?;

    let image = image::load_from_memory(&bytes).map_err(|e| DecodeFailure::Raster(e.to_string()))?;

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| DecodeFailure::Raster(e.to_string()))?;

    Ok(DecodedImage {
        png,
        width: image.width(),
        height: image.height(),
    })
}
