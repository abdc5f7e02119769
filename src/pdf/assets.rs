//! Optional image assets (logo, map)

use std::path::Path;

use image::{codecs::jpeg::JpegEncoder, ExtendedColorType};

use super::RenderError;

const JPEG_QUALITY: u8 = 90;

/// Image re-encoded as baseline JPEG, ready to embed with `DCTDecode`
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

/// Return the asset path when a file is present there
pub fn probe(path: &Path) -> Option<&Path> {
    path.is_file().then_some(path)
}

/// Decode an image file of any supported format
pub fn load(path: &Path) -> Result<DecodedImage, RenderError> {
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode(
        rgb.as_raw(),
        width,
        height,
        ExtendedColorType::Rgb8,
    )?;

    Ok(DecodedImage { width, height, jpeg })
}

/// Probe and load in one step; a missing asset yields `None`
pub fn load_optional(path: &Path) -> Result<Option<DecodedImage>, RenderError> {
    match probe(path) {
        Some(path) => load(path).map(Some),
        None => {
            tracing::debug!("Asset {} not found, skipping", path.display());
            Ok(None)
        }
    }
}
