//! Decodes image sources into RGB frames with the `image` crate.
//!
//! In-memory sources are handed over directly; no temporary files are
//! written.
use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

use crate::imaging::domain::image_source::ImageSource;
use crate::shared::error::RecognizerError;
use crate::shared::frame::Frame;

/// Decode `source` into an RGB frame.
///
/// With `jpeg_quality` set, in-memory images (`Image` and `Bytes`) are first
/// re-encoded as JPEG at that quality, so they go through the same lossy
/// step as JPEG files read from disk.
pub fn load(source: ImageSource<'_>, jpeg_quality: Option<u8>) -> Result<Frame, RecognizerError> {
    match source {
        ImageSource::Path(path) => read_path(path),
        ImageSource::Image(image) => from_image(image, jpeg_quality),
        ImageSource::Bytes(bytes) => {
            let image = decode(bytes)?;
            from_image(&image, jpeg_quality)
        }
    }
}

fn read_path(path: &Path) -> Result<Frame, RecognizerError> {
    let bytes = std::fs::read(path).map_err(|e| RecognizerError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Frame::from_rgb_image(decode(&bytes)?.to_rgb8()))
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, RecognizerError> {
    image::load_from_memory(bytes).map_err(|e| RecognizerError::Decode { source: e })
}

fn from_image(image: &DynamicImage, jpeg_quality: Option<u8>) -> Result<Frame, RecognizerError> {
    let rgb = image.to_rgb8();
    let Some(quality) = jpeg_quality else {
        return Ok(Frame::from_rgb_image(rgb));
    };

    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&rgb)
        .map_err(|e| RecognizerError::Decode { source: e })?;
    let reencoded = decode(buf.get_ref())?;
    Ok(Frame::from_rgb_image(reencoded.to_rgb8()))
}
