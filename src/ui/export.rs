//! Saving the board to an image file
//!
//! The file extension picks the encoding: `.png`, `.jpg`, or `.jpeg`.

use std::path::Path;

use image::{ImageFormat, RgbImage};
use thiserror::Error;

use crate::config::ChannelOrder;
use crate::ui::renderer::RenderedFrame;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Unsupported image format for {path}, expected .png, .jpg or .jpeg")]
    UnsupportedFormat { path: String },

    #[error("Frame buffer does not match {width}x{height}")]
    MalformedFrame { width: u32, height: u32 },

    #[error("Failed to write {path}: {source}")]
    Encode {
        path: String,
        source: image::ImageError,
    },
}

/// Maps a file extension to an encoder, case-insensitively
pub fn format_for_path(path: &Path) -> Option<ImageFormat> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        _ => None,
    }
}

/// Encodes `frame` to `path`
///
/// An empty path means no destination was chosen: nothing is written and
/// `Ok(false)` is returned.
pub fn save_frame(frame: &RenderedFrame, path: &Path) -> Result<bool, SaveError> {
    if path.as_os_str().is_empty() {
        log::debug!("Save skipped, no path chosen");
        return Ok(false);
    }

    let format = format_for_path(path).ok_or_else(|| SaveError::UnsupportedFormat {
        path: path.display().to_string(),
    })?;

    let image = to_rgb_image(frame)?;
    image
        .save_with_format(path, format)
        .map_err(|source| SaveError::Encode {
            path: path.display().to_string(),
            source,
        })?;

    log::info!("Saved {}x{} drawing to {}", frame.width, frame.height, path.display());
    Ok(true)
}

fn to_rgb_image(frame: &RenderedFrame) -> Result<RgbImage, SaveError> {
    let mut pixels = frame.pixels.clone();
    if frame.order == ChannelOrder::Bgr {
        for px in pixels.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
    }
    RgbImage::from_raw(frame.width, frame.height, pixels).ok_or(SaveError::MalformedFrame {
        width: frame.width,
        height: frame.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn frame(order: ChannelOrder) -> RenderedFrame {
        RenderedFrame {
            width: 2,
            height: 1,
            order,
            pixels: vec![10, 20, 30, 40, 50, 60],
        }
    }

    #[test]
    fn extension_selects_format() {
        assert_eq!(format_for_path(Path::new("a.png")), Some(ImageFormat::Png));
        assert_eq!(format_for_path(Path::new("a.JPG")), Some(ImageFormat::Jpeg));
        assert_eq!(format_for_path(Path::new("a.jpeg")), Some(ImageFormat::Jpeg));
        assert_eq!(format_for_path(Path::new("a.bmp")), None);
        assert_eq!(format_for_path(Path::new("drawing")), None);
    }

    #[test]
    fn empty_path_writes_nothing() {
        assert!(!save_frame(&frame(ChannelOrder::Rgb), &PathBuf::new()).unwrap());
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drawing.gif");
        let err = save_frame(&frame(ChannelOrder::Rgb), &path).unwrap_err();
        assert!(matches!(err, SaveError::UnsupportedFormat { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn png_round_trips_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drawing.png");

        assert!(save_frame(&frame(ChannelOrder::Bgr), &path).unwrap());

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (2, 1));
        assert_eq!(decoded.get_pixel(0, 0).0, [30, 20, 10]);
        assert_eq!(decoded.get_pixel(1, 0).0, [60, 50, 40]);
    }

    #[test]
    fn jpeg_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drawing.jpeg");
        assert!(save_frame(&frame(ChannelOrder::Rgb), &path).unwrap());
        assert!(path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn malformed_buffer_is_rejected() {
        let mut bad = frame(ChannelOrder::Rgb);
        bad.pixels.truncate(3);
        let dir = tempfile::tempdir().unwrap();
        let err = save_frame(&bad, &dir.path().join("bad.png")).unwrap_err();
        assert!(matches!(err, SaveError::MalformedFrame { .. }));
    }
}
