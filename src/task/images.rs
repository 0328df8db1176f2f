use std::fs;
use std::io::Cursor;

use camino::{Utf8Path, Utf8PathBuf};
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{AnimationDecoder, ExtendedColorType, ImageEncoder, ImageFormat};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use thiserror::Error;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::error::ScanError;
use crate::layout::Layout;

/// Quality bound for lossy JPEG re-encoding.
pub const JPEG_QUALITY: u8 = 75;

/// Errors that can occur when processing images.
#[derive(Debug, Error)]
pub enum ImageError {
    /// An I/O error occurred while reading or writing image files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image sources couldn't be listed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// An error occurred during image decoding or encoding.
    #[error("Image '{0}': {1}")]
    Image(Utf8PathBuf, image::ImageError),
}

/// Image formats handled by the optimizer, detected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Gif,
    Jpeg,
    Png,
    Svg,
    /// Anything else is copied unchanged.
    Other,
}

impl Kind {
    pub fn from_path(path: &Utf8Path) -> Self {
        match path.extension().map(str::to_ascii_lowercase).as_deref() {
            Some("gif") => Kind::Gif,
            Some("jpg" | "jpeg") => Kind::Jpeg,
            Some("png") => Kind::Png,
            Some("svg") => Kind::Svg,
            _ => Kind::Other,
        }
    }
}

/// Compresses every file under the images directory into the mirrored path
/// under the distribution directory. Returns the number of written files.
pub fn optimize_all(layout: &Layout) -> Result<usize, ImageError> {
    let source = layout.images_dir();
    let target = layout.dist_images();

    let files = crate::io::glob_files(&source, "**/*")?;

    let span = tracing::info_span!("images");
    span.pb_set_style(&crate::io::PROGRESS_STYLE);
    span.pb_set_length(files.len() as u64);
    span.pb_set_message("Optimizing images...");
    let _enter = span.enter();

    files.par_iter().try_for_each(|path| -> Result<_, ImageError> {
        let relative = path.strip_prefix(&source).map_err(ScanError::from)?;
        optimize_file(path, &target.join(relative))?;
        span.pb_inc(1);
        Ok(())
    })?;

    Ok(files.len())
}

pub fn optimize_file(src: &Utf8Path, dst: &Utf8Path) -> Result<(), ImageError> {
    let buffer = fs::read(src)?;
    let buffer = optimize(&buffer, Kind::from_path(src))
        .map_err(|e| ImageError::Image(src.to_owned(), e))?;

    crate::io::write(dst, buffer)?;
    Ok(())
}

/// Re-encodes a single image. When the result isn't smaller than the input,
/// the input is returned unchanged, so already optimized images pass through
/// as they are.
pub fn optimize(buffer: &[u8], kind: Kind) -> Result<Vec<u8>, image::ImageError> {
    let encoded = match kind {
        Kind::Gif => encode_gif(buffer)?,
        Kind::Jpeg => encode_jpeg(buffer)?,
        Kind::Png => encode_png(buffer)?,
        Kind::Svg => match std::str::from_utf8(buffer) {
            Ok(text) => super::svg::strip(text).into_bytes(),
            Err(_) => return Ok(buffer.to_vec()),
        },
        Kind::Other => return Ok(buffer.to_vec()),
    };

    if encoded.len() < buffer.len() {
        Ok(encoded)
    } else {
        Ok(buffer.to_vec())
    }
}

fn encode_gif(buffer: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let frames = GifDecoder::new(Cursor::new(buffer))?
        .into_frames()
        .collect_frames()?;

    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        encoder.set_repeat(Repeat::Infinite)?;
        encoder.encode_frames(frames)?;
    }

    Ok(out)
}

fn encode_jpeg(buffer: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory_with_format(buffer, ImageFormat::Jpeg)?;
    let rgb = img.to_rgb8();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode(
        &rgb,
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;

    Ok(out)
}

fn encode_png(buffer: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory_with_format(buffer, ImageFormat::Png)?;

    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive)
        .write_image(img.as_bytes(), img.width(), img.height(), img.color().into())?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use image::{Delay, Frame, Rgb, RgbImage, Rgba, RgbaImage};

    use super::*;

    fn gradient_png() -> Vec<u8> {
        let img = RgbaImage::from_fn(64, 64, |x, y| Rgba([x as u8 * 4, y as u8 * 4, 128, 255]));
        let mut out = Vec::new();
        // Fast, unfiltered encoding leaves room for the optimizer.
        PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter)
            .write_image(img.as_raw(), 64, 64, ExtendedColorType::Rgba8)
            .unwrap();
        out
    }

    fn photo_jpeg() -> Vec<u8> {
        let img = RgbImage::from_fn(64, 64, |x, y| Rgb([(x * y) as u8, x as u8 * 3, y as u8 * 3]));
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, 100)
            .encode(img.as_raw(), 64, 64, ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    /// Three full-canvas frames, a single color each.
    fn animated_gif() -> Vec<u8> {
        let frames = [[220, 30, 30, 255], [30, 220, 30, 255], [30, 30, 220, 255]].map(|color| {
            let buffer = RgbaImage::from_pixel(16, 12, Rgba(color));
            Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(100, 1))
        });

        let mut out = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut out);
            encoder.set_repeat(Repeat::Infinite).unwrap();
            encoder.encode_frames(frames).unwrap();
        }
        out
    }

    fn gif_frames(buffer: &[u8]) -> Vec<Frame> {
        GifDecoder::new(Cursor::new(buffer))
            .unwrap()
            .into_frames()
            .collect_frames()
            .unwrap()
    }

    #[test]
    fn detects_kind_by_extension() {
        assert_eq!(Kind::from_path(Utf8Path::new("a/B.JPG")), Kind::Jpeg);
        assert_eq!(Kind::from_path(Utf8Path::new("a.jpeg")), Kind::Jpeg);
        assert_eq!(Kind::from_path(Utf8Path::new("a.svg")), Kind::Svg);
        assert_eq!(Kind::from_path(Utf8Path::new("a.webp")), Kind::Other);
        assert_eq!(Kind::from_path(Utf8Path::new("README")), Kind::Other);
    }

    #[test]
    fn png_is_never_larger() {
        let source = gradient_png();
        let optimized = optimize(&source, Kind::Png).unwrap();

        assert!(optimized.len() <= source.len());
        let decoded = image::load_from_memory(&optimized).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 64));
    }

    #[test]
    fn optimized_png_is_a_no_op() {
        let once = optimize(&gradient_png(), Kind::Png).unwrap();
        let twice = optimize(&once, Kind::Png).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn jpeg_keeps_dimensions() {
        let source = photo_jpeg();
        let optimized = optimize(&source, Kind::Jpeg).unwrap();

        assert!(optimized.len() <= source.len());
        let decoded = image::load_from_memory(&optimized).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 64));
    }

    #[test]
    fn gif_keeps_every_frame() {
        let source = animated_gif();
        let optimized = optimize(&source, Kind::Gif).unwrap();

        assert!(optimized.len() <= source.len());
        let frames = gif_frames(&optimized);
        assert_eq!(frames.len(), 3);
        for frame in &frames {
            assert_eq!(frame.buffer().dimensions(), (16, 12));
        }
        assert_eq!(frames[1].buffer().get_pixel(5, 5), &Rgba([30, 220, 30, 255]));
    }

    #[test]
    fn optimized_gif_is_a_no_op() {
        let once = optimize(&animated_gif(), Kind::Gif).unwrap();
        let twice = optimize(&once, Kind::Gif).unwrap();

        assert_eq!(once, twice);
        assert_eq!(gif_frames(&twice).len(), 3);
    }

    #[test]
    fn optimized_jpeg_never_grows() {
        let once = optimize(&photo_jpeg(), Kind::Jpeg).unwrap();
        let twice = optimize(&once, Kind::Jpeg).unwrap();

        // Lossy re-encoding may shave a few more bytes, but never adds any.
        assert!(twice.len() <= once.len());
        let decoded = image::load_from_memory(&twice).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 64));

        let before = image::load_from_memory(&once).unwrap().to_rgb8();
        let after = decoded.to_rgb8();
        let drift = before
            .pixels()
            .zip(after.pixels())
            .flat_map(|(a, b)| a.0.iter().zip(b.0.iter()).map(|(x, y)| x.abs_diff(*y) as u64))
            .sum::<u64>()
            / (64 * 64 * 3);
        assert!(drift < 16, "mean channel drift {drift}");
    }

    #[test]
    fn unknown_files_pass_through() {
        let data = b"not an image at all".to_vec();
        assert_eq!(optimize(&data, Kind::Other).unwrap(), data);
    }

    #[test]
    fn corrupt_image_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let src = root.join("broken.png");
        fs::write(&src, b"garbage").unwrap();

        let err = optimize_file(&src, &root.join("out.png")).unwrap_err();

        assert!(matches!(err, ImageError::Image(ref path, _) if *path == src));
    }

    #[test]
    fn mirrors_directory_structure() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let layout = Layout::rooted(root);

        crate::io::write(&layout.images_dir().join("icons/logo.png"), gradient_png()).unwrap();
        crate::io::write(&layout.images_dir().join("notes.txt"), "keep me").unwrap();

        let count = optimize_all(&layout).unwrap();

        assert_eq!(count, 2);
        assert!(layout.dist_images().join("icons/logo.png").is_file());
        assert_eq!(
            fs::read_to_string(layout.dist_images().join("notes.txt")).unwrap(),
            "keep me"
        );
    }
}
