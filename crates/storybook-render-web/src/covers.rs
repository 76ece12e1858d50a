//! Cover image downsizing for web delivery.
//!
//! Story covers are authored at print resolution. Discovery prefers
//! `image/compressed/<name>` over `image/<name>`, so this module fills that
//! folder: wide images are resized to a maximum width, narrow ones are
//! copied through unchanged so every cover has a compressed counterpart.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::DynamicImage;

/// Width used for per-story covers.
pub const STORY_COVER_MAX_WIDTH: u32 = 400;
/// Width used for the book cover.
pub const BOOK_COVER_MAX_WIDTH: u32 = 800;
/// Folder, relative to the image folder, that receives compressed output.
pub const COMPRESSED_DIR: &str = "compressed";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressOptions {
    /// Images wider than this are scaled down, keeping their aspect ratio.
    pub max_width: u32,
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_width: STORY_COVER_MAX_WIDTH,
            jpeg_quality: 85,
        }
    }
}

/// What happened to one image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressOutcome {
    Resized {
        from: (u32, u32),
        to: (u32, u32),
        bytes_before: u64,
        bytes_after: u64,
    },
    /// Already within `max_width`; copied byte for byte.
    Copied { width: u32 },
}

/// Totals for a directory pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompressReport {
    pub resized: usize,
    pub copied: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub enum CompressError {
    Io(std::io::Error),
    Image(image::ImageError),
    Unsupported(String),
}

impl core::fmt::Display for CompressError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Image(err) => write!(f, "image error: {}", err),
            Self::Unsupported(path) => write!(f, "unsupported image type: {}", path),
        }
    }
}

impl std::error::Error for CompressError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Image(err) => Some(err),
            Self::Unsupported(_) => None,
        }
    }
}

impl From<std::io::Error> for CompressError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<image::ImageError> for CompressError {
    fn from(value: image::ImageError) -> Self {
        Self::Image(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Png,
    Jpeg,
}

fn output_format(path: &Path) -> Option<OutputFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(OutputFormat::Png),
        "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
        _ => None,
    }
}

/// Height that keeps `width x height` proportional at `new_width`.
fn scaled_height(width: u32, height: u32, new_width: u32) -> u32 {
    let scaled = u64::from(height) * u64::from(new_width) / u64::from(width.max(1));
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Downsize one image into `output`, or copy it when already narrow enough.
pub fn compress_image_file(
    input: &Path,
    output: &Path,
    opts: &CompressOptions,
) -> Result<CompressOutcome, CompressError> {
    let format = output_format(output)
        .ok_or_else(|| CompressError::Unsupported(output.display().to_string()))?;
    let (width, height) = image::image_dimensions(input)?;
    if width <= opts.max_width {
        fs::copy(input, output)?;
        return Ok(CompressOutcome::Copied { width });
    }

    let new_height = scaled_height(width, height, opts.max_width);
    let resized =
        image::open(input)?.resize_exact(opts.max_width, new_height, FilterType::Lanczos3);
    write_image(&resized, output, format, opts.jpeg_quality)?;

    Ok(CompressOutcome::Resized {
        from: (width, height),
        to: (opts.max_width, new_height),
        bytes_before: fs::metadata(input)?.len(),
        bytes_after: fs::metadata(output)?.len(),
    })
}

fn write_image(
    img: &DynamicImage,
    output: &Path,
    format: OutputFormat,
    jpeg_quality: u8,
) -> Result<(), CompressError> {
    let mut writer = BufWriter::new(fs::File::create(output)?);
    match format {
        OutputFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                &mut writer,
                CompressionType::Best,
                PngFilter::Adaptive,
            );
            img.write_with_encoder(encoder)?;
        }
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut writer, jpeg_quality.clamp(1, 100));
            rgb.write_with_encoder(encoder)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Compress every PNG/JPEG directly inside `source_dir` into `output_dir`.
///
/// Files keep their names. A file that fails is logged and counted; the
/// pass continues with the next one.
pub fn compress_dir(
    source_dir: &Path,
    output_dir: &Path,
    opts: &CompressOptions,
) -> Result<CompressReport, CompressError> {
    fs::create_dir_all(output_dir)?;

    let mut inputs: Vec<PathBuf> = fs::read_dir(source_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && output_format(path).is_some())
        .collect();
    inputs.sort();

    let mut report = CompressReport::default();
    for input in &inputs {
        let Some(name) = input.file_name() else {
            continue;
        };
        let output = output_dir.join(name);
        match compress_image_file(input, &output, opts) {
            Ok(CompressOutcome::Resized {
                from,
                to,
                bytes_before,
                bytes_after,
            }) => {
                log::info!(
                    "resized {} {}x{} -> {}x{} ({} -> {} bytes)",
                    input.display(),
                    from.0,
                    from.1,
                    to.0,
                    to.1,
                    bytes_before,
                    bytes_after
                );
                report.resized += 1;
            }
            Ok(CompressOutcome::Copied { width }) => {
                log::info!("copied {} (width {}px)", input.display(), width);
                report.copied += 1;
            }
            Err(err) => {
                log::warn!("failed to compress {}: {}", input.display(), err);
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

/// Compress `<stories_dir>/image/*` into `<stories_dir>/image/compressed/`.
pub fn compress_story_covers(
    stories_dir: &Path,
    opts: &CompressOptions,
) -> Result<CompressReport, CompressError> {
    let image_dir = stories_dir.join("image");
    compress_dir(&image_dir, &image_dir.join(COMPRESSED_DIR), opts)
}
