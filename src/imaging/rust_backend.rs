//! Pure Rust image codec backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` + [`density`](super::density) |
//! | Decode (JPEG, PNG, GIF, BMP, TIFF) | `image` crate decoders |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Encode → JPEG | `JpegEncoder` with quality + pixel density |
//! | Encode → PNG | `PngEncoder`, then a `pHYs` chunk stamped in |
//! | Encode → GIF, BMP, TIFF | `DynamicImage::write_to` (no density written) |

use super::backend::{BackendError, Dimensions, ImageBackend, ImageInfo, check_crop};
use super::density;
use super::params::{CropParams, Quality, Resolution};
use image::codecs::jpeg::{JpegEncoder, PixelDensity, PixelDensityUnit};
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

/// Extensions accepted for trimming, and the format each is encoded back to.
///
/// Matching is case-insensitive. Anything else is skipped by the batch driver.
const SUPPORTED_FORMATS: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
];

/// Look up the format for a path by its extension, if it is supported.
pub fn format_for_path(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_str()?;
    SUPPORTED_FORMATS
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
        .map(|(_, format)| *format)
}

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| BackendError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn encode_error(path: &Path, e: impl std::fmt::Display) -> BackendError {
    BackendError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Encode `img` as `format` and write it to `path`.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: ImageFormat,
    resolution: Option<Resolution>,
    quality: Quality,
) -> Result<(), BackendError> {
    match format {
        ImageFormat::Jpeg => save_jpeg(img, path, resolution, quality),
        ImageFormat::Png => save_png(img, path, resolution),
        ImageFormat::Gif | ImageFormat::Bmp | ImageFormat::Tiff => {
            if resolution.is_some() {
                log::debug!(
                    "{:?} output does not carry resolution, writing {} without it",
                    format,
                    path.display()
                );
            }
            let mut buf = Cursor::new(Vec::new());
            img.write_to(&mut buf, format)
                .map_err(|e| encode_error(path, e))?;
            std::fs::write(path, buf.into_inner())?;
            Ok(())
        }
        other => Err(BackendError::UnsupportedFormat(format!("{other:?}"))),
    }
}

fn save_jpeg(
    img: &DynamicImage,
    path: &Path,
    resolution: Option<Resolution>,
    quality: Quality,
) -> Result<(), BackendError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.value() as u8);
    if let Some(res) = resolution {
        encoder.set_pixel_density(PixelDensity {
            density: (
                density::dpi_to_jfif(res.horizontal),
                density::dpi_to_jfif(res.vertical),
            ),
            unit: PixelDensityUnit::Inches,
        });
    }
    // JPEG has no alpha channel
    let rgb = match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img.clone(),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };
    rgb.write_with_encoder(encoder)
        .map_err(|e| encode_error(path, e))?;
    writer.flush()?;
    Ok(())
}

fn save_png(
    img: &DynamicImage,
    path: &Path,
    resolution: Option<Resolution>,
) -> Result<(), BackendError> {
    let mut bytes = Vec::new();
    img.write_with_encoder(PngEncoder::new(&mut bytes))
        .map_err(|e| encode_error(path, e))?;
    let bytes = match resolution {
        Some(res) => density::insert_png_phys(&bytes, res),
        None => bytes,
    };
    std::fs::write(path, bytes)?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<ImageInfo, BackendError> {
        let decode_error = |e: image::ImageError| BackendError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format();
        let (width, height) = reader.into_dimensions().map_err(decode_error)?;

        let resolution = match format {
            Some(format @ (ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Tiff)) => {
                let bytes = std::fs::read(path)?;
                density::read_resolution(&bytes, format)
            }
            _ => None,
        };

        Ok(ImageInfo {
            dimensions: Dimensions { width, height },
            resolution,
        })
    }

    fn crop(&self, params: &CropParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let decoded = Dimensions {
            width: img.width(),
            height: img.height(),
        };
        check_crop(params.rect, decoded)?;

        let rect = params.rect;
        let cropped = img.crop_imm(
            rect.left as u32,
            rect.top as u32,
            rect.width as u32,
            rect.height as u32,
        );

        save_image(
            &cropped,
            &params.output,
            params.format,
            params.resolution,
            params.quality,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::CropRect;
    use image::{ImageEncoder, RgbImage};

    /// Create a small valid JPEG file with the given dimensions and density.
    fn create_test_jpeg(path: &Path, width: u32, height: u32, dpi: Option<u16>) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = BufWriter::new(file);
        let mut encoder = JpegEncoder::new(writer);
        if let Some(dpi) = dpi {
            encoder.set_pixel_density(PixelDensity {
                density: (dpi, dpi),
                unit: PixelDensityUnit::Inches,
            });
        }
        encoder
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn params(source: &Path, output: &Path, dims: (u32, u32), rect: CropRect) -> CropParams {
        CropParams {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            source_dimensions: Dimensions {
                width: dims.0,
                height: dims.1,
            },
            rect,
            format: format_for_path(output).unwrap(),
            resolution: None,
            quality: Quality::new(85),
        }
    }

    #[test]
    fn common_raster_formats_are_supported() {
        for ext in ["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff"] {
            let name = format!("a.{ext}");
            assert!(
                format_for_path(Path::new(&name)).is_some(),
                "expected {ext} to be supported"
            );
        }
        assert_eq!(format_for_path(Path::new("a.webp")), None);
    }

    #[test]
    fn format_lookup_ignores_case() {
        assert_eq!(
            format_for_path(Path::new("/a/IMG_01.JPG")),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            format_for_path(Path::new("scan.TiFf")),
            Some(ImageFormat::Tiff)
        );
        assert_eq!(format_for_path(Path::new("notes.txt")), None);
        assert_eq!(format_for_path(Path::new("no_extension")), None);
    }

    #[test]
    fn identify_synthetic_jpeg_with_density() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150, Some(300));

        let info = RustBackend::new().identify(&path).unwrap();
        assert_eq!(
            info.dimensions,
            Dimensions {
                width: 200,
                height: 150
            }
        );
        assert_eq!(info.resolution, Some(Resolution::uniform(300.0)));
    }

    #[test]
    fn identify_reads_exif_resolution_without_jfif_density() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("camera.jpg");
        create_test_jpeg(&path, 16, 16, None);

        // Swap the encoder's APP0 for an Exif APP1, as cameras write it
        let mut bytes = std::fs::read(&path).unwrap();
        if bytes[2..4] == [0xFF, 0xE0] {
            let app0_len = u16::from_be_bytes([bytes[4], bytes[5]]) as usize;
            bytes.drain(2..4 + app0_len);
        }
        let exif = density::tests::exif_app1(&density::tests::tiff_ifd0(false, 300, 2));
        bytes.splice(2..2, exif);
        std::fs::write(&path, &bytes).unwrap();

        let info = RustBackend::new().identify(&path).unwrap();
        assert_eq!(
            info.dimensions,
            Dimensions {
                width: 16,
                height: 16
            }
        );
        assert_eq!(info.resolution, Some(Resolution::uniform(300.0)));
    }

    #[test]
    fn identify_jpeg_without_density() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 64, 64, None);

        let info = RustBackend::new().identify(&path).unwrap();
        assert_eq!(info.resolution, None);
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn identify_corrupt_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        assert!(RustBackend::new().identify(&path).is_err());
    }

    #[test]
    fn crop_jpeg_writes_exact_dimensions_and_density() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 400, 300, Some(240));
        let output = tmp.path().join("out.jpg");

        let mut p = params(
            &source,
            &output,
            (400, 300),
            CropRect {
                top: 10,
                left: 20,
                width: 300,
                height: 250,
            },
        );
        p.resolution = Some(Resolution::uniform(240.0));
        RustBackend::new().crop(&p).unwrap();

        let info = RustBackend::new().identify(&output).unwrap();
        assert_eq!(
            info.dimensions,
            Dimensions {
                width: 300,
                height: 250
            }
        );
        assert_eq!(info.resolution, Some(Resolution::uniform(240.0)));
    }

    #[test]
    fn crop_png_keeps_format_and_stamps_density() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.png");
        RgbImage::from_pixel(50, 40, image::Rgb([1, 2, 3]))
            .save(&source)
            .unwrap();
        let output = tmp.path().join("out.png");

        let mut p = params(
            &source,
            &output,
            (50, 40),
            CropRect {
                top: 0,
                left: 5,
                width: 40,
                height: 40,
            },
        );
        p.resolution = Some(Resolution::uniform(72.0));
        RustBackend::new().crop(&p).unwrap();

        let info = RustBackend::new().identify(&output).unwrap();
        assert_eq!(info.dimensions.width, 40);
        let res = info.resolution.unwrap();
        assert!((res.horizontal - 72.0).abs() < 0.05);
    }

    #[test]
    fn crop_bmp_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.bmp");
        RgbImage::from_pixel(30, 30, image::Rgb([9, 9, 9]))
            .save(&source)
            .unwrap();
        let output = tmp.path().join("out.bmp");

        RustBackend::new()
            .crop(&params(
                &source,
                &output,
                (30, 30),
                CropRect {
                    top: 5,
                    left: 5,
                    width: 20,
                    height: 20,
                },
            ))
            .unwrap();

        let (w, h) = image::image_dimensions(&output).unwrap();
        assert_eq!((w, h), (20, 20));
    }

    #[test]
    fn crop_degenerate_rect_errors_without_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 100, 100, None);
        let output = tmp.path().join("out.jpg");

        let result = RustBackend::new().crop(&params(
            &source,
            &output,
            (100, 100),
            CropRect {
                top: 0,
                left: 0,
                width: 100,
                height: -10,
            },
        ));

        assert!(matches!(result, Err(BackendError::DegenerateCrop { .. })));
        assert!(!output.exists());
    }
}
