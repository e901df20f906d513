//! Minimal resolution (DPI) metadata reader/writer for JPEG, PNG and TIFF.
//!
//! The `image` crate decodes pixels but does not expose density headers, and
//! its PNG encoder cannot write them. This module fills both gaps:
//!
//! - JPEG: reads the JFIF APP0 density fields, falling back to the Exif APP1
//!   IFD0 resolution tags. Writing goes through
//!   `JpegEncoder::set_pixel_density`, so no writer is needed here.
//! - PNG: reads the `pHYs` chunk, and inserts one into encoded output.
//! - TIFF: reads the IFD0 resolution tags. There is no writer.
//!
//! Other formats report no resolution.

use super::params::Resolution;
use image::ImageFormat;

const CM_PER_INCH: f32 = 2.54;
const METERS_PER_INCH: f32 = 0.0254;

/// Read the resolution from raw file bytes, dispatching by format.
/// Returns `None` on any parse failure or when the header carries only an
/// aspect ratio with no physical unit.
pub fn read_resolution(data: &[u8], format: ImageFormat) -> Option<Resolution> {
    match format {
        ImageFormat::Jpeg => read_jfif_density(data),
        ImageFormat::Png => read_png_phys(data),
        ImageFormat::Tiff => read_tiff_resolution(data),
        _ => None,
    }
}

/// Convert a DPI value to the `u16` a JFIF header can hold.
pub fn dpi_to_jfif(dpi: f32) -> u16 {
    dpi.round().clamp(1.0, u16::MAX as f32) as u16
}

// ---------------------------------------------------------------------------
// JPEG: JFIF APP0, Exif APP1
// ---------------------------------------------------------------------------

const JFIF_IDENT: &[u8] = b"JFIF\0";
const EXIF_IDENT: &[u8] = b"Exif\0\0";

/// Walk the JPEG header segments and decode the density.
///
/// APP0 payload layout after the 2-byte length:
///   "JFIF\0" (5) | version (2) | units (1) | x density (2) | y density (2)
/// Units: 0 = aspect only, 1 = dots per inch, 2 = dots per cm.
///
/// A JFIF density with a physical unit wins. Otherwise the Exif APP1
/// segment, a TIFF structure after "Exif\0\0", is used if present.
fn read_jfif_density(data: &[u8]) -> Option<Resolution> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut exif = None;
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            break;
        }
        let marker = data[pos + 1];
        // SOS: entropy-coded data follows, no more headers
        if marker == 0xDA {
            break;
        }
        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let payload_start = pos + 4;
        let payload_end = (pos + 2 + seg_len).min(data.len());
        let payload = data.get(payload_start..payload_end).unwrap_or_default();

        match marker {
            0xE0 if payload.len() >= 12 && payload.starts_with(JFIF_IDENT) => {
                let units = payload[7];
                let x = u16::from_be_bytes([payload[8], payload[9]]) as f32;
                let y = u16::from_be_bytes([payload[10], payload[11]]) as f32;
                match units {
                    1 => {
                        return Some(Resolution {
                            horizontal: x,
                            vertical: y,
                        });
                    }
                    2 => {
                        return Some(Resolution {
                            horizontal: x * CM_PER_INCH,
                            vertical: y * CM_PER_INCH,
                        });
                    }
                    _ => {}
                }
            }
            0xE1 if exif.is_none() && payload.starts_with(EXIF_IDENT) => {
                exif = read_tiff_resolution(&payload[EXIF_IDENT.len()..]);
            }
            _ => {}
        }

        pos += 2 + seg_len;
    }
    exif
}

// ---------------------------------------------------------------------------
// TIFF IFD0 (TIFF files and Exif blocks)
// ---------------------------------------------------------------------------

const TAG_X_RESOLUTION: u16 = 0x011A;
const TAG_Y_RESOLUTION: u16 = 0x011B;
const TAG_RESOLUTION_UNIT: u16 = 0x0128;
const TYPE_RATIONAL: u16 = 5;
/// ResolutionUnit values: 1 = none, 2 = inch (the default), 3 = centimetre.
const UNIT_INCH: u16 = 2;
const UNIT_CM: u16 = 3;

/// Decode XResolution, YResolution and ResolutionUnit from IFD0.
///
/// `data` starts at the TIFF header ("II" or "MM", 42, IFD0 offset). Each
/// IFD entry is tag (2) | type (2) | count (4) | value or offset (4).
fn read_tiff_resolution(data: &[u8]) -> Option<Resolution> {
    let big_endian = match data.get(0..2)? {
        b"MM" => true,
        b"II" => false,
        _ => return None,
    };

    let read_u16 = |offset: usize| -> Option<u16> {
        let bytes: [u8; 2] = data.get(offset..offset + 2)?.try_into().ok()?;
        Some(if big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        })
    };
    let read_u32 = |offset: usize| -> Option<u32> {
        let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
        Some(if big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    };
    let read_rational = |offset: usize| -> Option<f32> {
        let numerator = read_u32(offset)?;
        let denominator = read_u32(offset + 4)?;
        (denominator != 0).then(|| numerator as f32 / denominator as f32)
    };

    if read_u16(2)? != 42 {
        return None;
    }
    let ifd_offset = read_u32(4)? as usize;
    let entry_count = read_u16(ifd_offset)? as usize;

    let (mut x, mut y, mut unit) = (None, None, UNIT_INCH);
    for i in 0..entry_count {
        let entry = ifd_offset + 2 + i * 12;
        let tag = read_u16(entry)?;
        let typ = read_u16(entry + 2)?;
        match tag {
            TAG_X_RESOLUTION if typ == TYPE_RATIONAL => {
                x = read_rational(read_u32(entry + 8)? as usize);
            }
            TAG_Y_RESOLUTION if typ == TYPE_RATIONAL => {
                y = read_rational(read_u32(entry + 8)? as usize);
            }
            // SHORT values sit left-justified in the value field
            TAG_RESOLUTION_UNIT => unit = read_u16(entry + 8)?,
            _ => {}
        }
    }

    let scale = match unit {
        UNIT_INCH => 1.0,
        UNIT_CM => CM_PER_INCH,
        _ => return None,
    };
    let horizontal = x.filter(|v| *v > 0.0)?;
    let vertical = y.filter(|v| *v > 0.0).unwrap_or(horizontal);
    Some(Resolution {
        horizontal: horizontal * scale,
        vertical: vertical * scale,
    })
}

// ---------------------------------------------------------------------------
// PNG: pHYs chunk
// ---------------------------------------------------------------------------

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const PHYS: &[u8; 4] = b"pHYs";
const IHDR: &[u8; 4] = b"IHDR";
const IDAT: &[u8; 4] = b"IDAT";
/// Unit specifier for pixels per metre.
const PHYS_UNIT_METER: u8 = 1;

/// A chunk header: (offset of the chunk start, data length, type).
fn png_chunks(data: &[u8]) -> impl Iterator<Item = (usize, usize, [u8; 4])> + '_ {
    let mut pos = PNG_SIGNATURE.len();
    std::iter::from_fn(move || {
        if pos + 12 > data.len() {
            return None;
        }
        let len = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
            as usize;
        let kind = [data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]];
        let start = pos;
        pos += 12 + len;
        Some((start, len, kind))
    })
}

/// Decode the `pHYs` chunk: x ppu (4) | y ppu (4) | unit (1).
fn read_png_phys(data: &[u8]) -> Option<Resolution> {
    if !data.starts_with(PNG_SIGNATURE) {
        return None;
    }

    for (start, len, kind) in png_chunks(data) {
        if &kind == IDAT {
            break;
        }
        if &kind != PHYS || len != 9 || start + 8 + 9 > data.len() {
            continue;
        }
        let body = &data[start + 8..start + 8 + 9];
        if body[8] != PHYS_UNIT_METER {
            return None;
        }
        let x = u32::from_be_bytes([body[0], body[1], body[2], body[3]]) as f32;
        let y = u32::from_be_bytes([body[4], body[5], body[6], body[7]]) as f32;
        return Some(Resolution {
            horizontal: x * METERS_PER_INCH,
            vertical: y * METERS_PER_INCH,
        });
    }
    None
}

/// Return a copy of `png` with a `pHYs` chunk carrying `resolution`,
/// placed right after `IHDR`. Any existing `pHYs` chunk is dropped.
///
/// Returns the input unchanged if it does not start with a valid `IHDR`.
pub fn insert_png_phys(png: &[u8], resolution: Resolution) -> Vec<u8> {
    let mut chunks = png_chunks(png);
    let Some((ihdr_start, ihdr_len, kind)) = chunks.next() else {
        return png.to_vec();
    };
    if &kind != IHDR {
        return png.to_vec();
    }
    let ihdr_end = ihdr_start + 12 + ihdr_len;

    let x = (resolution.horizontal / METERS_PER_INCH).round() as u32;
    let y = (resolution.vertical / METERS_PER_INCH).round() as u32;
    let mut body = Vec::with_capacity(9);
    body.extend_from_slice(&x.to_be_bytes());
    body.extend_from_slice(&y.to_be_bytes());
    body.push(PHYS_UNIT_METER);

    let mut out = Vec::with_capacity(png.len() + 21);
    out.extend_from_slice(&png[..ihdr_end]);
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(PHYS);
    out.extend_from_slice(&body);
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(PHYS);
    hasher.update(&body);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());

    let mut copied_to = ihdr_end;
    for (start, len, kind) in chunks {
        let end = (start + 12 + len).min(png.len());
        if &kind != PHYS {
            out.extend_from_slice(&png[start..end]);
        }
        copied_to = end;
    }
    // Trailing bytes that do not form a whole chunk
    out.extend_from_slice(&png[copied_to.min(png.len())..]);
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::codecs::jpeg::{JpegEncoder, PixelDensity, PixelDensityUnit};
    use image::codecs::png::PngEncoder;
    use image::{ImageEncoder, RgbImage};

    fn jfif(units: u8, x: u16, y: u16) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        data.extend_from_slice(JFIF_IDENT);
        data.extend_from_slice(&[1, 1, units]);
        data.extend_from_slice(&x.to_be_bytes());
        data.extend_from_slice(&y.to_be_bytes());
        data.extend_from_slice(&[0, 0]); // thumbnail size
        data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02]);
        data
    }

    /// A TIFF header and IFD0 holding only the three resolution tags.
    pub(crate) fn tiff_ifd0(big_endian: bool, dpi: u32, unit: u16) -> Vec<u8> {
        let u16_bytes = |v: u16| {
            if big_endian {
                v.to_be_bytes()
            } else {
                v.to_le_bytes()
            }
        };
        let u32_bytes = |v: u32| {
            if big_endian {
                v.to_be_bytes()
            } else {
                v.to_le_bytes()
            }
        };

        let mut data = Vec::new();
        data.extend_from_slice(if big_endian { b"MM" } else { b"II" });
        data.extend_from_slice(&u16_bytes(42));
        data.extend_from_slice(&u32_bytes(8));
        // IFD0 at 8: 3 entries, then the next-IFD offset, then two rationals at 50 and 58
        data.extend_from_slice(&u16_bytes(3));
        for (tag, rational_at) in [(TAG_X_RESOLUTION, 50), (TAG_Y_RESOLUTION, 58)] {
            data.extend_from_slice(&u16_bytes(tag));
            data.extend_from_slice(&u16_bytes(TYPE_RATIONAL));
            data.extend_from_slice(&u32_bytes(1));
            data.extend_from_slice(&u32_bytes(rational_at));
        }
        data.extend_from_slice(&u16_bytes(TAG_RESOLUTION_UNIT));
        data.extend_from_slice(&u16_bytes(3)); // SHORT
        data.extend_from_slice(&u32_bytes(1));
        data.extend_from_slice(&u16_bytes(unit));
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(&u32_bytes(0));
        for _ in 0..2 {
            data.extend_from_slice(&u32_bytes(dpi));
            data.extend_from_slice(&u32_bytes(1));
        }
        data
    }

    /// An Exif APP1 segment, marker included.
    pub(crate) fn exif_app1(tiff: &[u8]) -> Vec<u8> {
        let len = (2 + EXIF_IDENT.len() + tiff.len()) as u16;
        let mut data = vec![0xFF, 0xE1];
        data.extend_from_slice(&len.to_be_bytes());
        data.extend_from_slice(EXIF_IDENT);
        data.extend_from_slice(tiff);
        data
    }

    fn exif_only_jpeg(tiff: &[u8]) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&exif_app1(tiff));
        data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02]);
        data
    }

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        bytes
    }

    #[test]
    fn jfif_dots_per_inch() {
        let res = read_resolution(&jfif(1, 300, 240), ImageFormat::Jpeg).unwrap();
        assert_eq!(res.horizontal, 300.0);
        assert_eq!(res.vertical, 240.0);
    }

    #[test]
    fn jfif_dots_per_cm_converts_to_inches() {
        let res = read_resolution(&jfif(2, 100, 100), ImageFormat::Jpeg).unwrap();
        assert!((res.horizontal - 254.0).abs() < 0.01);
    }

    #[test]
    fn jfif_aspect_only_has_no_resolution() {
        assert_eq!(read_resolution(&jfif(0, 1, 1), ImageFormat::Jpeg), None);
    }

    #[test]
    fn exif_only_jpeg_reads_ifd0_resolution() {
        let data = exif_only_jpeg(&tiff_ifd0(false, 300, UNIT_INCH));
        assert_eq!(
            read_resolution(&data, ImageFormat::Jpeg),
            Some(Resolution::uniform(300.0))
        );
    }

    #[test]
    fn exif_big_endian_centimetres() {
        let data = exif_only_jpeg(&tiff_ifd0(true, 100, UNIT_CM));
        let res = read_resolution(&data, ImageFormat::Jpeg).unwrap();
        assert!((res.horizontal - 254.0).abs() < 0.01);
        assert!((res.vertical - 254.0).abs() < 0.01);
    }

    #[test]
    fn jfif_aspect_only_falls_back_to_exif() {
        let mut data = jfif(0, 1, 1);
        // Splice the Exif segment in front of SOS
        let sos = data.len() - 4;
        data.splice(sos..sos, exif_app1(&tiff_ifd0(false, 200, UNIT_INCH)));
        assert_eq!(
            read_resolution(&data, ImageFormat::Jpeg),
            Some(Resolution::uniform(200.0))
        );
    }

    #[test]
    fn jfif_density_wins_over_exif() {
        let mut data = jfif(1, 72, 72);
        let sos = data.len() - 4;
        data.splice(sos..sos, exif_app1(&tiff_ifd0(false, 300, UNIT_INCH)));
        assert_eq!(
            read_resolution(&data, ImageFormat::Jpeg),
            Some(Resolution::uniform(72.0))
        );
    }

    #[test]
    fn tiff_file_ifd0_resolution() {
        assert_eq!(
            read_resolution(&tiff_ifd0(true, 600, UNIT_INCH), ImageFormat::Tiff),
            Some(Resolution::uniform(600.0))
        );
        // Unit "none" carries no physical resolution
        assert_eq!(
            read_resolution(&tiff_ifd0(false, 600, 1), ImageFormat::Tiff),
            None
        );
    }

    #[test]
    fn truncated_tiff_has_no_resolution() {
        let tiff = tiff_ifd0(false, 300, UNIT_INCH);
        assert_eq!(read_resolution(&tiff[..30], ImageFormat::Tiff), None);
        assert_eq!(read_resolution(b"II", ImageFormat::Tiff), None);
    }

    #[test]
    fn garbage_has_no_resolution() {
        assert_eq!(read_resolution(b"not an image", ImageFormat::Jpeg), None);
        assert_eq!(read_resolution(b"not an image", ImageFormat::Png), None);
        assert_eq!(read_resolution(&[], ImageFormat::Gif), None);
    }

    #[test]
    fn jpeg_encoder_density_is_readable() {
        let img = RgbImage::from_pixel(8, 8, image::Rgb([0, 0, 0]));
        let mut bytes = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, 90);
        encoder.set_pixel_density(PixelDensity {
            density: (150, 150),
            unit: PixelDensityUnit::Inches,
        });
        encoder
            .write_image(img.as_raw(), 8, 8, image::ExtendedColorType::Rgb8)
            .unwrap();

        let res = read_resolution(&bytes, ImageFormat::Jpeg).unwrap();
        assert_eq!(res, Resolution::uniform(150.0));
    }

    #[test]
    fn png_without_phys_has_no_resolution() {
        assert_eq!(read_resolution(&encode_png(4, 4), ImageFormat::Png), None);
    }

    #[test]
    fn png_phys_insert_then_read() {
        let stamped = insert_png_phys(&encode_png(4, 4), Resolution::uniform(300.0));
        let res = read_resolution(&stamped, ImageFormat::Png).unwrap();
        assert!((res.horizontal - 300.0).abs() < 0.05);
        assert!((res.vertical - 300.0).abs() < 0.05);

        // Still a decodable PNG
        let decoded = image::load_from_memory_with_format(&stamped, ImageFormat::Png).unwrap();
        assert_eq!(decoded.width(), 4);
    }

    #[test]
    fn png_phys_insert_replaces_existing_chunk() {
        let once = insert_png_phys(&encode_png(2, 2), Resolution::uniform(72.0));
        let twice = insert_png_phys(&once, Resolution::uniform(600.0));

        let phys_count = png_chunks(&twice).filter(|(_, _, k)| k == PHYS).count();
        assert_eq!(phys_count, 1);
        let res = read_resolution(&twice, ImageFormat::Png).unwrap();
        assert!((res.horizontal - 600.0).abs() < 0.05);
    }

    #[test]
    fn dpi_to_jfif_clamps() {
        assert_eq!(dpi_to_jfif(0.0), 1);
        assert_eq!(dpi_to_jfif(299.6), 300);
        assert_eq!(dpi_to_jfif(1e9), u16::MAX);
    }
}
