//! Shared test fixtures: synthesized images and ZIP archives.
//!
//! Nothing here ships; everything is generated in-memory or into a caller's
//! temp directory with the same crates the pipeline itself uses.

use image::{ImageEncoder, Rgba, RgbaImage, RgbImage};
use std::io::{Cursor, Write};
use std::path::Path;

/// PNG bytes for a solid RGBA image.
pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Write a gradient RGB PNG to `path`.
pub fn write_png(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save(path).unwrap();
}

/// Write a solid RGBA PNG (with alpha) to `path`.
pub fn write_rgba_png(path: &Path, width: u32, height: u32, color: [u8; 4]) {
    RgbaImage::from_pixel(width, height, Rgba(color))
        .save(path)
        .unwrap();
}

/// Write a small valid JPEG with the given dimensions to `path`.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a JPEG with an embedded ICC profile to `path`.
pub fn write_jpeg_with_icc(path: &Path, width: u32, height: u32, profile: &[u8]) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    let mut encoder = image::codecs::jpeg::JpegEncoder::new(writer);
    encoder.set_icc_profile(profile.to_vec()).unwrap();
    encoder
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// An in-memory ZIP holding the given `(name, content)` entries, stored
/// uncompressed so tests can locate and corrupt payloads byte-for-byte.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Flip one byte inside a stored member's payload so its CRC check fails on
/// extraction while the container itself stays readable.
pub fn corrupt_stored_member(mut archive: Vec<u8>, payload: &[u8]) -> Vec<u8> {
    let at = archive
        .windows(payload.len())
        .position(|window| window == payload)
        .expect("payload not found in archive");
    archive[at] ^= 0xFF;
    archive
}
