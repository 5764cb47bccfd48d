//! Lossless image optimization.

use super::{Diagnostic, StageError, Transform};
use crate::build::{AssetFile, Fileset};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageEncoder, ImageResult};

/// Re-encodes PNGs at the highest compression level and, when a quality
/// is set, JPEGs at that quality. Output is kept only when smaller.
#[derive(Debug, Clone, Default)]
pub struct Optimize {
    jpeg_quality: Option<u8>,
}

impl Optimize {
    pub fn new(jpeg_quality: Option<u8>) -> Self {
        Self { jpeg_quality }
    }
}

fn encode_png(img: &DynamicImage) -> ImageResult<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive).write_image(
        img.as_bytes(),
        img.width(),
        img.height(),
        img.color(),
    )?;
    Ok(out)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> ImageResult<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality).encode_image(&img.to_rgb8())?;
    Ok(out)
}

impl Optimize {
    /// None when the file is not a format this stage touches.
    fn reencode(&self, file: &AssetFile) -> Option<ImageResult<Vec<u8>>> {
        let jpeg_quality = match file.extension().as_deref() {
            Some("png") => None,
            Some("jpg" | "jpeg") => Some(self.jpeg_quality?),
            _ => return None,
        };
        let encoded = image::load_from_memory(&file.contents).and_then(|img| match jpeg_quality {
            Some(quality) => encode_jpeg(&img, quality),
            None => encode_png(&img),
        });
        Some(encoded)
    }
}

impl Transform for Optimize {
    fn name(&self) -> &'static str {
        "optimize"
    }

    fn apply(&self, files: Fileset, diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError> {
        let mut out = Vec::with_capacity(files.len());
        for file in files {
            match self.reencode(&file) {
                Some(Ok(bytes)) if bytes.len() < file.contents.len() => {
                    tracing::debug!(
                        file = %file.path.display(),
                        before = file.contents.len(),
                        after = bytes.len(),
                        "optimized image"
                    );
                    out.push(AssetFile { contents: bytes, ..file });
                }
                Some(Err(e)) => {
                    diagnostics.push(Diagnostic::new(self.name(), &file.path, format!("left as is: {}", e)));
                    out.push(file);
                }
                _ => out.push(file),
            }
        }
        Ok(Fileset::new(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::path::Path;

    fn loose_png() -> Vec<u8> {
        let img = RgbaImage::from_fn(64, 64, |x, y| Rgba([(x * 4) as u8, (y * 4) as u8, 128, 255]));
        let mut out = Vec::new();
        PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter)
            .write_image(img.as_raw(), 64, 64, image::ColorType::Rgba8)
            .unwrap();
        out
    }

    #[test]
    fn test_optimize_png_not_larger_and_still_decodes() {
        let original = loose_png();
        let files = Fileset::new(vec![AssetFile::new("logo.png", "/src/logo.png", original.clone())]);

        let out = Optimize::default().apply(files, &mut vec![]).unwrap();

        let optimized = &out.get(Path::new("logo.png")).unwrap().contents;
        assert!(optimized.len() <= original.len());
        let decoded = image::load_from_memory_with_format(optimized, ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 64));
    }

    #[test]
    fn test_optimize_undecodable_passes_through() {
        let files = Fileset::new(vec![AssetFile::new("broken.png", "/src/broken.png", b"not a png".to_vec())]);
        let mut diagnostics = vec![];

        let out = Optimize::default().apply(files, &mut diagnostics).unwrap();

        assert_eq!(out.get(Path::new("broken.png")).unwrap().contents, b"not a png");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].stage, "optimize");
    }

    #[test]
    fn test_optimize_jpeg_untouched_without_quality() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255])));
        let mut jpeg = Vec::new();
        img.to_rgb8().write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg).unwrap();
        let files = Fileset::new(vec![AssetFile::new("photo.jpg", "/src/photo.jpg", jpeg.clone())]);

        let out = Optimize::default().apply(files, &mut vec![]).unwrap();

        assert_eq!(out.get(Path::new("photo.jpg")).unwrap().contents, jpeg);
    }

    #[test]
    fn test_optimize_other_formats_untouched() {
        let files = Fileset::new(vec![AssetFile::new("anim.gif", "/src/anim.gif", b"GIF89a".to_vec())]);
        let mut diagnostics = vec![];

        let out = Optimize::new(Some(70)).apply(files, &mut diagnostics).unwrap();

        assert_eq!(out.get(Path::new("anim.gif")).unwrap().contents, b"GIF89a");
        assert!(diagnostics.is_empty());
    }
}
