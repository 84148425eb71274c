use anyhow::{Context, Result};
use egui::{ColorImage, TextureHandle};
use image::{ImageFormat, ImageReader, RgbaImage};
use std::path::Path;

/// Names of the image formats that can be decoded.
pub fn supported_formats() -> Vec<String> {
    ImageFormat::all()
        .filter(|format| format.reading_enabled())
        .map(|format| format!("{format:?}").to_lowercase())
        .collect()
}

/// Whether the file extension maps to a decodable image format.
pub fn is_supported(path: &Path) -> bool {
    ImageFormat::from_path(path)
        .map(|format| format.reading_enabled())
        .unwrap_or(false)
}

/// Decodes an image file; the format is guessed from the content.
pub fn load_image_rgba(path: &Path) -> Result<RgbaImage> {
    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .with_context(|| format!("Unable to open {}", path.display()))?;
    let img = reader
        .decode()
        .with_context(|| format!("Unable to decode {}", path.display()))?;
    Ok(img.into_rgba8())
}

/// Decodes an in-memory image; `source` names it in error messages.
pub fn decode_bytes(bytes: &[u8], source: &str) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes)
        .with_context(|| format!("Unsupported image format in {source}"))?;
    Ok(img.into_rgba8())
}

/// Uploads decoded pixels as an egui texture.
pub fn rgba_to_texture(ctx: &egui::Context, name: &str, rgba: RgbaImage) -> TextureHandle {
    let (w, h) = rgba.dimensions();
    let pixels = rgba.into_raw();
    let color_image = ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &pixels);
    ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
}
