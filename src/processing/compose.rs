//! Background layers: flat fill, dimmed picture, centered overlay image.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use config_model::PictureFit;
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};

use crate::error::{Error, Result};
use crate::processing::layout::{center_offset, place};

pub const JPEG_QUALITY: u8 = 90;

pub fn fill(canvas: &mut RgbaImage, color: [u8; 3]) {
    let px = Rgba([color[0], color[1], color[2], 255]);
    for pixel in canvas.pixels_mut() {
        *pixel = px;
    }
}

pub fn load_picture(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Draw `picture` over black at opacity `intensity`, scaled per `fit`.
pub fn blend_picture(canvas: &mut RgbaImage, picture: &DynamicImage, intensity: f32, fit: PictureFit) {
    fill(canvas, [0, 0, 0]);
    let intensity = if intensity.is_finite() {
        intensity.clamp(0.0, 1.0)
    } else {
        1.0
    };
    let placement = place(
        fit,
        canvas.width(),
        canvas.height(),
        picture.width(),
        picture.height(),
    );
    let mut scaled = if (placement.width, placement.height) == (picture.width(), picture.height())
    {
        picture.to_rgba8()
    } else {
        picture
            .resize_exact(placement.width, placement.height, FilterType::Triangle)
            .into_rgba8()
    };
    for pixel in scaled.pixels_mut() {
        pixel[3] = (f32::from(pixel[3]) * intensity).round() as u8;
    }
    imageops::overlay(canvas, &scaled, placement.x, placement.y);
}

/// Draw `image` at native size in the middle of the canvas.
pub fn overlay_centered(canvas: &mut RgbaImage, image: &RgbaImage) {
    let (x, y) = center_offset(image.width(), image.height(), canvas.width(), canvas.height());
    imageops::overlay(canvas, image, x, y);
}

/// Encode `canvas` as JPEG next to `path`, then move it into place so readers
/// never see a partial file.
pub fn save_jpeg(canvas: &RgbaImage, path: &Path) -> Result<()> {
    let rgb: RgbImage = canvas.convert();
    let tmp = path.with_extension("tmp");
    let write = || -> Result<()> {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
            .encode_image(&rgb)
            .map_err(|source| Error::Image {
                path: tmp.clone(),
                source,
            })?;
        writer.flush()?;
        Ok(())
    };
    if let Err(err) = write() {
        let _ = std::fs::remove_file(&tmp);
        return Err(err);
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}
