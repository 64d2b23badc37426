//! Mean lightness of a canvas region, read straight from the pixel buffer.

use image::RgbaImage;
use palette::{FromColor, Hsl, Srgb};

/// Lightness at or above which a region counts as light.
pub const LIGHT_THRESHOLD: f32 = 0.5;

/// Overlay text color family chosen from the background under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ink {
    /// Light text for dark backgrounds.
    Light,
    /// Dark text for light backgrounds.
    Dark,
}

impl Ink {
    pub fn for_lightness(lightness: f32) -> Self {
        if lightness >= LIGHT_THRESHOLD {
            Self::Dark
        } else {
            Self::Light
        }
    }

    /// Base RGB of the ink; the alpha comes from the text style.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            Self::Light => [255, 255, 255],
            Self::Dark => [0, 0, 0],
        }
    }
}

/// Non-empty rectangle that lies inside a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Region {
    /// Clip the rectangle to a `canvas_w`×`canvas_h` canvas. Returns `None`
    /// when nothing of it remains.
    pub fn within(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        canvas_w: u32,
        canvas_h: u32,
    ) -> Option<Self> {
        if x >= canvas_w || y >= canvas_h {
            return None;
        }
        let width = width.min(canvas_w - x);
        let height = height.min(canvas_h - y);
        (width > 0 && height > 0).then_some(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Rectangle given as fractions of the canvas size.
    pub fn fraction(
        fx: f32,
        fy: f32,
        fw: f32,
        fh: f32,
        canvas_w: u32,
        canvas_h: u32,
    ) -> Option<Self> {
        let scale = |f: f32, total: u32| (f.clamp(0.0, 1.0) * total as f32).round() as u32;
        Self::within(
            scale(fx, canvas_w),
            scale(fy, canvas_h),
            scale(fw, canvas_w),
            scale(fh, canvas_h),
            canvas_w,
            canvas_h,
        )
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Borrowed view over raw pixel rows with an explicit stride.
#[derive(Debug, Clone, Copy)]
pub struct PixelView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
    bytes_per_pixel: usize,
}

impl<'a> PixelView<'a> {
    pub fn of(img: &'a RgbaImage) -> Self {
        Self {
            data: img.as_raw(),
            width: img.width(),
            height: img.height(),
            stride: img.width() as usize * 4,
            bytes_per_pixel: 4,
        }
    }

    /// Wrap a packed buffer whose first three channels are RGB. Returns `None`
    /// if the buffer is too short for the stated geometry.
    pub fn from_raw(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        bytes_per_pixel: usize,
    ) -> Option<Self> {
        if bytes_per_pixel < 3 {
            return None;
        }
        let row_bytes = (width as usize).checked_mul(bytes_per_pixel)?;
        if stride < row_bytes {
            return None;
        }
        if height > 0 {
            let needed = stride
                .checked_mul(height as usize - 1)?
                .checked_add(row_bytes)?;
            if data.len() < needed {
                return None;
            }
        }
        Some(Self {
            data,
            width,
            height,
            stride,
            bytes_per_pixel,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Mean HSL lightness in `[0, 1]` over every pixel of `region`, clipped to
    /// this view. `None` if the region falls outside it.
    pub fn mean_lightness(&self, region: Region) -> Option<f32> {
        let region = Region::within(
            region.x,
            region.y,
            region.width,
            region.height,
            self.width,
            self.height,
        )?;
        let bpp = self.bytes_per_pixel;
        let mut total = 0f64;
        for row in region.y..region.y + region.height {
            let start = row as usize * self.stride + region.x as usize * bpp;
            let end = start + region.width as usize * bpp;
            let line = self.data.get(start..end)?;
            for px in line.chunks_exact(bpp) {
                let rgb = Srgb::new(px[0], px[1], px[2]).into_format::<f32>();
                let hsl: Hsl = Hsl::from_color(rgb);
                total += f64::from(hsl.lightness);
            }
        }
        Some((total / region.area() as f64) as f32)
    }
}
