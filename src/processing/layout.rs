use config_model::PictureFit;

/// Where a scaled picture lands on the canvas. Offsets go negative when the
/// picture overhangs the canvas and gets cropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub width: u32,
    pub height: u32,
    pub x: i64,
    pub y: i64,
}

pub fn resize_to_cover(canvas_w: u32, canvas_h: u32, src_w: u32, src_h: u32) -> (u32, u32) {
    let iw = src_w.max(1) as f32;
    let ih = src_h.max(1) as f32;
    let cw = canvas_w.max(1) as f32;
    let ch = canvas_h.max(1) as f32;
    let scale = (cw / iw).max(ch / ih);
    let w = (iw * scale).round().max(cw);
    let h = (ih * scale).round().max(ch);
    (w as u32, h as u32)
}

pub fn resize_to_contain(canvas_w: u32, canvas_h: u32, src_w: u32, src_h: u32) -> (u32, u32) {
    let iw = src_w.max(1) as f32;
    let ih = src_h.max(1) as f32;
    let cw = canvas_w.max(1) as f32;
    let ch = canvas_h.max(1) as f32;
    let scale = (cw / iw).min(ch / ih).max(0.0);
    let scale = if scale.is_finite() { scale } else { 1.0 };
    let w = (iw * scale).round().clamp(1.0, cw);
    let h = (ih * scale).round().clamp(1.0, ch);
    (w as u32, h as u32)
}

/// Offset that centers `inner` inside `outer`; negative when `inner` is larger.
pub fn center_offset(inner_w: u32, inner_h: u32, outer_w: u32, outer_h: u32) -> (i64, i64) {
    let ox = (i64::from(outer_w) - i64::from(inner_w)) / 2;
    let oy = (i64::from(outer_h) - i64::from(inner_h)) / 2;
    (ox, oy)
}

pub fn place(fit: PictureFit, canvas_w: u32, canvas_h: u32, src_w: u32, src_h: u32) -> Placement {
    let (width, height) = match fit {
        PictureFit::Cover => resize_to_cover(canvas_w, canvas_h, src_w, src_h),
        PictureFit::Contain => resize_to_contain(canvas_w, canvas_h, src_w, src_h),
        PictureFit::Center => (src_w.max(1), src_h.max(1)),
    };
    let (x, y) = center_offset(width, height, canvas_w, canvas_h);
    Placement {
        width,
        height,
        x,
        y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_fills_and_crops_evenly() {
        let p = place(PictureFit::Cover, 1920, 1080, 1000, 1000);
        assert_eq!((p.width, p.height), (1920, 1920));
        assert_eq!((p.x, p.y), (0, -420));
    }

    #[test]
    fn cover_upscales_small_pictures() {
        let p = place(PictureFit::Cover, 800, 600, 400, 300);
        assert_eq!((p.width, p.height), (800, 600));
        assert_eq!((p.x, p.y), (0, 0));
    }

    #[test]
    fn contain_letterboxes() {
        let p = place(PictureFit::Contain, 1920, 1080, 1000, 1000);
        assert_eq!((p.width, p.height), (1080, 1080));
        assert_eq!((p.x, p.y), (420, 0));
    }

    #[test]
    fn center_keeps_native_size() {
        let p = place(PictureFit::Center, 100, 100, 40, 300);
        assert_eq!((p.width, p.height), (40, 300));
        assert_eq!((p.x, p.y), (30, -100));
    }
}
