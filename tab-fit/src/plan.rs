// SPDX-License-Identifier: MIT
/// Geometry for fitting a decoded frame onto a fixed panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> usize {
        self.w as usize * self.h as usize
    }

    pub fn is_landscape(&self) -> bool {
        self.w > self.h
    }

    pub fn is_portrait(&self) -> bool {
        self.w < self.h
    }

    pub fn transposed(&self) -> Size {
        Size { w: self.h, h: self.w }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitPlan {
    pub input: Size,
    pub panel: Size,
    /// Rotate the source 90 degrees clockwise before scaling.
    pub rotate: bool,
    /// Uniform scale factor applied after rotation.
    pub scale: f32,
    /// Sub-rect of the panel receiving the picture: (x, y, w, h).
    pub dst_roi: (u32, u32, u32, u32),
}

impl FitPlan {
    /// Source size after the optional rotation.
    pub fn oriented_input(&self) -> Size {
        if self.rotate {
            self.input.transposed()
        } else {
            self.input
        }
    }

    pub fn is_identity(&self) -> bool {
        !self.rotate && self.input == self.panel
    }
}

/// Computes how `input` lands on `panel`.
///
/// Rotation is chosen when the two orientations disagree (one landscape, the
/// other portrait) and `allow_rotate` is set. The scale is the largest that
/// keeps the whole picture visible; the result is centered, leaving equal
/// letterbox bars. Square inputs or panels never rotate.
pub fn plan_fit(input: Size, panel: Size, allow_rotate: bool) -> FitPlan {
    let rotate = allow_rotate
        && ((input.is_landscape() && panel.is_portrait())
            || (input.is_portrait() && panel.is_landscape()));

    let (box_w, box_h) = if rotate { (panel.h, panel.w) } else { (panel.w, panel.h) };
    let scale = (box_w as f32 / input.w.max(1) as f32).min(box_h as f32 / input.h.max(1) as f32);

    let fit_w = ((input.w as f32 * scale) as u32).clamp(1, box_w.max(1));
    let fit_h = ((input.h as f32 * scale) as u32).clamp(1, box_h.max(1));
    let (out_w, out_h) = if rotate { (fit_h, fit_w) } else { (fit_w, fit_h) };

    let x = panel.w.saturating_sub(out_w) / 2;
    let y = panel.h.saturating_sub(out_h) / 2;

    FitPlan {
        input,
        panel,
        rotate,
        scale,
        dst_roi: (x, y, out_w, out_h),
    }
}
