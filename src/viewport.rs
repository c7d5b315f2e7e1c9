//! Viewport: pan/zoom display state and the screen↔grid coordinate
//! transform.  Independent of grid contents — the transform is recomputed
//! from (zoom, pan, canvas rect) on every query, never cached.

use egui::{Pos2, Rect, Vec2};

use crate::grid::{Point, Size};

pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 200.0;

/// Multiplicative zoom step per discrete wheel notch.
pub const ZOOM_STEP: f32 = 1.1;

/// Pan/zoom state for the canvas view.  Purely a display concern, but the
/// transform it defines is load-bearing for input dispatch: every pointer
/// event goes through [`Viewport::screen_to_grid`] before it can touch a
/// pixel.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub zoom: f32,
    pan_offset: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_offset: Vec2::ZERO,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan_offset = Vec2::ZERO;
    }

    pub fn pan_offset(&self) -> Vec2 {
        self.pan_offset
    }

    /// Pan the viewport by a screen-space delta (drag motion accumulates
    /// additively).
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan_offset += delta;
    }

    pub fn apply_zoom(&mut self, zoom_factor: f32) {
        self.zoom = (self.zoom * zoom_factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_in(&mut self) {
        self.apply_zoom(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.apply_zoom(1.0 / ZOOM_STEP);
    }

    /// Zoom while keeping a screen-space point fixed (the point under the
    /// mouse cursor).  The image center in screen space is
    /// `canvas_rect.center() + pan_offset`; after scaling, the anchor would
    /// shift unless the pan offset is compensated.
    pub fn zoom_around_screen_point(&mut self, zoom_factor: f32, anchor: Pos2, canvas_rect: Rect) {
        let old_zoom = self.zoom;
        self.apply_zoom(zoom_factor);
        let actual_factor = self.zoom / old_zoom;
        let old_center = canvas_rect.center() + self.pan_offset;
        let new_center_x = anchor.x + (old_center.x - anchor.x) * actual_factor;
        let new_center_y = anchor.y + (old_center.y - anchor.y) * actual_factor;
        self.pan_offset = Vec2::new(
            new_center_x - canvas_rect.center().x,
            new_center_y - canvas_rect.center().y,
        );
    }

    /// On-screen bounding box of the grid: centered in the canvas area,
    /// shifted by the pan offset, `zoom` screen pixels per grid cell.
    /// Rounded to whole pixels to prevent sub-pixel rendering gaps.
    pub fn image_rect(&self, canvas_rect: Rect, size: Size) -> Rect {
        let image_width = size.width as f32 * self.zoom;
        let image_height = size.height as f32 * self.zoom;
        let center = canvas_rect.center() + self.pan_offset;
        let raw = Rect::from_center_size(center, Vec2::new(image_width, image_height));
        Rect::from_min_max(
            Pos2::new(raw.min.x.round(), raw.min.y.round()),
            Pos2::new(raw.max.x.round(), raw.max.y.round()),
        )
    }

    /// Map a screen position to a grid coordinate:
    /// `grid_x = floor((screen_x - box_left) / (box_width / grid_width))`.
    /// The result may lie outside the grid — bounds policy belongs to the
    /// caller, not the transform.
    pub fn screen_to_grid(&self, screen: Pos2, canvas_rect: Rect, size: Size) -> Point {
        let rect = self.image_rect(canvas_rect, size);
        let cell_w = rect.width() / size.width as f32;
        let cell_h = rect.height() / size.height as f32;
        Point::new(
            ((screen.x - rect.min.x) / cell_w).floor() as i32,
            ((screen.y - rect.min.y) / cell_h).floor() as i32,
        )
    }

    /// Top-left screen corner of a grid cell (inverse of
    /// [`Viewport::screen_to_grid`] up to cell granularity).
    pub fn grid_to_screen(&self, p: Point, canvas_rect: Rect, size: Size) -> Pos2 {
        let rect = self.image_rect(canvas_rect, size);
        let cell_w = rect.width() / size.width as f32;
        let cell_h = rect.height() / size.height as f32;
        Pos2::new(
            rect.min.x + p.x as f32 * cell_w,
            rect.min.y + p.y as f32 * cell_h,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(160.0, 160.0))
    }

    #[test]
    fn zoom_is_clamped() {
        let mut v = Viewport::new();
        for _ in 0..200 {
            v.zoom_out();
        }
        assert_eq!(v.zoom, MIN_ZOOM);
        for _ in 0..2000 {
            v.zoom_in();
        }
        assert_eq!(v.zoom, MAX_ZOOM);
    }

    #[test]
    fn screen_to_grid_floor_division() {
        // 16×16 grid at zoom 10 in a 160×160 canvas: the image rect is the
        // whole canvas, one cell per 10 screen px.
        let mut v = Viewport::new();
        v.apply_zoom(10.0);
        let size = Size::new(16, 16);
        assert_eq!(
            v.screen_to_grid(Pos2::new(0.0, 0.0), canvas(), size),
            Point::new(0, 0)
        );
        assert_eq!(
            v.screen_to_grid(Pos2::new(9.9, 9.9), canvas(), size),
            Point::new(0, 0)
        );
        assert_eq!(
            v.screen_to_grid(Pos2::new(10.0, 25.0), canvas(), size),
            Point::new(1, 2)
        );
        // Outside the image rect: negative / past-the-end coordinates, no clamping.
        assert_eq!(
            v.screen_to_grid(Pos2::new(-1.0, 161.0), canvas(), size),
            Point::new(-1, 16)
        );
    }

    #[test]
    fn pan_shifts_the_transform() {
        let mut v = Viewport::new();
        v.apply_zoom(10.0);
        let size = Size::new(16, 16);
        let before = v.screen_to_grid(Pos2::new(85.0, 85.0), canvas(), size);
        v.pan_by(Vec2::new(10.0, 0.0));
        let after = v.screen_to_grid(Pos2::new(85.0, 85.0), canvas(), size);
        assert_eq!(after.x, before.x - 1);
        assert_eq!(after.y, before.y);
    }

    #[test]
    fn zoom_around_point_keeps_anchor_cell() {
        let mut v = Viewport::new();
        v.apply_zoom(10.0);
        let size = Size::new(16, 16);
        let anchor = Pos2::new(45.0, 45.0);
        let before = v.screen_to_grid(anchor, canvas(), size);
        v.zoom_around_screen_point(ZOOM_STEP, anchor, canvas());
        let after = v.screen_to_grid(anchor, canvas(), size);
        // Rounding of the image rect can shift the result by at most a cell.
        assert!((after.x - before.x).abs() <= 1);
        assert!((after.y - before.y).abs() <= 1);
    }
}
