//! Render pipeline: composites pixel grids into raster surfaces — the
//! on-screen egui texture image (with optional onion-skin underlay) and the
//! RGBA buffers handed to the export encoders.

use egui::{Color32, ColorImage};
use image::RgbaImage;

use crate::grid::PixelGrid;

/// Onion-skin overlay opacity.  Display-only reference, never written back
/// into any grid.
pub const ONION_SKIN_ALPHA: u8 = 77; // 30% of 255

// ============================================================================
// DISPLAY COMPOSITE
// ============================================================================

/// Composite a frame for on-screen display: the previous frame first (when
/// onion skinning is on) at reduced global opacity, then the current frame
/// at full opacity.  Transparent cells stay alpha-zero so the UI's
/// checkerboard shows through.
pub fn compose_display(current: &PixelGrid, onion: Option<&PixelGrid>) -> ColorImage {
    let w = current.width() as usize;
    let h = current.height() as usize;
    let mut pixels = vec![Color32::TRANSPARENT; w * h];

    if let Some(prev) = onion {
        for (dst, cell) in pixels.iter_mut().zip(prev.cells()) {
            if let crate::grid::Color::Rgb([r, g, b]) = cell {
                *dst = Color32::from_rgba_unmultiplied(*r, *g, *b, ONION_SKIN_ALPHA);
            }
        }
    }

    for (dst, cell) in pixels.iter_mut().zip(current.cells()) {
        if cell.is_opaque() {
            *dst = cell.to_color32();
        }
    }

    ColorImage { size: [w, h], pixels }
}

// ============================================================================
// EXPORT RASTERIZATION
// ============================================================================

/// Rasterize a grid to RGBA at 1:1 — one surface pixel per cell, transparent
/// cells at true alpha zero.
pub fn render_frame(grid: &PixelGrid) -> RgbaImage {
    let mut img = RgbaImage::new(grid.width(), grid.height());
    for (dst, cell) in img.pixels_mut().zip(grid.cells()) {
        *dst = cell.to_rgba();
    }
    img
}

/// Rasterize with integer nearest-neighbor scale-up: each cell becomes a
/// `scale × scale` block with hard edges, no smoothing.
pub fn render_scaled(grid: &PixelGrid, scale: u32) -> RgbaImage {
    let scale = scale.max(1);
    if scale == 1 {
        return render_frame(grid);
    }
    let w = grid.width();
    let h = grid.height();
    let mut img = RgbaImage::new(w * scale, h * scale);
    let cells = grid.cells();
    for y in 0..h * scale {
        for x in 0..w * scale {
            let src = crate::geometry::pixel_index(x / scale, y / scale, w);
            img.put_pixel(x, y, cells[src].to_rgba());
        }
    }
    img
}

/// Compose frames into one horizontal sprite-sheet strip, no inter-frame
/// padding.  All grids must share one size (a project invariant).
pub fn compose_strip(frames: &[&PixelGrid], scale: u32) -> RgbaImage {
    let scale = scale.max(1);
    let Some(first) = frames.first() else {
        return RgbaImage::new(0, 0);
    };
    let fw = first.width() * scale;
    let fh = first.height() * scale;
    let mut strip = RgbaImage::new(fw * frames.len() as u32, fh);
    for (i, grid) in frames.iter().enumerate() {
        let tile = render_scaled(grid, scale);
        let x0 = i as u32 * fw;
        for (x, y, p) in tile.enumerate_pixels() {
            strip.put_pixel(x0 + x, y, *p);
        }
    }
    strip
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Color, PixelGrid, Point, Size};
    use image::Rgba;

    fn checker2() -> PixelGrid {
        let mut g = PixelGrid::new(Size::new(2, 2));
        g.set(Point::new(0, 0), Color::rgb(10, 20, 30));
        g.set(Point::new(1, 1), Color::rgb(40, 50, 60));
        g
    }

    #[test]
    fn render_frame_maps_cells_one_to_one() {
        let img = render_frame(&checker2());
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(*img.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
        assert_eq!(*img.get_pixel(1, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*img.get_pixel(1, 1), Rgba([40, 50, 60, 255]));
    }

    #[test]
    fn scaled_render_makes_hard_blocks() {
        let img = render_scaled(&checker2(), 3);
        assert_eq!(img.dimensions(), (6, 6));
        // Every pixel of the (0,0) block matches the source cell exactly.
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(*img.get_pixel(x, y), Rgba([10, 20, 30, 255]));
            }
        }
        // A block boundary is a hard edge: neighbor block is untouched.
        assert_eq!(*img.get_pixel(3, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn strip_is_horizontal_with_no_padding() {
        let a = checker2();
        let mut b = PixelGrid::new(Size::new(2, 2));
        b.set(Point::new(0, 0), Color::rgb(9, 9, 9));
        let strip = compose_strip(&[&a, &b], 1);
        assert_eq!(strip.dimensions(), (4, 2));
        assert_eq!(*strip.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
        assert_eq!(*strip.get_pixel(2, 0), Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn onion_skin_sits_beneath_current() {
        let mut prev = PixelGrid::new(Size::new(2, 1));
        prev.set(Point::new(0, 0), Color::rgb(100, 0, 0));
        prev.set(Point::new(1, 0), Color::rgb(0, 100, 0));
        let mut cur = PixelGrid::new(Size::new(2, 1));
        cur.set(Point::new(0, 0), Color::rgb(0, 0, 100));

        let img = compose_display(&cur, Some(&prev));
        // Cell 0: current frame wins at full opacity.
        assert_eq!(img.pixels[0], Color32::from_rgb(0, 0, 100));
        // Cell 1: only the onion layer, at 30% opacity.
        assert_eq!(
            img.pixels[1],
            Color32::from_rgba_unmultiplied(0, 100, 0, ONION_SKIN_ALPHA)
        );
    }
}
