use egui::Color32;
use image::Rgba;

/// Alpha cutoff used when binarizing imported / AI-generated pixels.
/// Pixels with `alpha >= 128` become opaque, everything below is dropped.
pub const ALPHA_THRESHOLD: u8 = 128;

// ============================================================================
// COLOR — transparent sentinel or opaque RGB
// ============================================================================

/// One cell of the pixel grid.  There is no partial alpha in the grid itself:
/// a cell is either fully transparent or a fully opaque RGB color.  Alpha
/// blending only happens transiently on the import/AI path, where it is
/// thresholded to this binary decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Transparent,
    Rgb([u8; 3]),
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb([r, g, b])
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Color::Rgb(_))
    }

    /// Parse a `#rrggbb` hex string, case-insensitive.  The leading `#` is
    /// optional.  Returns `None` for anything that isn't 6 hex digits.
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 || !s.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        Some(Color::Rgb([r, g, b]))
    }

    /// Canonical lowercase hex form, or `"transparent"` for the sentinel.
    pub fn to_hex(&self) -> String {
        match self {
            Color::Transparent => "transparent".to_string(),
            Color::Rgb([r, g, b]) => format!("#{:02x}{:02x}{:02x}", r, g, b),
        }
    }

    /// Binarize an RGBA pixel at the fixed alpha threshold.
    pub fn from_rgba_thresholded(p: Rgba<u8>) -> Self {
        if p[3] >= ALPHA_THRESHOLD {
            Color::Rgb([p[0], p[1], p[2]])
        } else {
            Color::Transparent
        }
    }

    pub fn to_rgba(&self) -> Rgba<u8> {
        match self {
            Color::Transparent => Rgba([0, 0, 0, 0]),
            Color::Rgb([r, g, b]) => Rgba([*r, *g, *b, 255]),
        }
    }

    pub fn to_color32(&self) -> Color32 {
        match self {
            Color::Transparent => Color32::TRANSPARENT,
            Color::Rgb([r, g, b]) => Color32::from_rgb(*r, *g, *b),
        }
    }
}

// ============================================================================
// SIZE / POINT
// ============================================================================

/// Logical canvas dimensions, shared by every frame in a project.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        // Zero-area canvases are never valid; clamp rather than panic so a
        // bad settings file can't take the app down.
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as u32) < self.width && (p.y as u32) < self.height
    }
}

/// Integer grid coordinate.  Signed so that pointer positions outside the
/// canvas can be represented (and then rejected by bounds checks) instead of
/// wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// PIXEL GRID — flat row-major color buffer
// ============================================================================

/// The canonical per-frame pixel store: a flat row-major `Vec<Color>` of
/// exactly `width * height` cells.  Out-of-bounds reads return transparent
/// and out-of-bounds writes are silently dropped — strokes are allowed to
/// wander off the canvas without erroring.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelGrid {
    size: Size,
    cells: Vec<Color>,
}

impl PixelGrid {
    /// Create an all-transparent grid.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            cells: vec![Color::Transparent; size.pixel_count()],
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn get(&self, p: Point) -> Color {
        if self.size.contains(p) {
            self.cells[crate::geometry::pixel_index(p.x as u32, p.y as u32, self.size.width)]
        } else {
            Color::Transparent
        }
    }

    /// Set one cell.  No-op when `p` is out of bounds.
    pub fn set(&mut self, p: Point, color: Color) {
        if self.size.contains(p) {
            let idx = crate::geometry::pixel_index(p.x as u32, p.y as u32, self.size.width);
            self.cells[idx] = color;
        }
    }

    pub fn cells(&self) -> &[Color] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Color] {
        &mut self.cells
    }

    /// Rebuild from raw parts.  Panics if the cell count doesn't match the
    /// size — callers construct the Vec from the same size, so a mismatch is
    /// a programming error, not a runtime condition.
    pub fn from_cells(size: Size, cells: Vec<Color>) -> Self {
        assert_eq!(cells.len(), size.pixel_count());
        Self { size, cells }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_is_lowercase() {
        let c = Color::from_hex("#FF00Aa").unwrap();
        assert_eq!(c, Color::rgb(255, 0, 170));
        assert_eq!(c.to_hex(), "#ff00aa");
    }

    #[test]
    fn hex_rejects_garbage() {
        assert_eq!(Color::from_hex("#ff00"), None);
        assert_eq!(Color::from_hex("zzzzzz"), None);
        assert_eq!(Color::from_hex(""), None);
    }

    #[test]
    fn hex_accepts_missing_hash() {
        assert_eq!(Color::from_hex("00ff00"), Some(Color::rgb(0, 255, 0)));
    }

    #[test]
    fn alpha_threshold_is_128() {
        assert_eq!(
            Color::from_rgba_thresholded(Rgba([10, 20, 30, 128])),
            Color::rgb(10, 20, 30)
        );
        assert_eq!(
            Color::from_rgba_thresholded(Rgba([10, 20, 30, 127])),
            Color::Transparent
        );
    }

    #[test]
    fn out_of_bounds_set_is_silent() {
        let size = Size::new(4, 4);
        let mut grid = PixelGrid::new(size);
        grid.set(Point::new(-1, 0), Color::rgb(1, 2, 3));
        grid.set(Point::new(4, 0), Color::rgb(1, 2, 3));
        grid.set(Point::new(0, 4), Color::rgb(1, 2, 3));
        assert!(grid.cells().iter().all(|c| *c == Color::Transparent));
    }

    #[test]
    fn out_of_bounds_get_is_transparent() {
        let grid = PixelGrid::new(Size::new(2, 2));
        assert_eq!(grid.get(Point::new(5, 5)), Color::Transparent);
    }
}
