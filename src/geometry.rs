//! Pure grid geometry: flat-index mapping, Bresenham line rasterization and
//! flood fill.  No state — everything else in the editor is built on these.

use crate::grid::{Color, PixelGrid, Point, Size};

// ============================================================================
// FLAT INDEX <-> 2D COORDS
// ============================================================================

/// Row-major flat index for (x, y) on a grid of the given width.
#[inline(always)]
pub fn pixel_index(x: u32, y: u32, width: u32) -> usize {
    (y * width + x) as usize
}

/// Inverse of [`pixel_index`].
#[inline(always)]
pub fn pixel_coords(index: usize, width: u32) -> Point {
    let w = width as usize;
    Point::new((index % w) as i32, (index / w) as i32)
}

// ============================================================================
// LINE RASTERIZATION
// ============================================================================

/// Bresenham's line, both endpoints included.  For `start == end` the result
/// is exactly one point; otherwise the sequence has `max(|dx|, |dy|) + 1`
/// points, each 8-connected to the previous, with no duplicates.
///
/// Used to interpolate pencil/eraser strokes between sampled pointer events
/// so fast drags still paint a continuous line.
pub fn rasterize_line(start: Point, end: Point) -> Vec<Point> {
    let dx = (end.x - start.x).abs();
    let dy = -(end.y - start.y).abs();
    let sx = if start.x < end.x { 1 } else { -1 };
    let sy = if start.y < end.y { 1 } else { -1 };

    let mut points = Vec::with_capacity(dx.max(-dy) as usize + 1);
    let mut x = start.x;
    let mut y = start.y;
    let mut err = dx + dy;

    loop {
        points.push(Point::new(x, y));
        if x == end.x && y == end.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points
}

// ============================================================================
// FLOOD FILL
// ============================================================================

/// 4-connected flood fill (N/E/S/W, never diagonal) with an explicit
/// Vec-stack work-list of packed flat indices — recursion depth proportional
/// to region size would blow the stack on large canvases.
///
/// The grid doubles as the visited set: a cell is committed to `fill` before
/// its neighbors are enqueued, so a cell can never be pushed twice and the
/// whole fill is O(width * height) worst case.
///
/// Silent no-op (grid returned untouched) when:
///   * `start` is out of bounds,
///   * `fill == target` (nothing would change),
///   * the cell at `start` doesn't actually hold `target`.
pub fn flood_fill(mut grid: PixelGrid, start: Point, target: Color, fill: Color) -> PixelGrid {
    let size: Size = grid.size();
    if !size.contains(start) || fill == target || grid.get(start) != target {
        return grid;
    }

    let w = size.width as usize;
    let h = size.height as usize;
    let cells = grid.cells_mut();

    let seed = pixel_index(start.x as u32, start.y as u32, size.width);
    let mut stack: Vec<u32> = Vec::with_capacity(256);
    cells[seed] = fill;
    stack.push(seed as u32);

    while let Some(idx) = stack.pop() {
        let idx = idx as usize;
        let x = idx % w;
        let y = idx / w;

        // Left
        if x > 0 && cells[idx - 1] == target {
            cells[idx - 1] = fill;
            stack.push((idx - 1) as u32);
        }
        // Right
        if x + 1 < w && cells[idx + 1] == target {
            cells[idx + 1] = fill;
            stack.push((idx + 1) as u32);
        }
        // Up
        if y > 0 && cells[idx - w] == target {
            cells[idx - w] = fill;
            stack.push((idx - w) as u32);
        }
        // Down
        if y + 1 < h && cells[idx + w] == target {
            cells[idx + w] = fill;
            stack.push((idx + w) as u32);
        }
    }

    grid
}
