//! Export / import collaborators.
//!
//! The core hands these functions value snapshots of frame data (row-major
//! color sequences at a fixed size); everything here is standalone so it can
//! run on a background thread while the UI keeps editing its own copies.

use image::codecs::png::PngEncoder;
use image::{Rgba, RgbaImage};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::frames::Frame;
use crate::grid::{Color, PixelGrid, Size};
use crate::render::{compose_strip, render_scaled};

/// Minimum animated-GIF frame delay in centiseconds.
const MIN_GIF_DELAY_CS: u16 = 1;

/// Per-frame animation delay in 10ms GIF ticks: `round((1000/fps)/10)`.
pub fn gif_delay_cs(fps: f32) -> u16 {
    ((100.0 / fps).round() as u16).max(MIN_GIF_DELAY_CS)
}

// ============================================================================
// STILL / SPRITE-SHEET EXPORT
// ============================================================================

fn write_png(image: &RgbaImage, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("Failed to create PNG file: {}", e))?;
    let mut writer = BufWriter::new(file);
    let encoder = PngEncoder::new(&mut writer);
    #[allow(deprecated)]
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|e| format!("PNG encode error: {}", e))
}

/// Export one frame as a still PNG at an integer pixel scale.
pub fn export_png(grid: &PixelGrid, scale: u32, path: &Path) -> Result<(), String> {
    write_png(&render_scaled(grid, scale), path)
}

/// Export all frames as one horizontal sprite-sheet strip (no padding).
pub fn export_sheet(grids: &[&PixelGrid], scale: u32, path: &Path) -> Result<(), String> {
    if grids.is_empty() {
        return Err("No frames to export".to_string());
    }
    write_png(&compose_strip(grids, scale), path)
}

// ============================================================================
// ANIMATED EXPORT
// ============================================================================

/// Encode frames as a looping animated GIF.
/// All frames must share one size (a project invariant upstream).
pub fn export_gif(grids: &[&PixelGrid], fps: f32, scale: u32, path: &Path) -> Result<(), String> {
    if grids.is_empty() {
        return Err("No frames to encode".to_string());
    }
    let rendered: Vec<RgbaImage> = grids.iter().map(|g| render_scaled(g, scale)).collect();
    let (w32, h32) = rendered[0].dimensions();
    if w32 > u16::MAX as u32 || h32 > u16::MAX as u32 {
        return Err("Image dimensions exceed GIF maximum (65535×65535)".to_string());
    }
    let (w, h) = (w32 as u16, h32 as u16);
    let delay_cs = gif_delay_cs(fps);

    let file = File::create(path).map_err(|e| format!("Failed to create GIF file: {}", e))?;
    // Global palette from the first frame; each frame carries a local
    // palette for color accuracy.
    let (global_palette, _, _) = palettize(&rendered[0], 256);

    let mut encoder = gif::Encoder::new(BufWriter::new(file), w, h, &global_palette)
        .map_err(|e| format!("GIF encoder init error: {}", e))?;
    encoder
        .set_repeat(gif::Repeat::Infinite)
        .map_err(|e| format!("GIF set repeat error: {}", e))?;

    for img in &rendered {
        let (palette, indices, transparent) = palettize(img, 256);
        let frame = gif::Frame {
            width: w,
            height: h,
            delay: delay_cs,
            palette: Some(palette),
            transparent,
            dispose: gif::DisposalMethod::Background,
            buffer: Cow::Owned(indices),
            ..Default::default()
        };
        encoder
            .write_frame(&frame)
            .map_err(|e| format!("GIF frame write error: {}", e))?;
    }
    Ok(())
}

/// Encode frames as a looping animated PNG (APNG).
pub fn export_apng(grids: &[&PixelGrid], fps: f32, scale: u32, path: &Path) -> Result<(), String> {
    if grids.is_empty() {
        return Err("No frames to encode".to_string());
    }
    let rendered: Vec<RgbaImage> = grids.iter().map(|g| render_scaled(g, scale)).collect();
    let (width, height) = rendered[0].dimensions();
    let delay_ms = (1000.0 / fps).round().clamp(1.0, 65535.0) as u16;

    let file = File::create(path).map_err(|e| format!("Failed to create APNG file: {}", e))?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder
        .set_animated(rendered.len() as u32, 0) // 0 = infinite loop
        .map_err(|e| format!("APNG set_animated error: {}", e))?;

    let mut writer = encoder
        .write_header()
        .map_err(|e| format!("APNG header write error: {}", e))?;

    for img in &rendered {
        writer
            .set_frame_delay(delay_ms, 1000)
            .map_err(|e| format!("APNG set frame delay error: {}", e))?;
        writer
            .set_dispose_op(png::DisposeOp::Background)
            .map_err(|e| format!("APNG set dispose op error: {}", e))?;
        writer
            .write_image_data(img.as_raw())
            .map_err(|e| format!("APNG frame write error: {}", e))?;
    }
    writer
        .finish()
        .map_err(|e| format!("APNG finish error: {}", e))
}

/// Map an RGBA image to indexed color for the gif crate:
/// `(flat_palette_rgb, indices, transparent_index)`.
///
/// Pixel art rarely exceeds a handful of colors, so the primary path builds
/// an exact palette from the distinct opaque colors, reserving index 0 for
/// transparency when any pixel needs it.  Images with more distinct colors
/// than fit fall back to NeuQuant quantization.
fn palettize(image: &RgbaImage, max_colors: usize) -> (Vec<u8>, Vec<u8>, Option<u8>) {
    let has_transparency = image.pixels().any(|p| p[3] < 255);
    let reserved = usize::from(has_transparency);

    let mut lookup: HashMap<[u8; 3], u8> = HashMap::new();
    let mut palette: Vec<u8> = vec![0; reserved * 3];
    let mut exact = true;
    for p in image.pixels() {
        if p[3] == 0 {
            continue;
        }
        let rgb = [p[0], p[1], p[2]];
        if !lookup.contains_key(&rgb) {
            if lookup.len() + reserved >= max_colors {
                exact = false;
                break;
            }
            lookup.insert(rgb, (lookup.len() + reserved) as u8);
            palette.extend_from_slice(&rgb);
        }
    }

    if exact {
        let indices = image
            .pixels()
            .map(|p| {
                if p[3] == 0 {
                    0
                } else {
                    lookup[&[p[0], p[1], p[2]]]
                }
            })
            .collect();
        let transparent = has_transparency.then_some(0u8);
        return (palette, indices, transparent);
    }

    // Quantized fallback: NeuQuant over the opaque colors, transparent
    // pixels pinned to the reserved index 0.
    let flat: Vec<u8> = image
        .pixels()
        .flat_map(|p| [p[0], p[1], p[2], 255])
        .collect();
    let nq = color_quant::NeuQuant::new(10, max_colors - reserved, &flat);
    let mut palette = vec![0u8; reserved * 3];
    for i in 0..(max_colors - reserved) {
        if let Some(color) = nq.lookup(i) {
            palette.extend_from_slice(&color[0..3]);
        } else {
            palette.extend_from_slice(&[0, 0, 0]);
        }
    }
    let indices = image
        .pixels()
        .map(|p| {
            if p[3] == 0 {
                0
            } else {
                nq.index_of(&[p[0], p[1], p[2], 255]) as u8 + reserved as u8
            }
        })
        .collect();
    (palette, indices, has_transparency.then_some(0u8))
}

// ============================================================================
// IMPORT — sprite-sheet slicing
// ============================================================================

/// Convert raw image bytes into project frames at the target size.
///
/// Policy:
///   * source smaller than the target in either dimension → a single frame
///     with the whole image centered (integer-floor centering);
///   * otherwise the image is sliced into `floor(w/tw) × floor(h/th)` tiles,
///     row-major, one frame per tile, leftover partial rows/columns
///     discarded.
///
/// Every pixel is binarized at the alpha≥128 threshold.  On any failure no
/// frames are produced — the caller's project is untouched.
pub fn import_frames(bytes: &[u8], size: Size) -> Result<Vec<Frame>, String> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| format!("Image decode error: {}", e))?
        .to_rgba8();
    let (iw, ih) = img.dimensions();

    if iw < size.width || ih < size.height {
        // Whole image as one centered frame.  An axis that is larger than
        // the target gets a negative offset and the overflow is cropped by
        // the grid's out-of-bounds write policy.
        let off_x = (size.width as i32 - iw as i32) / 2;
        let off_y = (size.height as i32 - ih as i32) / 2;
        let mut frame = Frame::blank(size);
        blit_thresholded(&img, 0, 0, iw, ih, &mut frame.pixels, off_x, off_y);
        return Ok(vec![frame]);
    }

    let cols = iw / size.width;
    let rows = ih / size.height;
    let mut frames = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let mut frame = Frame::blank(size);
            blit_thresholded(
                &img,
                col * size.width,
                row * size.height,
                size.width,
                size.height,
                &mut frame.pixels,
                0,
                0,
            );
            frames.push(frame);
        }
    }
    Ok(frames)
}

/// Copy a `w × h` region of `src` starting at (sx, sy) into `dst` at
/// (dx, dy), binarizing alpha as it goes.
fn blit_thresholded(
    src: &RgbaImage,
    sx: u32,
    sy: u32,
    w: u32,
    h: u32,
    dst: &mut PixelGrid,
    dx: i32,
    dy: i32,
) {
    for y in 0..h {
        for x in 0..w {
            let p: Rgba<u8> = *src.get_pixel(sx + x, sy + y);
            dst.set(
                crate::grid::Point::new(dx + x as i32, dy + y as i32),
                Color::from_rgba_thresholded(p),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Point;

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut out = Vec::new();
        let encoder = PngEncoder::new(&mut out);
        #[allow(deprecated)]
        encoder
            .encode(img.as_raw(), img.width(), img.height(), image::ColorType::Rgba8)
            .unwrap();
        out
    }

    #[test]
    fn delay_follows_the_ten_ms_tick_contract() {
        assert_eq!(gif_delay_cs(12.0), 8); // round(83.3 / 10)
        assert_eq!(gif_delay_cs(10.0), 10);
        assert_eq!(gif_delay_cs(60.0), 2);
        assert_eq!(gif_delay_cs(1000.0), 1); // clamped to the minimum tick
    }

    #[test]
    fn large_image_slices_into_row_major_tiles() {
        // 64×64 source into a 32×32 project → 2×2 = 4 frames.
        let mut img = RgbaImage::new(64, 64);
        // Mark each quadrant's top-left pixel with a distinct red value.
        for (i, (x, y)) in [(0u32, 0u32), (32, 0), (0, 32), (32, 32)].iter().enumerate() {
            img.put_pixel(*x, *y, Rgba([i as u8 + 1, 0, 0, 255]));
        }
        let frames = import_frames(&png_bytes(&img), Size::new(32, 32)).unwrap();
        assert_eq!(frames.len(), 4);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.pixels.size(), Size::new(32, 32));
            assert_eq!(
                frame.pixels.get(Point::new(0, 0)),
                Color::rgb(i as u8 + 1, 0, 0),
                "tiles must be row-major"
            );
        }
    }

    #[test]
    fn partial_tiles_are_discarded() {
        // 70×40 into 32×32 → floor(70/32)=2 × floor(40/32)=1 → 2 frames.
        let img = RgbaImage::new(70, 40);
        let frames = import_frames(&png_bytes(&img), Size::new(32, 32)).unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn small_image_is_centered_into_one_frame() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([7, 7, 7, 255]));
        let frames = import_frames(&png_bytes(&img), Size::new(8, 8)).unwrap();
        assert_eq!(frames.len(), 1);
        // floor((8-2)/2) = 3 offset on both axes.
        assert_eq!(frames[0].pixels.get(Point::new(3, 3)), Color::rgb(7, 7, 7));
        assert_eq!(frames[0].pixels.get(Point::new(0, 0)), Color::Transparent);
    }

    #[test]
    fn import_binarizes_alpha() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([5, 5, 5, 127]));
        img.put_pixel(1, 0, Rgba([6, 6, 6, 128]));
        let frames = import_frames(&png_bytes(&img), Size::new(8, 8)).unwrap();
        let g = &frames[0].pixels;
        assert_eq!(g.get(Point::new(3, 3)), Color::Transparent);
        assert_eq!(g.get(Point::new(4, 3)), Color::rgb(6, 6, 6));
    }

    #[test]
    fn undecodable_bytes_fail_without_frames() {
        let err = import_frames(b"definitely not an image", Size::new(8, 8));
        assert!(err.is_err());
    }

    #[test]
    fn exact_palette_reserves_transparent_index() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([1, 2, 3, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
        let (palette, indices, transparent) = palettize(&img, 256);
        assert_eq!(transparent, Some(0));
        assert_eq!(indices, vec![1, 0]);
        assert_eq!(&palette[3..6], &[1, 2, 3]);
    }
}
