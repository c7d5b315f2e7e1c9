//! Tool selection and the interactive drawing controller: the state machine
//! that turns pointer-down/move/up events into grid edits or pan updates.

use egui::{Pos2, Rect};

use crate::frames::FrameSequence;
use crate::geometry::{flood_fill, rasterize_line};
use crate::grid::{Color, Point};
use crate::viewport::Viewport;

// ============================================================================
// TOOLS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Pencil,
    Eraser,
    Bucket,
    ColorPicker,
    Pan,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Eraser => "Eraser",
            Tool::Bucket => "Bucket",
            Tool::ColorPicker => "Picker",
            Tool::Pan => "Pan",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::Pencil,
            Tool::Eraser,
            Tool::Bucket,
            Tool::ColorPicker,
            Tool::Pan,
        ]
    }
}

// ============================================================================
// DRAW CONTROLLER — Idle / Drawing / Panning state machine
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
enum DragState {
    Idle,
    /// Mid-stroke: `last` is the most recent grid point the stroke touched;
    /// the next pointer sample gets a Bresenham line from there so fast
    /// drags paint a continuous stroke instead of isolated dots.
    Drawing { last: Point },
    /// Mid-pan: `anchor` is the previous pointer position in screen space.
    Panning { anchor: Pos2 },
}

/// Converts pointer events plus the active tool into grid mutations (Pencil,
/// Eraser, Bucket, ColorPicker) or viewport pan updates (Pan tool / middle
/// button).  All edits land as whole-grid replacements on the current frame,
/// so a reader never observes a half-applied stroke segment.
pub struct DrawController {
    state: DragState,
}

impl Default for DrawController {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawController {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == DragState::Idle
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.state, DragState::Panning { .. })
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DragState::Drawing { .. })
    }

    /// Pointer pressed.  Returns the picked color when the ColorPicker hits
    /// an opaque pixel; `None` otherwise.
    pub fn pointer_down(
        &mut self,
        screen: Pos2,
        middle_button: bool,
        tool: Tool,
        viewport: &Viewport,
        canvas_rect: Rect,
        sequence: &mut FrameSequence,
        active_color: Color,
    ) -> Option<Color> {
        if !self.is_idle() {
            return None;
        }

        // Middle button always pans, whatever tool is active.
        if middle_button || tool == Tool::Pan {
            self.state = DragState::Panning { anchor: screen };
            return None;
        }

        let size = sequence.current_frame().pixels.size();
        let p = viewport.screen_to_grid(screen, canvas_rect, size);
        if !size.contains(p) {
            // Out-of-bounds presses are silently ignored for every tool.
            return None;
        }

        match tool {
            Tool::Pencil | Tool::Eraser => {
                let color = if tool == Tool::Pencil {
                    active_color
                } else {
                    Color::Transparent
                };
                let mut pixels = sequence.current_frame().pixels.clone();
                pixels.set(p, color);
                sequence.replace_current_pixels(pixels);
                self.state = DragState::Drawing { last: p };
            }
            Tool::Bucket => {
                // Single-shot: fill once and stay Idle, so dragging after
                // the press never re-fills.
                let grid = sequence.current_frame().pixels.clone();
                let target = grid.get(p);
                let filled = flood_fill(grid, p, target, active_color);
                sequence.replace_current_pixels(filled);
            }
            Tool::ColorPicker => {
                let c = sequence.current_frame().pixels.get(p);
                if c.is_opaque() {
                    return Some(c);
                }
            }
            Tool::Pan => unreachable!("handled above"),
        }
        None
    }

    /// Pointer moved with the button still held.
    pub fn pointer_move(
        &mut self,
        screen: Pos2,
        tool: Tool,
        viewport: &mut Viewport,
        canvas_rect: Rect,
        sequence: &mut FrameSequence,
        active_color: Color,
    ) {
        match self.state {
            DragState::Idle => {}
            DragState::Panning { anchor } => {
                viewport.pan_by(screen - anchor);
                self.state = DragState::Panning { anchor: screen };
            }
            DragState::Drawing { last } => {
                let size = sequence.current_frame().pixels.size();
                let p = viewport.screen_to_grid(screen, canvas_rect, size);
                if p == last {
                    return;
                }
                let color = if tool == Tool::Eraser {
                    Color::Transparent
                } else {
                    active_color
                };
                // The line may run off the canvas; per-point set() drops
                // out-of-bounds cells so strokes can wander outside freely.
                let mut pixels = sequence.current_frame().pixels.clone();
                for point in rasterize_line(last, p) {
                    pixels.set(point, color);
                }
                sequence.replace_current_pixels(pixels);
                self.state = DragState::Drawing { last: p };
            }
        }
    }

    /// Pointer released or left the canvas: abandon any drag cleanly.
    pub fn pointer_up(&mut self) {
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Size;
    use egui::Vec2;

    // A 16×16 grid displayed 1:1 in a 16×16 canvas rect at zoom 1 — screen
    // coordinates equal grid coordinates.
    fn setup() -> (Viewport, Rect, FrameSequence) {
        (
            Viewport::new(),
            Rect::from_min_size(Pos2::ZERO, Vec2::new(16.0, 16.0)),
            FrameSequence::new(Size::new(16, 16)),
        )
    }

    fn red() -> Color {
        Color::rgb(255, 0, 0)
    }

    #[test]
    fn pencil_down_paints_one_pixel_and_enters_drawing() {
        let (view, rect, mut seq) = setup();
        let mut ctl = DrawController::new();
        ctl.pointer_down(Pos2::new(3.5, 4.5), false, Tool::Pencil, &view, rect, &mut seq, red());
        assert!(ctl.is_drawing());
        assert_eq!(seq.current_frame().pixels.get(Point::new(3, 4)), red());
    }

    #[test]
    fn drag_interpolates_a_continuous_stroke() {
        let (mut view, rect, mut seq) = setup();
        let mut ctl = DrawController::new();
        ctl.pointer_down(Pos2::new(0.5, 0.5), false, Tool::Pencil, &view, rect, &mut seq, red());
        // Jump straight to (3,3) — the gap must be filled in.
        ctl.pointer_move(Pos2::new(3.5, 3.5), Tool::Pencil, &mut view, rect, &mut seq, red());
        let grid = &seq.current_frame().pixels;
        for i in 0..4 {
            assert_eq!(grid.get(Point::new(i, i)), red(), "gap at ({i},{i})");
        }
        let painted = grid.cells().iter().filter(|c| c.is_opaque()).count();
        assert_eq!(painted, 4);
    }

    #[test]
    fn stroke_may_leave_the_canvas_silently() {
        let (mut view, rect, mut seq) = setup();
        let mut ctl = DrawController::new();
        ctl.pointer_down(Pos2::new(14.5, 0.5), false, Tool::Pencil, &view, rect, &mut seq, red());
        ctl.pointer_move(Pos2::new(20.5, 0.5), Tool::Pencil, &mut view, rect, &mut seq, red());
        assert!(ctl.is_drawing());
        let grid = &seq.current_frame().pixels;
        assert_eq!(grid.get(Point::new(14, 0)), red());
        assert_eq!(grid.get(Point::new(15, 0)), red());
    }

    #[test]
    fn out_of_bounds_press_is_ignored() {
        let (view, rect, mut seq) = setup();
        let mut ctl = DrawController::new();
        let before = seq.generation();
        ctl.pointer_down(Pos2::new(30.0, 30.0), false, Tool::Pencil, &view, rect, &mut seq, red());
        assert!(ctl.is_idle());
        assert_eq!(seq.generation(), before);
    }

    #[test]
    fn bucket_is_single_shot() {
        let (mut view, rect, mut seq) = setup();
        let mut ctl = DrawController::new();
        ctl.pointer_down(Pos2::new(2.5, 2.5), false, Tool::Bucket, &view, rect, &mut seq, red());
        assert!(ctl.is_idle(), "bucket must not enter Drawing");
        assert!(seq.current_frame().pixels.cells().iter().all(|c| *c == red()));

        // Dragging afterwards (still before release) must not edit again.
        let generation = seq.generation();
        ctl.pointer_move(Pos2::new(8.5, 8.5), Tool::Bucket, &mut view, rect, &mut seq, red());
        assert_eq!(seq.generation(), generation);
    }

    #[test]
    fn picker_reads_opaque_pixels_only() {
        let (view, rect, mut seq) = setup();
        let mut pixels = seq.current_frame().pixels.clone();
        pixels.set(Point::new(5, 5), red());
        seq.replace_current_pixels(pixels);

        let mut ctl = DrawController::new();
        let picked = ctl.pointer_down(
            Pos2::new(5.5, 5.5), false, Tool::ColorPicker, &view, rect, &mut seq, Color::rgb(0, 0, 0),
        );
        assert_eq!(picked, Some(red()));
        assert!(ctl.is_idle());

        let picked = ctl.pointer_down(
            Pos2::new(1.5, 1.5), false, Tool::ColorPicker, &view, rect, &mut seq, Color::rgb(0, 0, 0),
        );
        assert_eq!(picked, None);
    }

    #[test]
    fn middle_button_pans_regardless_of_tool() {
        let (mut view, rect, mut seq) = setup();
        let mut ctl = DrawController::new();
        ctl.pointer_down(Pos2::new(4.0, 4.0), true, Tool::Pencil, &view, rect, &mut seq, red());
        assert!(ctl.is_panning());
        ctl.pointer_move(Pos2::new(9.0, 6.0), Tool::Pencil, &mut view, rect, &mut seq, red());
        assert_eq!(view.pan_offset(), Vec2::new(5.0, 2.0));
        // No pixel was touched.
        assert!(seq.current_frame().pixels.cells().iter().all(|c| !c.is_opaque()));
        ctl.pointer_up();
        assert!(ctl.is_idle());
    }

    #[test]
    fn eraser_clears_pixels() {
        let (view, rect, mut seq) = setup();
        let mut pixels = seq.current_frame().pixels.clone();
        pixels.set(Point::new(2, 2), red());
        seq.replace_current_pixels(pixels);

        let mut ctl = DrawController::new();
        ctl.pointer_down(Pos2::new(2.5, 2.5), false, Tool::Eraser, &view, rect, &mut seq, red());
        assert_eq!(
            seq.current_frame().pixels.get(Point::new(2, 2)),
            Color::Transparent
        );
    }
}
