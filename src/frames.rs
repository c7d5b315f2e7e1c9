//! Frame sequence (animation model): an ordered list of same-sized pixel
//! grids plus the currently selected index, and the playback clock that
//! advances it.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::grid::{PixelGrid, Size};

// ============================================================================
// FRAME IDENTITY
// ============================================================================

/// Process-wide monotonic source for frame ids.  Wall-clock ids can collide
/// under rapid creation; a counter cannot.
static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

/// Stable, opaque frame identity.  Survives reordering and duplication so UI
/// keys and references never desync from sequence positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

impl FrameId {
    fn next() -> Self {
        FrameId(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// One animation frame: a stable id plus its pixel grid.
#[derive(Clone, Debug)]
pub struct Frame {
    pub id: FrameId,
    pub pixels: PixelGrid,
}

impl Frame {
    pub fn blank(size: Size) -> Self {
        Self {
            id: FrameId::next(),
            pixels: PixelGrid::new(size),
        }
    }

    /// Deep copy of the pixel data under a fresh id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: FrameId::next(),
            pixels: self.pixels.clone(),
        }
    }
}

// ============================================================================
// FRAME SEQUENCE
// ============================================================================

/// Ordered frames + current index.  Invariants: length is always ≥ 1 and the
/// current index is always in range (clamped whenever the sequence shrinks).
#[derive(Clone, Debug)]
pub struct FrameSequence {
    frames: Vec<Frame>,
    current: usize,
    /// Bumped on every mutation; lets display caches detect staleness
    /// without diffing pixels.
    generation: u64,
}

impl FrameSequence {
    /// Start with a single blank frame.
    pub fn new(size: Size) -> Self {
        Self {
            frames: vec![Frame::blank(size)],
            current: 0,
            generation: 0,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn current_frame(&self) -> &Frame {
        &self.frames[self.current]
    }

    /// Frame before the current one, if any — the onion-skin reference.
    pub fn previous_frame(&self) -> Option<&Frame> {
        if self.current > 0 {
            self.frames.get(self.current - 1)
        } else {
            None
        }
    }

    /// Replace the current frame's pixels wholesale (how every drawing edit
    /// lands, so observers never see a half-written grid).
    pub fn replace_current_pixels(&mut self, pixels: PixelGrid) {
        self.frames[self.current].pixels = pixels;
        self.generation += 1;
    }

    /// Insert a blank frame immediately after `after_index` and select it.
    pub fn add_frame(&mut self, after_index: usize, size: Size) {
        let at = (after_index + 1).min(self.frames.len());
        self.frames.insert(at, Frame::blank(size));
        self.current = at;
        self.generation += 1;
    }

    /// Insert an independent copy of frame `index` immediately after it and
    /// select the copy.  Later edits to either frame never affect the other.
    pub fn duplicate_frame(&mut self, index: usize) {
        if index >= self.frames.len() {
            return;
        }
        let copy = self.frames[index].duplicate();
        self.frames.insert(index + 1, copy);
        self.current = index + 1;
        self.generation += 1;
    }

    /// Remove frame `index`.  Deleting the last remaining frame is a silent
    /// no-op — the sequence never reaches length 0.
    pub fn delete_frame(&mut self, index: usize) {
        if self.frames.len() <= 1 || index >= self.frames.len() {
            return;
        }
        self.frames.remove(index);
        self.current = index.saturating_sub(1).min(self.frames.len() - 1);
        self.generation += 1;
    }

    /// Select a frame, clamping to the valid range.
    pub fn select_frame(&mut self, index: usize) {
        self.current = index.min(self.frames.len() - 1);
    }

    /// Advance the current index by `steps`, wrapping modulo length.
    pub fn advance(&mut self, steps: u32) {
        self.current = (self.current + steps as usize) % self.frames.len();
    }
}

// ============================================================================
// PLAYBACK CLOCK
// ============================================================================

/// Fixed-interval playback: one frame advance every `1000 / fps` ms.
///
/// Time is injected (`now` in seconds) rather than read from a wall clock so
/// the advancement arithmetic is testable; the UI feeds it egui's frame
/// time.  An fps change leaves the already-scheduled tick where it is and
/// only affects the interval after it fires.
#[derive(Clone, Debug)]
pub struct Playback {
    fps: f32,
    next_tick: Option<f64>,
}

pub const MIN_FPS: f32 = 1.0;
pub const MAX_FPS: f32 = 60.0;
pub const DEFAULT_FPS: f32 = 12.0;

impl Playback {
    pub fn new(fps: f32) -> Self {
        Self {
            fps: fps.clamp(MIN_FPS, MAX_FPS),
            next_tick: None,
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn set_fps(&mut self, fps: f32) {
        self.fps = fps.clamp(MIN_FPS, MAX_FPS);
    }

    pub fn is_playing(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn interval(&self) -> f64 {
        1.0 / self.fps as f64
    }

    /// Start playing; the first advance is one full interval from `now`.
    pub fn start(&mut self, now: f64) {
        self.next_tick = Some(now + self.interval());
    }

    /// Stop advancing immediately.
    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    pub fn toggle(&mut self, now: f64) {
        if self.is_playing() {
            self.stop();
        } else {
            self.start(now);
        }
    }

    /// Number of whole intervals that elapsed up to `now`.  Schedules each
    /// following tick relative to the one that fired, so long stalls catch
    /// up instead of drifting.  The nanosecond slack absorbs float rounding
    /// in the accumulated schedule.
    pub fn tick(&mut self, now: f64) -> u32 {
        let Some(mut next) = self.next_tick else {
            return 0;
        };
        let mut advances = 0u32;
        while now + 1e-9 >= next {
            advances += 1;
            next += self.interval();
        }
        self.next_tick = Some(next);
        advances
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Color, Point};

    fn seq(n: usize) -> FrameSequence {
        let size = Size::new(4, 4);
        let mut s = FrameSequence::new(size);
        for _ in 1..n {
            s.add_frame(s.current_index(), size);
        }
        s
    }

    #[test]
    fn frame_ids_are_unique() {
        let s = seq(8);
        let ids: std::collections::HashSet<_> = s.frames().iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn add_frame_selects_the_new_frame() {
        let mut s = seq(3);
        s.select_frame(1);
        s.add_frame(1, Size::new(4, 4));
        assert_eq!(s.frame_count(), 4);
        assert_eq!(s.current_index(), 2);
    }

    #[test]
    fn delete_last_frame_is_noop() {
        let mut s = seq(1);
        let id = s.current_frame().id;
        s.delete_frame(0);
        assert_eq!(s.frame_count(), 1);
        assert_eq!(s.current_frame().id, id);
    }

    #[test]
    fn delete_clamps_current_index() {
        let mut s = seq(3);
        s.select_frame(0);
        s.delete_frame(0);
        assert_eq!(s.frame_count(), 2);
        assert_eq!(s.current_index(), 0);

        let mut s = seq(3);
        s.select_frame(2);
        s.delete_frame(2);
        assert_eq!(s.current_index(), 1);
    }

    #[test]
    fn duplicate_is_a_deep_copy() {
        let mut s = seq(1);
        let mut pixels = s.current_frame().pixels.clone();
        pixels.set(Point::new(1, 1), Color::rgb(9, 9, 9));
        s.replace_current_pixels(pixels);

        s.duplicate_frame(0);
        assert_eq!(s.frame_count(), 2);
        assert_eq!(s.current_index(), 1);
        assert_eq!(
            s.frame(1).unwrap().pixels.cells(),
            s.frame(0).unwrap().pixels.cells()
        );
        assert_ne!(s.frame(0).unwrap().id, s.frame(1).unwrap().id);

        // Mutating the duplicate must not touch the original.
        let mut edited = s.frame(1).unwrap().pixels.clone();
        edited.set(Point::new(0, 0), Color::rgb(1, 1, 1));
        s.replace_current_pixels(edited);
        assert_eq!(
            s.frame(0).unwrap().pixels.get(Point::new(0, 0)),
            Color::Transparent
        );
    }

    #[test]
    fn playback_advances_fps_times_per_second() {
        let mut pb = Playback::new(12.0);
        pb.start(0.0);
        // Feed uneven frame times covering exactly one second.
        let mut now = 0.0;
        let mut advances = 0u32;
        for step in [0.25, 0.125, 0.375, 0.25] {
            now += step;
            advances += pb.tick(now);
        }
        assert!((now - 1.0).abs() < 1e-9);
        assert_eq!(advances, 12);
    }

    #[test]
    fn playback_wraps_modulo_length() {
        let mut s = seq(5);
        s.select_frame(0);
        s.advance(12);
        assert_eq!(s.current_index(), 12 % 5);
    }

    #[test]
    fn stopped_playback_never_advances() {
        let mut pb = Playback::new(12.0);
        assert_eq!(pb.tick(100.0), 0);
        pb.start(0.0);
        pb.stop();
        assert_eq!(pb.tick(100.0), 0);
    }

    #[test]
    fn fps_change_applies_from_next_tick() {
        let mut pb = Playback::new(10.0); // interval 0.1
        pb.start(0.0);
        pb.set_fps(2.0); // interval 0.5, but the tick at 0.1 is already scheduled
        assert_eq!(pb.tick(0.1), 1);
        assert_eq!(pb.tick(0.59), 0);
        assert_eq!(pb.tick(0.6), 1);
    }
}
