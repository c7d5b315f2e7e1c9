use uuid::Uuid;

use crate::frames::{DEFAULT_FPS, FrameSequence, Playback};
use crate::grid::Size;

/// Single open document: the frame sequence plus its shared canvas size and
/// playback settings.  The viewport is deliberately *not* part of the
/// project — it's a display concern that doesn't travel with the document.
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub size: Size,
    pub sequence: FrameSequence,
    pub playback: Playback,
    pub is_dirty: bool,
}

impl Project {
    pub fn new_untitled(untitled_counter: usize, width: u32, height: u32) -> Self {
        let size = Size::new(width, height);
        Self {
            id: Uuid::new_v4(),
            name: format!("Untitled-{}", untitled_counter),
            size,
            sequence: FrameSequence::new(size),
            playback: Playback::new(DEFAULT_FPS),
            is_dirty: false,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    /// Display title (name with dirty indicator).
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Replace every frame — the all-or-nothing landing point for a
    /// successful import.  Resets the selection to the first frame.
    pub fn replace_frames(&mut self, frames: Vec<crate::frames::Frame>) {
        if frames.is_empty() {
            return;
        }
        let mut sequence = FrameSequence::new(self.size);
        for (i, frame) in frames.into_iter().enumerate() {
            if i == 0 {
                sequence.replace_current_pixels(frame.pixels);
            } else {
                sequence.add_frame(sequence.current_index(), self.size);
                sequence.replace_current_pixels(frame.pixels);
            }
        }
        sequence.select_frame(0);
        self.sequence = sequence;
        self.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::Frame;

    #[test]
    fn import_replacement_is_all_or_nothing() {
        let mut project = Project::new_untitled(1, 8, 8);
        project.replace_frames(Vec::new());
        assert_eq!(project.sequence.frame_count(), 1, "empty import must not replace anything");

        let frames = vec![
            Frame::blank(project.size),
            Frame::blank(project.size),
            Frame::blank(project.size),
        ];
        project.replace_frames(frames);
        assert_eq!(project.sequence.frame_count(), 3);
        assert_eq!(project.sequence.current_index(), 0);
        assert!(project.is_dirty);
    }
}
