//! Application shell: window panels, pointer dispatch into the drawing
//! controller, the playback tick, and the background export / AI pipeline.

use std::path::PathBuf;
use std::sync::mpsc;

use eframe::egui;
use egui::{Color32, Pos2, Rect, Stroke, TextureOptions, Vec2};

use serde::{Deserialize, Serialize};

use crate::ai::{self, GenerationSettings};
use crate::frames::{MAX_FPS, MIN_FPS};
use crate::grid::{Color, PixelGrid, Size};
use crate::io;
use crate::project::Project;
use crate::render;
use crate::tools::{DrawController, Tool};
use crate::viewport::{Viewport, ZOOM_STEP};
use crate::{log_err, log_info};

// ============================================================================
// BACKGROUND PIPELINE — exports and AI generation run off the UI thread
// ============================================================================
//
// Each job gets a by-value snapshot of the frame data, so edits made while
// it runs can never touch the pixels being encoded.  Completions come back
// over an mpsc channel polled once per frame in `update()`.

enum TaskResult {
    Export {
        label: String,
        result: Result<PathBuf, String>,
    },
    Generation(Result<PixelGrid, String>),
}

#[derive(Clone, Copy, PartialEq)]
enum ExportKind {
    Still,
    Sheet,
    Gif,
    Apng,
}

impl ExportKind {
    fn label(&self) -> &'static str {
        match self {
            ExportKind::Still => "PNG",
            ExportKind::Sheet => "sprite sheet",
            ExportKind::Gif => "GIF",
            ExportKind::Apng => "APNG",
        }
    }
}

/// Fixed swatch row in the toolbar.
const SWATCHES: [[u8; 3]; 8] = [
    [0, 0, 0],
    [255, 255, 255],
    [228, 59, 68],
    [254, 174, 52],
    [254, 231, 97],
    [99, 199, 77],
    [0, 149, 233],
    [181, 80, 136],
];

/// The slice of app state that survives restarts via eframe's storage:
/// service connection details and display preferences.  Documents do not —
/// a fresh launch always starts on a blank untitled project.
#[derive(Serialize, Deserialize)]
struct PersistedSettings {
    ai_settings: GenerationSettings,
    export_scale: u32,
    onion_skin: bool,
    show_pixel_grid: bool,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            ai_settings: GenerationSettings::default(),
            export_scale: 8,
            onion_skin: false,
            show_pixel_grid: true,
        }
    }
}

// ============================================================================
// APP
// ============================================================================

pub struct SpriteFEApp {
    project: Project,
    untitled_counter: usize,

    viewport: Viewport,
    controller: DrawController,
    active_tool: Tool,
    active_rgb: [u8; 3],
    hex_input: String,
    onion_skin: bool,
    show_pixel_grid: bool,

    /// Cached composite texture for the canvas; rebuilt when the key
    /// (sequence generation, frame index, onion flag) changes.
    canvas_texture: Option<egui::TextureHandle>,
    texture_key: Option<(u64, usize, bool)>,
    last_canvas_rect: Option<Rect>,
    pointer_was_down: bool,

    task_sender: mpsc::Sender<TaskResult>,
    task_receiver: mpsc::Receiver<TaskResult>,
    pending_tasks: usize,
    status: String,

    export_scale: u32,

    ai_prompt: String,
    ai_settings: GenerationSettings,

    new_dialog_open: bool,
    new_width: u32,
    new_height: u32,
}

impl SpriteFEApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings: PersistedSettings = cc
            .storage
            .and_then(|s| eframe::get_value(s, eframe::APP_KEY))
            .unwrap_or_default();
        let (task_sender, task_receiver) = mpsc::channel();
        log_info!("SpriteFE started");
        Self {
            project: Project::new_untitled(1, 32, 32),
            untitled_counter: 1,
            viewport: Viewport::new(),
            controller: DrawController::new(),
            active_tool: Tool::Pencil,
            active_rgb: [0, 0, 0],
            hex_input: "#000000".to_string(),
            onion_skin: settings.onion_skin,
            show_pixel_grid: settings.show_pixel_grid,
            canvas_texture: None,
            texture_key: None,
            last_canvas_rect: None,
            pointer_was_down: false,
            task_sender,
            task_receiver,
            pending_tasks: 0,
            status: String::new(),
            export_scale: settings.export_scale.clamp(1, 32),
            ai_prompt: String::new(),
            ai_settings: settings.ai_settings,
            new_dialog_open: false,
            new_width: 32,
            new_height: 32,
        }
    }

    fn active_color(&self) -> Color {
        Color::Rgb(self.active_rgb)
    }

    fn set_active_color(&mut self, color: Color) {
        if let Color::Rgb(rgb) = color {
            self.active_rgb = rgb;
            self.hex_input = color.to_hex();
        }
    }

    // -- background pipeline -------------------------------------------------

    fn poll_background(&mut self) {
        while let Ok(result) = self.task_receiver.try_recv() {
            self.pending_tasks = self.pending_tasks.saturating_sub(1);
            match result {
                TaskResult::Export { label, result } => match result {
                    Ok(path) => {
                        self.status = format!("Exported {} to {}", label, path.display());
                        log_info!("Export ({}) finished: {}", label, path.display());
                    }
                    Err(e) => {
                        self.status = format!("{} export failed: {}", label, e);
                        log_err!("Export ({}) failed: {}", label, e);
                    }
                },
                TaskResult::Generation(Ok(pixels)) => {
                    // The generated image lands in whichever frame is
                    // current when it arrives — never a new frame.
                    self.project.sequence.replace_current_pixels(pixels);
                    self.project.mark_dirty();
                    self.status = "Generation applied to current frame".to_string();
                    log_info!("AI generation applied");
                }
                TaskResult::Generation(Err(e)) => {
                    self.status = format!("Generation failed: {}", e);
                    log_err!("AI generation failed: {}", e);
                }
            }
        }
    }

    fn spawn_export(&mut self, kind: ExportKind, path: PathBuf) {
        // Snapshot the frame pixels by value — an in-flight export must
        // never see edits made after this point.
        let grids: Vec<PixelGrid> = self
            .project
            .sequence
            .frames()
            .iter()
            .map(|f| f.pixels.clone())
            .collect();
        let current = self.project.sequence.current_index();
        let fps = self.project.playback.fps();
        let scale = self.export_scale.max(1);
        let sender = self.task_sender.clone();
        let label = kind.label().to_string();
        self.pending_tasks += 1;
        self.status = format!("Exporting {}…", label);
        log_info!("Export ({}) started: {}", label, path.display());

        std::thread::spawn(move || {
            let refs: Vec<&PixelGrid> = grids.iter().collect();
            let result = match kind {
                ExportKind::Still => io::export_png(&grids[current], scale, &path),
                ExportKind::Sheet => io::export_sheet(&refs, scale, &path),
                ExportKind::Gif => io::export_gif(&refs, fps, scale, &path),
                ExportKind::Apng => io::export_apng(&refs, fps, scale, &path),
            };
            let _ = sender.send(TaskResult::Export {
                label,
                result: result.map(|_| path),
            });
        });
    }

    fn spawn_generation(&mut self) {
        let prompt = self.ai_prompt.clone();
        let size = self.project.size;
        let settings = self.ai_settings.clone();
        let sender = self.task_sender.clone();
        self.pending_tasks += 1;
        self.status = "Generating…".to_string();
        log_info!("AI generation started ({} chars prompt)", prompt.len());

        std::thread::spawn(move || {
            let result =
                ai::generate_frame_pixels(&prompt, size, &settings).map_err(|e| e.to_string());
            let _ = sender.send(TaskResult::Generation(result));
        });
    }

    fn import_sheet(&mut self, path: PathBuf) {
        // Import is all-or-nothing: decode and slice first, touch the
        // project only on success.
        let result = std::fs::read(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
            .and_then(|bytes| io::import_frames(&bytes, self.project.size));
        match result {
            Ok(frames) => {
                let count = frames.len();
                self.project.replace_frames(frames);
                self.status = format!("Imported {} frame(s) from {}", count, path.display());
                log_info!("Imported {} frame(s) from {}", count, path.display());
            }
            Err(e) => {
                self.status = format!("Import failed: {}", e);
                log_err!("Import failed: {}", e);
            }
        }
    }

    // -- input ---------------------------------------------------------------

    fn handle_scroll_zoom(&mut self, ctx: &egui::Context, modal_open: bool) {
        // Only when the pointer is over the canvas and NOT over a widget.
        let mut wheel = 0.0;
        let pointer_over_widget = ctx.is_pointer_over_area();
        if !modal_open {
            ctx.input_mut(|i| {
                if i.scroll_delta.y.abs() > 0.1 {
                    let over_canvas = i.pointer.hover_pos().is_some_and(|pos| {
                        self.last_canvas_rect.is_some_and(|rect| rect.contains(pos))
                    });
                    if over_canvas && !pointer_over_widget {
                        wheel = i.scroll_delta.y;
                        i.scroll_delta.y = 0.0;
                    }
                }
            });
        }
        if wheel != 0.0 {
            // One discrete notch = one ×1.1 step, anchored at the cursor so
            // the hovered pixel stays put.
            let factor = if wheel > 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
            let mouse_pos = ctx.input(|i| i.pointer.hover_pos());
            if let (Some(pos), Some(rect)) = (mouse_pos, self.last_canvas_rect) {
                self.viewport.zoom_around_screen_point(factor, pos, rect);
            } else {
                self.viewport.apply_zoom(factor);
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context, modal_open: bool) {
        if modal_open || ctx.wants_keyboard_input() {
            return;
        }
        ctx.input(|i| {
            if i.key_pressed(egui::Key::P) {
                self.active_tool = Tool::Pencil;
            }
            if i.key_pressed(egui::Key::E) {
                self.active_tool = Tool::Eraser;
            }
            if i.key_pressed(egui::Key::G) {
                self.active_tool = Tool::Bucket;
            }
            if i.key_pressed(egui::Key::I) {
                self.active_tool = Tool::ColorPicker;
            }
            if i.key_pressed(egui::Key::M) {
                self.active_tool = Tool::Pan;
            }
            if i.key_pressed(egui::Key::Space) {
                self.project.playback.toggle(i.time);
            }
            if i.key_pressed(egui::Key::O) {
                self.onion_skin = !self.onion_skin;
            }
        });
    }

    // -- panels ----------------------------------------------------------------

    fn toolbar_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            if ui.button("New…").clicked() {
                self.new_dialog_open = true;
                self.new_width = self.project.size.width;
                self.new_height = self.project.size.height;
            }
            ui.separator();

            for tool in Tool::all() {
                if ui
                    .selectable_label(self.active_tool == *tool, tool.label())
                    .clicked()
                {
                    self.active_tool = *tool;
                }
            }
            ui.separator();

            if ui.color_edit_button_srgb(&mut self.active_rgb).changed() {
                self.hex_input = self.active_color().to_hex();
            }
            let hex_resp =
                ui.add(egui::TextEdit::singleline(&mut self.hex_input).desired_width(64.0));
            if hex_resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                match Color::from_hex(&self.hex_input) {
                    Some(c) => self.set_active_color(c),
                    None => self.hex_input = self.active_color().to_hex(),
                }
            }
            for rgb in SWATCHES {
                let (rect, resp) = ui.allocate_exact_size(Vec2::splat(16.0), egui::Sense::click());
                ui.painter()
                    .rect_filled(rect, 2.0, Color32::from_rgb(rgb[0], rgb[1], rgb[2]));
                if resp.clicked() {
                    self.set_active_color(Color::Rgb(rgb));
                }
            }
            ui.separator();

            ui.checkbox(&mut self.onion_skin, "Onion skin");
            ui.checkbox(&mut self.show_pixel_grid, "Grid");
            if ui.button("Reset view").clicked() {
                self.viewport.reset();
            }
        });
    }

    fn side_panel_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Export");
        ui.horizontal(|ui| {
            ui.label("Scale");
            ui.add(egui::DragValue::new(&mut self.export_scale).clamp_range(1..=32));
        });
        if ui.button("Frame as PNG…").clicked()
            && let Some(path) = rfd::FileDialog::new()
                .add_filter("PNG", &["png"])
                .set_file_name("frame.png")
                .save_file()
        {
            self.spawn_export(ExportKind::Still, path);
        }
        if ui.button("Sprite sheet…").clicked()
            && let Some(path) = rfd::FileDialog::new()
                .add_filter("PNG", &["png"])
                .set_file_name("sheet.png")
                .save_file()
        {
            self.spawn_export(ExportKind::Sheet, path);
        }
        if ui.button("Animated GIF…").clicked()
            && let Some(path) = rfd::FileDialog::new()
                .add_filter("GIF", &["gif"])
                .set_file_name("animation.gif")
                .save_file()
        {
            self.spawn_export(ExportKind::Gif, path);
        }
        if ui.button("Animated PNG…").clicked()
            && let Some(path) = rfd::FileDialog::new()
                .add_filter("PNG", &["png"])
                .set_file_name("animation.png")
                .save_file()
        {
            self.spawn_export(ExportKind::Apng, path);
        }

        ui.separator();
        ui.heading("Import");
        if ui.button("Sprite sheet…").clicked()
            && let Some(path) = rfd::FileDialog::new()
                .add_filter("Images", &["png", "gif", "jpg", "jpeg", "bmp"])
                .pick_file()
        {
            self.import_sheet(path);
        }

        ui.separator();
        ui.heading("AI generate");
        ui.label("Prompt");
        ui.add(
            egui::TextEdit::multiline(&mut self.ai_prompt)
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
        ui.label("Endpoint");
        ui.add(
            egui::TextEdit::singleline(&mut self.ai_settings.endpoint)
                .desired_width(f32::INFINITY),
        );
        ui.label("API key");
        ui.add(
            egui::TextEdit::singleline(&mut self.ai_settings.api_key)
                .password(true)
                .desired_width(f32::INFINITY),
        );
        egui::ComboBox::from_label("Resample")
            .selected_text(self.ai_settings.resample.label())
            .show_ui(ui, |ui| {
                for mode in ai::ResampleMode::all() {
                    ui.selectable_value(&mut self.ai_settings.resample, *mode, mode.label());
                }
            });
        let busy = self.pending_tasks > 0;
        if ui
            .add_enabled(
                !busy && !self.ai_prompt.is_empty(),
                egui::Button::new("Generate"),
            )
            .clicked()
        {
            self.spawn_generation();
        }
        if busy {
            ui.spinner();
        }
    }

    fn frame_strip_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let now = ui.input(|i| i.time);
            let playing = self.project.playback.is_playing();
            if ui
                .button(if playing { "⏸" } else { "▶" })
                .on_hover_text("Play / pause (Space)")
                .clicked()
            {
                self.project.playback.toggle(now);
            }
            let mut fps = self.project.playback.fps();
            if ui
                .add(egui::Slider::new(&mut fps, MIN_FPS..=MAX_FPS).text("fps"))
                .changed()
            {
                // Takes effect on the next scheduled tick, not retroactively.
                self.project.playback.set_fps(fps);
            }
            ui.separator();

            let current = self.project.sequence.current_index();
            if ui.button("＋").on_hover_text("Add frame").clicked() {
                self.project.sequence.add_frame(current, self.project.size);
                self.project.mark_dirty();
            }
            if ui.button("⧉").on_hover_text("Duplicate frame").clicked() {
                self.project.sequence.duplicate_frame(current);
                self.project.mark_dirty();
            }
            if ui.button("🗑").on_hover_text("Delete frame").clicked() {
                self.project.sequence.delete_frame(current);
                self.project.mark_dirty();
            }
            ui.separator();

            egui::ScrollArea::horizontal().show(ui, |ui| {
                ui.horizontal(|ui| {
                    let mut clicked = None;
                    for (i, frame) in self.project.sequence.frames().iter().enumerate() {
                        let selected = i == self.project.sequence.current_index();
                        // The stable frame id keys the widget so insertions
                        // and deletions never confuse egui's per-widget state.
                        let resp = ui
                            .push_id(frame.id, |ui| {
                                ui.selectable_label(selected, format!("{}", i + 1))
                            })
                            .inner;
                        if resp.clicked() {
                            clicked = Some(i);
                        }
                    }
                    if let Some(i) = clicked {
                        self.project.sequence.select_frame(i);
                    }
                });
            });
        });
    }

    // -- canvas ----------------------------------------------------------------

    fn canvas_ui(&mut self, ui: &mut egui::Ui, modal_open: bool) {
        let available = ui.available_size();
        let sense = egui::Sense::click_and_drag().union(egui::Sense::hover());
        let (response, painter) = ui.allocate_painter(available, sense);
        let canvas_rect = response.rect;
        self.last_canvas_rect = Some(canvas_rect);
        let painter = painter.with_clip_rect(canvas_rect);

        painter.rect_filled(canvas_rect, 0.0, Color32::from_gray(34));

        let size = self.project.size;
        let image_rect = self.viewport.image_rect(canvas_rect, size);
        Self::draw_checkerboard(&painter, image_rect);

        // Rebuild the composite texture only when the frame data, frame
        // selection or onion flag changed — generation counters, not pixel
        // diffing.
        let onion = self.onion_skin;
        let key = (
            self.project.sequence.generation(),
            self.project.sequence.current_index(),
            onion,
        );
        if self.texture_key != Some(key) || self.canvas_texture.is_none() {
            let prev = if onion {
                self.project.sequence.previous_frame().map(|f| &f.pixels)
            } else {
                None
            };
            let image =
                render::compose_display(&self.project.sequence.current_frame().pixels, prev);
            match &mut self.canvas_texture {
                Some(tex) => tex.set(image, TextureOptions::NEAREST),
                None => {
                    self.canvas_texture = Some(ui.ctx().load_texture(
                        "canvas_composite",
                        image,
                        TextureOptions::NEAREST,
                    ))
                }
            }
            self.texture_key = Some(key);
        }
        if let Some(texture) = &self.canvas_texture {
            let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
            painter.image(texture.id(), image_rect, uv, Color32::WHITE);
        }

        if self.show_pixel_grid && self.viewport.zoom >= 8.0 {
            self.draw_pixel_grid(&painter, image_rect, canvas_rect, size);
        }
        painter.rect_stroke(image_rect, 0.0, Stroke::new(1.0, Color32::from_gray(90)));

        if !modal_open {
            self.dispatch_pointer(ui, &response, canvas_rect);
        }
    }

    /// Feed discrete pointer transitions to the drawing controller.  egui
    /// reports pointer state per frame; the `pointer_was_down` latch turns
    /// that into press / move / release events.
    fn dispatch_pointer(&mut self, ui: &egui::Ui, response: &egui::Response, canvas_rect: Rect) {
        let primary = ui.input(|i| i.pointer.primary_down());
        let middle = ui.input(|i| i.pointer.middle_down());
        let down_now = primary || middle;
        // interact_pointer_pos stays valid while a drag that started on the
        // canvas wanders outside it, so strokes and pans continue smoothly;
        // per-pixel bounds policy is the controller's job.
        let pointer_pos = response.interact_pointer_pos().or(response.hover_pos());

        let gen_before = self.project.sequence.generation();
        match pointer_pos {
            Some(pos) if down_now => {
                let active_color = self.active_color();
                if !self.pointer_was_down {
                    if canvas_rect.contains(pos) && response.hovered() {
                        let picked = self.controller.pointer_down(
                            pos,
                            middle,
                            self.active_tool,
                            &self.viewport,
                            canvas_rect,
                            &mut self.project.sequence,
                            active_color,
                        );
                        if let Some(c) = picked {
                            self.set_active_color(c);
                        }
                    }
                } else {
                    self.controller.pointer_move(
                        pos,
                        self.active_tool,
                        &mut self.viewport,
                        canvas_rect,
                        &mut self.project.sequence,
                        active_color,
                    );
                }
            }
            // Release, or the pointer left the window mid-drag: abandon the
            // stroke/pan cleanly.
            _ => self.controller.pointer_up(),
        }
        self.pointer_was_down = down_now && pointer_pos.is_some();

        if self.project.sequence.generation() != gen_before {
            self.project.mark_dirty();
        }
    }

    fn draw_checkerboard(painter: &egui::Painter, image_rect: Rect) {
        const CELL: f32 = 8.0;
        let light = Color32::from_gray(200);
        let dark = Color32::from_gray(162);
        painter.rect_filled(image_rect, 0.0, light);

        let cols = (image_rect.width() / CELL).ceil() as i32;
        let rows = (image_rect.height() / CELL).ceil() as i32;
        for row in 0..rows {
            for col in 0..cols {
                if (row + col) % 2 == 0 {
                    continue;
                }
                let min = Pos2::new(
                    image_rect.min.x + col as f32 * CELL,
                    image_rect.min.y + row as f32 * CELL,
                );
                let max = Pos2::new(
                    (min.x + CELL).min(image_rect.max.x),
                    (min.y + CELL).min(image_rect.max.y),
                );
                painter.rect_filled(Rect::from_min_max(min, max), 0.0, dark);
            }
        }
    }

    /// Cell boundary lines when zoomed in far enough for them to be useful.
    fn draw_pixel_grid(
        &self,
        painter: &egui::Painter,
        image_rect: Rect,
        canvas_rect: Rect,
        size: Size,
    ) {
        let stroke = Stroke::new(1.0, Color32::from_black_alpha(60));
        let cell_w = image_rect.width() / size.width as f32;
        let cell_h = image_rect.height() / size.height as f32;
        let top = image_rect.min.y.max(canvas_rect.min.y);
        let bottom = image_rect.max.y.min(canvas_rect.max.y);
        let left = image_rect.min.x.max(canvas_rect.min.x);
        let right = image_rect.max.x.min(canvas_rect.max.x);

        for x in 1..size.width {
            let sx = image_rect.min.x + x as f32 * cell_w;
            if sx >= left && sx <= right {
                painter.line_segment([Pos2::new(sx, top), Pos2::new(sx, bottom)], stroke);
            }
        }
        for y in 1..size.height {
            let sy = image_rect.min.y + y as f32 * cell_h;
            if sy >= top && sy <= bottom {
                painter.line_segment([Pos2::new(left, sy), Pos2::new(right, sy)], stroke);
            }
        }
    }

    fn new_project_dialog(&mut self, ctx: &egui::Context) {
        if !self.new_dialog_open {
            return;
        }
        let mut create = false;
        let mut cancel = false;
        egui::Window::new("New project")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Width");
                    ui.add(egui::DragValue::new(&mut self.new_width).clamp_range(1..=512));
                    ui.label("Height");
                    ui.add(egui::DragValue::new(&mut self.new_height).clamp_range(1..=512));
                });
                ui.horizontal(|ui| {
                    create = ui.button("Create").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });
        if create {
            self.untitled_counter += 1;
            self.project =
                Project::new_untitled(self.untitled_counter, self.new_width, self.new_height);
            self.viewport.reset();
            self.controller.pointer_up();
            self.canvas_texture = None;
            self.texture_key = None;
            self.status.clear();
            log_info!("New {}×{} project created", self.new_width, self.new_height);
        }
        if create || cancel {
            self.new_dialog_open = false;
        }
    }
}

impl eframe::App for SpriteFEApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(
            storage,
            eframe::APP_KEY,
            &PersistedSettings {
                ai_settings: self.ai_settings.clone(),
                export_scale: self.export_scale,
                onion_skin: self.onion_skin,
                show_pixel_grid: self.show_pixel_grid,
            },
        );
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_background();

        // Playback tick: advance by however many whole intervals elapsed
        // since the last repaint.
        let now = ctx.input(|i| i.time);
        let advances = self.project.playback.tick(now);
        if advances > 0 {
            self.project.sequence.advance(advances);
        }
        if self.project.playback.is_playing() || self.pending_tasks > 0 {
            ctx.request_repaint();
        }

        let modal_open = self.new_dialog_open;
        self.handle_scroll_zoom(ctx, modal_open);
        self.handle_shortcuts(ctx, modal_open);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar_ui(ui);
        });
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.project.display_title());
                ui.separator();
                ui.label(format!(
                    "{}×{} · frame {}/{} · zoom {:.0}%",
                    self.project.size.width,
                    self.project.size.height,
                    self.project.sequence.current_index() + 1,
                    self.project.sequence.frame_count(),
                    self.viewport.zoom * 100.0
                ));
                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(&self.status);
                }
            });
        });
        egui::TopBottomPanel::bottom("frame_strip").show(ctx, |ui| {
            self.frame_strip_ui(ui);
        });
        egui::SidePanel::right("side_panel")
            .default_width(220.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.side_panel_ui(ui);
                });
            });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.canvas_ui(ui, modal_open);
        });

        self.new_project_dialog(ctx);
    }
}
