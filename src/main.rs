// GUI-subsystem binary: no console window is ever allocated by Windows.
#![windows_subsystem = "windows"]

use eframe::egui;
use spritefe::app::SpriteFEApp;
use spritefe::logger;

fn main() -> Result<(), eframe::Error> {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title("SpriteFE"),
        ..Default::default()
    };

    eframe::run_native(
        "SpriteFE",
        options,
        Box::new(|cc| Box::new(SpriteFEApp::new(cc))),
    )
}
