//! SpriteFE core library: pixel grid, drawing geometry, frame/animation
//! model, viewport transform, drawing controller, render pipeline and the
//! export/import/AI collaborators.  The GUI binary in `main.rs` is a thin
//! eframe wrapper over [`app::SpriteFEApp`].

#![allow(clippy::too_many_arguments)]

pub mod logger;

pub mod ai;
pub mod app;
pub mod frames;
pub mod geometry;
pub mod grid;
pub mod io;
pub mod project;
pub mod render;
pub mod tools;
pub mod viewport;
