/*
 * Application Module
 *
 * This module defines the nannou host for the molecular background.
 * It owns the window, the egui panel and the theme book, forwards window
 * events to the engine and paints the engine's frame through the nannou
 * drawing surface.
 *
 * Redraws only happen when a tick ran or the panel changed something.
 */

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use nannou::prelude::*;
use nannou_egui::Egui;

use crate::debug::DebugInfo;
use crate::engine::{EngineConfig, MolecularBackground};
use crate::input::{key_pressed, mouse_exited, mouse_moved, raw_window_event, resized};
use crate::params::Viewport;
use crate::renderer::NannouSurface;
use crate::settings::JsonFileStore;
use crate::theme::ThemeBook;
use crate::ui;

// Window size when the primary monitor cannot be queried
const FALLBACK_WINDOW_SIZE: (u32, u32) = (1280, 800);

// Main model for the application
pub struct Model {
    pub engine: MolecularBackground,
    pub egui: Egui,
    pub themes: Rc<RefCell<ThemeBook>>,
    pub theme_store: JsonFileStore,
    pub saved_theme: String,
    pub debug_info: DebugInfo,
    pub render_needed: bool,
    pub show_panel: bool,
}

// Initialize the model
pub fn model(app: &App) -> Model {
    // 80% of the primary monitor
    let (window_width, window_height) = match app.primary_monitor() {
        Some(monitor) => {
            let size = monitor.size();
            (
                (size.width as f32 * 0.8) as u32,
                (size.height as f32 * 0.8) as u32,
            )
        }
        None => {
            log::warn!(
                "No primary monitor found, using a {}x{} window",
                FALLBACK_WINDOW_SIZE.0,
                FALLBACK_WINDOW_SIZE.1
            );
            FALLBACK_WINDOW_SIZE
        }
    };

    let window_id = app
        .new_window()
        .title("Molecules")
        .size(window_width.max(1), window_height.max(1))
        .view(view)
        .mouse_moved(mouse_moved)
        .mouse_exited(mouse_exited)
        .resized(resized)
        .key_pressed(key_pressed)
        .raw_event(raw_window_event)
        .build()
        .unwrap_or_else(|err| {
            log::error!("Failed to create the window: {:?}", err);
            panic!("failed to create the window: {:?}", err)
        });

    let window = app.window(window_id).expect("Window should exist");

    // Create the UI
    let egui = Egui::from_window(&window);
    let rect = window.rect();
    drop(window);

    let theme_store = JsonFileStore::theme_location();
    let mut book = ThemeBook::default();
    if book.load_selection(&theme_store) {
        log::info!("Restored theme {}", book.active_name());
    }
    let saved_theme = book.active_name().to_string();
    let themes = Rc::new(RefCell::new(book));

    let settings_store = JsonFileStore::default_location();
    log::info!("Settings file: {}", settings_store.path().display());

    let mut engine = MolecularBackground::new(
        EngineConfig::default(),
        Box::new(themes.clone()),
        Box::new(settings_store),
    );
    engine.init(Viewport::from_size(rect.w(), rect.h()));

    Model {
        engine,
        egui,
        themes,
        theme_store,
        saved_theme,
        debug_info: DebugInfo::default(),
        render_needed: true,
        show_panel: true,
    }
}

// Update the model
pub fn update(app: &App, model: &mut Model, update: Update) {
    model.egui.set_elapsed_time(update.since_start);

    // Set by input handlers since the last update
    let input_dirty = std::mem::take(&mut model.render_needed);

    let ui_changed = ui::update_ui(
        &mut model.egui,
        &mut model.engine,
        &model.themes,
        &model.debug_info,
        model.show_panel,
    );

    // The picker or the T shortcut may have switched themes
    let active = model.themes.borrow().active_name().to_string();
    if active != model.saved_theme {
        if let Err(err) = model.themes.borrow().save_selection(&mut model.theme_store) {
            log::warn!("Failed to save the theme selection: {}", err);
        }
        model.saved_theme = active;
    }

    let ticked = model.engine.tick(Instant::now());
    model
        .debug_info
        .record_frame(app.fps(), update.since_last, model.engine.stats());

    model.render_needed = input_dirty || ticked || ui_changed;
}

// Render the model
pub fn view(app: &App, model: &Model, frame: Frame) {
    if model.render_needed {
        let draw = app.draw();
        let mut surface = NannouSurface::new(&draw, app.window_rect());
        if model.engine.render(&mut surface) {
            if let Err(err) = draw.to_frame(app, &frame) {
                log::error!("Failed to draw frame: {:?}", err);
            }
        }
    }

    if let Err(err) = model.egui.draw_to_frame(&frame) {
        log::error!("Failed to draw the control panel: {:?}", err);
    }
}

// Called once when the app closes
pub fn exit(_app: &App, mut model: Model) {
    model.engine.destroy();
}
