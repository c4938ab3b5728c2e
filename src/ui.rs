/*
 * UI Module
 *
 * This module contains the egui control panel of the host window.
 * It edits a copy of the engine settings and hands only the values that
 * changed to the engine as a partial update, the same way any other host
 * would talk to it.
 */

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use nannou_egui::{egui, Egui};

use crate::debug::DebugInfo;
use crate::engine::MolecularBackground;
use crate::input::HostEvent;
use crate::settings::{Settings, SettingsPatch};
use crate::theme::ThemeBook;

// Update the UI and return whether anything changed that needs a redraw
pub fn update_ui(
    egui: &mut Egui,
    engine: &mut MolecularBackground,
    themes: &Rc<RefCell<ThemeBook>>,
    debug_info: &DebugInfo,
    show_panel: bool,
) -> bool {
    let ctx = egui.begin_frame();
    if !show_panel {
        return false;
    }

    // Snapshot for change detection
    let before = engine.settings().clone();
    let mut edited = before.clone();
    let mut count = edited
        .num_molecules
        .unwrap_or(engine.parameters().molecule_count);
    let mut max_distance = edited
        .max_distance
        .unwrap_or(engine.parameters().max_distance);

    let theme_names: Vec<String> = themes
        .borrow()
        .names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let active_theme = themes.borrow().active_name().to_string();
    let mut selected_theme = active_theme.clone();

    let mut reset_requested = false;
    let mut force_colors = false;
    let mut dump_colors = false;

    egui::Window::new("Molecules")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            ui.collapsing("Molecules", |ui| {
                let count_label = if edited.num_molecules.is_none() {
                    "Molecules (auto)"
                } else {
                    "Molecules"
                };
                ui.add(egui::Slider::new(&mut count, Settings::num_molecules_range()).text(count_label));
                ui.add(
                    egui::Slider::new(&mut edited.base_velocity, Settings::base_velocity_range())
                        .text("Base Velocity"),
                );
                ui.add(
                    egui::Slider::new(&mut edited.mouse_repel_force, Settings::repel_force_range())
                        .text("Mouse Repel Force"),
                );
            });

            ui.collapsing("Connections", |ui| {
                let distance_label = if edited.max_distance.is_none() {
                    "Max Distance (auto)"
                } else {
                    "Max Distance"
                };
                ui.add(
                    egui::Slider::new(&mut max_distance, Settings::max_distance_range())
                        .text(distance_label),
                );
                ui.add(
                    egui::Slider::new(
                        &mut edited.connection_thickness,
                        Settings::connection_thickness_range(),
                    )
                    .text("Thickness"),
                );
                ui.add(
                    egui::Slider::new(
                        &mut edited.connection_opacity,
                        Settings::connection_opacity_range(),
                    )
                    .text("Opacity"),
                );
            });

            ui.collapsing("Theme", |ui| {
                egui::ComboBox::from_label("Theme")
                    .selected_text(selected_theme.clone())
                    .show_ui(ui, |ui| {
                        for name in &theme_names {
                            ui.selectable_value(&mut selected_theme, name.clone(), name.as_str());
                        }
                    });
                if ui.button("Force Colour Update").clicked() {
                    force_colors = true;
                }
                if ui.button("Log Theme Colours").clicked() {
                    dump_colors = true;
                }
            });

            ui.collapsing("Performance", |ui| {
                ui.label(format!("FPS: {:.1}", debug_info.fps));
                ui.label(format!(
                    "Frame time: {:.2} ms",
                    debug_info.frame_time.as_secs_f64() * 1000.0
                ));
                ui.label(format!("Molecules: {}", debug_info.stats.molecules));
                ui.label(format!("Connections: {}", debug_info.stats.connections));
                ui.label(format!(
                    "Ticks: {} run, {} skipped ({:.0}%)",
                    debug_info.stats.ticks_run,
                    debug_info.stats.ticks_skipped,
                    debug_info.tick_ratio() * 100.0
                ));
                ui.label(format!(
                    "Linking: {}",
                    if debug_info.stats.using_grid { "spatial grid" } else { "pairwise" }
                ));
            });

            ui.separator();
            if ui.button("Reset Molecules").clicked() {
                reset_requested = true;
            }
            ui.label("R reset, T next theme, C refresh colours, D log colours, H hide panel");
        });

    // Sliders only pin the auto values once they are moved
    if edited.num_molecules.is_some() || count != engine.parameters().molecule_count {
        edited.num_molecules = Some(count);
    }
    if edited.max_distance.is_some()
        || (max_distance - engine.parameters().max_distance).abs() > f32::EPSILON
    {
        edited.max_distance = Some(max_distance);
    }

    let mut changed = false;

    if reset_requested {
        engine.reset_settings();
        changed = true;
    } else {
        let patch = SettingsPatch::diff(&before, &edited);
        if !patch.is_empty() {
            engine.update_settings(&patch);
            changed = true;
        }
    }

    if selected_theme != active_theme {
        themes.borrow_mut().set_active(&selected_theme);
        engine.handle_event(HostEvent::ThemeChanged, Instant::now());
        changed = true;
    }
    if force_colors {
        engine.force_color_update();
        changed = true;
    }
    if dump_colors {
        engine.debug_theme_colors();
    }

    changed
}
