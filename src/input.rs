/*
 * Input Module
 *
 * This module handles the host events the molecular background listens to.
 * It defines the pointer state, the event type forwarded into the engine and
 * the listener registry that is torn down on destroy.
 *
 * Features:
 * - Pointer tracking in screen space with an off-screen sentinel
 * - Resize, pointer-move, pointer-leave and theme-change listeners
 * - nannou window callbacks converting into engine events
 * - Keyboard shortcuts for reset, theme cycling and colour refresh
 */

use std::cell::RefCell;
use std::time::Instant;

use nannou::prelude::*;

use crate::app::Model;
use crate::engine::MolecularBackground;
use crate::params::Viewport;
use crate::theme::ThemeBook;

// Where the pointer "is" while it is outside the window
pub const POINTER_SENTINEL: f32 = -1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl PointerState {
    pub fn new(radius: f32) -> Self {
        Self {
            x: POINTER_SENTINEL,
            y: POINTER_SENTINEL,
            radius,
        }
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    pub fn leave(&mut self) {
        self.x = POINTER_SENTINEL;
        self.y = POINTER_SENTINEL;
    }

    pub fn is_present(&self) -> bool {
        self.x != POINTER_SENTINEL || self.y != POINTER_SENTINEL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Resize,
    PointerMove,
    PointerLeave,
    ThemeChange,
}

impl ListenerKind {
    pub const ALL: [ListenerKind; 4] = [
        ListenerKind::Resize,
        ListenerKind::PointerMove,
        ListenerKind::PointerLeave,
        ListenerKind::ThemeChange,
    ];
}

// Events the host forwards into the engine, in screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    Resized { viewport: Viewport },
    PointerMoved { x: f32, y: f32 },
    PointerLeft,
    ThemeChanged,
}

impl HostEvent {
    pub fn kind(&self) -> ListenerKind {
        match self {
            HostEvent::Resized { .. } => ListenerKind::Resize,
            HostEvent::PointerMoved { .. } => ListenerKind::PointerMove,
            HostEvent::PointerLeft => ListenerKind::PointerLeave,
            HostEvent::ThemeChanged => ListenerKind::ThemeChange,
        }
    }
}

// Registered listeners; events of an unregistered kind are dropped
#[derive(Debug, Default, Clone)]
pub struct Listeners {
    active: Vec<ListenerKind>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: ListenerKind) {
        if !self.active.contains(&kind) {
            self.active.push(kind);
        }
    }

    pub fn register_all(&mut self) {
        for kind in ListenerKind::ALL {
            self.register(kind);
        }
    }

    pub fn remove_all(&mut self) {
        self.active.clear();
    }

    pub fn is_registered(&self, kind: ListenerKind) -> bool {
        self.active.contains(&kind)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

// nannou's window space is centred with y up; the engine works top-left, y down
pub fn to_screen_space(window: Rect, pos: Point2) -> (f32, f32) {
    (pos.x - window.left(), window.top() - pos.y)
}

// Mouse moved event handler
pub fn mouse_moved(app: &App, model: &mut Model, pos: Point2) {
    let (x, y) = to_screen_space(app.window_rect(), pos);
    model
        .engine
        .handle_event(HostEvent::PointerMoved { x, y }, Instant::now());
}

// Cursor left the window
pub fn mouse_exited(_app: &App, model: &mut Model) {
    model.engine.handle_event(HostEvent::PointerLeft, Instant::now());
}

// Window resized; the engine debounces the rebuild
pub fn resized(_app: &App, model: &mut Model, size: Vec2) {
    let viewport = Viewport::from_size(size.x, size.y);
    model
        .engine
        .handle_event(HostEvent::Resized { viewport }, Instant::now());
    model.render_needed = true;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Reset,
    ForceColors,
    LogColors,
    NextTheme,
    TogglePanel,
}

impl Shortcut {
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::R => Some(Shortcut::Reset),
            Key::C => Some(Shortcut::ForceColors),
            Key::D => Some(Shortcut::LogColors),
            Key::T => Some(Shortcut::NextTheme),
            Key::H => Some(Shortcut::TogglePanel),
            _ => None,
        }
    }
}

pub fn run_shortcut(
    shortcut: Shortcut,
    engine: &mut MolecularBackground,
    themes: &RefCell<ThemeBook>,
    show_panel: &mut bool,
    now: Instant,
) {
    match shortcut {
        Shortcut::Reset => engine.reset_settings(),
        Shortcut::ForceColors => engine.force_color_update(),
        Shortcut::LogColors => engine.debug_theme_colors(),
        Shortcut::NextTheme => {
            let name = themes.borrow_mut().cycle();
            log::info!("Switched theme to {}", name);
            engine.handle_event(HostEvent::ThemeChanged, now);
        }
        Shortcut::TogglePanel => *show_panel = !*show_panel,
    }
}

// Keyboard shortcuts
pub fn key_pressed(_app: &App, model: &mut Model, key: Key) {
    // Typing into a panel field must not trigger shortcuts
    if model.egui.ctx().wants_keyboard_input() {
        return;
    }

    let shortcut = match Shortcut::from_key(key) {
        Some(shortcut) => shortcut,
        None => return,
    };
    run_shortcut(
        shortcut,
        &mut model.engine,
        &model.themes,
        &mut model.show_panel,
        Instant::now(),
    );
    model.render_needed = true;
}

// Handle raw window events for egui
pub fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    // Pass events to egui
    model.egui.handle_raw_event(event);

    // Force re-render when UI is interacted with
    if let nannou::winit::event::WindowEvent::MouseInput { .. } = event {
        model.render_needed = true;
    }
}
