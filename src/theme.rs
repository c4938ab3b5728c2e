/*
 * Theme Module
 *
 * Resolves the four colour roles (background, particle, connection, glow)
 * from whatever theme context the host provides. Colours are pulled on
 * demand through the ThemeSource trait; the engine never caches a reference
 * to the host's theme.
 *
 * Unset roles take the built-in defaults. Values that are set but cannot be
 * parsed fall back to a neutral grey so drawing never fails.
 */

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{MoleculesError, Result};
use crate::settings::SettingsStore;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

// Used whenever a colour string is present but unreadable
pub const DEFAULT_COLOR: Rgba = Rgba::new(143, 145, 145, 0.8);

pub const DEFAULT_BACKGROUND: &str = "#1A1A1A";
pub const DEFAULT_PARTICLE: &str = "rgb(255, 255, 255)";
pub const DEFAULT_CONNECTION: &str = "rgb(255, 255, 255)";
pub const DEFAULT_GLOW: &str = "rgb(255, 255, 255)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorRole {
    Background,
    Particle,
    Connection,
    Glow,
}

impl ColorRole {
    pub const ALL: [ColorRole; 4] = [
        ColorRole::Background,
        ColorRole::Particle,
        ColorRole::Connection,
        ColorRole::Glow,
    ];

    // Theme variable the role is read from
    pub fn variable(&self) -> &'static str {
        match self {
            ColorRole::Background => "--molecule-bg",
            ColorRole::Particle => "--molecule-color",
            ColorRole::Connection => "--molecule-connection",
            ColorRole::Glow => "--molecule-glow",
        }
    }

    pub fn default_value(&self) -> &'static str {
        match self {
            ColorRole::Background => DEFAULT_BACKGROUND,
            ColorRole::Particle => DEFAULT_PARTICLE,
            ColorRole::Connection => DEFAULT_CONNECTION,
            ColorRole::Glow => DEFAULT_GLOW,
        }
    }
}

// Parses `rgb(r, g, b)` and `rgba(r, g, b, a)`. Channels are clamped to
// 0..=255 and alpha to 0..=1; `rgb()` gets an alpha of 1
pub fn parse_color(value: &str) -> Result<Rgba> {
    let fail = || MoleculesError::ColorParse(value.to_string());
    let trimmed = value.trim().to_ascii_lowercase();

    let inner = trimmed
        .strip_prefix("rgba(")
        .or_else(|| trimmed.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(fail)?;

    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(fail());
    }

    let mut channels = [0u8; 3];
    for (channel, part) in channels.iter_mut().zip(&parts) {
        let v: f32 = part.parse().map_err(|_| fail())?;
        if !v.is_finite() {
            return Err(fail());
        }
        *channel = v.round().clamp(0.0, 255.0) as u8;
    }

    let alpha = match parts.get(3) {
        Some(part) => {
            let a: f32 = part.parse().map_err(|_| fail())?;
            if !a.is_finite() {
                return Err(fail());
            }
            a.clamp(0.0, 1.0)
        }
        None => 1.0,
    };

    Ok(Rgba::new(channels[0], channels[1], channels[2], alpha))
}

// Parses `#rgb` and `#rrggbb`
pub fn parse_hex(value: &str) -> Result<Rgba> {
    let fail = || MoleculesError::ColorParse(value.to_string());
    let digits = value.trim().strip_prefix('#').ok_or_else(fail)?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(fail());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| fail());
    match digits.len() {
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in digits.chars().enumerate() {
                let v = channel(&c.to_string())?;
                out[i] = v * 17;
            }
            Ok(Rgba::rgb(out[0], out[1], out[2]))
        }
        6 => Ok(Rgba::rgb(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        _ => Err(fail()),
    }
}

fn color_or_fallback(value: &str) -> Rgba {
    match parse_color(value) {
        Ok(color) => color,
        Err(err) => {
            log::debug!("{}, using fallback colour", err);
            DEFAULT_COLOR
        }
    }
}

// A background colour: parsed when it is an `rgb()` string, otherwise kept
// as the raw value for the drawing surface to interpret
#[derive(Debug, Clone, PartialEq)]
pub enum ColorValue {
    Rgba(Rgba),
    Raw(String),
}

impl ColorValue {
    pub fn from_theme_value(value: &str) -> Self {
        match parse_color(value) {
            Ok(color) => ColorValue::Rgba(color),
            Err(_) => ColorValue::Raw(value.trim().to_string()),
        }
    }

    // Concrete colour if one can be worked out (rgb strings and hex)
    pub fn to_rgba(&self) -> Option<Rgba> {
        match self {
            ColorValue::Rgba(color) => Some(*color),
            ColorValue::Raw(raw) => parse_hex(raw).ok(),
        }
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorValue::Rgba(color) => write!(f, "{}", color),
            ColorValue::Raw(raw) => write!(f, "{}", raw),
        }
    }
}

// Host-provided theme context
pub trait ThemeSource {
    // The raw value for a role, or `None` when the theme leaves it unset
    fn lookup(&self, role: ColorRole) -> Option<String>;
}

impl<T: ThemeSource> ThemeSource for Rc<RefCell<T>> {
    fn lookup(&self, role: ColorRole) -> Option<String> {
        self.borrow().lookup(role)
    }
}

// Theme variables by name, e.g. "--molecule-bg"
impl ThemeSource for HashMap<String, String> {
    fn lookup(&self, role: ColorRole) -> Option<String> {
        self.get(role.variable()).cloned()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeColors {
    pub background: ColorValue,
    pub particle: Rgba,
    pub connection: Rgba,
    pub glow: Rgba,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            background: ColorValue::from_theme_value(DEFAULT_BACKGROUND),
            particle: color_or_fallback(DEFAULT_PARTICLE),
            connection: color_or_fallback(DEFAULT_CONNECTION),
            glow: color_or_fallback(DEFAULT_GLOW),
        }
    }
}

impl ThemeColors {
    pub fn resolve(source: &dyn ThemeSource) -> Self {
        let value = |role: ColorRole| {
            source
                .lookup(role)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| role.default_value().to_string())
        };

        Self {
            background: ColorValue::from_theme_value(&value(ColorRole::Background)),
            particle: color_or_fallback(&value(ColorRole::Particle)),
            connection: color_or_fallback(&value(ColorRole::Connection)),
            glow: color_or_fallback(&value(ColorRole::Glow)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub background: String,
    pub particle: String,
    pub connection: String,
    pub glow: String,
}

impl Theme {
    pub fn new(name: &str, background: &str, particle: &str, connection: &str, glow: &str) -> Self {
        Self {
            name: name.to_string(),
            background: background.to_string(),
            particle: particle.to_string(),
            connection: connection.to_string(),
            glow: glow.to_string(),
        }
    }
}

// The host's named themes with one active at a time
#[derive(Debug, Clone)]
pub struct ThemeBook {
    themes: Vec<Theme>,
    active: usize,
}

impl Default for ThemeBook {
    fn default() -> Self {
        Self::with_themes(vec![
            Theme::new("default", DEFAULT_BACKGROUND, DEFAULT_PARTICLE, DEFAULT_CONNECTION, DEFAULT_GLOW),
            Theme::new(
                "light",
                "#F2F2EE",
                "rgb(40, 40, 40)",
                "rgb(70, 70, 70)",
                "rgb(0, 0, 0)",
            ),
            Theme::new(
                "ocean",
                "#0B1D2E",
                "rgb(120, 200, 255)",
                "rgb(80, 160, 220)",
                "rgb(170, 230, 255)",
            ),
            Theme::new(
                "forest",
                "#0F1A12",
                "rgb(150, 220, 150)",
                "rgb(100, 180, 110)",
                "rgb(200, 255, 200)",
            ),
            Theme::new(
                "sunset",
                "#2A1420",
                "rgb(255, 170, 120)",
                "rgb(255, 120, 140)",
                "rgb(255, 220, 180)",
            ),
        ])
    }
}

impl ThemeBook {
    pub fn with_themes(themes: Vec<Theme>) -> Self {
        Self { themes, active: 0 }
    }

    pub fn names(&self) -> Vec<&str> {
        self.themes.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn active(&self) -> Option<&Theme> {
        self.themes.get(self.active)
    }

    pub fn active_name(&self) -> &str {
        self.active().map_or("", |t| t.name.as_str())
    }

    // Returns false when no theme has that name
    pub fn set_active(&mut self, name: &str) -> bool {
        match self.themes.iter().position(|t| t.name == name) {
            Some(index) => {
                self.active = index;
                true
            }
            None => false,
        }
    }

    // Advance to the next theme and return its name
    pub fn cycle(&mut self) -> String {
        if !self.themes.is_empty() {
            self.active = (self.active + 1) % self.themes.len();
        }
        self.active_name().to_string()
    }

    // Restore the theme picked in an earlier session. A missing, corrupt or
    // unknown selection keeps the current theme
    pub fn load_selection(&mut self, store: &dyn SettingsStore) -> bool {
        let payload = match store.load() {
            Ok(Some(payload)) => payload,
            Ok(None) => return false,
            Err(e) => {
                log::warn!("Could not read the saved theme: {}", e);
                return false;
            }
        };

        match serde_json::from_str::<ThemeSelection>(&payload) {
            Ok(selection) => {
                if self.set_active(&selection.theme) {
                    true
                } else {
                    log::warn!("Saved theme {:?} no longer exists", selection.theme);
                    false
                }
            }
            Err(e) => {
                log::warn!("Discarding saved theme: {}", e);
                false
            }
        }
    }

    pub fn save_selection(&self, store: &mut dyn SettingsStore) -> Result<()> {
        let selection = ThemeSelection {
            theme: self.active_name().to_string(),
        };
        store.save(&serde_json::to_string(&selection)?)
    }
}

// Persisted as {"theme": "<name>"}
#[derive(Debug, Serialize, Deserialize)]
struct ThemeSelection {
    theme: String,
}

impl ThemeSource for ThemeBook {
    fn lookup(&self, role: ColorRole) -> Option<String> {
        let theme = self.active()?;
        let value = match role {
            ColorRole::Background => &theme.background,
            ColorRole::Particle => &theme.particle,
            ColorRole::Connection => &theme.connection,
            ColorRole::Glow => &theme.glow,
        };
        Some(value.clone())
    }
}
