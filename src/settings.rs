/*
 * Settings Module
 *
 * User-tunable engine settings, the partial updates the host sends in, and
 * the stores that persist them between sessions. The persisted payload is a
 * flat JSON object with camelCase keys:
 *
 *   numMolecules, maxDistance, mouseRepelForce,
 *   baseVelocity, connectionThickness, connectionOpacity
 *
 * A payload that fails to parse is discarded wholesale in favour of the
 * defaults; individual values are clamped into their accepted ranges.
 */

use std::cell::RefCell;
use std::fs;
use std::io;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

pub const DEFAULT_REPEL_FORCE: f32 = 150.0;
pub const DEFAULT_BASE_VELOCITY: f32 = 1.2;
pub const DEFAULT_CONNECTION_THICKNESS: f32 = 1.0;
pub const DEFAULT_CONNECTION_OPACITY: f32 = 0.5;

const SETTINGS_DIR: &str = "molecules";
const SETTINGS_FILE: &str = "settings.json";
const THEME_FILE: &str = "theme.json";

// Engine settings. `num_molecules` and `max_distance` are `None` while they
// follow the viewport-derived defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "count_from_number")]
    pub num_molecules: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f32>,
    pub mouse_repel_force: f32,
    pub base_velocity: f32,
    pub connection_thickness: f32,
    pub connection_opacity: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            num_molecules: None,
            max_distance: None,
            mouse_repel_force: DEFAULT_REPEL_FORCE,
            base_velocity: DEFAULT_BASE_VELOCITY,
            connection_thickness: DEFAULT_CONNECTION_THICKNESS,
            connection_opacity: DEFAULT_CONNECTION_OPACITY,
        }
    }
}

// Which settings actually changed during a merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsChanges {
    pub num_molecules: bool,
    pub max_distance: bool,
    pub mouse_repel_force: bool,
    pub base_velocity: bool,
    pub connection_thickness: bool,
    pub connection_opacity: bool,
}

impl SettingsChanges {
    pub fn any(&self) -> bool {
        self.num_molecules
            || self.max_distance
            || self.mouse_repel_force
            || self.base_velocity
            || self.connection_thickness
            || self.connection_opacity
    }
}

impl Settings {
    // Accepted ranges, also used for the UI sliders
    pub fn num_molecules_range() -> RangeInclusive<usize> {
        10..=500
    }

    pub fn max_distance_range() -> RangeInclusive<f32> {
        50.0..=300.0
    }

    pub fn repel_force_range() -> RangeInclusive<f32> {
        0.0..=500.0
    }

    pub fn base_velocity_range() -> RangeInclusive<f32> {
        0.1..=5.0
    }

    pub fn connection_thickness_range() -> RangeInclusive<f32> {
        0.1..=5.0
    }

    pub fn connection_opacity_range() -> RangeInclusive<f32> {
        0.0..=1.0
    }

    pub fn from_json(payload: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(payload)?;
        Ok(settings.sanitized())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    // Clamps every value into its accepted range. Non-finite numbers are
    // replaced by the default (or by "auto" for the optional values)
    pub fn sanitized(self) -> Self {
        let defaults = Settings::default();
        Self {
            num_molecules: self.num_molecules.map(|n| {
                let range = Self::num_molecules_range();
                n.clamp(*range.start(), *range.end())
            }),
            max_distance: self
                .max_distance
                .filter(|d| d.is_finite())
                .map(|d| clamp_into(d, Self::max_distance_range())),
            mouse_repel_force: sanitize(
                self.mouse_repel_force,
                Self::repel_force_range(),
                defaults.mouse_repel_force,
            ),
            base_velocity: sanitize(
                self.base_velocity,
                Self::base_velocity_range(),
                defaults.base_velocity,
            ),
            connection_thickness: sanitize(
                self.connection_thickness,
                Self::connection_thickness_range(),
                defaults.connection_thickness,
            ),
            connection_opacity: sanitize(
                self.connection_opacity,
                Self::connection_opacity_range(),
                defaults.connection_opacity,
            ),
        }
    }

    // Applies the keys present in `patch` and reports which values changed
    pub fn merge(&mut self, patch: &SettingsPatch) -> SettingsChanges {
        let before = self.clone();

        if let Some(n) = patch.num_molecules {
            self.num_molecules = Some(n);
        }
        if let Some(d) = patch.max_distance {
            self.max_distance = Some(d);
        }
        if let Some(f) = patch.mouse_repel_force {
            self.mouse_repel_force = f;
        }
        if let Some(v) = patch.base_velocity {
            self.base_velocity = v;
        }
        if let Some(t) = patch.connection_thickness {
            self.connection_thickness = t;
        }
        if let Some(o) = patch.connection_opacity {
            self.connection_opacity = o;
        }

        *self = self.clone().sanitized();

        SettingsChanges {
            num_molecules: self.num_molecules != before.num_molecules,
            max_distance: self.max_distance != before.max_distance,
            mouse_repel_force: self.mouse_repel_force != before.mouse_repel_force,
            base_velocity: self.base_velocity != before.base_velocity,
            connection_thickness: self.connection_thickness != before.connection_thickness,
            connection_opacity: self.connection_opacity != before.connection_opacity,
        }
    }
}

// A partial settings update. Absent keys leave the current value alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "count_from_number")]
    pub num_molecules: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mouse_repel_force: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_velocity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_thickness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_opacity: Option<f32>,
}

impl SettingsPatch {
    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }

    // Build a patch holding only the values that differ between two snapshots
    pub fn diff(before: &Settings, after: &Settings) -> Self {
        fn changed<T: PartialEq + Copy>(a: T, b: T) -> Option<T> {
            if a != b {
                Some(b)
            } else {
                None
            }
        }

        Self {
            num_molecules: if before.num_molecules != after.num_molecules {
                after.num_molecules
            } else {
                None
            },
            max_distance: if before.max_distance != after.max_distance {
                after.max_distance
            } else {
                None
            },
            mouse_repel_force: changed(before.mouse_repel_force, after.mouse_repel_force),
            base_velocity: changed(before.base_velocity, after.base_velocity),
            connection_thickness: changed(before.connection_thickness, after.connection_thickness),
            connection_opacity: changed(before.connection_opacity, after.connection_opacity),
        }
    }
}

// Counts may arrive as floats from slider-driven hosts
fn count_from_number<'de, D>(deserializer: D) -> std::result::Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as usize))
}

fn clamp_into(value: f32, range: RangeInclusive<f32>) -> f32 {
    value.clamp(*range.start(), *range.end())
}

fn sanitize(value: f32, range: RangeInclusive<f32>, fallback: f32) -> f32 {
    if value.is_finite() {
        clamp_into(value, range)
    } else {
        fallback
    }
}

// Where settings are persisted between sessions
pub trait SettingsStore {
    // Returns the stored payload, or `None` when nothing was saved yet
    fn load(&self) -> Result<Option<String>>;
    fn save(&mut self, payload: &str) -> Result<()>;
}

// Settings kept in a JSON file on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    // <config dir>/molecules/settings.json, or the working directory when the
    // platform has no config dir
    pub fn default_location() -> Self {
        Self::in_config_dir(SETTINGS_FILE)
    }

    // The host's theme picker keeps its selection next to the settings
    pub fn theme_location() -> Self {
        Self::in_config_dir(THEME_FILE)
    }

    fn in_config_dir(file: &str) -> Self {
        let path = dirs::config_dir()
            .map(|dir| dir.join(SETTINGS_DIR).join(file))
            .unwrap_or_else(|| PathBuf::from(file));
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, payload: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

// In-memory store. Clones share the same slot, so a host can keep a handle
// to inspect what the engine saved
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(payload.into()))),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot.borrow().clone())
    }

    fn save(&mut self, payload: &str) -> Result<()> {
        *self.slot.borrow_mut() = Some(payload.to_owned());
        Ok(())
    }
}

// Loads settings, falling back to the defaults when nothing is stored, the
// store fails, or the payload is corrupt
pub fn load_settings(store: &dyn SettingsStore) -> Settings {
    match store.load() {
        Ok(Some(payload)) => match Settings::from_json(&payload) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Discarding stored settings: {}", e);
                Settings::default()
            }
        },
        Ok(None) => Settings::default(),
        Err(e) => {
            log::warn!("Could not read stored settings: {}", e);
            Settings::default()
        }
    }
}

pub fn save_settings(store: &mut dyn SettingsStore, settings: &Settings) -> Result<()> {
    let payload = settings.to_json()?;
    store.save(&payload)
}
