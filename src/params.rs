/*
 * Parameters Module
 *
 * This module derives density-adaptive defaults (molecule count, connection
 * distance, pointer radius) from the viewport size, and resolves the
 * effective per-tick parameters from those defaults plus the user settings.
 *
 * The derivation keeps the apparent dot density roughly constant across
 * aspect ratios and resolutions instead of scaling purely by area.
 */

use crate::settings::Settings;

// Bounds for the derived values
pub const MIN_DERIVED_MOLECULES: usize = 30;
pub const MAX_DERIVED_MOLECULES: usize = 300;
pub const MIN_DERIVED_DISTANCE: f32 = 80.0;
pub const MAX_DERIVED_DISTANCE: f32 = 200.0;
pub const MIN_POINTER_RADIUS: f32 = 50.0;
pub const MAX_POINTER_RADIUS: f32 = 120.0;

// Reference screen used by the density heuristics
const REFERENCE_WIDTH: f64 = 1920.0;
const REFERENCE_HEIGHT: f64 = 1080.0;
const REFERENCE_DIMENSION: f64 = 1500.0;
const MOLECULES_PER_10K_PIXELS: f64 = 20.0;
const BASE_DISTANCE: f64 = 120.0;
const BASE_POINTER_RADIUS: f64 = 80.0;

// Size of the drawing surface in pixels. Both dimensions are at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    // Build from a floating point window size (as reported by the window system)
    pub fn from_size(width: f32, height: f32) -> Self {
        let to_px = |v: f32| {
            if v.is_finite() && v >= 1.0 {
                v.round().min(u32::MAX as f32) as u32
            } else {
                1
            }
        };
        Self::new(to_px(width), to_px(height))
    }

    pub fn width_f32(&self) -> f32 {
        self.width as f32
    }

    pub fn height_f32(&self) -> f32 {
        self.height as f32
    }

    fn average_dimension(&self) -> f64 {
        (self.width as f64 + self.height as f64) / 2.0
    }
}

// Values derived from the viewport alone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedParameters {
    pub molecule_count: usize,
    pub max_distance: f32,
    pub pointer_radius: f32,
}

impl DerivedParameters {
    pub fn for_viewport(viewport: Viewport) -> Self {
        Self {
            molecule_count: molecule_count_for(viewport),
            max_distance: max_distance_for(viewport),
            pointer_radius: pointer_radius_for(viewport),
        }
    }
}

// Molecule count: area based, corrected by how far the screen is from 1920x1080
pub fn molecule_count_for(viewport: Viewport) -> usize {
    let width = viewport.width as f64;
    let height = viewport.height as f64;
    let area = width * height;

    let resolution_factor =
        ((width / REFERENCE_WIDTH).sqrt() + (height / REFERENCE_HEIGHT).sqrt()) / 2.0;
    let count = (area / 10_000.0 * MOLECULES_PER_10K_PIXELS * resolution_factor).floor();

    (count as usize).clamp(MIN_DERIVED_MOLECULES, MAX_DERIVED_MOLECULES)
}

pub fn max_distance_for(viewport: Viewport) -> f32 {
    let scale = (viewport.average_dimension() / REFERENCE_DIMENSION).sqrt();
    ((BASE_DISTANCE * scale) as f32).clamp(MIN_DERIVED_DISTANCE, MAX_DERIVED_DISTANCE)
}

pub fn pointer_radius_for(viewport: Viewport) -> f32 {
    let scale = viewport.average_dimension() / REFERENCE_DIMENSION;
    ((BASE_POINTER_RADIUS * scale) as f32).clamp(MIN_POINTER_RADIUS, MAX_POINTER_RADIUS)
}

// Remembers the last viewport it derived for, so callers can tell whether a
// settled resize actually changed anything.
#[derive(Debug, Default)]
pub struct ParameterDeriver {
    last_viewport: Option<Viewport>,
    current: Option<DerivedParameters>,
}

impl ParameterDeriver {
    pub fn new() -> Self {
        Self::default()
    }

    // Derives parameters for `viewport`. The flag is `true` when the viewport
    // differs from the one seen on the previous call
    pub fn derive(&mut self, viewport: Viewport) -> (DerivedParameters, bool) {
        if self.last_viewport == Some(viewport) {
            if let Some(current) = self.current {
                return (current, false);
            }
        }

        let derived = DerivedParameters::for_viewport(viewport);
        self.last_viewport = Some(viewport);
        self.current = Some(derived);
        (derived, true)
    }

    pub fn last_viewport(&self) -> Option<Viewport> {
        self.last_viewport
    }
}

// Effective values used by one animation tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub molecule_count: usize,
    pub max_distance: f32,
    pub pointer_radius: f32,
    pub repel_force: f32,
    pub base_velocity: f32,
    pub connection_thickness: f32,
    pub connection_opacity: f32,
}

impl Parameters {
    // User settings win; unset count/distance follow the viewport
    pub fn resolve(settings: &Settings, derived: &DerivedParameters) -> Self {
        Self {
            molecule_count: settings.num_molecules.unwrap_or(derived.molecule_count),
            max_distance: settings.max_distance.unwrap_or(derived.max_distance),
            pointer_radius: derived.pointer_radius,
            repel_force: settings.mouse_repel_force,
            base_velocity: settings.base_velocity,
            connection_thickness: settings.connection_thickness,
            connection_opacity: settings.connection_opacity,
        }
    }
}
