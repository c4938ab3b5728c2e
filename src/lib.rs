/*
 * Molecules - Module Definitions
 *
 * This file defines the module structure for the molecular background.
 * The engine modules are independent of the window; app, ui and input make
 * up the nannou host around them.
 */

// Re-export key components for easier access
pub use engine::{EngineConfig, EngineStats, MolecularBackground};
pub use error::{MoleculesError, Result};
pub use input::{HostEvent, ListenerKind, PointerState};
pub use linker::{Connection, ProximityLinker};
pub use molecule::Molecule;
pub use params::{DerivedParameters, ParameterDeriver, Parameters, Viewport};
pub use renderer::{RecordingSurface, Surface};
pub use scheduler::{AnimationScheduler, CancelToken, Debounce};
pub use settings::{JsonFileStore, MemoryStore, Settings, SettingsPatch, SettingsStore};
pub use store::ParticleStore;
pub use theme::{ColorRole, ColorValue, Rgba, ThemeBook, ThemeColors, ThemeSource};

// Define modules
pub mod app;
pub mod debug;
pub mod engine;
pub mod error;
pub mod input;
pub mod linker;
pub mod molecule;
pub mod params;
pub mod physics;
pub mod renderer;
pub mod scheduler;
pub mod settings;
pub mod spatial_grid;
pub mod store;
pub mod theme;
pub mod ui;
