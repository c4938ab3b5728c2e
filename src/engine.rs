/*
 * Engine Module
 *
 * MolecularBackground is the handle a host holds for one running animation.
 * It owns the molecules, the connection set, the scheduler and the debounced
 * host reactions, and exposes the lifecycle hooks:
 *
 * - init: derive parameters for the viewport, build the molecules, start
 * - handle_event: resize, pointer and theme-change notifications
 * - tick: pump debounces and, when the frame gate opens, move and relink
 * - render: paint the current state onto a Surface
 * - update_settings / reset_settings: apply and persist user settings
 * - force_color_update / debug_theme_colors: theme refresh and inspection
 * - destroy: tear everything down; every hook is a no-op afterwards
 */

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::Result;
use crate::input::{HostEvent, ListenerKind, Listeners, PointerState};
use crate::linker::{Connection, ProximityLinker};
use crate::molecule::Molecule;
use crate::params::{DerivedParameters, ParameterDeriver, Parameters, Viewport};
use crate::physics;
use crate::renderer::{self, Surface};
use crate::scheduler::{AnimationScheduler, CancelToken, Debounce, DEFAULT_TARGET_FPS};
use crate::settings::{load_settings, save_settings, Settings, SettingsChanges, SettingsPatch, SettingsStore};
use crate::store::ParticleStore;
use crate::theme::{ColorRole, ThemeColors, ThemeSource};

// Tunables that are not user settings
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub target_fps: f32,
    pub resize_debounce: Duration,
    pub theme_debounce: Duration,
    // A requested count within this distance of the live count keeps the set
    pub count_hysteresis: usize,
    pub grid_threshold: usize,
    // Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            resize_debounce: Duration::from_millis(150),
            theme_debounce: Duration::from_millis(100),
            count_hysteresis: 5,
            grid_threshold: 150,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub molecules: usize,
    pub connections: usize,
    pub ticks_run: u64,
    pub ticks_skipped: u64,
    pub using_grid: bool,
}

pub struct MolecularBackground {
    config: EngineConfig,
    settings: Settings,
    settings_store: Box<dyn SettingsStore>,
    theme_source: Box<dyn ThemeSource>,
    theme: ThemeColors,
    deriver: ParameterDeriver,
    derived: DerivedParameters,
    params: Parameters,
    viewport: Viewport,
    store: ParticleStore,
    linker: ProximityLinker,
    connections: Vec<Connection>,
    pointer: PointerState,
    scheduler: AnimationScheduler,
    listeners: Listeners,
    resize_debounce: Debounce<Viewport>,
    theme_debounce: Debounce<()>,
    pending_resize: Option<CancelToken>,
    pending_theme: Option<CancelToken>,
    rng: StdRng,
    initialized: bool,
    alive: bool,
}

impl MolecularBackground {
    // Stopped until init; persisted settings are loaded here
    pub fn new(
        config: EngineConfig,
        theme_source: Box<dyn ThemeSource>,
        settings_store: Box<dyn SettingsStore>,
    ) -> Self {
        let settings = load_settings(settings_store.as_ref());
        let viewport = Viewport::new(1, 1);
        let derived = DerivedParameters::for_viewport(viewport);
        let params = Parameters::resolve(&settings, &derived);

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            scheduler: AnimationScheduler::new(config.target_fps),
            linker: ProximityLinker::new(config.grid_threshold),
            resize_debounce: Debounce::new(config.resize_debounce),
            theme_debounce: Debounce::new(config.theme_debounce),
            pending_resize: None,
            pending_theme: None,
            config,
            settings,
            settings_store,
            theme_source,
            theme: ThemeColors::default(),
            deriver: ParameterDeriver::new(),
            derived,
            params,
            viewport,
            store: ParticleStore::new(),
            connections: Vec::new(),
            pointer: PointerState::new(params.pointer_radius),
            listeners: Listeners::new(),
            rng,
            initialized: false,
            alive: true,
        }
    }

    // Only the first call has an effect
    pub fn init(&mut self, viewport: Viewport) {
        if !self.alive || self.initialized {
            return;
        }

        self.viewport = viewport;
        let (derived, _) = self.deriver.derive(viewport);
        self.derived = derived;
        self.resolve_parameters();

        log::info!(
            "Molecules: {}, Max Distance: {:.1}, Pointer Radius: {:.1} ({}x{})",
            self.params.molecule_count,
            self.params.max_distance,
            self.params.pointer_radius,
            viewport.width,
            viewport.height
        );

        self.rebuild_molecules();
        self.refresh_theme();
        self.listeners.register_all();
        self.scheduler.start();
        self.initialized = true;
    }

    pub fn handle_event(&mut self, event: HostEvent, now: Instant) {
        if !self.alive || !self.listeners.is_registered(event.kind()) {
            return;
        }

        match event {
            HostEvent::Resized { viewport } => {
                // Wrap bounds follow the new size at once; the rest waits
                self.viewport = viewport;
                self.pending_resize = Some(self.resize_debounce.schedule(viewport, now));
            }
            HostEvent::PointerMoved { x, y } => self.pointer.move_to(x, y),
            HostEvent::PointerLeft => self.pointer.leave(),
            HostEvent::ThemeChanged => {
                self.pending_theme = Some(self.theme_debounce.schedule((), now));
            }
        }
    }

    // One frame opportunity. Returns whether a tick ran
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.alive {
            return false;
        }

        if let Some(viewport) = self.resize_debounce.poll(now) {
            self.pending_resize = None;
            self.apply_resize(viewport);
        }
        if self.theme_debounce.poll(now).is_some() {
            self.pending_theme = None;
            self.refresh_theme();
        }

        if !self.scheduler.should_tick(now) {
            return false;
        }

        physics::update_molecules(
            &mut self.store,
            &self.pointer,
            self.params.repel_force,
            self.viewport,
            &mut self.rng,
        );
        self.relink();
        true
    }

    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) -> bool {
        if !self.alive || !self.initialized {
            return false;
        }

        renderer::render(
            surface,
            self.store.molecules(),
            &self.connections,
            &self.theme,
            self.params.connection_thickness,
        );
        true
    }

    // A count change only rebuilds when it is more than the hysteresis away
    // from the live count; a speed change retunes in place
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> SettingsChanges {
        if !self.alive {
            return SettingsChanges::default();
        }

        let changes = self.settings.merge(patch);
        if !changes.any() {
            return changes;
        }
        log::debug!("Settings updated: {:?}", self.settings);

        self.persist_settings();
        self.resolve_parameters();

        if !self.initialized {
            return changes;
        }

        if changes.num_molecules {
            let live = self.store.len();
            let target = self.params.molecule_count;
            if target.abs_diff(live) > self.config.count_hysteresis {
                log::info!("Rebuilding molecules: {} -> {}", live, target);
                self.rebuild_molecules();
            }
        }
        if changes.base_velocity {
            self.store.retune(&mut self.rng, self.params.base_velocity);
        }
        if changes.max_distance || changes.connection_opacity || changes.num_molecules {
            self.relink();
        }

        changes
    }

    pub fn update_settings_json(&mut self, payload: &str) -> Result<SettingsChanges> {
        let patch = SettingsPatch::from_json(payload)?;
        Ok(self.update_settings(&patch))
    }

    pub fn reset_settings(&mut self) {
        if !self.alive {
            return;
        }

        self.settings = Settings::default();
        self.persist_settings();
        self.resolve_parameters();
        log::info!("Settings reset to defaults");

        if self.initialized {
            self.rebuild_molecules();
        }
    }

    pub fn force_color_update(&mut self) {
        if !self.alive {
            return;
        }
        self.cancel_theme_refresh();
        self.refresh_theme();
    }

    // Log what the theme source reports next to what is in use
    pub fn debug_theme_colors(&self) {
        for role in ColorRole::ALL {
            let raw = self.theme_source.lookup(role);
            log::info!("{}: {}", role.variable(), raw.as_deref().unwrap_or("<unset>"));
        }
        log::info!(
            "In use: background {}, particle {}, connection {}, glow {}",
            self.theme.background,
            self.theme.particle,
            self.theme.connection,
            self.theme.glow
        );
    }

    // Safe to call more than once
    pub fn destroy(&mut self) {
        if !self.alive {
            return;
        }

        self.scheduler.stop();
        self.listeners.remove_all();
        if let Some(token) = self.pending_resize.take() {
            self.resize_debounce.cancel(token);
        }
        self.cancel_theme_refresh();
        self.store.clear();
        self.connections.clear();
        self.linker.reset();
        self.pointer.leave();
        self.alive = false;
        log::info!("Molecular background destroyed");
    }

    fn cancel_theme_refresh(&mut self) {
        if let Some(token) = self.pending_theme.take() {
            self.theme_debounce.cancel(token);
        }
    }

    fn resolve_parameters(&mut self) {
        self.params = Parameters::resolve(&self.settings, &self.derived);
        self.pointer.radius = self.params.pointer_radius;
    }

    fn rebuild_molecules(&mut self) {
        self.store.rebuild(
            &mut self.rng,
            self.params.molecule_count,
            self.viewport,
            self.params.base_velocity,
        );
        self.relink();
    }

    fn relink(&mut self) {
        self.linker.link(
            self.store.molecules(),
            self.params.max_distance,
            self.params.connection_opacity,
            self.viewport,
            &mut self.connections,
        );
    }

    fn apply_resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let (derived, changed) = self.deriver.derive(viewport);
        if !changed {
            return;
        }

        self.derived = derived;
        self.resolve_parameters();
        self.rebuild_molecules();
        log::info!(
            "Recreated {} molecules for {}x{}",
            self.store.len(),
            viewport.width,
            viewport.height
        );
    }

    fn refresh_theme(&mut self) {
        self.theme = ThemeColors::resolve(self.theme_source.as_ref());
        log::debug!(
            "Theme colours: background {}, particle {}, connection {}, glow {}",
            self.theme.background,
            self.theme.particle,
            self.theme.connection,
            self.theme.glow
        );
    }

    fn persist_settings(&mut self) {
        if let Err(err) = save_settings(self.settings_store.as_mut(), &self.settings) {
            log::warn!("Failed to save settings: {}", err);
        }
    }

    pub fn molecules(&self) -> &[Molecule] {
        self.store.molecules()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn derived_parameters(&self) -> &DerivedParameters {
        &self.derived
    }

    pub fn theme(&self) -> &ThemeColors {
        &self.theme
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_listening(&self, kind: ListenerKind) -> bool {
        self.listeners.is_registered(kind)
    }

    pub fn has_pending_resize(&self) -> bool {
        self.resize_debounce.is_pending()
    }

    pub fn has_pending_theme_update(&self) -> bool {
        self.theme_debounce.is_pending()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            molecules: self.store.len(),
            connections: self.connections.len(),
            ticks_run: self.scheduler.ticks_run(),
            ticks_skipped: self.scheduler.ticks_skipped(),
            using_grid: self.linker.uses_grid_for(self.store.len()),
        }
    }
}

impl Drop for MolecularBackground {
    fn drop(&mut self) {
        self.destroy();
    }
}
