/*
 * Particle Store Module
 *
 * Owns the live molecules. The set is only ever regenerated as a whole
 * (rebuild) or retuned in place when the baseline speed changes; there is no
 * incremental add/remove.
 */

use rand::Rng;

use crate::molecule::{random_velocity, Molecule};
use crate::params::Viewport;

#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    molecules: Vec<Molecule>,
    baseline_speed: f32,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Wrap an existing set, e.g. a hand-placed scene
    pub fn from_molecules(molecules: Vec<Molecule>, baseline_speed: f32) -> Self {
        Self {
            molecules,
            baseline_speed,
        }
    }

    // Discards every molecule and generates `count` new ones scattered over
    // the viewport with velocities drawn from `baseline_speed`
    pub fn rebuild<R: Rng>(&mut self, rng: &mut R, count: usize, viewport: Viewport, baseline_speed: f32) {
        self.molecules.clear();
        self.molecules.reserve(count);
        for _ in 0..count {
            self.molecules.push(Molecule::random(rng, viewport, baseline_speed));
        }
        self.baseline_speed = baseline_speed;
    }

    // Baselines scale by new / old; a zero old speed draws fresh ones
    pub fn retune<R: Rng>(&mut self, rng: &mut R, new_speed: f32) {
        let old_speed = self.baseline_speed;

        for molecule in &mut self.molecules {
            molecule.base_velocity = if old_speed > 0.0 {
                molecule.base_velocity * (new_speed / old_speed)
            } else {
                random_velocity(rng, new_speed)
            };

            let current_speed = molecule.velocity.length();
            if current_speed > 0.0 {
                let target_speed = molecule.base_velocity.length();
                molecule.velocity *= target_speed / current_speed;
            } else {
                molecule.velocity = molecule.base_velocity;
            }
        }

        self.baseline_speed = new_speed;
    }

    pub fn clear(&mut self) {
        self.molecules.clear();
    }

    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    pub fn molecules_mut(&mut self) -> &mut [Molecule] {
        &mut self.molecules
    }

    pub fn len(&self) -> usize {
        self.molecules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.molecules.is_empty()
    }

    pub fn baseline_speed(&self) -> f32 {
        self.baseline_speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nannou::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn rebuild_replaces_the_whole_set() {
        let mut rng = seeded();
        let mut store = ParticleStore::new();
        store.rebuild(&mut rng, 50, Viewport::new(640, 480), 1.2);
        assert_eq!(store.len(), 50);
        let first = store.molecules()[0].clone();

        store.rebuild(&mut rng, 20, Viewport::new(640, 480), 1.2);
        assert_eq!(store.len(), 20);
        assert_ne!(store.molecules()[0], first);
        assert_eq!(store.baseline_speed(), 1.2);
    }

    #[test]
    fn rebuild_distribution_covers_the_viewport() {
        let mut rng = seeded();
        let mut store = ParticleStore::new();
        let viewport = Viewport::new(1000, 500);
        store.rebuild(&mut rng, 2000, viewport, 2.0);

        let n = store.len() as f32;
        let mean_x = store.molecules().iter().map(|m| m.position.x).sum::<f32>() / n;
        let mean_y = store.molecules().iter().map(|m| m.position.y).sum::<f32>() / n;
        let mean_vx = store.molecules().iter().map(|m| m.velocity.x).sum::<f32>() / n;
        let mean_opacity = store.molecules().iter().map(|m| m.opacity).sum::<f32>() / n;

        // Uniform means with generous tolerances
        assert!((mean_x - 500.0).abs() < 40.0);
        assert!((mean_y - 250.0).abs() < 20.0);
        assert!(mean_vx.abs() < 0.08);
        assert!((mean_opacity - 0.8).abs() < 0.02);
        assert!(store
            .molecules()
            .iter()
            .all(|m| m.velocity.x.abs() <= 1.0 && m.velocity.y.abs() <= 1.0));
    }

    #[test]
    fn rebuild_with_zero_count_empties_the_store() {
        let mut rng = seeded();
        let mut store = ParticleStore::new();
        store.rebuild(&mut rng, 10, Viewport::new(100, 100), 1.0);
        store.rebuild(&mut rng, 0, Viewport::new(100, 100), 1.0);
        assert!(store.is_empty());
    }

    #[test]
    fn retune_preserves_direction_and_matches_baseline_magnitude() {
        let mut rng = seeded();
        let mut store = ParticleStore::new();
        store.rebuild(&mut rng, 100, Viewport::new(800, 600), 1.5);

        // Disturb the current velocities so they differ from the baselines
        for m in store.molecules_mut() {
            m.velocity = m.velocity * 1.7 + vec2(0.1, -0.05);
        }
        let before: Vec<Molecule> = store.molecules().to_vec();

        store.retune(&mut rng, 3.0);

        for (old, new) in before.iter().zip(store.molecules()) {
            assert!((new.base_velocity - old.base_velocity * 2.0).length() < 1e-5);

            let old_angle = old.velocity.y.atan2(old.velocity.x);
            let new_angle = new.velocity.y.atan2(new.velocity.x);
            assert!((old_angle - new_angle).abs() < 1e-4);
            assert!((new.velocity.length() - new.base_velocity.length()).abs() < 1e-4);
        }
        assert_eq!(store.baseline_speed(), 3.0);
    }

    #[test]
    fn retune_assigns_baseline_to_resting_molecules() {
        let mut rng = seeded();
        let mut molecule = Molecule::new(10.0, 10.0, vec2(0.5, 0.0));
        molecule.velocity = Vec2::ZERO;
        let mut store = ParticleStore::from_molecules(vec![molecule], 1.0);

        store.retune(&mut rng, 2.0);
        let m = &store.molecules()[0];
        assert_eq!(m.base_velocity, vec2(1.0, 0.0));
        assert_eq!(m.velocity, m.base_velocity);
    }

    #[test]
    fn retune_from_zero_speed_draws_fresh_baselines() {
        let mut rng = seeded();
        let mut store = ParticleStore::new();
        store.rebuild(&mut rng, 30, Viewport::new(300, 300), 0.0);
        assert!(store.molecules().iter().all(|m| m.velocity == Vec2::ZERO));

        store.retune(&mut rng, 2.0);
        assert!(store.molecules().iter().any(|m| m.base_velocity != Vec2::ZERO));
        for m in store.molecules() {
            assert_eq!(m.velocity, m.base_velocity);
            assert!(m.base_velocity.x.abs() <= 1.0 && m.base_velocity.y.abs() <= 1.0);
        }
    }
}
