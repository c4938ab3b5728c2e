/*
 * Physics Module
 *
 * Advances every molecule by one tick: pointer repulsion or relaxation,
 * position integration, edge wraparound, jitter and the speed clamp, in
 * that order. The step is unit-less (one tick = one step), so the apparent
 * speed is tied to the scheduler's frame rate rather than wall-clock time.
 */

use rand::Rng;

use crate::input::PointerState;
use crate::molecule::Molecule;
use crate::params::Viewport;
use crate::store::ParticleStore;

// Update all molecules for one tick
pub fn update_molecules<R: Rng>(
    store: &mut ParticleStore,
    pointer: &PointerState,
    repel_force: f32,
    viewport: Viewport,
    rng: &mut R,
) {
    for molecule in store.molecules_mut() {
        step_molecule(molecule, pointer, repel_force, viewport, rng);
    }
}

pub fn step_molecule<R: Rng>(
    molecule: &mut Molecule,
    pointer: &PointerState,
    repel_force: f32,
    viewport: Viewport,
    rng: &mut R,
) {
    // Vector from the molecule to the pointer
    let dx = pointer.x - molecule.position.x;
    let dy = pointer.y - molecule.position.y;
    let distance = (dx * dx + dy * dy).sqrt();

    // A pointer exactly on top of the molecule has no usable angle
    if distance < pointer.radius && distance > 0.0 {
        molecule.repel(dx, dy, distance, pointer.radius, repel_force);
    } else {
        molecule.relax();
    }

    molecule.advance();
    molecule.wrap_edges(viewport);
    molecule.jitter(rng);
    molecule.limit_speed();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::{MAX_COMPONENT_SPEED, WRAP_MARGIN};
    use nannou::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn absent_pointer() -> PointerState {
        PointerState::new(80.0)
    }

    #[test]
    fn speed_clamp_holds_after_every_tick() {
        let mut rng = StdRng::seed_from_u64(11);
        let viewport = Viewport::new(800, 600);
        let mut store = ParticleStore::new();
        store.rebuild(&mut rng, 200, viewport, 5.0);

        // Pointer parked in the middle with a huge force
        let mut pointer = PointerState::new(120.0);
        pointer.move_to(400.0, 300.0);

        for tick in 0..300 {
            // Sweep the pointer around to keep kicking molecules
            pointer.move_to(400.0 + (tick as f32 * 0.1).cos() * 200.0, 300.0);
            update_molecules(&mut store, &pointer, 500.0, viewport, &mut rng);
            for m in store.molecules() {
                assert!(m.velocity.x.abs() <= MAX_COMPONENT_SPEED);
                assert!(m.velocity.y.abs() <= MAX_COMPONENT_SPEED);
            }
        }
    }

    #[test]
    fn positions_stay_within_the_inflated_bounds() {
        let mut rng = StdRng::seed_from_u64(5);
        let viewport = Viewport::new(300, 200);
        let mut store = ParticleStore::new();
        store.rebuild(&mut rng, 100, viewport, 4.0);

        for _ in 0..500 {
            update_molecules(&mut store, &absent_pointer(), 150.0, viewport, &mut rng);
            for m in store.molecules() {
                assert!(m.position.x >= -WRAP_MARGIN && m.position.x <= 300.0 + WRAP_MARGIN);
                assert!(m.position.y >= -WRAP_MARGIN && m.position.y <= 200.0 + WRAP_MARGIN);
            }
        }
    }

    #[test]
    fn wraparound_from_each_edge() {
        let mut rng = StdRng::seed_from_u64(1);
        let viewport = Viewport::new(400, 300);
        let pointer = absent_pointer();

        let mut left = Molecule::new(-11.0, 150.0, Vec2::ZERO);
        step_molecule(&mut left, &pointer, 150.0, viewport, &mut rng);
        assert!(left.position.x >= 400.0);

        let mut right = Molecule::new(411.0, 150.0, Vec2::ZERO);
        step_molecule(&mut right, &pointer, 150.0, viewport, &mut rng);
        assert!(right.position.x <= 0.0);

        let mut top = Molecule::new(200.0, -11.0, Vec2::ZERO);
        step_molecule(&mut top, &pointer, 150.0, viewport, &mut rng);
        assert!(top.position.y >= 300.0);

        let mut bottom = Molecule::new(200.0, 311.0, Vec2::ZERO);
        step_molecule(&mut bottom, &pointer, 150.0, viewport, &mut rng);
        assert!(bottom.position.y <= 0.0);
    }

    #[test]
    fn pointer_inside_radius_repels() {
        let mut rng = StdRng::seed_from_u64(2);
        let viewport = Viewport::new(800, 600);
        let mut pointer = PointerState::new(80.0);
        pointer.move_to(130.0, 100.0);

        let mut m = Molecule::new(100.0, 100.0, Vec2::ZERO);
        step_molecule(&mut m, &pointer, 150.0, viewport, &mut rng);
        // Pointer on the right: molecule heads left
        assert!(m.velocity.x < -0.5);
        assert!(m.position.x < 100.0);
    }

    #[test]
    fn pointer_on_top_of_molecule_relaxes_instead() {
        let mut rng = StdRng::seed_from_u64(2);
        let viewport = Viewport::new(800, 600);
        let mut pointer = PointerState::new(80.0);
        pointer.move_to(100.0, 100.0);

        let mut m = Molecule::new(100.0, 100.0, vec2(1.0, 0.0));
        m.velocity = Vec2::ZERO;
        step_molecule(&mut m, &pointer, 150.0, viewport, &mut rng);
        // 2% toward the baseline plus at most half the jitter width
        assert!((m.velocity.x - 0.02).abs() <= 0.0125 + 1e-6);
        assert!(m.velocity.y.abs() <= 0.0125 + 1e-6);
    }

    #[test]
    fn absent_pointer_never_influences() {
        let mut rng = StdRng::seed_from_u64(9);
        let viewport = Viewport::new(200, 200);
        let mut pointer = PointerState::new(120.0);
        pointer.move_to(5.0, 5.0);
        pointer.leave();

        let mut m = Molecule::new(-10.0, -10.0, Vec2::ZERO);
        step_molecule(&mut m, &pointer, 500.0, viewport, &mut rng);
        assert!(m.velocity.length() < 0.02);
    }

    #[test]
    fn idle_motion_converges_to_baseline() {
        let mut rng = StdRng::seed_from_u64(4);
        let viewport = Viewport::new(800, 600);
        let mut m = Molecule::new(400.0, 300.0, vec2(0.8, -0.4));
        m.velocity = vec2(-2.0, 2.0);

        for _ in 0..400 {
            step_molecule(&mut m, &absent_pointer(), 150.0, viewport, &mut rng);
        }
        assert!((m.velocity - m.base_velocity).length() < 0.2);
    }
}
