/*
 * Molecule Module
 *
 * This module defines the Molecule struct and the per-tick motion rules.
 * Each molecule:
 * 1. Is pushed away from the pointer while inside its influence radius
 * 2. Otherwise relaxes back toward its baseline ("home") velocity
 * 3. Moves, wraps around the inflated viewport edges, and picks up a
 *    little jitter so idle motion stays organic
 *
 * Coordinates are screen space: origin at the top-left, y growing downward.
 */

use nannou::prelude::*;
use rand::Rng;

use crate::params::Viewport;

// Band for the randomly drawn body radius
pub const BASE_RADIUS: f32 = 2.0;
pub const RADIUS_VARIATION: f32 = 1.5;

// Opacity band, fixed at creation
pub const MIN_OPACITY: f32 = 0.6;
pub const OPACITY_VARIATION: f32 = 0.4;

// Motion constants
pub const REPEL_SCALE: f32 = 0.015;
pub const RELAX_RATE: f32 = 0.02;
pub const JITTER: f32 = 0.025;
pub const MAX_COMPONENT_SPEED: f32 = 2.5;
pub const WRAP_MARGIN: f32 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub position: Point2,
    pub velocity: Vec2,
    pub base_velocity: Vec2,
    pub radius: f32,
    pub opacity: f32,
}

impl Molecule {
    // A molecule at rest with the given baseline velocity
    pub fn new(x: f32, y: f32, velocity: Vec2) -> Self {
        Self {
            position: pt2(x, y),
            velocity,
            base_velocity: velocity,
            radius: BASE_RADIUS,
            opacity: 1.0,
        }
    }

    // A molecule at a random spot in the viewport
    pub fn random<R: Rng>(rng: &mut R, viewport: Viewport, base_speed: f32) -> Self {
        let velocity = random_velocity(rng, base_speed);

        Self {
            position: pt2(
                rng.gen::<f32>() * viewport.width_f32(),
                rng.gen::<f32>() * viewport.height_f32(),
            ),
            velocity,
            base_velocity: velocity,
            radius: rng.gen::<f32>() * RADIUS_VARIATION + BASE_RADIUS,
            opacity: rng.gen::<f32>() * OPACITY_VARIATION + MIN_OPACITY,
        }
    }

    // Push away from the pointer. `dx`/`dy` point from the molecule to the
    // pointer, so subtracting along that angle moves the molecule away.
    pub fn repel(&mut self, dx: f32, dy: f32, distance: f32, radius: f32, strength: f32) {
        let force = (radius - distance) / radius;
        let angle = dy.atan2(dx);

        self.velocity.x -= angle.cos() * force * strength * REPEL_SCALE;
        self.velocity.y -= angle.sin() * force * strength * REPEL_SCALE;
    }

    // Exponential return toward the baseline velocity
    pub fn relax(&mut self) {
        self.velocity += (self.base_velocity - self.velocity) * RELAX_RATE;
    }

    pub fn advance(&mut self) {
        self.position += self.velocity;
    }

    // Toroidal wrap across the inflated viewport
    pub fn wrap_edges(&mut self, viewport: Viewport) {
        let width = viewport.width_f32();
        let height = viewport.height_f32();

        if self.position.x < -WRAP_MARGIN {
            self.position.x = width + WRAP_MARGIN;
        }
        if self.position.x > width + WRAP_MARGIN {
            self.position.x = -WRAP_MARGIN;
        }
        if self.position.y < -WRAP_MARGIN {
            self.position.y = height + WRAP_MARGIN;
        }
        if self.position.y > height + WRAP_MARGIN {
            self.position.y = -WRAP_MARGIN;
        }
    }

    pub fn jitter<R: Rng>(&mut self, rng: &mut R) {
        self.velocity.x += (rng.gen::<f32>() - 0.5) * JITTER;
        self.velocity.y += (rng.gen::<f32>() - 0.5) * JITTER;
    }

    // Component-wise clamp: the speed envelope is a square, not a circle
    pub fn limit_speed(&mut self) {
        if self.velocity.x.abs() > MAX_COMPONENT_SPEED {
            self.velocity.x = self.velocity.x.signum() * MAX_COMPONENT_SPEED;
        }
        if self.velocity.y.abs() > MAX_COMPONENT_SPEED {
            self.velocity.y = self.velocity.y.signum() * MAX_COMPONENT_SPEED;
        }
    }
}

// Each component uniform in [-speed/2, speed/2)
pub fn random_velocity<R: Rng>(rng: &mut R, speed: f32) -> Vec2 {
    vec2(
        (rng.gen::<f32>() - 0.5) * speed,
        (rng.gen::<f32>() - 0.5) * speed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_molecules_respect_their_bands() {
        let mut rng = StdRng::seed_from_u64(7);
        let viewport = Viewport::new(800, 600);

        for _ in 0..1000 {
            let m = Molecule::random(&mut rng, viewport, 1.2);
            assert!(m.position.x >= 0.0 && m.position.x < 800.0);
            assert!(m.position.y >= 0.0 && m.position.y < 600.0);
            assert!(m.velocity.x.abs() <= 0.6 && m.velocity.y.abs() <= 0.6);
            assert_eq!(m.velocity, m.base_velocity);
            assert!(m.radius >= BASE_RADIUS && m.radius < BASE_RADIUS + RADIUS_VARIATION);
            assert!(m.opacity >= 0.6 && m.opacity <= 1.0);
        }
    }

    #[test]
    fn repel_pushes_away_from_pointer() {
        // Pointer to the right of the molecule
        let mut m = Molecule::new(100.0, 100.0, Vec2::ZERO);
        m.repel(10.0, 0.0, 10.0, 80.0, 150.0);
        assert!(m.velocity.x < 0.0);
        assert!(m.velocity.y.abs() < 1e-6);

        // Pointer below the molecule (y grows downward)
        let mut m = Molecule::new(100.0, 100.0, Vec2::ZERO);
        m.repel(0.0, 20.0, 20.0, 80.0, 150.0);
        assert!(m.velocity.y < 0.0);
    }

    #[test]
    fn repel_magnitude_falls_off_linearly() {
        let mut near = Molecule::new(0.0, 0.0, Vec2::ZERO);
        near.repel(20.0, 0.0, 20.0, 80.0, 100.0);
        // force = 60/80, impulse = 0.75 * 100 * 0.015
        assert!((near.velocity.x + 1.125).abs() < 1e-5);

        let mut far = Molecule::new(0.0, 0.0, Vec2::ZERO);
        far.repel(60.0, 0.0, 60.0, 80.0, 100.0);
        assert!(far.velocity.x.abs() < near.velocity.x.abs());
    }

    #[test]
    fn relax_moves_two_percent_toward_baseline() {
        let mut m = Molecule::new(0.0, 0.0, vec2(1.0, -1.0));
        m.velocity = vec2(2.0, 0.0);
        m.relax();
        assert!((m.velocity.x - 1.98).abs() < 1e-6);
        assert!((m.velocity.y + 0.02).abs() < 1e-6);
    }

    #[test]
    fn wraps_all_four_edges() {
        let viewport = Viewport::new(200, 100);

        let mut left = Molecule::new(-11.0, 50.0, Vec2::ZERO);
        left.wrap_edges(viewport);
        assert!(left.position.x >= 200.0);

        let mut right = Molecule::new(211.0, 50.0, Vec2::ZERO);
        right.wrap_edges(viewport);
        assert!(right.position.x <= 0.0);

        let mut top = Molecule::new(50.0, -11.0, Vec2::ZERO);
        top.wrap_edges(viewport);
        assert!(top.position.y >= 100.0);

        let mut bottom = Molecule::new(50.0, 111.0, Vec2::ZERO);
        bottom.wrap_edges(viewport);
        assert!(bottom.position.y <= 0.0);
    }

    #[test]
    fn inside_margin_does_not_wrap() {
        let viewport = Viewport::new(200, 100);
        let mut m = Molecule::new(-9.5, 109.0, Vec2::ZERO);
        m.wrap_edges(viewport);
        assert_eq!(m.position, pt2(-9.5, 109.0));
    }

    #[test]
    fn limit_speed_clamps_each_component() {
        let mut m = Molecule::new(0.0, 0.0, Vec2::ZERO);
        m.velocity = vec2(-4.0, 2.4);
        m.limit_speed();
        assert_eq!(m.velocity, vec2(-2.5, 2.4));

        // Both components at the limit: the magnitude exceeds 2.5
        m.velocity = vec2(3.0, 3.0);
        m.limit_speed();
        assert_eq!(m.velocity, vec2(2.5, 2.5));
    }

    #[test]
    fn jitter_is_small_and_centred() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sum = Vec2::ZERO;
        for _ in 0..2000 {
            let mut m = Molecule::new(0.0, 0.0, Vec2::ZERO);
            m.jitter(&mut rng);
            assert!(m.velocity.x.abs() <= JITTER / 2.0);
            assert!(m.velocity.y.abs() <= JITTER / 2.0);
            sum += m.velocity;
        }
        let mean = sum / 2000.0;
        assert!(mean.x.abs() < 0.002 && mean.y.abs() < 0.002);
    }
}
