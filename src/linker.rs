/*
 * Proximity Linker Module
 *
 * Builds the set of connections drawn between nearby molecules. Every
 * unordered pair closer than the connection distance gets a line whose
 * opacity fades linearly with distance.
 *
 * Small sets are scanned pair by pair. Larger sets go through the spatial
 * grid, whose output is sorted so both paths emit identical lists.
 */

use crate::molecule::Molecule;
use crate::params::Viewport;
use crate::spatial_grid::SpatialGrid;

// Grid cells never shrink below this, even for tiny connection distances
const MIN_CELL_SIZE: f32 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub from: usize,
    pub to: usize,
    pub opacity: f32,
}

// The connection between two molecules, if they are close enough
#[inline]
fn connection_between(
    from: usize,
    to: usize,
    a: &Molecule,
    b: &Molecule,
    max_distance: f32,
    opacity_scale: f32,
) -> Option<Connection> {
    let dx = a.position.x - b.position.x;
    let dy = a.position.y - b.position.y;
    let distance = (dx * dx + dy * dy).sqrt();

    if distance < max_distance {
        Some(Connection {
            from,
            to,
            opacity: (1.0 - distance / max_distance) * opacity_scale,
        })
    } else {
        None
    }
}

// Scans every pair `i < j`. Connections come out ordered by `(from, to)`
pub fn link_brute_force(
    molecules: &[Molecule],
    max_distance: f32,
    opacity_scale: f32,
    out: &mut Vec<Connection>,
) {
    out.clear();
    if max_distance <= 0.0 {
        return;
    }

    for i in 0..molecules.len() {
        for j in (i + 1)..molecules.len() {
            if let Some(connection) =
                connection_between(i, j, &molecules[i], &molecules[j], max_distance, opacity_scale)
            {
                out.push(connection);
            }
        }
    }
}

pub struct ProximityLinker {
    grid_threshold: usize,
    grid: Option<SpatialGrid>,
    candidates: Vec<usize>,
}

impl ProximityLinker {
    // Sets at or above `grid_threshold` molecules use the spatial grid
    pub fn new(grid_threshold: usize) -> Self {
        Self {
            grid_threshold,
            grid: None,
            candidates: Vec::new(),
        }
    }

    pub fn uses_grid_for(&self, count: usize) -> bool {
        count >= self.grid_threshold
    }

    // Recomputes `out` from scratch for the current molecule positions
    pub fn link(
        &mut self,
        molecules: &[Molecule],
        max_distance: f32,
        opacity_scale: f32,
        viewport: Viewport,
        out: &mut Vec<Connection>,
    ) {
        if self.uses_grid_for(molecules.len()) {
            self.link_with_grid(molecules, max_distance, opacity_scale, viewport, out);
        } else {
            link_brute_force(molecules, max_distance, opacity_scale, out);
        }
    }

    fn link_with_grid(
        &mut self,
        molecules: &[Molecule],
        max_distance: f32,
        opacity_scale: f32,
        viewport: Viewport,
        out: &mut Vec<Connection>,
    ) {
        out.clear();
        if max_distance <= 0.0 {
            return;
        }

        let cell_size = max_distance.max(MIN_CELL_SIZE);
        let reuse = self
            .grid
            .as_ref()
            .map_or(false, |grid| grid.fits(cell_size, viewport));
        if !reuse {
            self.grid = Some(SpatialGrid::new(cell_size, viewport));
        }
        let grid = match self.grid.as_mut() {
            Some(grid) => grid,
            None => return,
        };

        grid.clear();
        for (index, molecule) in molecules.iter().enumerate() {
            grid.insert(index, molecule.position);
        }

        for (i, molecule) in molecules.iter().enumerate() {
            grid.nearby_indices(molecule.position, &mut self.candidates);
            for &j in &self.candidates {
                if j <= i {
                    continue;
                }
                if let Some(connection) =
                    connection_between(i, j, molecule, &molecules[j], max_distance, opacity_scale)
                {
                    out.push(connection);
                }
            }
        }

        // Match the pair-scan order
        out.sort_unstable_by_key(|c| (c.from, c.to));
    }

    // Forget the cached grid
    pub fn reset(&mut self) {
        self.grid = None;
        self.candidates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ParticleStore;
    use nannou::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at(x: f32, y: f32) -> Molecule {
        Molecule::new(x, y, Vec2::ZERO)
    }

    #[test]
    fn close_pair_gets_distance_scaled_opacity() {
        let molecules = vec![at(0.0, 0.0), at(50.0, 0.0)];
        let mut out = Vec::new();
        link_brute_force(&molecules, 80.0, 0.5, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!((out[0].from, out[0].to), (0, 1));
        let expected = (1.0 - 50.0 / 80.0) * 0.5;
        assert!((out[0].opacity - expected).abs() < 1e-6);
    }

    #[test]
    fn distant_pair_is_not_linked() {
        let molecules = vec![at(0.0, 0.0), at(100.0, 0.0)];
        let mut out = Vec::new();
        link_brute_force(&molecules, 80.0, 0.5, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn pair_at_exactly_max_distance_is_not_linked() {
        let molecules = vec![at(0.0, 0.0), at(80.0, 0.0)];
        let mut out = Vec::new();
        link_brute_force(&molecules, 80.0, 1.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn lowering_max_distance_never_adds_connections() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut store = ParticleStore::new();
        store.rebuild(&mut rng, 120, Viewport::new(800, 600), 1.2);

        let mut wide = Vec::new();
        let mut narrow = Vec::new();
        link_brute_force(store.molecules(), 140.0, 0.5, &mut wide);
        link_brute_force(store.molecules(), 50.0, 0.5, &mut narrow);

        assert!(narrow.len() <= wide.len());
        for c in &narrow {
            assert!(wide.iter().any(|w| w.from == c.from && w.to == c.to));
        }
    }

    #[test]
    fn non_positive_max_distance_links_nothing() {
        let molecules = vec![at(0.0, 0.0), at(0.0, 0.0)];
        let mut out = vec![Connection {
            from: 0,
            to: 1,
            opacity: 1.0,
        }];
        link_brute_force(&molecules, 0.0, 0.5, &mut out);
        assert!(out.is_empty());

        let mut linker = ProximityLinker::new(0);
        linker.link(&molecules, -5.0, 0.5, Viewport::new(100, 100), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn grid_matches_brute_force_exactly() {
        let mut rng = StdRng::seed_from_u64(77);
        let viewport = Viewport::new(1280, 720);
        let mut store = ParticleStore::new();
        store.rebuild(&mut rng, 400, viewport, 1.2);

        // A few molecules parked in the wrap margin
        store.molecules_mut()[0].position = pt2(-9.0, -9.0);
        store.molecules_mut()[1].position = pt2(1289.0, 729.0);

        for &max_distance in &[20.0, 80.0, 150.0, 300.0] {
            let mut brute = Vec::new();
            link_brute_force(store.molecules(), max_distance, 0.7, &mut brute);

            let mut linker = ProximityLinker::new(0);
            let mut grid = Vec::new();
            linker.link(store.molecules(), max_distance, 0.7, viewport, &mut grid);

            assert_eq!(brute, grid, "mismatch at max distance {}", max_distance);
        }
    }

    #[test]
    fn threshold_selects_the_path() {
        let linker = ProximityLinker::new(150);
        assert!(!linker.uses_grid_for(149));
        assert!(linker.uses_grid_for(150));
    }

    #[test]
    fn grid_is_rebuilt_after_a_resize() {
        let mut linker = ProximityLinker::new(0);
        let molecules = vec![at(900.0, 900.0), at(950.0, 900.0)];
        let mut out = Vec::new();

        linker.link(&molecules, 80.0, 1.0, Viewport::new(200, 200), &mut out);
        assert_eq!(out.len(), 1);

        linker.link(&molecules, 80.0, 1.0, Viewport::new(1000, 1000), &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].from, out[0].to), (0, 1));
    }
}
