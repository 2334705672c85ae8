use glam::DVec2;
use rand::Rng;
use urbis_geometry::Rect;

use crate::error::VoronoiError;

/// Bridson-style Poisson-disk sampler over `[0, width) x [0, height)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoissonSampler {
    /// Minimum distance between two accepted points.
    pub radius: f64,
    /// Width and height of the sampled region.
    pub region_size: DVec2,
    /// Candidates tried around an active point before it is retired.
    pub rejection_limit: u32,
}

/// Output of [`PoissonSampler::sample`].
#[derive(Clone, Debug, PartialEq)]
pub struct PoissonSample {
    /// Side of the acceleration grid (`radius / sqrt(2)`).
    pub cell_size: f64,
    /// Accepted points in acceptance order.
    pub points: Vec<DVec2>,
}

/// Acceleration grid holding at most one sample per cell.
struct SampleGrid {
    cell_size: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Option<usize>>,
}

impl SampleGrid {
    fn new(cell_size: f64, region_size: DVec2) -> Self {
        let cols = ((region_size.x / cell_size).ceil() as usize).max(1);
        let rows = ((region_size.y / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            cols,
            rows,
            cells: vec![None; cols * rows],
        }
    }

    fn cell_of(&self, p: DVec2) -> (usize, usize) {
        let cx = ((p.x / self.cell_size) as usize).min(self.cols - 1);
        let cy = ((p.y / self.cell_size) as usize).min(self.rows - 1);
        (cx, cy)
    }

    fn insert(&mut self, p: DVec2, index: usize) {
        let (cx, cy) = self.cell_of(p);
        self.cells[cy * self.cols + cx] = Some(index);
    }

    /// Indices stored in the 5x5 block of cells around `p`.
    fn neighbours(&self, p: DVec2) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy) = self.cell_of(p);
        let x0 = cx.saturating_sub(2);
        let x1 = (cx + 2).min(self.cols - 1);
        let y0 = cy.saturating_sub(2);
        let y1 = (cy + 2).min(self.rows - 1);
        (y0..=y1).flat_map(move |y| (x0..=x1).filter_map(move |x| self.cells[y * self.cols + x]))
    }
}

impl PoissonSampler {
    pub fn new(radius: f64, region_size: DVec2, rejection_limit: u32) -> Self {
        Self {
            radius,
            region_size,
            rejection_limit,
        }
    }

    fn check(&self) -> Result<(), VoronoiError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(VoronoiError::InvalidRadius(self.radius));
        }
        let size = self.region_size;
        if !(size.is_finite() && size.x > 0.0 && size.y > 0.0) {
            return Err(VoronoiError::InvalidRegion {
                width: size.x,
                height: size.y,
            });
        }
        if self.rejection_limit == 0 {
            return Err(VoronoiError::InvalidRejectionLimit);
        }
        Ok(())
    }

    /// Scatter points until no active point can spawn a neighbour.
    ///
    /// The walk starts from the region centre, which is a spawn point only and never
    /// appears in the output. Candidates are drawn at distance `[radius, 2 * radius)` from
    /// a random active point.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Result<PoissonSample, VoronoiError> {
        self.check()?;

        let cell_size = self.radius / std::f64::consts::SQRT_2;
        let bounds = Rect::from_size(self.region_size);
        let mut grid = SampleGrid::new(cell_size, self.region_size);
        let mut points: Vec<DVec2> = Vec::new();
        let mut spawn_points = vec![bounds.center()];
        let radius_sq = self.radius * self.radius;

        while !spawn_points.is_empty() {
            let spawn_index = rng.random_range(0..spawn_points.len());
            let spawn_center = spawn_points[spawn_index];
            let mut accepted = false;

            for _ in 0..self.rejection_limit {
                let angle = rng.random::<f64>() * std::f64::consts::TAU;
                let dir = DVec2::new(angle.sin(), angle.cos());
                let candidate =
                    spawn_center + dir * rng.random_range(self.radius..2.0 * self.radius);

                if !bounds.contains(candidate) {
                    continue;
                }
                let crowded = grid
                    .neighbours(candidate)
                    .any(|i| points[i].distance_squared(candidate) < radius_sq);
                if crowded {
                    continue;
                }

                grid.insert(candidate, points.len());
                points.push(candidate);
                spawn_points.push(candidate);
                accepted = true;
                break;
            }

            if !accepted {
                spawn_points.swap_remove(spawn_index);
            }
        }

        tracing::debug!(
            count = points.len(),
            radius = self.radius,
            "poisson sampling finished"
        );
        Ok(PoissonSample { cell_size, points })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sample(seed: u64, radius: f64, size: f64) -> PoissonSample {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        PoissonSampler::new(radius, DVec2::splat(size), 30)
            .sample(&mut rng)
            .unwrap()
    }

    #[test]
    fn test_poisson_sampling_maintains_minimum_distance() {
        let radius = 10.0;
        let result = sample(123, radius, 200.0);
        assert!(result.points.len() > 50, "expected a dense fill, got {}", result.points.len());

        for (i, a) in result.points.iter().enumerate() {
            for (j, b) in result.points.iter().enumerate().skip(i + 1) {
                let dist = a.distance(*b);
                assert!(
                    dist >= radius,
                    "Points {i} and {j} are too close: distance={dist}, min={radius}"
                );
            }
        }
    }

    #[test]
    fn test_small_region_large_radius() {
        let result = sample(7, 90.0, 200.0);
        assert!(!result.points.is_empty());
        assert!((result.cell_size - 90.0 / 2f64.sqrt()).abs() < 1e-12);

        for p in &result.points {
            assert!(
                p.x >= 0.0 && p.x < 200.0 && p.y >= 0.0 && p.y < 200.0,
                "point {p} escaped the region"
            );
        }
        for (i, a) in result.points.iter().enumerate() {
            for b in &result.points[i + 1..] {
                assert!(a.distance(*b) >= 90.0);
            }
        }
    }

    #[test]
    fn test_spawn_centre_is_not_a_sample() {
        let result = sample(3, 20.0, 100.0);
        assert!(!result.points.contains(&DVec2::splat(50.0)));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(sample(99, 30.0, 400.0), sample(99, 30.0, 400.0));
        assert_ne!(sample(99, 30.0, 400.0), sample(100, 30.0, 400.0));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let bad_radius = PoissonSampler::new(0.0, DVec2::splat(10.0), 30).sample(&mut rng);
        assert!(matches!(bad_radius, Err(VoronoiError::InvalidRadius(_))));

        let bad_region = PoissonSampler::new(1.0, DVec2::new(10.0, -1.0), 30).sample(&mut rng);
        assert!(matches!(bad_region, Err(VoronoiError::InvalidRegion { .. })));

        let bad_limit = PoissonSampler::new(1.0, DVec2::splat(10.0), 0).sample(&mut rng);
        assert!(matches!(bad_limit, Err(VoronoiError::InvalidRejectionLimit)));
    }
}
