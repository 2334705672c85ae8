//! Candidate positions for one growth step.

use glam::DVec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand_distr::StudentT;
use urbis_config::{GridGrowthProp, Probability};
use urbis_geometry::rotate_degrees;

use crate::error::GenerationError;

/// Heading class of a candidate relative to the incoming road.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Left,
    Right,
}

impl Direction {
    const ALL: [Direction; 3] = [Direction::Forward, Direction::Left, Direction::Right];

    fn row(self) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Left => 1,
            Direction::Right => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Proposal {
    pub direction: Direction,
    pub position: DVec2,
    pub length: f64,
    /// Angular offset in degrees that was applied to the base heading.
    pub angle_offset: f64,
}

/// Skewed, heavy-tailed step length centred between `min_len` and `max_len`.
///
/// A Student-t magnitude is mirrored to the long side with probability `(1 + skew) / 2`
/// and stretched by `1 + skew` there, or by `1 - skew` on the short side. The result
/// is clamped into `[min_len, max_len]`.
#[derive(Clone, Debug)]
pub struct StepLength {
    center: f64,
    scale: f64,
    skew: f64,
    min: f64,
    max: f64,
    tail: StudentT<f64>,
}

impl StepLength {
    pub fn new(growth: &GridGrowthProp) -> Result<Self, GenerationError> {
        let tail = StudentT::new(growth.length_dof).map_err(|e| {
            GenerationError::InvalidParameter(format!(
                "length_dof {}: {e:?}",
                growth.length_dof
            ))
        })?;
        Ok(Self {
            center: (growth.min_len + growth.max_len) / 2.0,
            scale: growth.length_scale,
            skew: growth.length_skew,
            min: growth.min_len,
            max: growth.max_len,
            tail,
        })
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        let magnitude = self.tail.sample(rng).abs();
        let long_side = rng.random::<f64>() < (1.0 + self.skew) / 2.0;
        let x = if long_side {
            magnitude * (1.0 + self.skew)
        } else {
            -magnitude * (1.0 - self.skew)
        };
        (self.center + self.scale * x).clamp(self.min, self.max)
    }
}

/// Draw up to `picks` distinct indices, each weighted by `weights`, without replacement.
/// Stops early once every remaining weight is zero.
fn pick_without_replacement<R: Rng>(rng: &mut R, mut weights: [u32; 3], picks: usize) -> Vec<usize> {
    let mut picked = Vec::with_capacity(picks);
    while picked.len() < picks {
        let Ok(dist) = WeightedIndex::new(weights) else {
            break;
        };
        let index = dist.sample(rng);
        weights[index] = 0;
        picked.push(index);
    }
    picked
}

fn offset_in<R: Rng>(rng: &mut R, [lo, hi]: [f64; 2]) -> f64 {
    if lo < hi { rng.random_range(lo..hi) } else { lo }
}

/// Propose candidates growing from `from`, heading away from `prev`.
///
/// The branch count is drawn from `prob.count`, then that many distinct direction classes
/// from `prob.direction`. Each candidate gets its own angular offset and step length.
pub fn propose<R: Rng>(
    rng: &mut R,
    from: DVec2,
    prev: DVec2,
    prob: &Probability,
    growth: &GridGrowthProp,
    lengths: &StepLength,
) -> Vec<Proposal> {
    let heading = (from - prev).try_normalize().unwrap_or(DVec2::X);
    let right = DVec2::new(heading.y, -heading.x);

    let count = pick_without_replacement(rng, prob.count, 1)
        .first()
        .map_or(0, |&i| i + 1);
    let directions = pick_without_replacement(rng, prob.direction, count);

    directions
        .into_iter()
        .map(|i| {
            let direction = Direction::ALL[i];
            let length = lengths.sample(rng);
            let angle_offset = offset_in(rng, growth.growth_offset_range[direction.row()]);
            let dir = match direction {
                Direction::Forward => rotate_degrees(heading, angle_offset),
                Direction::Left => rotate_degrees(-right, -angle_offset),
                Direction::Right => rotate_degrees(right, angle_offset),
            };
            Proposal {
                direction,
                position: from + dir * length,
                length,
                angle_offset,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup() -> (GridGrowthProp, StepLength, ChaCha8Rng) {
        let growth = GridGrowthProp::default();
        let lengths = StepLength::new(&growth).unwrap();
        (growth, lengths, ChaCha8Rng::seed_from_u64(11))
    }

    #[test]
    fn test_lengths_stay_in_range() {
        let (growth, lengths, mut rng) = setup();
        for _ in 0..2000 {
            let len = lengths.sample(&mut rng);
            assert!((growth.min_len..=growth.max_len).contains(&len), "got {len}");
        }
    }

    #[test]
    fn test_positive_skew_favours_long_steps() {
        let (growth, lengths, mut rng) = setup();
        let center = (growth.min_len + growth.max_len) / 2.0;
        let long = (0..4000)
            .filter(|_| lengths.sample(&mut rng) > center)
            .count();
        assert!(long > 2000, "only {long} of 4000 above center");
    }

    #[test]
    fn test_boundary_seed_grows_left_and_right() {
        let (growth, lengths, mut rng) = setup();
        for _ in 0..50 {
            let proposals = propose(
                &mut rng,
                DVec2::new(100.0, 0.0),
                DVec2::ZERO,
                &Probability::BOUNDARY_SEED,
                &growth,
                &lengths,
            );
            assert_eq!(proposals.len(), 2);
            let left = proposals.iter().find(|p| p.direction == Direction::Left).unwrap();
            let right = proposals.iter().find(|p| p.direction == Direction::Right).unwrap();
            // Heading +x: left turns go to +y, right turns to -y.
            assert!(left.position.y > 0.0, "left went to {}", left.position);
            assert!(right.position.y < 0.0, "right went to {}", right.position);
        }
    }

    #[test]
    fn test_directions_are_distinct() {
        let (growth, lengths, mut rng) = setup();
        let prob = Probability {
            count: [0, 0, 1],
            direction: [1, 1, 1],
        };
        let proposals = propose(&mut rng, DVec2::ZERO, DVec2::NEG_Y, &prob, &growth, &lengths);
        assert_eq!(proposals.len(), 3);
        for (i, a) in proposals.iter().enumerate() {
            for b in &proposals[i + 1..] {
                assert_ne!(a.direction, b.direction);
            }
        }
    }

    #[test]
    fn test_forward_offset_respects_row() {
        let (growth, lengths, mut rng) = setup();
        let prob = Probability {
            count: [1, 0, 0],
            direction: [1, 0, 0],
        };
        for _ in 0..100 {
            let p = propose(&mut rng, DVec2::ZERO, DVec2::NEG_Y, &prob, &growth, &lengths)[0];
            let [lo, hi] = growth.growth_offset_range[0];
            assert!(p.angle_offset >= lo && p.angle_offset < hi);
            assert!(
                (p.position.length() - p.length).abs() < 1e-9,
                "candidate must sit one step away"
            );
        }
    }

    #[test]
    fn test_zero_weights_produce_nothing() {
        let (growth, lengths, mut rng) = setup();
        let prob = Probability {
            count: [0, 0, 0],
            direction: [1, 1, 1],
        };
        assert!(propose(&mut rng, DVec2::ZERO, DVec2::NEG_Y, &prob, &growth, &lengths).is_empty());
    }

    #[test]
    fn test_degenerate_heading_falls_back() {
        let (growth, lengths, mut rng) = setup();
        let prob = Probability {
            count: [1, 0, 0],
            direction: [1, 0, 0],
        };
        let p = propose(&mut rng, DVec2::ONE, DVec2::ONE, &prob, &growth, &lengths);
        assert_eq!(p.len(), 1);
        assert!(p[0].position.is_finite());
    }
}
