use crate::error::{invalid, Result};

/// Integer lattice coordinate, one entry per axis
pub type Coord = Vec<usize>;

/// Ordered lattice coordinates from one endpoint to the other.
///
/// Immutable once built. Every step has the same number of axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    dimension: usize,
    steps: Vec<Coord>,
}

impl Path {
    /// Wrap precomputed steps. Fails if any step has the wrong axis count.
    pub fn from_steps(dimension: usize, steps: Vec<Coord>) -> Result<Self> {
        if let Some(bad) = steps.iter().find(|c| c.len() != dimension) {
            return Err(invalid(format!(
                "path step {:?} does not have {} coordinates",
                bad, dimension
            )));
        }
        Ok(Self { dimension, steps })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Coord] {
        &self.steps
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coord> {
        self.steps.iter()
    }

    /// Drop every axis past the second; a 2D path is returned unchanged.
    pub fn project_2d(&self) -> Path {
        Path {
            dimension: self.dimension.min(2),
            steps: self.steps.iter().map(|c| c[..c.len().min(2)].to_vec()).collect(),
        }
    }
}

/// Build the straight path between `point_a` and `point_b`.
///
/// Uses `max(|b - a|) + 1` evenly spaced samples, rounding each axis to the
/// nearest integer (ties to even). `a == b` yields a single step.
pub fn build_path(point_a: &[usize], point_b: &[usize], dimension: usize) -> Result<Path> {
    if point_a.len() != dimension || point_b.len() != dimension {
        return Err(invalid(format!(
            "endpoints {:?} and {:?} must both have {} coordinates",
            point_a, point_b, dimension
        )));
    }

    let span = point_a
        .iter()
        .zip(point_b)
        .map(|(&a, &b)| a.abs_diff(b))
        .max()
        .unwrap_or(0);
    let count = span + 1;

    let steps = (0..count)
        .map(|i| {
            let t = if span == 0 { 0.0 } else { i as f64 / span as f64 };
            point_a
                .iter()
                .zip(point_b)
                .map(|(&a, &b)| {
                    let (a, b) = (a as f64, b as f64);
                    (a + (b - a) * t).round_ties_even() as usize
                })
                .collect()
        })
        .collect();

    Ok(Path { dimension, steps })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_path() {
        let path = build_path(&[0, 0], &[4, 4], 2).unwrap();
        assert_eq!(path.len(), 5);
        for (i, step) in path.iter().enumerate() {
            assert_eq!(step, &vec![i, i]);
        }
    }

    #[test]
    fn test_step_count_follows_longest_axis() {
        let path = build_path(&[2, 0, 1], &[8, 3, 1], 3).unwrap();
        assert_eq!(path.len(), 7, "max delta is 6, so 7 steps");
        assert_eq!(path.steps()[0], vec![2, 0, 1]);
        assert_eq!(path.steps()[6], vec![8, 3, 1]);
    }

    #[test]
    fn test_monotonic_toward_end() {
        let path = build_path(&[9, 1], &[0, 6], 2).unwrap();
        for pair in path.steps().windows(2) {
            assert!(pair[1][0] <= pair[0][0], "axis 0 must not move away from the end");
            assert!(pair[1][1] >= pair[0][1], "axis 1 must not move away from the end");
        }
        assert_eq!(path.steps().last().unwrap(), &vec![0, 6]);
    }

    #[test]
    fn test_degenerate_single_step() {
        let path = build_path(&[3, 3], &[3, 3], 2).unwrap();
        assert_eq!(path.steps(), &[vec![3, 3]]);
    }

    #[test]
    fn test_dimension_mismatch() {
        assert!(build_path(&[0, 0], &[1, 1, 1], 2).is_err());
        assert!(build_path(&[0, 0], &[1, 1], 3).is_err());
    }

    #[test]
    fn test_project_2d() {
        let path = build_path(&[0, 0, 4], &[2, 2, 4], 3).unwrap();
        let flat = path.project_2d();
        assert_eq!(flat.dimension(), 2);
        assert_eq!(flat.steps(), &[vec![0, 0], vec![1, 1], vec![2, 2]]);
    }

    #[test]
    fn test_from_steps_checks_axes() {
        assert!(Path::from_steps(2, vec![vec![0, 0], vec![1]]).is_err());
        assert!(Path::from_steps(2, Vec::new()).unwrap().is_empty());
    }
}
