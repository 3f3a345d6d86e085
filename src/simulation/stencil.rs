use std::fmt;
use std::str::FromStr;

use crate::error::SimulationError;
use crate::simulation::lattice::Lattice;

/// How neighbour lookups treat the lattice edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryMode {
    /// Periodic: leaving one edge re-enters at the opposite edge
    #[default]
    Wrap,
    /// Mirror about the edge, edge cell included (-1 -> 0, n -> n-1)
    Reflect,
    /// Out-of-grid neighbours are absent and excluded from the count
    Open,
}

impl BoundaryMode {
    pub fn name(&self) -> &'static str {
        match self {
            BoundaryMode::Wrap => "wrap",
            BoundaryMode::Reflect => "reflect",
            BoundaryMode::Open => "open",
        }
    }

    /// Parse a selector, falling back to `wrap` with a warning.
    pub fn from_name_or_wrap(name: &str) -> Self {
        name.parse().unwrap_or_else(|e: SimulationError| {
            log::warn!("{}, falling back to wrap", e);
            BoundaryMode::Wrap
        })
    }

    /// Map a possibly out-of-range index onto the axis, or `None` if the
    /// neighbour does not exist.
    fn resolve(&self, index: isize, extent: usize) -> Option<usize> {
        let n = extent as isize;
        match self {
            BoundaryMode::Wrap => Some(index.rem_euclid(n) as usize),
            BoundaryMode::Reflect => {
                let mut i = index;
                // Loop covers offsets wider than the axis
                while i < 0 || i >= n {
                    i = if i < 0 { -i - 1 } else { 2 * n - i - 1 };
                }
                Some(i as usize)
            }
            BoundaryMode::Open => (0..n).contains(&index).then_some(index as usize),
        }
    }
}

impl FromStr for BoundaryMode {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wrap" => Ok(BoundaryMode::Wrap),
            "reflect" => Ok(BoundaryMode::Reflect),
            "open" => Ok(BoundaryMode::Open),
            _ => Err(SimulationError::UnrecognizedMode {
                kind: "boundary",
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for BoundaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Neighbour offsets of a fixed-weight kernel, center excluded.
///
/// Selected once per run from the lattice dimension so callers never branch
/// on 2D vs 3D.
#[derive(Debug, Clone, PartialEq)]
pub struct Stencil {
    offsets: Vec<Vec<isize>>,
}

impl Stencil {
    /// 8-connected ring: every offset in the 3x3 block except the center
    pub fn moore_2d() -> Self {
        Self::from_predicate(2, |nonzero| nonzero >= 1)
    }

    /// 6 face plus 12 edge neighbours of the 3x3x3 block
    pub fn face_edge_3d() -> Self {
        Self::from_predicate(3, |nonzero| nonzero == 1 || nonzero == 2)
    }

    /// Kernel table for a lattice dimension, `None` for unsupported ranks.
    pub fn for_dimension(dimension: usize) -> Option<Self> {
        match dimension {
            2 => Some(Self::moore_2d()),
            3 => Some(Self::face_edge_3d()),
            _ => None,
        }
    }

    /// All offsets in {-1, 0, 1}^dim whose count of non-zero axes passes
    /// `keep`.
    fn from_predicate(dimension: usize, keep: impl Fn(usize) -> bool) -> Self {
        let total = 3usize.pow(dimension as u32);
        let offsets = (0..total)
            .map(|mut code| {
                (0..dimension)
                    .map(|_| {
                        let d = (code % 3) as isize - 1;
                        code /= 3;
                        d
                    })
                    .collect::<Vec<isize>>()
            })
            .filter(|offset| keep(offset.iter().filter(|&&d| d != 0).count()))
            .collect();
        Self { offsets }
    }

    pub fn dimension(&self) -> usize {
        self.offsets.first().map_or(0, Vec::len)
    }

    pub fn offsets(&self) -> &[Vec<isize>] {
        &self.offsets
    }
}

/// Mean of each cell's stencil neighbours under `mode`.
///
/// Neighbours that do not exist (open boundary) are left out of both the sum
/// and the count. A cell with no neighbours at all yields `None`.
pub fn neighbor_average(field: &Lattice, stencil: &Stencil, mode: BoundaryMode) -> Vec<Option<f64>> {
    let shape = field.shape();
    let values = field.values();
    let mut neighbor = vec![0usize; shape.len()];

    (0..field.len())
        .map(|offset| {
            let coord = field.coord_of(offset);
            let mut sum = 0.0;
            let mut count = 0usize;

            'neighbors: for delta in stencil.offsets() {
                for axis in 0..shape.len() {
                    let index = coord[axis] as isize + delta[axis];
                    match mode.resolve(index, shape[axis]) {
                        Some(i) => neighbor[axis] = i,
                        None => continue 'neighbors,
                    }
                }
                sum += values[field.offset(&neighbor)];
                count += 1;
            }

            (count > 0).then(|| sum / count as f64)
        })
        .collect()
}
