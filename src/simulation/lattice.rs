use crate::config::{PATH_DECAY_RATE, SENSITIVITY_RAMP};
use crate::error::{invalid, Result};
use crate::simulation::path::Path;

/// Dense row-major scalar field over a 2D or 3D lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    shape: Vec<usize>,
    strides: Vec<usize>,
    values: Vec<f64>,
}

impl Lattice {
    /// Zero-filled lattice
    pub fn zeros(shape: &[usize]) -> Self {
        Self::filled(shape, 0.0)
    }

    pub fn filled(shape: &[usize], value: f64) -> Self {
        let count = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            strides: row_major_strides(shape),
            values: vec![value; count],
        }
    }

    /// Build from a flat row-major buffer. Fails if the length does not match.
    pub fn from_values(shape: &[usize], values: Vec<f64>) -> Result<Self> {
        let count: usize = shape.iter().product();
        if values.len() != count {
            return Err(invalid(format!(
                "{} values cannot fill lattice {:?}",
                values.len(),
                shape
            )));
        }
        Ok(Self {
            shape: shape.to_vec(),
            strides: row_major_strides(shape),
            values,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dimension(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn contains(&self, coord: &[usize]) -> bool {
        coord.len() == self.shape.len() && coord.iter().zip(&self.shape).all(|(&c, &n)| c < n)
    }

    /// Flat index of an in-bounds coordinate, `None` otherwise
    pub fn checked_offset(&self, coord: &[usize]) -> Option<usize> {
        self.contains(coord)
            .then(|| coord.iter().zip(&self.strides).map(|(c, s)| c * s).sum())
    }

    /// Flat index of a coordinate.
    ///
    /// # Panics
    ///
    /// Panics if `coord` has the wrong axis count or lies outside the lattice.
    pub fn offset(&self, coord: &[usize]) -> usize {
        match self.checked_offset(coord) {
            Some(i) => i,
            None => panic!("{:?} outside lattice {:?}", coord, self.shape),
        }
    }

    /// Inverse of [`Lattice::offset`]
    pub fn coord_of(&self, mut offset: usize) -> Vec<usize> {
        self.strides
            .iter()
            .map(|&stride| {
                let c = offset / stride;
                offset %= stride;
                c
            })
            .collect()
    }

    /// Value at `coord`, `None` if it lies outside the lattice
    pub fn try_get(&self, coord: &[usize]) -> Option<f64> {
        self.checked_offset(coord).map(|i| self.values[i])
    }

    /// # Panics
    ///
    /// Panics if `coord` lies outside the lattice.
    pub fn get(&self, coord: &[usize]) -> f64 {
        self.values[self.offset(coord)]
    }

    pub fn set(&mut self, coord: &[usize], value: f64) {
        let i = self.offset(coord);
        self.values[i] = value;
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min_value(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// The 2D plane at `index` along the third axis. A 2D lattice is
    /// returned as-is.
    pub fn plane(&self, index: usize) -> Lattice {
        if self.dimension() < 3 {
            return self.clone();
        }
        let (nx, ny) = (self.shape[0], self.shape[1]);
        let mut plane = Lattice::zeros(&[nx, ny]);
        for x in 0..nx {
            for y in 0..ny {
                plane.values[x * ny + y] = self.get(&[x, y, index]);
            }
        }
        plane
    }

    /// Raw native-endian bytes of the value buffer, for persistence layers
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.values)
    }
}

fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

/// Zero lattice seeded along the path with `peak * exp(-0.05 * i)`.
///
/// Decay follows the path index, not spatial distance.
pub fn initialize_lattice(shape: &[usize], path: &Path, peak_value: f64) -> Result<Lattice> {
    let mut lattice = Lattice::zeros(shape);
    if path.dimension() != lattice.dimension() {
        return Err(invalid(format!(
            "{}D path cannot seed a {}D lattice",
            path.dimension(),
            lattice.dimension()
        )));
    }
    for (i, coord) in path.iter().enumerate() {
        if !lattice.contains(coord) {
            return Err(invalid(format!(
                "path step {:?} lies outside lattice {:?}",
                coord, shape
            )));
        }
        lattice.set(coord, peak_value * (-PATH_DECAY_RATE * i as f64).exp());
    }
    Ok(lattice)
}

/// Per-cell sensitivity: `factor` times a linear 1.0..1.1 ramp along axis 0,
/// constant across the other axes.
pub fn sensitivity_grid(shape: &[usize], factor: f64) -> Lattice {
    let mut grid = Lattice::zeros(shape);
    let rows = shape.first().copied().unwrap_or(0);
    let (lo, hi) = SENSITIVITY_RAMP;
    let row_len = grid.strides.first().copied().unwrap_or(0);
    for row in 0..rows {
        let t = if rows > 1 { row as f64 / (rows - 1) as f64 } else { 0.0 };
        let value = factor * (lo + (hi - lo) * t);
        let start = row * row_len;
        grid.values[start..start + row_len].fill(value);
    }
    grid
}
