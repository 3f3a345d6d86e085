use crate::error::{invalid, Result};
use crate::simulation::{BoundaryMode, ResponseMode};

// ============================================
// Field Transform Parameters
// ============================================

/// Upper bound of every lattice cell after a completed timestep
pub const DEFAULT_MAX_CURVATURE: f64 = 0.1;

/// Fraction of the gap to the neighbour average closed per diffusion pass
pub const DIFFUSION_RATE: f64 = 0.2;

/// Cells above this value shed their excess to their neighbours
pub const REDISTRIBUTION_THRESHOLD: f64 = 0.08;

/// Half-width of the uniform noise added to every cell each timestep
pub const PERTURBATION_MAGNITUDE: f64 = 0.005;

/// Fixed re-clamp ceiling applied after random perturbation.
/// Independent of the configured max curvature.
pub const PERTURBATION_CEILING: f64 = 0.1;

// ============================================
// Driver Parameters
// ============================================

/// Amplitude of the optional external-field forcing term
pub const EXTERNAL_FIELD_AMPLITUDE: f64 = 0.01;

/// Standard deviation of the Gaussian noise injected into entanglement
pub const ENTANGLEMENT_NOISE_SIGMA: f64 = 0.001;

/// Exponential decay of the initial seed along the path index
pub const PATH_DECAY_RATE: f64 = 0.05;

/// Sensitivity ramp along axis 0: (first index, last index)
pub const SENSITIVITY_RAMP: (f64, f64) = (1.0, 1.1);

/// Emit a progress record every N timesteps
pub const PROGRESS_INTERVAL: usize = 25;

/// Final-report marker for "some cell is close to saturation"
pub const HIGH_CURVATURE_THRESHOLD: f64 = 0.095;

// ============================================
// Default Run
// ============================================

pub const DEFAULT_SHAPE: [usize; 2] = [50, 50];
pub const DEFAULT_POINT_A: [usize; 2] = [5, 5];
pub const DEFAULT_POINT_B: [usize; 2] = [45, 45];
pub const DEFAULT_TIMESTEPS: usize = 200;

/// Full description of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Lattice extents, two or three entries
    pub shape: Vec<usize>,
    pub point_a: Vec<usize>,
    pub point_b: Vec<usize>,
    /// Seed value at the first path step
    pub peak_curvature: f64,
    pub timesteps: usize,
    pub forcing_amplitude: f64,

    pub base_entanglement: f64,
    pub base_decoherence: f64,
    pub base_fidelity: f64,
    pub perturbation_scale: f64,
    pub sensitivity_factor: f64,
    pub response_mode: ResponseMode,
    pub boundary_mode: BoundaryMode,

    pub feedback: bool,
    pub feedback_strength: f64,
    pub external_field: bool,
    pub noise_injection: bool,

    pub max_curvature: f64,
    pub diffusion_rate: f64,
    pub threshold: f64,
    pub perturbation_magnitude: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            shape: DEFAULT_SHAPE.to_vec(),
            point_a: DEFAULT_POINT_A.to_vec(),
            point_b: DEFAULT_POINT_B.to_vec(),
            peak_curvature: 0.1,
            timesteps: DEFAULT_TIMESTEPS,
            forcing_amplitude: 0.01,
            base_entanglement: 0.5,
            base_decoherence: 0.1,
            base_fidelity: 0.9,
            perturbation_scale: 0.25,
            sensitivity_factor: 1.0,
            response_mode: ResponseMode::Linear,
            boundary_mode: BoundaryMode::Wrap,
            feedback: false,
            feedback_strength: 0.01,
            external_field: false,
            noise_injection: false,
            max_curvature: DEFAULT_MAX_CURVATURE,
            diffusion_rate: DIFFUSION_RATE,
            threshold: REDISTRIBUTION_THRESHOLD,
            perturbation_magnitude: PERTURBATION_MAGNITUDE,
        }
    }
}

impl SimulationConfig {
    /// Number of lattice axes
    pub fn dimension(&self) -> usize {
        self.shape.len()
    }

    /// Check dimensional consistency and numeric sanity.
    pub fn validate(&self) -> Result<()> {
        let dim = self.dimension();
        if dim != 2 && dim != 3 {
            return Err(invalid(format!(
                "lattice shape must have 2 or 3 axes, got {}",
                dim
            )));
        }
        if self.shape.iter().any(|&n| n == 0) {
            return Err(invalid(format!(
                "lattice extents must be positive, got {:?}",
                self.shape
            )));
        }

        for (name, point) in [("point_a", &self.point_a), ("point_b", &self.point_b)] {
            if point.len() != dim {
                return Err(invalid(format!(
                    "{} has {} coordinates, lattice has {} axes",
                    name,
                    point.len(),
                    dim
                )));
            }
            if point.iter().zip(&self.shape).any(|(&p, &n)| p >= n) {
                return Err(invalid(format!(
                    "{} {:?} lies outside lattice {:?}",
                    name, point, self.shape
                )));
            }
        }

        let reals = [
            ("peak_curvature", self.peak_curvature),
            ("forcing_amplitude", self.forcing_amplitude),
            ("base_entanglement", self.base_entanglement),
            ("base_decoherence", self.base_decoherence),
            ("base_fidelity", self.base_fidelity),
            ("perturbation_scale", self.perturbation_scale),
            ("sensitivity_factor", self.sensitivity_factor),
            ("feedback_strength", self.feedback_strength),
            ("max_curvature", self.max_curvature),
            ("diffusion_rate", self.diffusion_rate),
            ("threshold", self.threshold),
            ("perturbation_magnitude", self.perturbation_magnitude),
        ];
        if let Some((name, value)) = reals.iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!("{} must be finite, got {}", name, value)));
        }

        // These feed uniform ranges [-x, x] and the clamp bound
        let non_negative = [
            ("forcing_amplitude", self.forcing_amplitude),
            ("perturbation_magnitude", self.perturbation_magnitude),
            ("max_curvature", self.max_curvature),
        ];
        if let Some((name, value)) = non_negative.iter().find(|(_, v)| *v < 0.0) {
            return Err(invalid(format!(
                "{} must be non-negative, got {}",
                name, value
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulationError;

    #[test]
    fn test_default_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_rank() {
        let config = SimulationConfig {
            shape: vec![10],
            point_a: vec![0],
            point_b: vec![5],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_endpoint_mismatch() {
        let config = SimulationConfig {
            shape: vec![10, 10, 10],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_bounds_endpoint() {
        let config = SimulationConfig {
            point_b: vec![50, 10],
            ..Default::default()
        };
        assert!(config.validate().is_err(), "index 50 is outside a 50-wide axis");
    }

    #[test]
    fn test_rejects_non_finite() {
        let config = SimulationConfig {
            forcing_amplitude: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            perturbation_magnitude: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
