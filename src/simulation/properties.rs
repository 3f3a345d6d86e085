use std::fmt;
use std::str::FromStr;

use crate::error::SimulationError;
use crate::simulation::lattice::Lattice;
use crate::simulation::path::Path;

/// Response law mapping curvature to entanglement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    #[default]
    Linear,
    Quadratic,
    Exponential,
}

impl ResponseMode {
    pub fn name(&self) -> &'static str {
        match self {
            ResponseMode::Linear => "linear",
            ResponseMode::Quadratic => "quadratic",
            ResponseMode::Exponential => "exponential",
        }
    }

    /// Parse a selector, falling back to `linear` with a warning.
    pub fn from_name_or_linear(name: &str) -> Self {
        name.parse().unwrap_or_else(|e: SimulationError| {
            log::warn!("{}, falling back to linear response", e);
            ResponseMode::Linear
        })
    }

    /// `base + scale * f(curvature)`
    pub fn respond(&self, base: f64, scale: f64, curvature: f64) -> f64 {
        match self {
            ResponseMode::Linear => base + scale * curvature,
            ResponseMode::Quadratic => base + scale * curvature.powi(2),
            ResponseMode::Exponential => base + scale * (curvature.exp() - 1.0),
        }
    }
}

impl FromStr for ResponseMode {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(ResponseMode::Linear),
            "quadratic" => Ok(ResponseMode::Quadratic),
            "exponential" => Ok(ResponseMode::Exponential),
            _ => Err(SimulationError::UnrecognizedMode {
                kind: "response",
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Baselines and gains of the three derived properties
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyParams {
    pub base_entanglement: f64,
    pub base_decoherence: f64,
    pub base_fidelity: f64,
    pub perturbation_scale: f64,
    pub mode: ResponseMode,
}

/// Entanglement, decoherence and fidelity per path step, in path order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyTriples {
    pub entanglement: Vec<f64>,
    pub decoherence: Vec<f64>,
    pub fidelity: Vec<f64>,
}

impl PropertyTriples {
    pub fn len(&self) -> usize {
        self.entanglement.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entanglement.is_empty()
    }

    /// Means of (entanglement, decoherence, fidelity); zeros when empty
    pub fn means(&self) -> (f64, f64, f64) {
        (
            mean(&self.entanglement),
            mean(&self.decoherence),
            mean(&self.fidelity),
        )
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Derive the property triple at every path step.
///
/// `field`, `sensitivity` and `path` must share a dimension and every path
/// step must lie inside the field.
pub fn derive_properties(
    field: &Lattice,
    path: &Path,
    sensitivity: &Lattice,
    params: &PropertyParams,
) -> PropertyTriples {
    let mut triples = PropertyTriples {
        entanglement: Vec::with_capacity(path.len()),
        decoherence: Vec::with_capacity(path.len()),
        fidelity: Vec::with_capacity(path.len()),
    };

    for coord in path.iter() {
        let curvature = field.get(coord);
        let weight = sensitivity.get(coord) * curvature.abs();
        triples.entanglement.push(params.mode.respond(
            params.base_entanglement,
            params.perturbation_scale,
            curvature,
        ));
        triples.decoherence.push(params.base_decoherence + weight);
        triples.fidelity.push((params.base_fidelity - weight).clamp(0.0, 1.0));
    }

    triples
}
