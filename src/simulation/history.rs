use crate::simulation::properties::mean;

/// Path-averaged statistics of one completed timestep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSummary {
    pub entanglement: f64,
    pub decoherence: f64,
    pub fidelity: f64,
    pub curvature: f64,
}

/// Four parallel, append-only sequences with one entry per completed
/// timestep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryRecorder {
    entanglement: Vec<f64>,
    decoherence: Vec<f64>,
    fidelity: Vec<f64>,
    curvature: Vec<f64>,
}

impl HistoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(timesteps: usize) -> Self {
        Self {
            entanglement: Vec::with_capacity(timesteps),
            decoherence: Vec::with_capacity(timesteps),
            fidelity: Vec::with_capacity(timesteps),
            curvature: Vec::with_capacity(timesteps),
        }
    }

    /// Append all four values of a timestep together.
    pub fn record(&mut self, summary: StepSummary) {
        self.entanglement.push(summary.entanglement);
        self.decoherence.push(summary.decoherence);
        self.fidelity.push(summary.fidelity);
        self.curvature.push(summary.curvature);
    }

    pub fn len(&self) -> usize {
        self.curvature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curvature.is_empty()
    }

    pub fn entanglement(&self) -> &[f64] {
        &self.entanglement
    }

    pub fn decoherence(&self) -> &[f64] {
        &self.decoherence
    }

    pub fn fidelity(&self) -> &[f64] {
        &self.fidelity
    }

    pub fn curvature(&self) -> &[f64] {
        &self.curvature
    }

    /// (entanglement, decoherence, fidelity, curvature)
    pub fn sequences(&self) -> [&[f64]; 4] {
        [
            &self.entanglement,
            &self.decoherence,
            &self.fidelity,
            &self.curvature,
        ]
    }

    pub fn last(&self) -> Option<StepSummary> {
        let i = self.len().checked_sub(1)?;
        Some(StepSummary {
            entanglement: self.entanglement[i],
            decoherence: self.decoherence[i],
            fidelity: self.fidelity[i],
            curvature: self.curvature[i],
        })
    }

    /// Mean of every sequence over all recorded timesteps
    pub fn running_means(&self) -> StepSummary {
        StepSummary {
            entanglement: mean(&self.entanglement),
            decoherence: mean(&self.decoherence),
            fidelity: mean(&self.fidelity),
            curvature: mean(&self.curvature),
        }
    }
}
