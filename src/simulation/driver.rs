//! Temporal evolution of the curvature field.
//!
//! One timestep, in order:
//! 1. sinusoidal + uniform forcing (plus optional external field) per path step
//! 2. forcing added at path cells, touched cells clamped
//! 3. diffusion
//! 4. threshold redistribution
//! 5. clamp to `[0, max_curvature]`
//! 6. random perturbation
//! 7. property derivation (plane z = 0 in 3D)
//! 8. optional Gaussian noise on entanglement
//! 9. optional entanglement feedback into the field, then clamp
//! 10. path means appended to the history

use std::borrow::Cow;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::config::{
    SimulationConfig, ENTANGLEMENT_NOISE_SIGMA, EXTERNAL_FIELD_AMPLITUDE,
    HIGH_CURVATURE_THRESHOLD, PROGRESS_INTERVAL,
};
use crate::error::{invalid, Result};
use crate::simulation::history::{HistoryRecorder, StepSummary};
use crate::simulation::lattice::{initialize_lattice, sensitivity_grid, Lattice};
use crate::simulation::path::{build_path, Path};
use crate::simulation::properties::{derive_properties, mean, PropertyParams, PropertyTriples};
use crate::simulation::stencil::Stencil;
use crate::simulation::transforms::{clamp_in_place, diffuse, perturb, redistribute_excess};

/// Shared flag polled between timesteps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Emitted every [`PROGRESS_INTERVAL`] timesteps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressRecord {
    pub timestep: usize,
    pub means: StepSummary,
}

/// Observations over the final lattice. Never alters it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalReport {
    pub cells_above_threshold: usize,
    pub high_curvature_detected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Cancelled { completed_steps: usize },
    /// Nothing to simulate; outputs are empty
    EmptyPath,
}

/// Everything a run hands to downstream consumers
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub lattice: Lattice,
    pub history: HistoryRecorder,
    /// Properties of the seeded lattice, before any timestep
    pub initial_properties: PropertyTriples,
    pub status: RunStatus,
    /// `None` for an empty path
    pub report: Option<FinalReport>,
}

/// Owns the lattice for the duration of one run.
pub struct Simulation {
    config: SimulationConfig,
    stencil: Stencil,
    params: PropertyParams,
    path: Path,
    /// Path used for property sampling: the 2D projection in 3D runs
    sample_path: Path,
    sensitivity: Lattice,
    sample_sensitivity: Lattice,
    lattice: Lattice,
}

impl Simulation {
    /// Validate the configuration and build path, lattice and sensitivity.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let path = build_path(&config.point_a, &config.point_b, config.dimension())?;
        Self::with_path(config, path)
    }

    /// Like [`Simulation::new`] but with a caller-supplied path, which may
    /// be empty.
    pub fn with_path(config: SimulationConfig, path: Path) -> Result<Self> {
        config.validate()?;
        let stencil = Stencil::for_dimension(config.dimension()).ok_or_else(|| {
            invalid(format!("no stencil for {} dimensions", config.dimension()))
        })?;
        if path.dimension() != stencil.dimension() {
            return Err(invalid(format!(
                "{}D path cannot drive a {}D lattice",
                path.dimension(),
                stencil.dimension()
            )));
        }
        let lattice = initialize_lattice(&config.shape, &path, config.peak_curvature)?;
        let sensitivity = sensitivity_grid(&config.shape, config.sensitivity_factor);

        let sample_path = path.project_2d();
        let sample_sensitivity = sensitivity.plane(0);

        let params = PropertyParams {
            base_entanglement: config.base_entanglement,
            base_decoherence: config.base_decoherence,
            base_fidelity: config.base_fidelity,
            perturbation_scale: config.perturbation_scale,
            mode: config.response_mode,
        };

        Ok(Self {
            config,
            stencil,
            params,
            path,
            sample_path,
            sensitivity,
            sample_sensitivity,
            lattice,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn sensitivity(&self) -> &Lattice {
        &self.sensitivity
    }

    /// Property triples of the current lattice.
    ///
    /// 3D lattices are sampled on the plane at index 0 of the third axis.
    pub fn derive_current(&self) -> PropertyTriples {
        let plane = if self.lattice.dimension() > 2 {
            Cow::Owned(self.lattice.plane(0))
        } else {
            Cow::Borrowed(&self.lattice)
        };
        derive_properties(&plane, &self.sample_path, &self.sample_sensitivity, &self.params)
    }

    /// Advance one timestep and return its path means.
    pub fn step<R: Rng + ?Sized>(&mut self, t: usize, rng: &mut R) -> StepSummary {
        let cfg = &self.config;
        let period = cfg.timesteps.max(1) as f64;
        let phase = (2.0 * PI * t as f64 / period).sin();
        let amplitude = cfg.forcing_amplitude;

        let mut field = self.lattice.clone();
        for coord in self.path.iter() {
            let mut forcing = amplitude * phase + rng.gen_range(-amplitude..=amplitude);
            if cfg.external_field {
                forcing += EXTERNAL_FIELD_AMPLITUDE * phase;
            }
            let i = field.offset(coord);
            let cell = &mut field.values_mut()[i];
            *cell = (*cell + forcing).clamp(0.0, cfg.max_curvature);
        }
        log::debug!("t={} forcing phase {:.4}", t, amplitude * phase);

        let field = diffuse(&field, &self.stencil, cfg.boundary_mode, cfg.diffusion_rate);
        let mut field = redistribute_excess(&field, &self.stencil, cfg.boundary_mode, cfg.threshold);
        clamp_in_place(&mut field, 0.0, cfg.max_curvature);
        self.lattice = perturb(&field, cfg.perturbation_magnitude, rng);

        let mut triples = self.derive_current();
        let cfg = &self.config;

        if cfg.noise_injection {
            for value in triples.entanglement.iter_mut() {
                let noise: f64 = rng.sample(StandardNormal);
                *value += noise * ENTANGLEMENT_NOISE_SIGMA;
            }
        }

        if cfg.feedback {
            for (coord, &e) in self.path.iter().zip(&triples.entanglement) {
                let i = self.lattice.offset(coord);
                self.lattice.values_mut()[i] += cfg.feedback_strength * e;
            }
            clamp_in_place(&mut self.lattice, 0.0, cfg.max_curvature);
        }

        let curvature: Vec<f64> = self.path.iter().map(|c| self.lattice.get(c)).collect();
        let (entanglement, decoherence, fidelity) = triples.means();
        StepSummary {
            entanglement,
            decoherence,
            fidelity,
            curvature: mean(&curvature),
        }
    }

    /// Run every configured timestep, logging progress records.
    pub fn run<R: Rng + ?Sized>(self, rng: &mut R, cancel: &CancelToken) -> RunOutcome {
        self.run_with_observer(rng, cancel, |record| {
            log::info!(
                "t={} entanglement={:.5} decoherence={:.5} fidelity={:.5} curvature={:.5}",
                record.timestep,
                record.means.entanglement,
                record.means.decoherence,
                record.means.fidelity,
                record.means.curvature,
            );
        })
    }

    /// Run every configured timestep, handing progress records to `observer`.
    ///
    /// Cancellation is checked before each timestep, so the returned history
    /// always matches the returned lattice.
    pub fn run_with_observer<R, F>(
        mut self,
        rng: &mut R,
        cancel: &CancelToken,
        mut observer: F,
    ) -> RunOutcome
    where
        R: Rng + ?Sized,
        F: FnMut(&ProgressRecord),
    {
        if self.path.is_empty() {
            log::warn!("Empty path, nothing to simulate");
            return RunOutcome {
                lattice: self.lattice,
                history: HistoryRecorder::new(),
                initial_properties: PropertyTriples::default(),
                status: RunStatus::EmptyPath,
                report: None,
            };
        }

        let timesteps = self.config.timesteps;
        log::info!(
            "Running {} timesteps on lattice {:?}, path length {}",
            timesteps,
            self.lattice.shape(),
            self.path.len()
        );

        let initial_properties = self.derive_current();
        let mut history = HistoryRecorder::with_capacity(timesteps);
        let mut status = RunStatus::Completed;

        for t in 0..timesteps {
            if cancel.is_cancelled() {
                log::warn!("Cancelled after {} of {} timesteps", t, timesteps);
                status = RunStatus::Cancelled { completed_steps: t };
                break;
            }

            let summary = self.step(t, rng);
            history.record(summary);

            if t % PROGRESS_INTERVAL == 0 {
                observer(&ProgressRecord {
                    timestep: t,
                    means: history.running_means(),
                });
            }
        }

        let report = self.final_report();
        log::info!(
            "{} cells above threshold {}, high curvature {}",
            report.cells_above_threshold,
            self.config.threshold,
            if report.high_curvature_detected { "detected" } else { "not detected" }
        );

        RunOutcome {
            lattice: self.lattice,
            history,
            initial_properties,
            status,
            report: Some(report),
        }
    }

    fn final_report(&self) -> FinalReport {
        let values = self.lattice.values();
        FinalReport {
            cells_above_threshold: values.iter().filter(|&&v| v > self.config.threshold).count(),
            high_curvature_detected: values.iter().any(|&v| v > HIGH_CURVATURE_THRESHOLD),
        }
    }
}
