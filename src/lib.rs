//! Curvature field evolution on a 2D or 3D lattice.
//!
//! A localized seed along a straight path is forced, diffused, capped and
//! perturbed every timestep while entanglement, decoherence and fidelity are
//! derived along the path and recorded as per-step means.

pub mod config;
pub mod error;
pub mod simulation;

pub use config::SimulationConfig;
pub use error::{Result, SimulationError};
pub use simulation::{CancelToken, RunOutcome, RunStatus, Simulation};
