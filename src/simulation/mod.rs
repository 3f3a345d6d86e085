mod driver;
mod history;
mod lattice;
mod path;
mod properties;
mod stencil;
pub mod transforms;

pub use driver::{CancelToken, FinalReport, ProgressRecord, RunOutcome, RunStatus, Simulation};
pub use history::{HistoryRecorder, StepSummary};
pub use lattice::{initialize_lattice, sensitivity_grid, Lattice};
pub use path::{build_path, Coord, Path};
pub use properties::{derive_properties, PropertyParams, PropertyTriples, ResponseMode};
pub use stencil::{neighbor_average, BoundaryMode, Stencil};
