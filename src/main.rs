use curvature_lattice::{CancelToken, RunStatus, Simulation, SimulationConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SimulationConfig::default();
    log::info!("Initializing curvature lattice simulation...");
    log::info!(
        "Lattice {:?}, path {:?} -> {:?}, {} timesteps, {} response, {} boundary",
        config.shape,
        config.point_a,
        config.point_b,
        config.timesteps,
        config.response_mode,
        config.boundary_mode
    );

    let simulation = match Simulation::new(config) {
        Ok(simulation) => simulation,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let mut rng = rand::thread_rng();
    let outcome = simulation.run(&mut rng, &CancelToken::new());

    match outcome.status {
        RunStatus::Completed => log::info!("Run complete"),
        RunStatus::Cancelled { completed_steps } => {
            log::info!("Run cancelled after {} timesteps", completed_steps)
        }
        RunStatus::EmptyPath => log::info!("Nothing simulated"),
    }

    if let Some(last) = outcome.history.last() {
        log::info!(
            "Final means: entanglement={:.5} decoherence={:.5} fidelity={:.5} curvature={:.5}",
            last.entanglement,
            last.decoherence,
            last.fidelity,
            last.curvature
        );
    }
    log::info!(
        "Final lattice: min={:.5} max={:.5} ({} bytes)",
        outcome.lattice.min_value(),
        outcome.lattice.max_value(),
        outcome.lattice.as_bytes().len()
    );
}
