use anyhow::Result;
use tracing_subscriber::{prelude::*, EnvFilter};

use railsim_core::{build_events, Generator, GeneratorConfig, Simulation, TrackRegistry};

const ROUTES: usize = 200;
const SCHEDULES: usize = 250;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    tracing::info!("starting train simulation with track availability");

    let generator = Generator::new(GeneratorConfig::default())?;
    let mut rng = rand::rng();
    let (routes, schedules) = generator.fleet(&mut rng, ROUTES, SCHEDULES);

    let events = build_events(&schedules);
    let registry = TrackRegistry::for_routes(&routes);
    tracing::info!(
        "simulating {} events over {} routes",
        events.len(),
        registry.len()
    );

    let report = Simulation::new().run(events, &registry).await;
    tracing::info!("simulation complete: {} events executed", report.holds.len());

    Ok(())
}

fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();
}
