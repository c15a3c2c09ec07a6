use chrono::Utc;
use clap::Parser;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cert_rotation_check::certs::RotationSimulator;
use cert_rotation_check::cli::Cli;
use cert_rotation_check::report::Reporter;
use cert_rotation_check::{
    CONFIG_ERROR_EXIT_CODE, Result, SIMULATION_COMPLETE_EXIT_CODE, config,
};

fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing; stdout is reserved for reports
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cert_rotation_check=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => process::exit(SIMULATION_COMPLETE_EXIT_CODE),
        Err(e) => {
            tracing::error!("{}", e);
            process::exit(CONFIG_ERROR_EXIT_CODE);
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let raw = config::load_config_with_fallback(cli.config.as_deref())?
        .unwrap_or_default()
        .merge(cli.schedule_overrides());

    let schedule = raw.resolve()?;
    let iterations = raw.iterations()?;

    let simulator = RotationSimulator::new(schedule, Utc::now())?;
    simulator.check_horizon(iterations)?;

    let mut reporter = Reporter::new(cli.format);
    reporter.schedule(simulator.config(), simulator.start())?;
    for report in simulator.ticks(iterations) {
        reporter.tick(&report)?;
    }
    reporter.finished(iterations)
}
