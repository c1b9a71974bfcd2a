//! Entry point for the solver supervisor binary
//!
//! Wires the real NEAR, hosting and transfer clients into the scheduler.

use std::sync::Arc;

use clap::Parser;
use tokio::signal;

use orchestrator::{
    core::{FundingSupervisor, Reconciler, Scheduler},
    services::{RealDeploymentDirectory, RealFundsTransfer, RealRegistryClient, SolverEnvironment},
    Args, OrchestratorResult, SupervisorConfig,
};
use shared::{fleet_debug, fleet_error, fleet_info, logging, Component};

#[tokio::main]
async fn main() -> OrchestratorResult<()> {
    // Values in .env never override the real environment
    let _ = dotenv::dotenv();

    let args = Args::parse();
    logging::init_tracing(&args.log_level, args.log_json);

    let config = match SupervisorConfig::from_args(&args) {
        Ok(config) => config,
        Err(error) => {
            logging::log_error(Component::Supervisor, "Configuration", &error);
            return Err(error);
        }
    };

    logging::log_startup(Component::Supervisor, "solver fleet supervisor");
    fleet_info!(
        Component::Supervisor,
        "Network: {}, registry: {}, intents: {}, operator: {}",
        config.near.network,
        config.near.solver_registry_contract,
        config.near.intents_contract,
        config.funding.operator
    );
    fleet_debug!(Component::Supervisor, "Schedule: {:?}", config.schedule);

    // Initialize services
    let registry = Arc::new(RealRegistryClient::from_config(&config.near));
    let directory = Arc::new(RealDeploymentDirectory::new(
        &config.hosting,
        SolverEnvironment::from_config(&config.near),
    ));
    let transfer = Arc::new(RealFundsTransfer::from_config(&config.near, config.funding.operator.clone())?);

    directory.setup_auth().await?;

    let reconciler = Reconciler::new(registry.clone(), directory.clone(), &config.reconciler);
    let funding = FundingSupervisor::new(registry, directory, transfer, &config.funding);
    let mut scheduler = Scheduler::new(reconciler, funding, config.schedule.clone());

    if config.once {
        let (reconcile, funding) = scheduler.run_once().await;
        let report = reconcile?;
        fleet_info!(
            Component::Supervisor,
            "Single pass complete: {} unserved pools, {} deployed, {} funded, {} funding failures",
            report.unserved.len(),
            report.deployed_count(),
            funding.funded_count(),
            funding.failure_count()
        );
        return Ok(());
    }

    // Set up graceful shutdown
    let shutdown_sender = scheduler.get_shutdown_sender();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                logging::log_shutdown(Component::Supervisor, "Received Ctrl+C signal");
                let _ = shutdown_sender.send(()).await;
            }
            Err(err) => {
                fleet_error!(Component::Supervisor, "Signal handling failed: {}", err);
            }
        }
    });

    scheduler.run().await?;

    logging::log_success(Component::Supervisor, "Supervisor stopped gracefully");
    Ok(())
}
