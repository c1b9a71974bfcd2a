//! Timer chain driving the reconcile and funding passes
//!
//! Both passes run on one task. Each timer is re-armed only after the pass it
//! triggered has completed, so two passes of the same kind never overlap.
//! Reconcile re-arms unconditionally every poll interval; funding is armed by
//! successful deployments and re-armed only while a pass reports failures.

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use shared::{fleet_error, fleet_info, fleet_warn, logging, Component};

use crate::config::ScheduleConfig;
use crate::core::funding::{FundingReport, FundingSupervisor};
use crate::core::reconciler::{ReconcileReport, Reconciler};
use crate::error::OrchestratorResult;
use crate::traits::{DeploymentDirectory, FundsTransfer, RegistryClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingFunding {
    due: Instant,
    /// Consecutive failed passes leading up to this one
    retries: u32,
}

async fn wait_until(due: Option<Instant>) {
    match due {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

pub struct Scheduler<R, D, F>
where
    R: RegistryClient + 'static,
    D: DeploymentDirectory + 'static,
    F: FundsTransfer + 'static,
{
    reconciler: Reconciler<R, D>,
    funding: FundingSupervisor<R, D, F>,
    schedule: ScheduleConfig,

    /// Shutdown signal
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl<R, D, F> Scheduler<R, D, F>
where
    R: RegistryClient + 'static,
    D: DeploymentDirectory + 'static,
    F: FundsTransfer + 'static,
{
    pub fn new(reconciler: Reconciler<R, D>, funding: FundingSupervisor<R, D, F>, schedule: ScheduleConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        Self {
            reconciler,
            funding,
            schedule,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Sender that stops `run` after the pass in progress completes
    pub fn get_shutdown_sender(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run one reconcile pass followed by one funding pass
    pub async fn run_once(&self) -> (OrchestratorResult<ReconcileReport>, FundingReport) {
        let reconcile = self.reconciler.reconcile().await;
        let funding = self.funding.fund_all().await;
        (reconcile, funding)
    }

    /// Main loop, runs until a shutdown signal arrives
    pub async fn run(&mut self) -> OrchestratorResult<()> {
        logging::log_startup(Component::Supervisor, "solver fleet supervisor loop");

        let mut next_reconcile = Instant::now();
        let mut pending_funding = self.schedule.fund_on_startup.then(|| PendingFunding {
            due: Instant::now(),
            retries: 0,
        });

        loop {
            let funding_due = pending_funding.map(|pending| pending.due);

            tokio::select! {
                biased;

                Some(_) = self.shutdown_rx.recv() => {
                    logging::log_shutdown(Component::Supervisor, "shutdown requested");
                    break;
                }

                _ = sleep_until(next_reconcile) => {
                    if self.run_reconcile_pass().await > 0 {
                        pending_funding = Some(PendingFunding {
                            due: Instant::now() + self.schedule.funding_delay,
                            retries: 0,
                        });
                    }
                    next_reconcile = Instant::now() + self.schedule.poll_interval;
                }

                _ = wait_until(funding_due) => {
                    let retries = pending_funding.take().map(|pending| pending.retries).unwrap_or(0);
                    pending_funding = self.run_funding_pass(retries).await;
                }
            }
        }

        Ok(())
    }

    /// Returns the number of deployments created
    async fn run_reconcile_pass(&self) -> usize {
        match self.reconciler.reconcile().await {
            Ok(report) => {
                let deployed = report.deployed_count();
                if deployed > 0 {
                    fleet_info!(
                        Component::Supervisor,
                        "Scheduling funding pass in {}s for {} new deployments",
                        self.schedule.funding_delay.as_secs(),
                        deployed
                    );
                }
                deployed
            }
            Err(error) => {
                fleet_error!(
                    Component::Supervisor,
                    "⚠️ Reconcile pass failed: {}. Will retry in {}s",
                    error,
                    self.schedule.poll_interval.as_secs()
                );
                0
            }
        }
    }

    /// Returns the next funding pass to arm, if any
    async fn run_funding_pass(&self, retries: u32) -> Option<PendingFunding> {
        let report = self.funding.fund_all().await;
        let failures = report.failure_count();
        if failures == 0 {
            logging::log_success(Component::Funding, "Funding pass completed without failures");
            return None;
        }

        if let Some(max) = self.schedule.max_funding_retries {
            if retries >= max {
                fleet_error!(
                    Component::Supervisor,
                    "Giving up on funding after {} retries; {} deployments still failing",
                    retries,
                    failures
                );
                return None;
            }
        }

        fleet_warn!(
            Component::Supervisor,
            "Retrying funding in {}s ({} failures)",
            self.schedule.funding_retry_delay.as_secs(),
            failures
        );
        Some(PendingFunding {
            due: Instant::now() + self.schedule.funding_retry_delay,
            retries: retries + 1,
        })
    }
}
