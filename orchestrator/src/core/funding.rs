//! Funding of freshly deployed solvers
//!
//! A solver generates its own account inside the enclave and needs native
//! currency to pay for its registration transaction. Each pass resolves that
//! account for every deployment and tops it up once: registered workers never
//! need funding again, and a non-zero balance on an unregistered account means
//! registration is still pending.

use std::sync::Arc;

use shared::{fleet_error, fleet_info, AccountId, Balance, Component, Deployment, DeploymentName};

use crate::config::FundingConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::{DeploymentDirectory, FundsTransfer, RegistryClient, TransferReceipt};

/// What a funding pass observed and did for one deployment
#[derive(Debug)]
pub enum FundingOutcome {
    AlreadyRegistered { address: AccountId },
    Funded { address: AccountId, receipt: TransferReceipt },
    AwaitingRegistration { address: AccountId, balance: Balance },
    Failed { error: OrchestratorError },
}

#[derive(Debug)]
pub struct DeploymentFunding {
    pub deployment: DeploymentName,
    pub outcome: FundingOutcome,
}

/// Summary of one funding pass
#[derive(Debug, Default)]
pub struct FundingReport {
    pub deployments: Vec<DeploymentFunding>,
    /// Set when the deployment directory itself could not be listed
    pub listing_error: Option<String>,
}

impl FundingReport {
    /// Failures that warrant another pass
    pub fn failure_count(&self) -> usize {
        let item_failures = self
            .deployments
            .iter()
            .filter(|entry| matches!(entry.outcome, FundingOutcome::Failed { .. }))
            .count();
        item_failures + usize::from(self.listing_error.is_some())
    }

    pub fn funded_count(&self) -> usize {
        self.deployments
            .iter()
            .filter(|entry| matches!(entry.outcome, FundingOutcome::Funded { .. }))
            .count()
    }
}

pub struct FundingSupervisor<R, D, F>
where
    R: RegistryClient + 'static,
    D: DeploymentDirectory + 'static,
    F: FundsTransfer + 'static,
{
    registry: Arc<R>,
    directory: Arc<D>,
    transfer: Arc<F>,
    operator: AccountId,
    minimum_balance: Balance,
}

impl<R, D, F> FundingSupervisor<R, D, F>
where
    R: RegistryClient + 'static,
    D: DeploymentDirectory + 'static,
    F: FundsTransfer + 'static,
{
    pub fn new(registry: Arc<R>, directory: Arc<D>, transfer: Arc<F>, config: &FundingConfig) -> Self {
        Self {
            registry,
            directory,
            transfer,
            operator: config.operator.clone(),
            minimum_balance: config.minimum_balance,
        }
    }

    /// Run one funding pass over every known deployment
    pub async fn fund_all(&self) -> FundingReport {
        fleet_info!(Component::Funding, "---- Funding solvers ----");

        let deployments = match self.directory.list_deployments().await {
            Ok(deployments) => deployments,
            Err(error) => {
                fleet_error!(Component::Funding, "❌ Failed to list solver deployments: {}", error);
                return FundingReport {
                    deployments: Vec::new(),
                    listing_error: Some(error.to_string()),
                };
            }
        };
        fleet_info!(Component::Funding, "Found {} solver deployments", deployments.len());

        let mut report = FundingReport::default();
        for deployment in deployments {
            let outcome = match self.fund_deployment(&deployment).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    fleet_error!(Component::Funding, "❌ Failed to fund {}: {}", deployment.name, error);
                    FundingOutcome::Failed { error }
                }
            };
            report.deployments.push(DeploymentFunding {
                deployment: deployment.name,
                outcome,
            });
        }

        let failures = report.failure_count();
        if failures > 0 {
            fleet_error!(Component::Funding, "Failed to fund {} solver deployments", failures);
        }
        report
    }

    async fn fund_deployment(&self, deployment: &Deployment) -> OrchestratorResult<FundingOutcome> {
        let endpoint = self.directory.resolve_endpoint(deployment)?;
        let address = self.directory.query_runtime_address(&endpoint).await?;

        if let Some(worker) = self.registry.get_worker(&address).await? {
            fleet_info!(
                Component::Funding,
                "Worker {} already registered for pool {}",
                address,
                worker.pool_id
            );
            return Ok(FundingOutcome::AlreadyRegistered { address });
        }

        let balance = self.transfer.get_native_balance(&address).await?;
        fleet_info!(Component::Funding, "Solver {} balance: {}", address, balance);
        if !balance.is_zero() {
            return Ok(FundingOutcome::AwaitingRegistration { address, balance });
        }

        fleet_info!(Component::Funding, "Funding solver {} with {}", address, self.minimum_balance);
        let receipt = self
            .transfer
            .transfer_native(&self.operator, &address, self.minimum_balance)
            .await?;
        fleet_info!(Component::Funding, "✅ Funded {} in transaction {}", address, receipt.tx_hash);

        Ok(FundingOutcome::Funded { address, receipt })
    }
}
