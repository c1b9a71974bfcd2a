//! Reconciliation of registry pools against hosted solver deployments
//!
//! Desired state is "every pool has a registered worker". Pools without one
//! are unserved; an unserved pool whose deterministic deployment name is not
//! in the directory gets a new deployment, provided its liquidity passes the
//! balance gate. The pass is level-triggered: anything skipped or failed here
//! is simply evaluated again on the next pass.

use std::collections::HashSet;
use std::sync::Arc;

use shared::{fleet_debug, fleet_error, fleet_info, Component, Deployment, DeploymentName, Pool, PoolId};

use crate::config::ReconcilerConfig;
use crate::core::deployment::SolverDeploymentParams;
use crate::core::gate::{BalanceGate, GateDecision};
use crate::core::paging::WorkerPager;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::{DeploymentDirectory, RegistryClient};

/// Why an unserved pool was left alone this pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyDeployed,
    InsufficientPoolBalance,
    PoolNotFound,
}

/// Result of evaluating one unserved pool
#[derive(Debug)]
pub enum PoolOutcome {
    Deployed { pool_id: PoolId, deployment: Deployment },
    Skipped { pool_id: PoolId, reason: SkipReason },
    Failed { pool_id: PoolId, error: OrchestratorError },
}

impl PoolOutcome {
    pub fn pool_id(&self) -> PoolId {
        match self {
            PoolOutcome::Deployed { pool_id, .. }
            | PoolOutcome::Skipped { pool_id, .. }
            | PoolOutcome::Failed { pool_id, .. } => *pool_id,
        }
    }
}

/// Summary of one reconcile pass
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Pools without a registered worker, in registry order
    pub unserved: Vec<PoolId>,
    pub outcomes: Vec<PoolOutcome>,
}

impl ReconcileReport {
    pub fn deployed(&self) -> impl Iterator<Item = &Deployment> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            PoolOutcome::Deployed { deployment, .. } => Some(deployment),
            _ => None,
        })
    }

    pub fn deployed_count(&self) -> usize {
        self.deployed().count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, PoolOutcome::Failed { .. }))
            .count()
    }

    pub fn skipped(&self, reason: SkipReason) -> Vec<PoolId> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                PoolOutcome::Skipped { pool_id, reason: r } if *r == reason => Some(*pool_id),
                _ => None,
            })
            .collect()
    }
}

pub struct Reconciler<R, D>
where
    R: RegistryClient + 'static,
    D: DeploymentDirectory + 'static,
{
    registry: Arc<R>,
    directory: Arc<D>,
    gate: BalanceGate,
    pager: WorkerPager,
}

impl<R, D> Reconciler<R, D>
where
    R: RegistryClient + 'static,
    D: DeploymentDirectory + 'static,
{
    pub fn new(registry: Arc<R>, directory: Arc<D>, config: &ReconcilerConfig) -> Self {
        Self {
            registry,
            directory,
            gate: config.gate.clone(),
            pager: WorkerPager::new(config.worker_page_size),
        }
    }

    /// Run one reconcile pass
    ///
    /// An `Err` means the pass could not establish desired or actual state
    /// (registry or directory unavailable, incomplete worker enumeration).
    /// Per-pool failures are reported in the returned outcomes instead.
    pub async fn reconcile(&self) -> OrchestratorResult<ReconcileReport> {
        fleet_info!(Component::Reconciler, "---- Reconciling solver deployments ----");

        let pool_ids = self.registry.list_pools().await?;
        let workers = self.pager.collect_all(self.registry.as_ref()).await?;
        let served: HashSet<PoolId> = workers.iter().map(|worker| worker.pool_id).collect();

        let unserved: Vec<PoolId> = pool_ids.into_iter().filter(|id| !served.contains(id)).collect();
        fleet_info!(
            Component::Reconciler,
            "Found {} pools without workers: {:?}",
            unserved.len(),
            unserved.iter().map(|id| id.0).collect::<Vec<_>>()
        );

        let mut report = ReconcileReport {
            unserved: unserved.clone(),
            outcomes: Vec::with_capacity(unserved.len()),
        };
        if unserved.is_empty() {
            return Ok(report);
        }

        let existing: HashSet<DeploymentName> = self
            .directory
            .list_deployments()
            .await?
            .into_iter()
            .map(|deployment| deployment.name)
            .collect();

        for pool_id in unserved {
            let name = DeploymentName::for_pool(pool_id);
            if existing.contains(&name) {
                fleet_debug!(Component::Reconciler, "Pool {} already has deployment {}", pool_id, name);
                report.outcomes.push(PoolOutcome::Skipped {
                    pool_id,
                    reason: SkipReason::AlreadyDeployed,
                });
                continue;
            }

            let outcome = match self.provision(pool_id).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    fleet_error!(Component::Reconciler, "❌ Failed to deploy solver for pool {}: {}", pool_id, error);
                    PoolOutcome::Failed { pool_id, error }
                }
            };
            report.outcomes.push(outcome);
        }

        fleet_info!(
            Component::Reconciler,
            "Reconcile pass finished: {} deployed, {} failed",
            report.deployed_count(),
            report.failure_count()
        );
        Ok(report)
    }

    async fn provision(&self, pool_id: PoolId) -> OrchestratorResult<PoolOutcome> {
        let Some(pool) = self.registry.get_pool(pool_id).await? else {
            return Ok(PoolOutcome::Skipped {
                pool_id,
                reason: SkipReason::PoolNotFound,
            });
        };

        match self.check_gate(&pool).await? {
            GateDecision::Pass { token_id, balance } => {
                fleet_debug!(Component::Reconciler, "Pool {} qualifies with {} {}", pool_id, balance, token_id);
            }
            GateDecision::Fail => {
                fleet_info!(Component::Reconciler, "Pool {} lacks liquidity, skipping this pass", pool_id);
                return Ok(PoolOutcome::Skipped {
                    pool_id,
                    reason: SkipReason::InsufficientPoolBalance,
                });
            }
        }

        fleet_info!(
            Component::Reconciler,
            "Deploying solver for pool {} ({:?}, fee {} bps)",
            pool_id,
            pool.token_ids.iter().map(|t| t.0.as_str()).collect::<Vec<_>>(),
            pool.fee
        );
        let deployment = self.create_solver_deployment(&pool).await?;
        Ok(PoolOutcome::Deployed { pool_id, deployment })
    }

    async fn check_gate(&self, pool: &Pool) -> OrchestratorResult<GateDecision> {
        let balances = self.registry.pool_balances(pool.id, &pool.token_ids).await?;
        if balances.len() != pool.token_ids.len() {
            return Err(OrchestratorError::malformed(
                "pool_balances",
                format!("expected {} balances, got {}", pool.token_ids.len(), balances.len()),
            ));
        }

        let paired: Vec<_> = pool.token_ids.iter().cloned().zip(balances).collect();
        Ok(self.gate.evaluate(&paired))
    }

    /// Validate the pool's deployment parameters and create its solver
    ///
    /// Validation failures return before the hosting platform is contacted.
    pub async fn create_solver_deployment(&self, pool: &Pool) -> OrchestratorResult<Deployment> {
        let params = SolverDeploymentParams::new(pool.id, &pool.token_ids, i64::from(pool.fee))?;
        let name = DeploymentName::for_pool(pool.id);
        self.directory.create_deployment(&name, &params).await
    }
}
