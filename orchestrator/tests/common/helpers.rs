//! Mock builders for supervisor tests
//!
//! Each builder produces a mockall mock backed by shared state, so a test can
//! run several passes and observe what the previous ones changed.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use orchestrator::core::{FundingSupervisor, Reconciler, Scheduler};
use orchestrator::config::ScheduleConfig;
use orchestrator::traits::{MockDeploymentDirectory, MockFundsTransfer, MockRegistryClient, TransferReceipt};
use orchestrator::OrchestratorError;
use shared::{AccountId, Balance, Deployment, DeploymentName, Pool, PoolId, Worker};
use url::Url;

use super::fixtures::TestFixtures;

pub type TestReconciler = Reconciler<MockRegistryClient, MockDeploymentDirectory>;
pub type TestFunding = FundingSupervisor<MockRegistryClient, MockDeploymentDirectory, MockFundsTransfer>;
pub type TestScheduler = Scheduler<MockRegistryClient, MockDeploymentDirectory, MockFundsTransfer>;

/// Builder for a registry mock serving fixed pools, balances and workers
#[derive(Default)]
pub struct RegistryBuilder {
    pools: Vec<Pool>,
    balances: HashMap<PoolId, Vec<Balance>>,
    /// Registered workers keyed by the account they were registered under
    workers: Vec<(AccountId, Worker)>,
    missing_pools: Vec<PoolId>,
    failing_pools: HashSet<PoolId>,
    /// Number of `list_pools` calls, i.e. reconcile passes started
    pub list_pools_calls: Arc<AtomicUsize>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(mut self, pool: Pool, balances: Vec<Balance>) -> Self {
        self.balances.insert(pool.id, balances);
        self.pools.push(pool);
        self
    }

    /// Pool id that is enumerated but has no detail
    pub fn with_missing_pool(mut self, pool_id: u32) -> Self {
        self.missing_pools.push(PoolId(pool_id));
        self
    }

    /// Pool whose detail lookup fails
    pub fn with_failing_pool(mut self, pool: Pool) -> Self {
        self.failing_pools.insert(pool.id);
        self.pools.push(pool);
        self
    }

    /// Register a worker for `pool_id` under `account`
    pub fn with_worker(mut self, account: &str, pool_id: u32) -> Self {
        self.workers
            .push((TestFixtures::account(account), TestFixtures::worker(pool_id)));
        self
    }

    pub fn build(self) -> MockRegistryClient {
        let mut mock = MockRegistryClient::new();

        let mut ids: Vec<PoolId> = self.pools.iter().map(|pool| pool.id).collect();
        ids.extend(self.missing_pools.iter().copied());
        ids.sort();
        let calls = self.list_pools_calls.clone();
        mock.expect_list_pools().returning(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(ids.clone())
        });

        let pools = self.pools.clone();
        let failing = self.failing_pools.clone();
        mock.expect_get_pool().returning(move |pool_id| {
            if failing.contains(&pool_id) {
                return Err(OrchestratorError::rpc("get_pool", "node unavailable"));
            }
            Ok(pools.iter().find(|pool| pool.id == pool_id).cloned())
        });

        let balances = self.balances.clone();
        mock.expect_pool_balances().returning(move |pool_id, token_ids| {
            Ok(balances
                .get(&pool_id)
                .cloned()
                .unwrap_or_else(|| vec![Balance::ZERO; token_ids.len()]))
        });

        let worker_len = self.workers.len() as u32;
        mock.expect_worker_len().returning(move || Ok(worker_len));

        let workers = self.workers.clone();
        mock.expect_list_workers().returning(move |offset, limit| {
            Ok(workers
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .map(|(_, worker)| worker.clone())
                .collect())
        });

        let workers = self.workers;
        mock.expect_get_worker().returning(move |account_id| {
            Ok(workers
                .iter()
                .find(|(registered, _)| registered == account_id)
                .map(|(_, worker)| worker.clone()))
        });

        mock
    }
}

/// Builder for a deployment directory mock with an in-memory instance list
///
/// Created deployments get app id `app<pool id>` and report the solver
/// address `TestFixtures::solver_address(app_id)`.
#[derive(Default)]
pub struct DirectoryBuilder {
    existing: Vec<Deployment>,
    fail_listing: bool,
    unreachable: HashSet<String>,
    /// Names passed to `create_deployment`, in call order
    pub created: Arc<Mutex<Vec<DeploymentName>>>,
    pub list_calls: Arc<AtomicUsize>,
}

impl DirectoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deployment(mut self, deployment: Deployment) -> Self {
        self.existing.push(deployment);
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Solver endpoint for `app_id` never answers
    pub fn with_unreachable(mut self, app_id: &str) -> Self {
        self.unreachable.insert(app_id.to_string());
        self
    }

    pub fn build(self) -> MockDeploymentDirectory {
        let mut mock = MockDeploymentDirectory::new();
        let state = Arc::new(Mutex::new(self.existing));

        let listed = state.clone();
        let calls = self.list_calls.clone();
        let fail_listing = self.fail_listing;
        mock.expect_list_deployments().returning(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            if fail_listing {
                return Err(OrchestratorError::HostingError {
                    operation: "list_cvms".to_string(),
                    message: "HTTP 503".to_string(),
                });
            }
            Ok(listed.lock().unwrap().clone())
        });

        let created = self.created.clone();
        mock.expect_create_deployment().returning(move |name, params| {
            created.lock().unwrap().push(name.clone());
            let deployment = Deployment {
                name: name.clone(),
                app_id: Some(format!("app{}", params.pool_id)),
                node_name: "prod7".to_string(),
                status: "starting".to_string(),
            };
            state.lock().unwrap().push(deployment.clone());
            Ok(deployment)
        });

        mock.expect_resolve_endpoint().returning(|deployment| {
            let app_id = deployment.app_id.clone().ok_or_else(|| OrchestratorError::HostingError {
                operation: "resolve_endpoint".to_string(),
                message: format!("{} has no app id yet", deployment.name),
            })?;
            Ok(Url::parse(&format!("https://{}-3000.example.test", app_id)).unwrap())
        });

        let unreachable = self.unreachable;
        mock.expect_query_runtime_address().returning(move |endpoint| {
            let host = endpoint.host_str().unwrap_or_default();
            let app_id = host.split('-').next().unwrap_or_default();
            if unreachable.contains(app_id) {
                return Err(OrchestratorError::EndpointError {
                    endpoint: endpoint.to_string(),
                    message: "connection refused".to_string(),
                });
            }
            Ok(TestFixtures::solver_address(app_id))
        });

        mock
    }
}

/// Builder for a transfer mock; sent funds are credited to the receiver
#[derive(Default)]
pub struct TransferBuilder {
    balances: HashMap<AccountId, Balance>,
    fail_transfers: bool,
    pub transfers: Arc<Mutex<Vec<(AccountId, Balance)>>>,
}

impl TransferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, account_id: AccountId, balance: Balance) -> Self {
        self.balances.insert(account_id, balance);
        self
    }

    pub fn failing_transfers(mut self) -> Self {
        self.fail_transfers = true;
        self
    }

    pub fn build(self) -> MockFundsTransfer {
        let mut mock = MockFundsTransfer::new();
        let balances = Arc::new(Mutex::new(self.balances));

        let read = balances.clone();
        mock.expect_get_native_balance()
            .returning(move |account_id| Ok(read.lock().unwrap().get(account_id).copied().unwrap_or(Balance::ZERO)));

        let transfers = self.transfers.clone();
        let fail_transfers = self.fail_transfers;
        mock.expect_transfer_native().returning(move |_sender, receiver, amount| {
            if fail_transfers {
                return Err(OrchestratorError::TransferError {
                    receiver: receiver.clone(),
                    message: "NotEnoughBalance".to_string(),
                });
            }
            transfers.lock().unwrap().push((receiver.clone(), amount));
            balances.lock().unwrap().insert(receiver.clone(), amount);
            Ok(TransferReceipt {
                tx_hash: format!("tx-{}", receiver),
                receiver: receiver.clone(),
                amount,
            })
        });

        mock
    }
}

/// Assembly helpers for the core components
pub struct TestHelpers;

impl TestHelpers {
    pub fn reconciler(registry: MockRegistryClient, directory: MockDeploymentDirectory) -> TestReconciler {
        Reconciler::new(
            Arc::new(registry),
            Arc::new(directory),
            &TestFixtures::reconciler_config(),
        )
    }

    pub fn funding(
        registry: MockRegistryClient,
        directory: MockDeploymentDirectory,
        transfer: MockFundsTransfer,
    ) -> TestFunding {
        FundingSupervisor::new(
            Arc::new(registry),
            Arc::new(directory),
            Arc::new(transfer),
            &TestFixtures::funding_config(),
        )
    }

    pub fn scheduler(
        registry: MockRegistryClient,
        directory: MockDeploymentDirectory,
        transfer: MockFundsTransfer,
        schedule: ScheduleConfig,
    ) -> TestScheduler {
        let registry = Arc::new(registry);
        let directory = Arc::new(directory);
        let reconciler = Reconciler::new(registry.clone(), directory.clone(), &TestFixtures::reconciler_config());
        let funding = FundingSupervisor::new(
            registry,
            directory,
            Arc::new(transfer),
            &TestFixtures::funding_config(),
        );
        Scheduler::new(reconciler, funding, schedule)
    }

    pub fn created_names(created: &Arc<Mutex<Vec<DeploymentName>>>) -> Vec<String> {
        created
            .lock()
            .unwrap()
            .iter()
            .map(|name| name.as_str().to_string())
            .collect()
    }
}
