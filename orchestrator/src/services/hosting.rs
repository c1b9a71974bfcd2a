//! Phala Cloud deployment directory
//!
//! Listing goes through the cloud REST API; creation and authentication go
//! through the `phala` CLI, which handles compose encryption and node
//! selection on our behalf.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use url::Url;

use shared::{
    fleet_debug, fleet_info, fleet_warn, AccountId, Component, Deployment, DeploymentName, NetworkId,
    SOLVER_DEPLOYMENT_PREFIX,
};

use crate::config::{HostingConfig, NearConfig, Secret};
use crate::core::deployment::SolverDeploymentParams;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::DeploymentDirectory;

/// Port the solver serves its HTTP API on inside the CVM
pub const SOLVER_PORT: u16 = 3000;

const CVMS_PATH: &str = "api/v1/cvms?user_id=0";

/// Environment variable the hosting CLI reads its API key from
pub const API_KEY_ENV: &str = "PHALA_CLOUD_API_KEY";

#[derive(Debug, Deserialize)]
struct CvmInstance {
    name: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    hosted: Option<HostedInfo>,
    #[serde(default)]
    node: Option<NodeInfo>,
}

#[derive(Debug, Deserialize)]
struct HostedInfo {
    #[serde(default)]
    app_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NodeInfo {
    name: String,
}

impl CvmInstance {
    fn into_deployment(self) -> Deployment {
        let hosted_status = self.hosted.as_ref().and_then(|hosted| hosted.status.clone());
        Deployment {
            name: DeploymentName::from_hosted(self.name),
            app_id: self.hosted.and_then(|hosted| hosted.app_id),
            node_name: self.node.map(|node| node.name).unwrap_or_default(),
            status: self.status.or(hosted_status).unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddressResponse {
    address: String,
}

/// Values the solver image reads from its environment
#[derive(Debug, Clone)]
pub struct SolverEnvironment {
    pub network: NetworkId,
    pub intents_contract: AccountId,
    pub solver_registry_contract: AccountId,
}

impl SolverEnvironment {
    pub fn from_config(config: &NearConfig) -> Self {
        Self {
            network: config.network,
            intents_contract: config.intents_contract.clone(),
            solver_registry_contract: config.solver_registry_contract.clone(),
        }
    }

    /// Env file contents for one solver instance
    pub fn render(&self, params: &SolverDeploymentParams) -> String {
        let (token1, token2) = &params.token_pair;
        format!(
            "NEAR_NETWORK_ID={}\nINTENTS_CONTRACT={}\nSOLVER_REGISTRY_CONTRACT={}\nSOLVER_POOL_ID={}\nAMM_TOKEN1_ID={}\nAMM_TOKEN2_ID={}\nAMM_FEE_BPS={}\n",
            self.network,
            self.intents_contract,
            self.solver_registry_contract,
            params.pool_id,
            token1,
            token2,
            params.fee_bps
        )
    }
}

pub struct RealDeploymentDirectory {
    http: reqwest::Client,
    api_url: Url,
    api_key: Secret,
    compose_file: PathBuf,
    env_dir: PathBuf,
    environment: SolverEnvironment,
    /// Program and leading arguments used to invoke the hosting CLI
    cli: Vec<String>,
}

impl RealDeploymentDirectory {
    pub fn new(hosting: &HostingConfig, environment: SolverEnvironment) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: hosting.api_url.clone(),
            api_key: hosting.api_key.clone(),
            compose_file: hosting.compose_file.clone(),
            env_dir: PathBuf::from("."),
            environment,
            cli: vec!["npx".to_string(), "phala".to_string()],
        }
    }

    /// Directory env files are written to (fluent API)
    pub fn with_env_dir(mut self, env_dir: impl Into<PathBuf>) -> Self {
        self.env_dir = env_dir.into();
        self
    }

    /// Replace the hosting CLI invocation (fluent API)
    pub fn with_cli<I, S>(mut self, cli: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cli = cli.into_iter().map(Into::into).collect();
        self
    }

    /// Check the hosting CLI accepts the configured API key
    ///
    /// The key only ever reaches the CLI through its environment, never argv.
    pub async fn setup_auth(&self) -> OrchestratorResult<()> {
        self.run_cli("auth status", &["auth", "status"]).await?;
        fleet_info!(Component::Hosting, "Hosting CLI authenticated");
        Ok(())
    }

    pub fn env_file_path(&self, name: &DeploymentName) -> PathBuf {
        self.env_dir.join(format!(".env.{}", name))
    }

    async fn run_cli(&self, operation: &str, args: &[&str]) -> OrchestratorResult<String> {
        let (program, leading) = self
            .cli
            .split_first()
            .ok_or_else(|| OrchestratorError::config("hosting_cli", "empty command"))?;

        let output = Command::new(program)
            .args(leading)
            .args(args)
            .env(API_KEY_ENV, self.api_key.expose())
            .stdin(Stdio::null())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            return Err(OrchestratorError::HostingError {
                operation: operation.to_string(),
                message: format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(stdout)
    }

    async fn write_env_file(&self, name: &DeploymentName, params: &SolverDeploymentParams) -> OrchestratorResult<PathBuf> {
        let path = self.env_file_path(name);
        tokio::fs::write(&path, self.environment.render(params)).await?;
        Ok(path)
    }
}

fn path_arg(path: &Path) -> OrchestratorResult<&str> {
    path.to_str()
        .ok_or_else(|| OrchestratorError::config("path", format!("{} is not valid UTF-8", path.display())))
}

#[async_trait]
impl DeploymentDirectory for RealDeploymentDirectory {
    async fn list_deployments(&self) -> OrchestratorResult<Vec<Deployment>> {
        let url = self
            .api_url
            .join(CVMS_PATH)
            .map_err(|e| OrchestratorError::config("phala_api_url", e.to_string()))?;

        let response = self
            .http
            .get(url)
            .header("X-API-Key", self.api_key.expose())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(OrchestratorError::HostingError {
                operation: "list_cvms".to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let instances: Vec<CvmInstance> = response
            .json()
            .await
            .map_err(|e| OrchestratorError::malformed("list_cvms", e.to_string()))?;
        let deployments: Vec<Deployment> = instances
            .into_iter()
            .filter(|cvm| cvm.name.starts_with(SOLVER_DEPLOYMENT_PREFIX))
            .map(CvmInstance::into_deployment)
            .collect();

        fleet_debug!(Component::Hosting, "Listed {} solver deployments", deployments.len());
        Ok(deployments)
    }

    async fn create_deployment(
        &self,
        name: &DeploymentName,
        params: &SolverDeploymentParams,
    ) -> OrchestratorResult<Deployment> {
        let env_file = self.write_env_file(name, params).await?;
        fleet_info!(Component::Hosting, "Creating deployment {} ({})", name, env_file.display());

        let output = self
            .run_cli(
                "cvms create",
                &[
                    "cvms",
                    "create",
                    "-n",
                    name.as_str(),
                    "-c",
                    path_arg(&self.compose_file)?,
                    "-e",
                    path_arg(&env_file)?,
                ],
            )
            .await?;
        fleet_debug!(Component::Hosting, "cvms create output: {}", output.trim());

        // The CLI does not report the new instance in a parseable form
        let listed = match self.list_deployments().await {
            Ok(deployments) => deployments.into_iter().find(|deployment| &deployment.name == name),
            Err(error) => {
                fleet_warn!(Component::Hosting, "Could not re-list deployments after creating {}: {}", name, error);
                None
            }
        };

        Ok(listed.unwrap_or_else(|| Deployment {
            name: name.clone(),
            app_id: None,
            node_name: String::new(),
            status: "provisioning".to_string(),
        }))
    }

    fn resolve_endpoint(&self, deployment: &Deployment) -> OrchestratorResult<Url> {
        let app_id = deployment
            .app_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| OrchestratorError::HostingError {
                operation: "resolve_endpoint".to_string(),
                message: format!("{} has no app id yet", deployment.name),
            })?;
        if deployment.node_name.is_empty() {
            return Err(OrchestratorError::HostingError {
                operation: "resolve_endpoint".to_string(),
                message: format!("{} is not scheduled on a node yet", deployment.name),
            });
        }

        let raw = format!(
            "https://{}-{}.dstack-{}.phala.network",
            app_id, SOLVER_PORT, deployment.node_name
        );
        Url::parse(&raw).map_err(|e| OrchestratorError::EndpointError {
            endpoint: raw,
            message: e.to_string(),
        })
    }

    async fn query_runtime_address(&self, endpoint: &Url) -> OrchestratorResult<AccountId> {
        let endpoint_error = |message: String| OrchestratorError::EndpointError {
            endpoint: endpoint.to_string(),
            message,
        };

        let url = endpoint.join("address").map_err(|e| endpoint_error(e.to_string()))?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| endpoint_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(endpoint_error(format!("HTTP {}", response.status())));
        }

        let body: AddressResponse = response
            .json()
            .await
            .map_err(|e| endpoint_error(format!("invalid address response: {}", e)))?;
        body.address
            .parse::<AccountId>()
            .map_err(|e| endpoint_error(e.to_string()))
    }
}
