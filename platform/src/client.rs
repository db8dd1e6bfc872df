use async_trait::async_trait;
use log::info;

use crate::error::{PlatformErr, Result};
use crate::resources::{
    AssetSpec, ComputeTarget, DataAsset, Deployment, Endpoint, Environment, JobHandle, JobSpec,
};

/// Registration and lookup of named, versioned data assets.
#[async_trait]
pub trait DatasetRegistry: Send + Sync {
    /// Registers a new version of the named asset and returns it.
    async fn register_asset(&self, spec: &AssetSpec) -> Result<DataAsset>;

    /// Resolves the highest registered version of the named asset.
    async fn latest_asset(&self, name: &str) -> Result<DataAsset>;
}

/// Lookup and creation of compute targets.
#[async_trait]
pub trait ComputeProvisioner: Send + Sync {
    async fn get_compute(&self, name: &str) -> Result<ComputeTarget>;
    async fn create_compute(&self, target: &ComputeTarget) -> Result<ComputeTarget>;
}

/// Registration of container environments.
#[async_trait]
pub trait EnvironmentRegistry: Send + Sync {
    async fn register_environment(&self, environment: &Environment) -> Result<Environment>;
}

/// Single-shot submission of training runs.
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn submit(&self, spec: &JobSpec) -> Result<JobHandle>;
}

/// Managed endpoint and deployment lifecycle, plus scoring invocation.
#[async_trait]
pub trait EndpointManager: Send + Sync {
    async fn create_endpoint(&self, endpoint: &Endpoint) -> Result<()>;
    async fn create_deployment(&self, deployment: &Deployment) -> Result<()>;

    /// Points `percent` of the endpoint's traffic at the deployment.
    async fn route_traffic(&self, endpoint: &str, deployment: &str, percent: u8) -> Result<()>;

    /// Sends a scoring request body and returns the response body.
    async fn invoke(&self, endpoint: &str, body: &str) -> Result<String>;
}

/// Everything a workspace client offers, as one bound for the orchestration
/// glue. Blanket-implemented for any type providing the five seams.
pub trait Workspace:
    DatasetRegistry + ComputeProvisioner + EnvironmentRegistry + JobSubmitter + EndpointManager
{
}

impl<T> Workspace for T where
    T: DatasetRegistry + ComputeProvisioner + EnvironmentRegistry + JobSubmitter + EndpointManager
{
}

/// Returns the named compute target, creating it when it does not exist.
///
/// This is the only guarded call in the system: a `NotFound` lookup creates
/// the target, any other error propagates unchanged.
pub async fn ensure_compute<P>(provisioner: &P, target: &ComputeTarget) -> Result<ComputeTarget>
where
    P: ComputeProvisioner + ?Sized,
{
    match provisioner.get_compute(&target.name).await {
        Ok(existing) => {
            info!("reusing compute target {}", existing.name);
            Ok(existing)
        }
        Err(PlatformErr::NotFound { .. }) => {
            info!("compute target {} not found, creating it", target.name);
            provisioner.create_compute(target).await
        }
        Err(e) => Err(e),
    }
}
