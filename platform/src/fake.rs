use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::{
    ComputeProvisioner, DatasetRegistry, EndpointManager, EnvironmentRegistry, JobSubmitter,
};
use crate::error::{PlatformErr, ResourceKind, Result};
use crate::resources::{
    AssetSpec, ComputeTarget, DataAsset, Deployment, Endpoint, Environment, JobHandle, JobSpec,
};

#[derive(Default)]
struct Inner {
    calls: Vec<String>,
    assets: BTreeMap<String, Vec<DataAsset>>,
    compute: BTreeMap<String, ComputeTarget>,
    environments: BTreeMap<String, Environment>,
    jobs: Vec<JobSpec>,
    endpoints: BTreeMap<String, Endpoint>,
    deployments: Vec<Deployment>,
    traffic: BTreeMap<(String, String), u8>,
    invoke_response: Option<String>,
    fail_next: Option<(&'static str, String)>,
}

/// In-memory workspace fake.
///
/// Records every call in order so tests can assert the orchestration
/// sequence, supports one injectable failure, and answers `invoke` with a
/// canned response body.
///
/// Today: hardcoded behavior driven by the test. There is no plan to grow
/// this into a real backend; `LocalWorkspace` covers that.
#[derive(Default)]
pub struct FakeWorkspace {
    inner: Mutex<Inner>,
}

impl FakeWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the body `invoke` answers with.
    pub fn set_invoke_response(&self, body: impl Into<String>) {
        self.inner.lock().invoke_response = Some(body.into());
    }

    /// Makes the next call to `method` fail with a backend error.
    pub fn fail_next(&self, method: &'static str, message: impl Into<String>) {
        self.inner.lock().fail_next = Some((method, message.into()));
    }

    /// Preloads an existing compute target, as if provisioned earlier.
    pub fn preload_compute(&self, target: ComputeTarget) {
        self.inner.lock().compute.insert(target.name.clone(), target);
    }

    /// The calls made so far, in order, as `"method argument"` strings.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().calls.clone()
    }

    /// The jobs submitted so far.
    pub fn jobs(&self) -> Vec<JobSpec> {
        self.inner.lock().jobs.clone()
    }

    /// The deployments created so far.
    pub fn deployments(&self) -> Vec<Deployment> {
        self.inner.lock().deployments.clone()
    }

    /// Traffic routed to `deployment` behind `endpoint`, if any.
    pub fn traffic(&self, endpoint: &str, deployment: &str) -> Option<u8> {
        self.inner
            .lock()
            .traffic
            .get(&(endpoint.to_string(), deployment.to_string()))
            .copied()
    }

    /// All registered versions of the named asset, oldest first.
    pub fn asset_versions(&self, name: &str) -> Vec<DataAsset> {
        self.inner.lock().assets.get(name).cloned().unwrap_or_default()
    }

    fn enter(&self, method: &'static str, argument: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.calls.push(format!("{method} {argument}"));

        if inner.fail_next.as_ref().is_some_and(|(m, _)| *m == method) {
            // SAFETY: The `is_some_and` check above guarantees the value.
            let (_, message) = inner.fail_next.take().unwrap();
            return Err(PlatformErr::Backend(message));
        }

        Ok(())
    }
}

#[async_trait]
impl DatasetRegistry for FakeWorkspace {
    async fn register_asset(&self, spec: &AssetSpec) -> Result<DataAsset> {
        self.enter("register_asset", &spec.name)?;

        let mut inner = self.inner.lock();
        let versions = inner.assets.entry(spec.name.clone()).or_default();
        let asset = DataAsset {
            name: spec.name.clone(),
            version: versions.len() as u32 + 1,
            path: spec.path.clone(),
            kind: spec.kind,
        };
        versions.push(asset.clone());
        Ok(asset)
    }

    async fn latest_asset(&self, name: &str) -> Result<DataAsset> {
        self.enter("latest_asset", name)?;

        self.inner
            .lock()
            .assets
            .get(name)
            .and_then(|versions| versions.last().cloned())
            .ok_or_else(|| PlatformErr::not_found(ResourceKind::Asset, name))
    }
}

#[async_trait]
impl ComputeProvisioner for FakeWorkspace {
    async fn get_compute(&self, name: &str) -> Result<ComputeTarget> {
        self.enter("get_compute", name)?;

        self.inner
            .lock()
            .compute
            .get(name)
            .cloned()
            .ok_or_else(|| PlatformErr::not_found(ResourceKind::Compute, name))
    }

    async fn create_compute(&self, target: &ComputeTarget) -> Result<ComputeTarget> {
        self.enter("create_compute", &target.name)?;

        self.inner
            .lock()
            .compute
            .insert(target.name.clone(), target.clone());
        Ok(target.clone())
    }
}

#[async_trait]
impl EnvironmentRegistry for FakeWorkspace {
    async fn register_environment(&self, environment: &Environment) -> Result<Environment> {
        self.enter("register_environment", &environment.name)?;

        self.inner
            .lock()
            .environments
            .insert(environment.name.clone(), environment.clone());
        Ok(environment.clone())
    }
}

#[async_trait]
impl JobSubmitter for FakeWorkspace {
    async fn submit(&self, spec: &JobSpec) -> Result<JobHandle> {
        self.enter("submit", &spec.experiment)?;

        let mut inner = self.inner.lock();
        inner.jobs.push(spec.clone());
        Ok(JobHandle {
            id: format!("{}-{}", spec.experiment, inner.jobs.len()),
            experiment: spec.experiment.clone(),
        })
    }
}

#[async_trait]
impl EndpointManager for FakeWorkspace {
    async fn create_endpoint(&self, endpoint: &Endpoint) -> Result<()> {
        self.enter("create_endpoint", &endpoint.name)?;

        self.inner
            .lock()
            .endpoints
            .insert(endpoint.name.clone(), endpoint.clone());
        Ok(())
    }

    async fn create_deployment(&self, deployment: &Deployment) -> Result<()> {
        self.enter("create_deployment", &deployment.name)?;

        let mut inner = self.inner.lock();
        if !inner.endpoints.contains_key(&deployment.endpoint) {
            return Err(PlatformErr::not_found(
                ResourceKind::Endpoint,
                &deployment.endpoint,
            ));
        }
        inner.deployments.push(deployment.clone());
        Ok(())
    }

    async fn route_traffic(&self, endpoint: &str, deployment: &str, percent: u8) -> Result<()> {
        self.enter("route_traffic", endpoint)?;

        self.inner
            .lock()
            .traffic
            .insert((endpoint.to_string(), deployment.to_string()), percent);
        Ok(())
    }

    async fn invoke(&self, endpoint: &str, _body: &str) -> Result<String> {
        self.enter("invoke", endpoint)?;

        self.inner
            .lock()
            .invoke_response
            .clone()
            .ok_or_else(|| PlatformErr::not_found(ResourceKind::Deployment, endpoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{AssetKind, ComputeTier};
    use std::path::PathBuf;

    #[tokio::test]
    async fn records_calls_in_order() {
        let ws = FakeWorkspace::new();
        let spec = AssetSpec {
            name: "pneumonia-dataset".into(),
            path: PathBuf::from("/tmp/split"),
            kind: AssetKind::Folder,
            description: String::new(),
        };

        ws.register_asset(&spec).await.unwrap();
        ws.latest_asset("pneumonia-dataset").await.unwrap();

        assert_eq!(
            ws.calls(),
            vec![
                "register_asset pneumonia-dataset",
                "latest_asset pneumonia-dataset"
            ]
        );
    }

    #[tokio::test]
    async fn versions_increase_per_name() {
        let ws = FakeWorkspace::new();
        let spec = AssetSpec {
            name: "pneumonia-central".into(),
            path: PathBuf::from("/tmp/split"),
            kind: AssetKind::Folder,
            description: String::new(),
        };

        assert_eq!(ws.register_asset(&spec).await.unwrap().version, 1);
        assert_eq!(ws.register_asset(&spec).await.unwrap().version, 2);
        assert_eq!(
            ws.latest_asset("pneumonia-central").await.unwrap().version,
            2
        );
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let ws = FakeWorkspace::new();
        ws.fail_next("get_compute", "throttled");

        let err = ws.get_compute("gpu-cluster").await.unwrap_err();
        assert!(matches!(err, PlatformErr::Backend(_)));

        // Second call falls through to the normal not-found path.
        let err = ws.get_compute("gpu-cluster").await.unwrap_err();
        assert!(matches!(err, PlatformErr::NotFound { .. }));
    }

    #[tokio::test]
    async fn preloaded_compute_is_returned() {
        let ws = FakeWorkspace::new();
        let target = ComputeTarget {
            name: "gpu-cluster".into(),
            vm_size: "STANDARD_NC6".into(),
            min_instances: 0,
            max_instances: 4,
            tier: ComputeTier::Dedicated,
        };
        ws.preload_compute(target.clone());

        assert_eq!(ws.get_compute("gpu-cluster").await.unwrap(), target);
    }
}
