use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::client::{
    ComputeProvisioner, DatasetRegistry, EndpointManager, EnvironmentRegistry, JobSubmitter,
};
use crate::error::{PlatformErr, ResourceKind, Result};
use crate::resources::{
    AssetSpec, ComputeTarget, DataAsset, Deployment, Endpoint, Environment, JobHandle, JobSpec,
};

/// Scoring function a local deployment answers `invoke` with.
pub type Scorer = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Stored form of an endpoint: its definition plus the traffic split.
#[derive(Debug, Serialize, Deserialize)]
struct EndpointRecord {
    endpoint: Endpoint,
    traffic: BTreeMap<String, u8>,
}

/// Filesystem-backed workspace simulation.
///
/// Resources live as JSON records under the workspace root:
/// `assets/<name>/<version>.json`, `compute/<name>.json`,
/// `environments/<name>.json`, `jobs/<id>.json`, `endpoints/<name>.json`
/// and `deployments/<endpoint>/<name>.json`.
///
/// Scoring is delegated to a caller-registered [`Scorer`]; invoking an
/// endpoint with no routed deployment or no scorer fails with `NotFound`.
pub struct LocalWorkspace {
    root: PathBuf,
    scorer: Mutex<Option<Scorer>>,
}

impl LocalWorkspace {
    /// Opens (and lazily creates) a workspace rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            scorer: Mutex::new(None),
        })
    }

    /// Registers the scoring function local deployments answer with.
    pub fn set_scorer(&self, scorer: impl Fn(&str) -> Result<String> + Send + Sync + 'static) {
        *self.scorer.lock() = Some(Box::new(scorer));
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_dir(&self, kind: &str) -> Result<PathBuf> {
        let dir = self.root.join(kind);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn read_record<T: serde::de::DeserializeOwned>(
        path: &Path,
        kind: ResourceKind,
        name: &str,
    ) -> Result<T> {
        if !path.is_file() {
            return Err(PlatformErr::not_found(kind, name));
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(record)?)?;
        Ok(())
    }

    /// Highest registered version of `name`, if any.
    fn max_version(&self, name: &str) -> Result<Option<u32>> {
        let dir = self.root.join("assets").join(name);
        if !dir.is_dir() {
            return Ok(None);
        }

        let mut max = None;
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let version = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok());
            if let Some(v) = version {
                max = Some(max.map_or(v, |m: u32| m.max(v)));
            }
        }

        Ok(max)
    }

    fn endpoint_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.record_dir("endpoints")?.join(format!("{name}.json")))
    }
}

#[async_trait]
impl DatasetRegistry for LocalWorkspace {
    async fn register_asset(&self, spec: &AssetSpec) -> Result<DataAsset> {
        if !spec.path.exists() {
            return Err(PlatformErr::InvalidSpec(format!(
                "asset path '{}' does not exist",
                spec.path.display()
            )));
        }

        let version = self.max_version(&spec.name)?.unwrap_or(0) + 1;
        let asset = DataAsset {
            name: spec.name.clone(),
            version,
            path: spec.path.clone(),
            kind: spec.kind,
        };

        let dir = self.root.join("assets").join(&spec.name);
        fs::create_dir_all(&dir)?;
        Self::write_record(&dir.join(format!("{version}.json")), &asset)?;

        debug!("registered asset {} v{version}", spec.name);
        Ok(asset)
    }

    async fn latest_asset(&self, name: &str) -> Result<DataAsset> {
        let version = self
            .max_version(name)?
            .ok_or_else(|| PlatformErr::not_found(ResourceKind::Asset, name))?;

        let path = self
            .root
            .join("assets")
            .join(name)
            .join(format!("{version}.json"));
        Self::read_record(&path, ResourceKind::Asset, name)
    }
}

#[async_trait]
impl ComputeProvisioner for LocalWorkspace {
    async fn get_compute(&self, name: &str) -> Result<ComputeTarget> {
        let path = self.record_dir("compute")?.join(format!("{name}.json"));
        Self::read_record(&path, ResourceKind::Compute, name)
    }

    async fn create_compute(&self, target: &ComputeTarget) -> Result<ComputeTarget> {
        let path = self
            .record_dir("compute")?
            .join(format!("{}.json", target.name));
        if path.exists() {
            return Err(PlatformErr::AlreadyExists {
                kind: ResourceKind::Compute,
                name: target.name.clone(),
            });
        }

        Self::write_record(&path, target)?;
        debug!("created compute target {}", target.name);
        Ok(target.clone())
    }
}

#[async_trait]
impl EnvironmentRegistry for LocalWorkspace {
    async fn register_environment(&self, environment: &Environment) -> Result<Environment> {
        let path = self
            .record_dir("environments")?
            .join(format!("{}.json", environment.name));
        Self::write_record(&path, environment)?;
        Ok(environment.clone())
    }
}

#[async_trait]
impl JobSubmitter for LocalWorkspace {
    async fn submit(&self, spec: &JobSpec) -> Result<JobHandle> {
        let dir = self.record_dir("jobs")?;
        let sequence = fs::read_dir(&dir)?.count() + 1;
        let id = format!("{}-{sequence}", spec.experiment);

        Self::write_record(&dir.join(format!("{id}.json")), spec)?;
        debug!("submitted job {id}");

        Ok(JobHandle {
            id,
            experiment: spec.experiment.clone(),
        })
    }
}

#[async_trait]
impl EndpointManager for LocalWorkspace {
    async fn create_endpoint(&self, endpoint: &Endpoint) -> Result<()> {
        let path = self.endpoint_path(&endpoint.name)?;
        if path.exists() {
            return Err(PlatformErr::AlreadyExists {
                kind: ResourceKind::Endpoint,
                name: endpoint.name.clone(),
            });
        }

        let record = EndpointRecord {
            endpoint: endpoint.clone(),
            traffic: BTreeMap::new(),
        };
        Self::write_record(&path, &record)
    }

    async fn create_deployment(&self, deployment: &Deployment) -> Result<()> {
        // The endpoint must exist before anything deploys behind it.
        let endpoint_path = self.endpoint_path(&deployment.endpoint)?;
        let _: EndpointRecord =
            Self::read_record(&endpoint_path, ResourceKind::Endpoint, &deployment.endpoint)?;

        let dir = self.record_dir("deployments")?.join(&deployment.endpoint);
        fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.json", deployment.name));
        if path.exists() {
            return Err(PlatformErr::AlreadyExists {
                kind: ResourceKind::Deployment,
                name: deployment.name.clone(),
            });
        }

        Self::write_record(&path, deployment)
    }

    async fn route_traffic(&self, endpoint: &str, deployment: &str, percent: u8) -> Result<()> {
        let dep_path = self
            .record_dir("deployments")?
            .join(endpoint)
            .join(format!("{deployment}.json"));
        if !dep_path.is_file() {
            return Err(PlatformErr::not_found(ResourceKind::Deployment, deployment));
        }

        let path = self.endpoint_path(endpoint)?;
        let mut record: EndpointRecord =
            Self::read_record(&path, ResourceKind::Endpoint, endpoint)?;
        record.traffic.insert(deployment.to_string(), percent);
        Self::write_record(&path, &record)
    }

    async fn invoke(&self, endpoint: &str, body: &str) -> Result<String> {
        let path = self.endpoint_path(endpoint)?;
        let record: EndpointRecord = Self::read_record(&path, ResourceKind::Endpoint, endpoint)?;

        if record.traffic.values().all(|p| *p == 0) {
            return Err(PlatformErr::not_found(ResourceKind::Deployment, endpoint));
        }

        match &*self.scorer.lock() {
            Some(scorer) => scorer(body),
            None => Err(PlatformErr::not_found(ResourceKind::Deployment, endpoint)),
        }
    }
}
