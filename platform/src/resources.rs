use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// The storage shape of a data asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Folder,
}

/// A registration request for a data asset. The backend assigns the version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub name: String,
    pub path: PathBuf,
    pub kind: AssetKind,
    pub description: String,
}

/// A named, versioned folder registered with the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAsset {
    pub name: String,
    pub version: u32,
    pub path: PathBuf,
    pub kind: AssetKind,
}

/// A name + version reference to a registered asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub name: String,
    pub version: u32,
}

impl From<&DataAsset> for AssetRef {
    fn from(asset: &DataAsset) -> Self {
        Self {
            name: asset.name.clone(),
            version: asset.version,
        }
    }
}

/// Compute pricing tier. Low-priority capacity can be reclaimed at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeTier {
    Dedicated,
    LowPriority,
}

/// A named cluster definition: VM size, scaling bounds and pricing tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeTarget {
    pub name: String,
    pub vm_size: String,
    pub min_instances: u32,
    pub max_instances: u32,
    pub tier: ComputeTier,
}

/// A named container image + dependency manifest pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    pub image: String,
    pub conda_file: Option<PathBuf>,
}

/// Process layout of a distributed training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub process_count_per_instance: u32,
    pub instance_count: u32,
}

/// A training run description, submitted once; the backend owns the
/// lifecycle from there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub experiment: String,
    pub command: String,
    pub inputs: BTreeMap<String, AssetRef>,
    pub environment: String,
    pub compute: String,
    pub distribution: Distribution,
    pub environment_variables: BTreeMap<String, String>,
    /// Interactive services attached to the run (e.g. a debugger UI).
    pub services: Vec<String>,
}

/// Identifier of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub id: String,
    pub experiment: String,
}

/// Authentication mode of a managed endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    Key,
}

/// A named network-exposed inference target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub auth_mode: AuthMode,
}

/// A name + version reference to a registered model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    pub name: String,
    pub version: u32,
}

/// A model + environment binding deployed behind an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub name: String,
    pub endpoint: String,
    pub model: ModelRef,
    pub environment: String,
    pub instance_type: String,
    pub instance_count: u32,
    pub request_timeout_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_ref_from_asset() {
        let asset = DataAsset {
            name: "pneumonia-dataset".into(),
            version: 3,
            path: PathBuf::from("/data/split"),
            kind: AssetKind::Folder,
        };
        let r = AssetRef::from(&asset);
        assert_eq!(r.name, "pneumonia-dataset");
        assert_eq!(r.version, 3);
    }

    #[test]
    fn records_roundtrip_through_json() {
        let target = ComputeTarget {
            name: "gpu-cluster".into(),
            vm_size: "STANDARD_NC6".into(),
            min_instances: 0,
            max_instances: 4,
            tier: ComputeTier::LowPriority,
        };
        let body = serde_json::to_string(&target).unwrap();
        assert!(body.contains("low_priority"));
        let back: ComputeTarget = serde_json::from_str(&body).unwrap();
        assert_eq!(back, target);
    }
}
