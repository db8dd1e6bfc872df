use std::{env, fs, path::Path, path::PathBuf};

use platform::{ComputeTarget, Environment};
use serde::Deserialize;

use crate::error::{Result, WorkflowErr};

/// The dataset the training job consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSection {
    pub name: String,
    pub path: PathBuf,
}

/// The two container environments the flow registers.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentsSection {
    pub training: Environment,
    pub scoring: Environment,
}

/// Training job settings.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSection {
    pub command: String,
    pub process_count_per_instance: u32,
    pub instance_count: u32,
    #[serde(default)]
    pub services: Vec<String>,
}

/// Endpoint and deployment settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointSection {
    pub name: String,
    pub deployment: String,
    pub model_name: String,
    pub model_version: u32,
    pub instance_type: String,
    pub instance_count: u32,
    pub request_timeout_ms: u64,
}

/// Sample files used for inspection and the scoring request.
#[derive(Debug, Clone, Deserialize)]
pub struct SampleSection {
    pub label_volume: PathBuf,
    pub flair: PathBuf,
    pub t1: PathBuf,
    pub t1ce: PathBuf,
    pub t2: PathBuf,
}

/// The whole run's configuration, loaded from a JSON file.
///
/// Deployment-specific values never live in code; this file (plus a few
/// environment overrides) is the single source of them.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    pub subscription_id: String,
    pub resource_group: String,
    pub workspace: String,
    pub experiment: String,
    pub dataset: DatasetSection,
    pub compute: ComputeTarget,
    pub environments: EnvironmentsSection,
    pub job: JobSection,
    pub endpoint: EndpointSection,
    pub sample: SampleSection,
    /// Forwarded verbatim into the job's environment when set; populated
    /// from `AZUREML_ARTIFACTS_DEFAULT_TIMEOUT`, never from the file.
    #[serde(skip)]
    pub artifacts_timeout: Option<String>,
}

impl WorkflowConfig {
    /// Loads and validates a configuration file, applying environment
    /// overrides (`FEDLEARN_SUBSCRIPTION_ID`, `FEDLEARN_RESOURCE_GROUP`,
    /// `FEDLEARN_WORKSPACE`).
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| WorkflowErr::Config(format!("cannot read '{}': {e}", path.display())))?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| WorkflowErr::Config(format!("invalid JSON in '{}': {e}", path.display())))?;

        if let Ok(v) = env::var("FEDLEARN_SUBSCRIPTION_ID") {
            config.subscription_id = v;
        }
        if let Ok(v) = env::var("FEDLEARN_RESOURCE_GROUP") {
            config.resource_group = v;
        }
        if let Ok(v) = env::var("FEDLEARN_WORKSPACE") {
            config.workspace = v;
        }
        config.artifacts_timeout = env::var("AZUREML_ARTIFACTS_DEFAULT_TIMEOUT").ok();

        config.validate()?;
        Ok(config)
    }

    /// Rejects empty fields, leftover placeholders and zero-sized resources.
    pub fn validate(&self) -> Result<()> {
        let require = |field: &str, value: &str| -> Result<()> {
            if value.trim().is_empty() {
                return Err(WorkflowErr::Config(format!("{field} must not be empty")));
            }
            if value.contains('<') || value.contains('>') {
                return Err(WorkflowErr::Config(format!(
                    "{field} still holds the placeholder '{value}'"
                )));
            }
            Ok(())
        };

        require("subscription_id", &self.subscription_id)?;
        require("resource_group", &self.resource_group)?;
        require("workspace", &self.workspace)?;
        require("experiment", &self.experiment)?;
        require("dataset.name", &self.dataset.name)?;
        require("compute.name", &self.compute.name)?;
        require("compute.vm_size", &self.compute.vm_size)?;
        require("environments.training.name", &self.environments.training.name)?;
        require("environments.scoring.name", &self.environments.scoring.name)?;
        require("job.command", &self.job.command)?;
        require("endpoint.name", &self.endpoint.name)?;
        require("endpoint.deployment", &self.endpoint.deployment)?;
        require("endpoint.model_name", &self.endpoint.model_name)?;

        if self.compute.max_instances < self.compute.min_instances {
            return Err(WorkflowErr::Config(
                "compute.max_instances must be >= compute.min_instances".into(),
            ));
        }
        if self.job.process_count_per_instance == 0 || self.job.instance_count == 0 {
            return Err(WorkflowErr::Config(
                "job distribution counts must be at least 1".into(),
            ));
        }
        if self.endpoint.instance_count == 0 {
            return Err(WorkflowErr::Config(
                "endpoint.instance_count must be at least 1".into(),
            ));
        }
        if self.endpoint.request_timeout_ms == 0 {
            return Err(WorkflowErr::Config(
                "endpoint.request_timeout_ms must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::ComputeTier;

    pub(crate) fn valid() -> WorkflowConfig {
        WorkflowConfig {
            subscription_id: "0000-demo".into(),
            resource_group: "fedlearn".into(),
            workspace: "Central-Workspace".into(),
            experiment: "tumor-seg".into(),
            dataset: DatasetSection {
                name: "brats-dataset".into(),
                path: PathBuf::from("/data/brats"),
            },
            compute: ComputeTarget {
                name: "gpu-cluster".into(),
                vm_size: "STANDARD_NC6".into(),
                min_instances: 0,
                max_instances: 4,
                tier: ComputeTier::LowPriority,
            },
            environments: EnvironmentsSection {
                training: Environment {
                    name: "train-env".into(),
                    image: "pytorch:latest".into(),
                    conda_file: None,
                },
                scoring: Environment {
                    name: "score-env".into(),
                    image: "inference:latest".into(),
                    conda_file: None,
                },
            },
            job: JobSection {
                command: "python train.py --epochs 100".into(),
                process_count_per_instance: 4,
                instance_count: 2,
                services: vec!["jupyter".into()],
            },
            endpoint: EndpointSection {
                name: "tumor-seg".into(),
                deployment: "blue".into(),
                model_name: "tumor-model".into(),
                model_version: 1,
                instance_type: "STANDARD_DS3".into(),
                instance_count: 1,
                request_timeout_ms: 90_000,
            },
            sample: SampleSection {
                label_volume: PathBuf::from("/data/sample/labels.json"),
                flair: PathBuf::from("/data/sample/flair.json"),
                t1: PathBuf::from("/data/sample/t1.json"),
                t1ce: PathBuf::from("/data/sample/t1ce.json"),
                t2: PathBuf::from("/data/sample/t2.json"),
            },
            artifacts_timeout: None,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn placeholder_fields_are_rejected() {
        let mut config = valid();
        config.subscription_id = "<subscription id>".into();
        assert!(matches!(config.validate(), Err(WorkflowErr::Config(_))));
    }

    #[test]
    fn empty_fields_are_rejected() {
        let mut config = valid();
        config.workspace = "  ".into();
        assert!(matches!(config.validate(), Err(WorkflowErr::Config(_))));
    }

    #[test]
    fn zero_distribution_is_rejected() {
        let mut config = valid();
        config.job.instance_count = 0;
        assert!(matches!(config.validate(), Err(WorkflowErr::Config(_))));
    }

    #[test]
    fn inverted_scale_bounds_are_rejected() {
        let mut config = valid();
        config.compute.min_instances = 5;
        assert!(matches!(config.validate(), Err(WorkflowErr::Config(_))));
    }
}
