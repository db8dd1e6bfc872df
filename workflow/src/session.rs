use std::{collections::BTreeMap, fs};

use imaging::{LabelVolume, PredictionTensor, ScoreRequest, TumorMasks, remap_labels};
use log::info;
use platform::{
    AssetKind, AssetRef, AssetSpec, AuthMode, ComputeTarget, DataAsset, Deployment, Distribution,
    Endpoint, JobHandle, JobSpec, ModelRef, Workspace, ensure_compute,
};

use crate::config::WorkflowConfig;
use crate::error::{Result, WorkflowErr};
use crate::render::render_slice;

/// Environment variable forwarded verbatim into the training job when set.
const ARTIFACTS_TIMEOUT_VAR: &str = "AZUREML_ARTIFACTS_DEFAULT_TIMEOUT";

/// The name the dataset input binds to inside the training job.
const DATA_INPUT: &str = "data";

/// Channel index used for the text-mode slice render (whole tumor).
const RENDER_CHANNEL: usize = 1;

/// What the run did, for logging and assertions.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub voxel_counts: [usize; 3],
    pub compute: ComputeTarget,
    pub dataset: DataAsset,
    pub job: JobHandle,
    pub dice: [f32; 3],
}

/// An end-to-end run of the training/deployment flow against one workspace.
///
/// Every step is a single call into the workspace seam; any failure aborts
/// the run with the backend's error. Compute provisioning is the only step
/// with handling logic (create on `NotFound`).
pub struct Session<'a, W: Workspace + ?Sized> {
    config: WorkflowConfig,
    workspace: &'a W,
}

impl<'a, W: Workspace + ?Sized> Session<'a, W> {
    /// Creates a session over a validated configuration.
    pub fn new(config: WorkflowConfig, workspace: &'a W) -> Self {
        Self { config, workspace }
    }

    /// Runs all steps in order and returns what happened.
    pub async fn run(&self) -> Result<RunReport> {
        let masks = self.inspect_sample()?;
        let voxel_counts = masks.voxel_counts();

        let compute = ensure_compute(self.workspace, &self.config.compute).await?;

        self.register_environments().await?;
        let dataset = self.register_dataset().await?;

        let job = self.submit_training(&dataset).await?;
        self.deploy().await?;

        let prediction = self.infer_sample().await?;
        let dice = self.score_prediction(&masks, &prediction)?;

        info!("run finished, job {} submitted", job.id);
        Ok(RunReport {
            voxel_counts,
            compute,
            dataset,
            job,
            dice,
        })
    }

    /// Loads the sample label volume, remaps it into the three channels and
    /// logs what they contain.
    pub fn inspect_sample(&self) -> Result<TumorMasks> {
        let volume = LabelVolume::load(&self.config.sample.label_volume)?;
        let masks = remap_labels(&volume);

        for (name, count) in TumorMasks::channel_names().iter().zip(masks.voxel_counts()) {
            info!("sample channel {name}: {count} positive voxels");
        }
        info!(
            "whole tumor, mid axial slice:\n{}",
            render_slice(&masks.mid_slice(RENDER_CHANNEL))
        );

        Ok(masks)
    }

    async fn register_environments(&self) -> Result<()> {
        let envs = &self.config.environments;
        self.workspace.register_environment(&envs.training).await?;
        self.workspace.register_environment(&envs.scoring).await?;
        info!(
            "registered environments {} and {}",
            envs.training.name, envs.scoring.name
        );
        Ok(())
    }

    /// Registers the dataset folder, then resolves it back by name + latest
    /// version, which is how every later step refers to it.
    async fn register_dataset(&self) -> Result<DataAsset> {
        let section = &self.config.dataset;
        self.workspace
            .register_asset(&AssetSpec {
                name: section.name.clone(),
                path: section.path.clone(),
                kind: AssetKind::Folder,
                description: format!("training data for {}", self.config.experiment),
            })
            .await?;

        let asset = self.workspace.latest_asset(&section.name).await?;
        info!("using dataset {} v{}", asset.name, asset.version);
        Ok(asset)
    }

    /// Submits the distributed training job. Single-shot; the backend owns
    /// the job from here.
    async fn submit_training(&self, dataset: &DataAsset) -> Result<JobHandle> {
        let job = &self.config.job;

        let mut environment_variables = BTreeMap::new();
        if let Some(timeout) = &self.config.artifacts_timeout {
            environment_variables.insert(ARTIFACTS_TIMEOUT_VAR.to_string(), timeout.clone());
        }

        let spec = JobSpec {
            experiment: self.config.experiment.clone(),
            command: job.command.clone(),
            inputs: BTreeMap::from([(DATA_INPUT.to_string(), AssetRef::from(dataset))]),
            environment: self.config.environments.training.name.clone(),
            compute: self.config.compute.name.clone(),
            distribution: Distribution {
                process_count_per_instance: job.process_count_per_instance,
                instance_count: job.instance_count,
            },
            environment_variables,
            services: job.services.clone(),
        };

        let handle = self.workspace.submit(&spec).await?;
        info!(
            "submitted job {} ({} x {} processes)",
            handle.id, job.instance_count, job.process_count_per_instance
        );
        Ok(handle)
    }

    /// Creates the endpoint and the deployment behind it, then points all
    /// traffic at the new deployment.
    async fn deploy(&self) -> Result<()> {
        let section = &self.config.endpoint;

        self.workspace
            .create_endpoint(&Endpoint {
                name: section.name.clone(),
                auth_mode: AuthMode::Key,
            })
            .await?;

        self.workspace
            .create_deployment(&Deployment {
                name: section.deployment.clone(),
                endpoint: section.name.clone(),
                model: ModelRef {
                    name: section.model_name.clone(),
                    version: section.model_version,
                },
                environment: self.config.environments.scoring.name.clone(),
                instance_type: section.instance_type.clone(),
                instance_count: section.instance_count,
                request_timeout_ms: section.request_timeout_ms,
            })
            .await?;

        self.workspace
            .route_traffic(&section.name, &section.deployment, 100)
            .await?;

        info!(
            "endpoint {} live with deployment {}",
            section.name, section.deployment
        );
        Ok(())
    }

    /// Builds the scoring request from the four modality files, invokes the
    /// endpoint and decodes the prediction tensor.
    pub async fn infer_sample(&self) -> Result<PredictionTensor> {
        let sample = &self.config.sample;
        let flair = fs::read(&sample.flair)?;
        let t1 = fs::read(&sample.t1)?;
        let t1ce = fs::read(&sample.t1ce)?;
        let t2 = fs::read(&sample.t2)?;

        let request = ScoreRequest::from_modalities([&flair, &t1, &t1ce, &t2]);
        let body = self
            .workspace
            .invoke(&self.config.endpoint.name, &request.to_json()?)
            .await?;

        let prediction = PredictionTensor::from_json(&body)?;
        info!("received prediction tensor of shape {:?}", prediction.shape());
        Ok(prediction)
    }

    /// Thresholds the prediction at 0.5 and reports per-channel Dice against
    /// the ground-truth masks.
    fn score_prediction(
        &self,
        masks: &TumorMasks,
        prediction: &PredictionTensor,
    ) -> Result<[f32; 3]> {
        let (_, h, w, s) = prediction.shape();
        if (h, w, s) != masks.shape() {
            return Err(WorkflowErr::ShapeMismatch {
                expected: masks.shape(),
                got: (h, w, s),
            });
        }

        let dice = masks.dice(prediction, 0.5);
        for (name, score) in TumorMasks::channel_names().iter().zip(dice) {
            info!("dice {name}: {score:.3}");
        }

        Ok(dice)
    }
}
