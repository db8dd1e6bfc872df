use std::fs;
use std::path::Path;

use imaging::{LabelVolume, PredictionTensor, remap_labels};
use platform::{ComputeTarget, ComputeTier, Environment, FakeWorkspace, PlatformErr};
use workflow::config::{
    DatasetSection, EndpointSection, EnvironmentsSection, JobSection, SampleSection,
};
use workflow::{Session, WorkflowConfig, WorkflowErr};

/// Label volume with one voxel per interesting code.
fn sample_volume() -> LabelVolume {
    LabelVolume::from_flat([2, 2, 2], vec![0, 1, 2, 4, 3, 0, 0, 0]).unwrap()
}

/// Writes the sample label volume and four modality files under `dir`.
fn write_sample_files(dir: &Path) -> SampleSection {
    let volume = sample_volume();
    let label_volume = dir.join("labels.json");
    volume.save(&label_volume).unwrap();

    let mut paths = Vec::new();
    for name in ["flair", "t1", "t1ce", "t2"] {
        let path = dir.join(format!("{name}.json"));
        volume.save(&path).unwrap();
        paths.push(path);
    }

    SampleSection {
        label_volume,
        flair: paths[0].clone(),
        t1: paths[1].clone(),
        t1ce: paths[2].clone(),
        t2: paths[3].clone(),
    }
}

fn config(dir: &Path) -> WorkflowConfig {
    let data = dir.join("brats");
    fs::create_dir_all(&data).unwrap();

    WorkflowConfig {
        subscription_id: "0000-demo".into(),
        resource_group: "fedlearn".into(),
        workspace: "Central-Workspace".into(),
        experiment: "tumor-seg".into(),
        dataset: DatasetSection {
            name: "brats-dataset".into(),
            path: data,
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
        sample: write_sample_files(dir),
        artifacts_timeout: None,
    }
}

/// A prediction matching the sample's ground truth exactly.
fn perfect_prediction() -> PredictionTensor {
    let masks = remap_labels(&sample_volume());
    let mut values = Vec::new();
    for mask in masks.channels() {
        values.extend(mask.iter().map(|v| if *v { 1.0f32 } else { 0.0 }));
    }
    PredictionTensor::from_flat([3, 2, 2, 2], values).unwrap()
}

#[tokio::test]
async fn run_performs_every_step_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let ws = FakeWorkspace::new();
    ws.set_invoke_response(perfect_prediction().to_json().unwrap());

    let report = Session::new(config(dir.path()), &ws).run().await.unwrap();

    assert_eq!(
        ws.calls(),
        vec![
            "get_compute gpu-cluster",
            "create_compute gpu-cluster",
            "register_environment train-env",
            "register_environment score-env",
            "register_asset brats-dataset",
            "latest_asset brats-dataset",
            "submit tumor-seg",
            "create_endpoint tumor-seg",
            "create_deployment blue",
            "route_traffic tumor-seg",
            "invoke tumor-seg",
        ]
    );

    // One voxel each of codes 1, 2 and 4.
    assert_eq!(report.voxel_counts, [2, 3, 1]);
    assert_eq!(report.dataset.version, 1);
    assert_eq!(report.dice, [1.0, 1.0, 1.0]);
    assert_eq!(ws.traffic("tumor-seg", "blue"), Some(100));
}

#[tokio::test]
async fn existing_compute_is_reused_not_recreated() {
    let dir = tempfile::tempdir().unwrap();
    let ws = FakeWorkspace::new();
    ws.set_invoke_response(perfect_prediction().to_json().unwrap());

    let cfg = config(dir.path());
    ws.preload_compute(cfg.compute.clone());

    Session::new(cfg, &ws).run().await.unwrap();

    let calls = ws.calls();
    assert!(calls.contains(&"get_compute gpu-cluster".to_string()));
    assert!(!calls.iter().any(|c| c.starts_with("create_compute")));
}

#[tokio::test]
async fn job_spec_carries_binding_distribution_and_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let ws = FakeWorkspace::new();
    ws.set_invoke_response(perfect_prediction().to_json().unwrap());

    let mut cfg = config(dir.path());
    cfg.artifacts_timeout = Some("3600".into());

    Session::new(cfg, &ws).run().await.unwrap();

    let jobs = ws.jobs();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];

    assert_eq!(job.command, "python train.py --epochs 100");
    assert_eq!(job.environment, "train-env");
    assert_eq!(job.compute, "gpu-cluster");
    assert_eq!(job.inputs["data"].name, "brats-dataset");
    assert_eq!(job.inputs["data"].version, 1);
    assert_eq!(job.distribution.process_count_per_instance, 4);
    assert_eq!(job.distribution.instance_count, 2);
    assert_eq!(
        job.environment_variables["AZUREML_ARTIFACTS_DEFAULT_TIMEOUT"],
        "3600"
    );
    assert_eq!(job.services, vec!["jupyter".to_string()]);
}

#[tokio::test]
async fn timeout_is_omitted_when_unset() {
    let dir = tempfile::tempdir().unwrap();
    let ws = FakeWorkspace::new();
    ws.set_invoke_response(perfect_prediction().to_json().unwrap());

    Session::new(config(dir.path()), &ws).run().await.unwrap();

    assert!(ws.jobs()[0].environment_variables.is_empty());
}

#[tokio::test]
async fn backend_failure_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let ws = FakeWorkspace::new();
    ws.fail_next("submit", "quota exceeded");

    let err = Session::new(config(dir.path()), &ws).run().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowErr::Platform(PlatformErr::Backend(_))
    ));

    // Nothing after the failed step ran.
    assert!(!ws.calls().iter().any(|c| c.starts_with("create_endpoint")));
}

#[tokio::test]
async fn mismatched_prediction_shape_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let ws = FakeWorkspace::new();

    // 3x1x1x1 tensor against a 2x2x2 sample.
    let tensor = PredictionTensor::from_flat([3, 1, 1, 1], vec![0.0; 3]).unwrap();
    ws.set_invoke_response(tensor.to_json().unwrap());

    let err = Session::new(config(dir.path()), &ws).run().await.unwrap_err();
    assert!(matches!(err, WorkflowErr::ShapeMismatch { .. }));
}
