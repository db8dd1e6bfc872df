use std::{
    env, io,
    path::{Path, PathBuf},
};

use imaging::{Modality, PredictionTensor, ScoreRequest};
use log::info;
use platform::{LocalWorkspace, PlatformErr};

use workflow::{Session, WorkflowConfig};

/// All-background scorer for offline runs: answers with a zero tensor sized
/// from the request's flair volume. A real deployment would run the trained
/// model here.
fn background_scorer(body: &str) -> platform::Result<String> {
    let backend = |msg: String| PlatformErr::Backend(msg);

    let request = ScoreRequest::from_json(body).map_err(|e| backend(e.to_string()))?;
    let flair = request
        .modality(Modality::Flair)
        .map_err(|e| backend(e.to_string()))?;

    let value: serde_json::Value = serde_json::from_slice(&flair)?;
    let shape: Vec<usize> = value["shape"]
        .as_array()
        .map(|dims| dims.iter().filter_map(|d| d.as_u64()).map(|d| d as usize).collect())
        .unwrap_or_default();
    let [x, y, z] = shape.as_slice() else {
        return Err(backend("flair volume carries no 3D shape".into()));
    };

    let tensor = PredictionTensor::from_flat([3, *x, *y, *z], vec![0.0; 3 * x * y * z])
        .map_err(|e| backend(e.to_string()))?;
    tensor.to_json().map_err(|e| backend(e.to_string()))
}

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "workflow.json".to_string());
    let config = WorkflowConfig::load(Path::new(&config_path))?;

    let workspaces_root: PathBuf = env::var("FEDLEARN_WORKSPACE_DIR")
        .unwrap_or_else(|_| "./fedlearn-workspaces".to_string())
        .into();
    let workspace = LocalWorkspace::open(workspaces_root.join(&config.workspace))?;
    workspace.set_scorer(background_scorer);

    info!(
        "running experiment {} in workspace {} (resource group {})",
        config.experiment, config.workspace, config.resource_group
    );

    let session = Session::new(config, &workspace);
    let report = session.run().await?;

    info!(
        "job {} submitted on {} ({}), dice core/whole/enhancing = {:.3}/{:.3}/{:.3}",
        report.job.id,
        report.compute.name,
        report.compute.vm_size,
        report.dice[0],
        report.dice[1],
        report.dice[2]
    );

    Ok(())
}
