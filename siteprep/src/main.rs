use std::{env, io};

use log::info;
use platform::LocalWorkspace;

use siteprep::{KaggleCli, LocalSource, PrepConfig, pipeline, source::DatasetSource};

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let config = PrepConfig::from_env();
    info!(
        "preparing resource group {} under {}",
        config.resource_group,
        config.work_dir.display()
    );

    // An already-downloaded tree takes priority over the Kaggle CLI.
    let source: Box<dyn DatasetSource> = match env::var("FEDLEARN_SOURCE_DIR") {
        Ok(dir) => Box::new(LocalSource::new(dir)),
        Err(_) => Box::new(KaggleCli::new(config.dataset_slug.clone())),
    };

    let workspaces_root = config.work_dir.join("workspaces");
    let central_ws = LocalWorkspace::open(workspaces_root.join(&config.resource_group))?;
    let site_ws = [
        LocalWorkspace::open(workspaces_root.join(config.sites[0].workspace))?,
        LocalWorkspace::open(workspaces_root.join(config.sites[1].workspace))?,
        LocalWorkspace::open(workspaces_root.join(config.sites[2].workspace))?,
    ];

    let report = pipeline::run(
        &config,
        source.as_ref(),
        &central_ws,
        [&site_ws[0], &site_ws[1], &site_ws[2]],
    )
    .await?;

    let counts = report.partition.counts();
    info!(
        "done: split train={} val={} test={}, sites {}/{}/{} files, central asset {} v{}",
        report.split.train,
        report.split.val,
        report.split.test,
        counts[0],
        counts[1],
        counts[2],
        report.central.name,
        report.central.version
    );

    Ok(())
}
