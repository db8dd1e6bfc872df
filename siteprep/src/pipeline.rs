use log::info;
use platform::{AssetKind, AssetSpec, DataAsset, DatasetRegistry};

use crate::config::PrepConfig;
use crate::error::Result;
use crate::partition::{PartitionReport, partition_sites};
use crate::source::DatasetSource;
use crate::split::{SplitCounts, split_dataset};

/// Everything the pipeline produced, for logging and assertions.
#[derive(Debug, Clone)]
pub struct PrepReport {
    pub split: SplitCounts,
    pub partition: PartitionReport,
    pub central: DataAsset,
    pub site_assets: [DataAsset; 3],
}

/// Runs the full preparation pipeline.
///
/// Fetches the raw dataset, splits it 80/10/10, round-robins the split
/// across the three site folders, then registers one asset per site
/// workspace plus the central asset holding the undivided split.
///
/// # Arguments
/// * `config` - Names, paths and site layout.
/// * `source` - Where the raw dataset comes from.
/// * `central_ws` - Registry that receives the central asset.
/// * `site_ws` - Per-site registries, in site assignment order.
///
/// # Returns
/// A [`PrepReport`] describing the split, the partition and the assets.
pub async fn run<S, W>(
    config: &PrepConfig,
    source: &S,
    central_ws: &W,
    site_ws: [&W; 3],
) -> Result<PrepReport>
where
    S: DatasetSource + ?Sized,
    W: DatasetRegistry + ?Sized,
{
    let raw = config.work_dir.join("raw");
    let split_root = config.work_dir.join("split");

    info!("fetching dataset into {}", raw.display());
    source.fetch(&raw)?;

    let split = split_dataset(&raw, &split_root)?;

    let site_roots = [
        config.work_dir.join("sites").join(config.sites[0].site),
        config.work_dir.join("sites").join(config.sites[1].site),
        config.work_dir.join("sites").join(config.sites[2].site),
    ];
    let partition = partition_sites(&split_root, &site_roots)?;

    let central = central_ws
        .register_asset(&AssetSpec {
            name: config.central_asset.clone(),
            path: split_root,
            kind: AssetKind::Folder,
            description: "undivided train/val/test split".into(),
        })
        .await?;

    let mut site_assets = Vec::with_capacity(3);
    for (site, root) in config.sites.iter().zip(site_roots) {
        let asset = site_ws[site_assets.len()]
            .register_asset(&AssetSpec {
                name: config.site_asset.clone(),
                path: root,
                kind: AssetKind::Folder,
                description: format!("{} partition for workspace {}", site.site, site.workspace),
            })
            .await?;

        info!(
            "registered {} v{} in workspace {}",
            asset.name, asset.version, site.workspace
        );
        site_assets.push(asset);
    }

    // SAFETY: The loop above pushes exactly one asset per configured site.
    let site_assets: [DataAsset; 3] = site_assets.try_into().expect("three sites");

    Ok(PrepReport {
        split,
        partition,
        central,
        site_assets,
    })
}
