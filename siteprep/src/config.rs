use std::{env, path::PathBuf};

use crate::partition::SITE_ORDER;

/// One simulated hospital site: its assignment-order name and the
/// workspace its data asset is registered in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub site: &'static str,
    pub workspace: &'static str,
}

/// Pipeline configuration, loaded from the environment.
///
/// Everything has a default matching the demo deployment; only the
/// Kaggle credentials are required (and only when the Kaggle source is
/// actually used).
#[derive(Debug, Clone)]
pub struct PrepConfig {
    pub resource_group: String,
    pub dataset_slug: String,
    pub work_dir: PathBuf,
    /// Asset name registered once per site workspace.
    pub site_asset: String,
    /// Asset name for the undivided split.
    pub central_asset: String,
    pub sites: [SiteConfig; 3],
}

impl PrepConfig {
    /// Creates a configuration snapshot from the process environment.
    pub fn from_env() -> Self {
        fn env_or(key: &str, default: &str) -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        }

        Self {
            resource_group: env_or("FEDLEARN_RESOURCE_GROUP", "fedlearn"),
            dataset_slug: env_or(
                "FEDLEARN_DATASET_SLUG",
                "paultimothymooney/chest-xray-pneumonia",
            ),
            work_dir: env_or("FEDLEARN_WORK_DIR", "./fedlearn-data").into(),
            site_asset: env_or("FEDLEARN_SITE_ASSET", "pneumonia-dataset"),
            central_asset: env_or("FEDLEARN_CENTRAL_ASSET", "pneumonia-central"),
            sites: [
                SiteConfig {
                    site: SITE_ORDER[0],
                    workspace: "Europe-Hospital",
                },
                SiteConfig {
                    site: SITE_ORDER[1],
                    workspace: "Asia-Hospital",
                },
                SiteConfig {
                    site: SITE_ORDER[2],
                    workspace: "US-Hospital",
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo_deployment() {
        let cfg = PrepConfig::from_env();
        assert_eq!(cfg.resource_group, "fedlearn");
        assert_eq!(cfg.site_asset, "pneumonia-dataset");
        assert_eq!(cfg.central_asset, "pneumonia-central");

        let sites: Vec<_> = cfg.sites.iter().map(|s| s.site).collect();
        assert_eq!(sites, vec!["europe", "asia", "us"]);
        let workspaces: Vec<_> = cfg.sites.iter().map(|s| s.workspace).collect();
        assert_eq!(
            workspaces,
            vec!["Europe-Hospital", "Asia-Hospital", "US-Hospital"]
        );
    }
}
