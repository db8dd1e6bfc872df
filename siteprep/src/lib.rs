//! Data-preparation pipeline for the simulated hospital sites.
//!
//! The pipeline downloads a public dataset, performs the 80/10/10
//! train/val/test split, round-robins every file of the split across three
//! site folders, and registers the resulting folders as data assets: one
//! per site plus one central asset holding the undivided split.

pub mod config;
pub mod error;
pub mod partition;
pub mod pipeline;
pub mod source;
pub mod split;
pub mod walk;

pub use config::{PrepConfig, SiteConfig};
pub use error::{PrepErr, Result};
pub use partition::{MANIFEST_FILE, PartitionReport, SITE_ORDER, SiteManifest, partition_sites};
pub use pipeline::{PrepReport, run};
pub use source::{DatasetSource, KaggleCli, LocalSource};
pub use split::{SplitCounts, split_dataset};
