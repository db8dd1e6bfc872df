use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{PrepErr, Result};
use crate::walk::{copy_relative, relative_files};

/// Site names in assignment order: file `i` goes to site `i mod 3`.
pub const SITE_ORDER: [&str; 3] = ["europe", "asia", "us"];

/// Manifest file written into each site folder after partitioning.
pub const MANIFEST_FILE: &str = "manifest.json";

/// What one site received, as persisted in its [`MANIFEST_FILE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteManifest {
    pub site: String,
    pub files: Vec<PathBuf>,
}

/// Which files each site received, in assignment order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionReport {
    pub per_site: [Vec<PathBuf>; 3],
}

impl PartitionReport {
    /// File counts per site, in [`SITE_ORDER`] order.
    pub fn counts(&self) -> [usize; 3] {
        [
            self.per_site[0].len(),
            self.per_site[1].len(),
            self.per_site[2].len(),
        ]
    }
}

/// Round-robins every file under `split_root` across the three site roots.
///
/// One global counter runs over ALL files of the split (train, val and test
/// intermixed), sorted by full relative path; the file at position `i` is
/// copied to `site_roots[i % 3]` under the same relative path. No per-stage
/// or per-class balance is attempted.
///
/// Sources are copied, never moved, so the undivided split stays intact.
/// Each site root additionally receives a [`MANIFEST_FILE`] listing the
/// files it was assigned.
pub fn partition_sites(split_root: &Path, site_roots: &[PathBuf; 3]) -> Result<PartitionReport> {
    let files = relative_files(split_root)?;
    if files.is_empty() {
        return Err(PrepErr::EmptyDataset {
            path: split_root.into(),
        });
    }

    let mut per_site: [Vec<PathBuf>; 3] = [Vec::new(), Vec::new(), Vec::new()];

    for (i, rel) in files.into_iter().enumerate() {
        let site = i % 3;
        copy_relative(split_root, &site_roots[site], &rel)?;
        per_site[site].push(rel);
    }

    for site in 0..3 {
        let manifest = SiteManifest {
            site: SITE_ORDER[site].to_string(),
            files: per_site[site].clone(),
        };
        fs::create_dir_all(&site_roots[site])?;
        fs::write(
            site_roots[site].join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )?;
    }

    let report = PartitionReport { per_site };
    let [europe, asia, us] = report.counts();
    info!(europe = europe, asia = asia, us = us; "partitioned files across sites");

    Ok(report)
}
