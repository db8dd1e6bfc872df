use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::Result;

/// Enumerates every file under `root`, as paths relative to `root`, sorted
/// lexicographically by full relative path.
///
/// The sort is what makes every downstream index-based assignment
/// reproducible; filesystem listing order is never exposed.
pub fn relative_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect(root, Path::new(""), &mut files)?;
    files.sort();
    Ok(files)
}

fn collect(root: &Path, rel: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(root.join(rel))? {
        let entry = entry?;
        let rel = rel.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            collect(root, &rel, out)?;
        } else {
            out.push(rel);
        }
    }

    Ok(())
}

/// Copies `rel` from `src_root` into `dst_root`, preserving the relative
/// path and creating parent directories as needed.
pub fn copy_relative(src_root: &Path, dst_root: &Path, rel: &Path) -> Result<()> {
    let dst = dst_root.join(rel);
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src_root.join(rel), dst)?;
    Ok(())
}
