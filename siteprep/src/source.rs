use std::{env, fs, path::Path, path::PathBuf, process::Command};

use log::info;

use crate::error::{PrepErr, Result};
use crate::walk::{copy_relative, relative_files};

/// Where the raw dataset comes from.
///
/// The pipeline only needs a populated folder; how it gets populated is the
/// implementation's business.
pub trait DatasetSource {
    /// Materializes the dataset under `dest`.
    fn fetch(&self, dest: &Path) -> Result<()>;
}

/// Downloads a dataset with the `kaggle` CLI and extracts it with `unzip`.
///
/// Authentication uses the `KAGGLE_USERNAME` / `KAGGLE_KEY` environment
/// variables; both must be present before anything is spawned.
pub struct KaggleCli {
    slug: String,
}

impl KaggleCli {
    /// Creates a source for a `owner/dataset` Kaggle slug.
    pub fn new(slug: impl Into<String>) -> Self {
        Self { slug: slug.into() }
    }

    fn require_env(key: &'static str) -> Result<()> {
        if env::var_os(key).is_none() {
            return Err(PrepErr::MissingEnv { key });
        }
        Ok(())
    }

    fn run(program: &'static str, args: &[&str]) -> Result<()> {
        let status = Command::new(program).args(args).status()?;
        if !status.success() {
            return Err(PrepErr::Command { program, status });
        }
        Ok(())
    }
}

impl DatasetSource for KaggleCli {
    fn fetch(&self, dest: &Path) -> Result<()> {
        Self::require_env("KAGGLE_USERNAME")?;
        Self::require_env("KAGGLE_KEY")?;

        fs::create_dir_all(dest)?;
        let dest_str = dest.to_string_lossy();

        info!("downloading kaggle dataset {}", self.slug);
        Self::run(
            "kaggle",
            &["datasets", "download", "-d", &self.slug, "-p", &dest_str],
        )?;

        // The CLI names the archive after the part behind the slash.
        let archive_name = self
            .slug
            .rsplit('/')
            .next()
            .unwrap_or(self.slug.as_str());
        let archive = dest.join(format!("{archive_name}.zip"));
        let archive_str = archive.to_string_lossy();

        info!("extracting {archive_str}");
        Self::run("unzip", &["-q", "-o", &archive_str, "-d", &dest_str])?;
        fs::remove_file(&archive)?;

        Ok(())
    }
}

/// Copies an already-downloaded dataset tree (offline runs and tests).
pub struct LocalSource {
    path: PathBuf,
}

impl LocalSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for LocalSource {
    fn fetch(&self, dest: &Path) -> Result<()> {
        let files = relative_files(&self.path)?;
        if files.is_empty() {
            return Err(PrepErr::EmptyDataset {
                path: self.path.clone(),
            });
        }

        for rel in &files {
            copy_relative(&self.path, dest, rel)?;
        }

        info!("copied {} files from {}", files.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_source_copies_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("normal")).unwrap();
        fs::write(src.join("normal/a.jpeg"), b"x").unwrap();

        let dest = dir.path().join("dest");
        LocalSource::new(&src).fetch(&dest).unwrap();

        assert!(dest.join("normal/a.jpeg").is_file());
        assert!(src.join("normal/a.jpeg").is_file());
    }

    #[test]
    fn local_source_rejects_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();

        let err = LocalSource::new(&src)
            .fetch(&dir.path().join("dest"))
            .unwrap_err();
        assert!(matches!(err, PrepErr::EmptyDataset { .. }));
    }
}
