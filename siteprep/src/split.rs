use std::path::Path;

use log::info;

use crate::error::{PrepErr, Result};
use crate::walk::{copy_relative, relative_files};

/// How many files each stage of the split received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitCounts {
    pub train: usize,
    pub val: usize,
    pub test: usize,
}

impl SplitCounts {
    /// Stage sizes for an 80/10/10 split of `total` files.
    ///
    /// `train` and `val` round down; `test` absorbs the remainder, so the
    /// three stages always cover every file exactly once.
    pub fn for_total(total: usize) -> Self {
        let train = total * 80 / 100;
        let val = total * 10 / 100;
        Self {
            train,
            val,
            test: total - train - val,
        }
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.train + self.val + self.test
    }
}

/// Splits the dataset at `src` into `train/ val/ test/` under `dst`.
///
/// Files are enumerated in sorted relative-path order, the first 80% goes
/// to `train`, the next 10% to `val`, the rest to `test`. Files are copied,
/// never moved, and keep their relative path below the stage folder.
///
/// # Returns
/// The per-stage file counts, or an error if `src` holds no files.
pub fn split_dataset(src: &Path, dst: &Path) -> Result<SplitCounts> {
    let files = relative_files(src)?;
    if files.is_empty() {
        return Err(PrepErr::EmptyDataset { path: src.into() });
    }

    let counts = SplitCounts::for_total(files.len());
    info!(
        "splitting {} files: train={} val={} test={}",
        counts.total(),
        counts.train,
        counts.val,
        counts.test
    );

    for (i, rel) in files.iter().enumerate() {
        let stage = if i < counts.train {
            "train"
        } else if i < counts.train + counts.val {
            "val"
        } else {
            "test"
        };
        copy_relative(src, &dst.join(stage), rel)?;
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn counts_cover_every_total() {
        for total in 1..200 {
            let c = SplitCounts::for_total(total);
            assert_eq!(c.total(), total, "total {total}");
            assert!(c.train >= c.val, "total {total}");
        }
    }

    #[test]
    fn counts_match_exact_ratios() {
        let c = SplitCounts::for_total(100);
        assert_eq!(
            c,
            SplitCounts {
                train: 80,
                val: 10,
                test: 10
            }
        );
    }

    #[test]
    fn split_copies_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");

        // Ten files: 8 train, 1 val, 1 test by sorted name.
        fs::create_dir_all(src.join("imgs")).unwrap();
        for i in 0..10 {
            fs::write(src.join("imgs").join(format!("{i:02}.jpeg")), b"x").unwrap();
        }

        let counts = split_dataset(&src, &dst).unwrap();
        assert_eq!(
            counts,
            SplitCounts {
                train: 8,
                val: 1,
                test: 1
            }
        );

        for i in 0..8 {
            assert!(dst.join(format!("train/imgs/{i:02}.jpeg")).is_file());
        }
        assert!(dst.join("val/imgs/08.jpeg").is_file());
        assert!(dst.join("test/imgs/09.jpeg").is_file());

        // Copy, not move.
        for i in 0..10 {
            assert!(src.join(format!("imgs/{i:02}.jpeg")).is_file());
        }
    }

    #[test]
    fn empty_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();

        assert!(matches!(
            split_dataset(&src, &dir.path().join("dst")),
            Err(PrepErr::EmptyDataset { .. })
        ));
    }
}
