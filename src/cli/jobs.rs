use crate::core::{Action, Job};
use anyhow::{bail, Context, Result};
use log::{debug, warn};
use std::path::Path;
use walkdir::WalkDir;

/// Build one job per regular file under `dir`, in file-name order.
///
/// Symlinks to regular files count as files; directory symlinks are not
/// descended into.
/// The `.env` file at the top of `dir` is skipped since it may hold the key.
/// Paths that are not valid UTF-8 cannot be encoded as jobs and are skipped.
pub fn collect_jobs(dir: &Path, action: Action) -> Result<Vec<Job>> {
    if !dir.is_dir() {
        bail!("Invalid directory path: {}", dir.display());
    }
    let env_file = dir.join(".env");

    let mut jobs = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {}", dir.display()))?;
        if !entry.path().is_file() || entry.path() == env_file {
            continue;
        }
        match entry.path().to_str() {
            Some(path) => jobs.push(Job::new(path, action)),
            None => warn!("Skipping non UTF-8 path {}", entry.path().display()),
        }
    }

    debug!("Found {} files under {}", jobs.len(), dir.display());
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collects_files_recursively_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("sub").join("c.txt"), b"c").unwrap();
        fs::write(dir.path().join(".env"), b"CRYPTPOOL_KEY=k").unwrap();

        let jobs = collect_jobs(dir.path(), Action::Encrypt).unwrap();
        let names: Vec<_> = jobs
            .iter()
            .map(|j| {
                Path::new(j.target())
                    .strip_prefix(dir.path())
                    .unwrap()
                    .to_path_buf()
            })
            .collect();

        assert_eq!(
            names,
            vec![
                Path::new("a.txt").to_path_buf(),
                Path::new("b.txt").to_path_buf(),
                Path::new("sub").join("c.txt"),
            ]
        );
        assert!(jobs.iter().all(|j| j.action() == Action::Encrypt));
    }

    #[cfg(unix)]
    #[test]
    fn test_includes_symlinked_files() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let real = outside.path().join("real.txt");
        fs::write(&real, b"r").unwrap();
        std::os::unix::fs::symlink(&real, dir.path().join("link.txt")).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked-dir")).unwrap();

        let jobs = collect_jobs(dir.path(), Action::Encrypt).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(
            Path::new(jobs[0].target()),
            dir.path().join("link.txt").as_path()
        );
    }

    #[test]
    fn test_rejects_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_jobs(&dir.path().join("missing"), Action::Decrypt).unwrap_err();
        assert!(err.to_string().contains("Invalid directory path"));
    }
}
