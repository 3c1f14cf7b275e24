//! Files-changed measurement (spec §4.8 step 5, [SUPPLEMENT] in SPEC_FULL.md
//! §4.8). Grounded in the teacher's `git::commit_project_changes`, which
//! already shells out to `git status --porcelain` and skips silently when no
//! `.git` directory exists — the same git-or-skip pattern, repurposed here to
//! count changed files instead of committing them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use sprinty_data::{Result, SprintyError};

/// A snapshot of `(relative path, mtime)` pairs, used as the fallback change
/// detector when the project working directory isn't a git repository.
pub struct MtimeManifest {
    entries: HashMap<PathBuf, SystemTime>,
}

impl MtimeManifest {
    pub fn capture(root: &Path) -> Result<Self> {
        let mut entries = HashMap::new();
        walk(root, root, &mut entries)?;
        Ok(Self { entries })
    }

    /// Count paths that are new, removed, or whose mtime changed since this
    /// manifest was captured.
    pub fn diff_against(&self, after: &MtimeManifest) -> u32 {
        let mut changed = 0u32;
        for (path, mtime) in &after.entries {
            match self.entries.get(path) {
                Some(before_mtime) if before_mtime == mtime => {}
                _ => changed += 1,
            }
        }
        for path in self.entries.keys() {
            if !after.entries.contains_key(path) {
                changed += 1;
            }
        }
        changed
    }
}

fn walk(root: &Path, dir: &Path, out: &mut HashMap<PathBuf, SystemTime>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_name = entry.file_name();
        if file_name == ".git" || file_name == ".sprinty" || file_name == "target" {
            continue;
        }
        if path.is_dir() {
            walk(root, &path, out)?;
        } else {
            let metadata = entry.metadata()?;
            let mtime = metadata.modified()?;
            if let Ok(relative) = path.strip_prefix(root) {
                out.insert(relative.to_path_buf(), mtime);
            }
        }
    }
    Ok(())
}

/// Count changed files via `git status --porcelain`, falling back to an
/// mtime-manifest diff when `project_path` has no `.git` directory.
pub fn files_changed_via_git(project_path: &Path) -> Result<u32> {
    let git_dir = project_path.join(".git");
    if !git_dir.exists() {
        return Err(SprintyError::Unknown("not a git repository".to_string()));
    }

    let output = Command::new("git")
        .current_dir(project_path)
        .args(["status", "--porcelain"])
        .output()
        .map_err(|e| SprintyError::Unknown(format!("failed to run git status: {e}")))?;

    let count = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .count();

    Ok(count as u32)
}

/// Wraps a before/after pair so the orchestrator can measure files_changed
/// regardless of whether the project is under git.
pub struct ChangeMeasurement {
    project_path: PathBuf,
    before_manifest: Option<MtimeManifest>,
}

impl ChangeMeasurement {
    /// Begin measuring. Captures an mtime manifest eagerly so the fallback
    /// path is ready even if a later git check fails transiently.
    pub fn begin(project_path: impl Into<PathBuf>) -> Result<Self> {
        let project_path = project_path.into();
        let before_manifest = MtimeManifest::capture(&project_path).ok();
        Ok(Self { project_path, before_manifest })
    }

    pub fn finish(self) -> Result<u32> {
        if let Ok(count) = files_changed_via_git(&self.project_path) {
            return Ok(count);
        }
        let before = self
            .before_manifest
            .ok_or_else(|| SprintyError::Unknown("no baseline manifest captured".to_string()))?;
        let after = MtimeManifest::capture(&self.project_path)?;
        Ok(before.diff_against(&after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn mtime_manifest_detects_modified_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "one").unwrap();
        let before = MtimeManifest::capture(dir.path()).unwrap();

        sleep(Duration::from_millis(20));
        fs::write(dir.path().join("a.txt"), "two").unwrap();
        let after = MtimeManifest::capture(dir.path()).unwrap();

        assert_eq!(before.diff_against(&after), 1);
    }

    #[test]
    fn mtime_manifest_detects_new_and_removed_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.txt"), "x").unwrap();
        fs::write(dir.path().join("removed.txt"), "x").unwrap();
        let before = MtimeManifest::capture(dir.path()).unwrap();

        fs::remove_file(dir.path().join("removed.txt")).unwrap();
        fs::write(dir.path().join("new.txt"), "y").unwrap();
        let after = MtimeManifest::capture(dir.path()).unwrap();

        assert_eq!(before.diff_against(&after), 2);
    }

    #[test]
    fn no_changes_yields_zero() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "one").unwrap();
        let before = MtimeManifest::capture(dir.path()).unwrap();
        let after = MtimeManifest::capture(dir.path()).unwrap();
        assert_eq!(before.diff_against(&after), 0);
    }

    #[test]
    fn non_git_directory_reports_error_from_git_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(files_changed_via_git(dir.path()).is_err());
    }

    #[test]
    fn change_measurement_falls_back_to_mtime_manifest_without_git() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "one").unwrap();
        let measurement = ChangeMeasurement::begin(dir.path()).unwrap();
        sleep(Duration::from_millis(20));
        fs::write(dir.path().join("b.txt"), "two").unwrap();
        assert_eq!(measurement.finish().unwrap(), 1);
    }
}
