//! The one state-mutation primitive everything else in Sprinty is built on
//! (spec §4.1): read the JSON at `path` (or `T::default()` if it doesn't
//! exist yet), apply a closure, write the result to `path.tmp`, then rename
//! over `path`. The rename is atomic on the same filesystem, so a reader can
//! only ever observe the pre- or post-update content, never a partial write.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::{Result, SprintyError};

/// Read `path` as JSON, defaulting to `T::default()` if the file is absent.
/// A present-but-unparseable file is `StateCorrupt` — callers decide whether
/// to recover by reinitializing.
pub fn read_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)
            .map_err(|e| SprintyError::StateCorrupt(format!("{}: {}", path.display(), e))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Write `value` to `path` via a same-directory temp file + rename.
pub fn write_json<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize,
{
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let tmp_path = tmp_path_for(path);
    let content = serde_json::to_string_pretty(value)?;
    fs::write(&tmp_path, content)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::path::PathBuf::from(tmp)
}

/// Read-modify-write `path`: the sole mutation primitive (spec §4.1).
/// `f` may return any value to pass back to the caller (e.g. the new state,
/// or a derived fact about the transition that just happened).
pub fn update<T, F, R>(path: &Path, f: F) -> Result<R>
where
    T: DeserializeOwned + Serialize + Default,
    F: FnOnce(&mut T) -> R,
{
    let mut value: T = read_json(path)?;
    let result = f(&mut value);
    write_json(path, &value)?;
    Ok(result)
}
