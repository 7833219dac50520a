use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Extension of the library files the engine is assembled from.
pub const LIBRARY_EXT: &str = "jar";

/// A runtime cannot be assembled from fewer libraries than this.
pub const MIN_LIBRARY_COUNT: usize = 2;

const LOCK_GUIDANCE: &str =
    "Please close all open consoles and stop all running servers before trying again.";

/// Lists the entries in `dir` whose lowercased name satisfies `keep`, in
/// sorted order. A missing directory lists as empty. The filter is purely
/// name-based, matching how a previous install may leave oddities behind.
fn list_where(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if keep(&name.to_ascii_lowercase()) {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

pub fn list_libraries(dir: &Path) -> Result<Vec<PathBuf>> {
    let suffix = format!(".{LIBRARY_EXT}");
    list_where(dir, |name| name.ends_with(&suffix))
}

/// Resolves the ordered library set for one launch.
///
/// Falls back once into a nested `lib` subdirectory when `base_dir` holds
/// fewer than the minimum; still coming up short is fatal, since no usable
/// runtime can be assembled from a partial set.
pub fn resolve_library_path(base_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut libraries = list_libraries(base_dir)?;
    if libraries.len() < MIN_LIBRARY_COUNT {
        libraries = list_libraries(&base_dir.join("lib"))?;
    }
    if libraries.len() < MIN_LIBRARY_COUNT {
        bail!(
            "could not find the runtime libraries under {}; the installation is incomplete (run with -update to reinstall)",
            base_dir.display()
        );
    }
    Ok(libraries)
}

/// Attempts to delete any library whose filename contains `name_fragment`
/// before anything else is touched.
///
/// That library is the one a running process most likely holds open, so a
/// failed delete aborts the whole upgrade here, before any other file has
/// been removed.
pub fn check_locked(lib_dir: &Path, name_fragment: &str) -> Result<()> {
    let fragment = name_fragment.to_ascii_lowercase();
    for library in list_libraries(lib_dir)? {
        let matches = library
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.to_ascii_lowercase().contains(&fragment))
            .unwrap_or(false);
        if !matches {
            continue;
        }
        fs::remove_file(&library).with_context(|| {
            format!(
                "cannot delete {} to complete the upgrade; a running process may hold it open. {LOCK_GUIDANCE}",
                library.display()
            )
        })?;
    }
    Ok(())
}

/// Deletes every previously installed library. All-or-nothing: the first
/// failed delete aborts so the next launch never picks up a partial set.
pub fn remove_previous(lib_dir: &Path) -> Result<()> {
    for library in list_libraries(lib_dir)? {
        fs::remove_file(&library).with_context(|| {
            format!(
                "could not delete the library [{}]. {LOCK_GUIDANCE}",
                library.display()
            )
        })?;
    }
    Ok(())
}
