use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::extract::{clean_unpacked, install_archive};
use crate::layout::{lib_marker_path, HomeLayout};
use crate::libpath::{check_locked, list_libraries, remove_previous, MIN_LIBRARY_COUNT};
use crate::markers::{check_marker, delete_marker, write_marker, MarkerStatus};

/// Identifiers of the embedded resources every distribution must carry.
pub const LIB_ARCHIVE: &str = "libs.zip";
pub const SHELL_ARCHIVE: &str = "shell.zip";
pub const ENGINE_ARCHIVE: &str = "engine.zip";
pub const LIB_VERSION_RESOURCE: &str = "libs.version";
pub const SHELL_VERSION_RESOURCE: &str = "shell.version";

/// Named byte blobs bundled with the running binary.
pub trait ResourceStore {
    fn archive(&self, id: &str) -> Option<&[u8]>;
    fn text(&self, id: &str) -> Option<&str>;
}

#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    /// Where the libraries live; defaults to `<home>/lib` but `-lib` may
    /// point it elsewhere.
    pub lib_dir: PathBuf,
    /// `-update` was passed: reinstall regardless of markers.
    pub force_update: bool,
    /// The `autoupdate` property: let the version gate reinstall on its own.
    pub auto_update: bool,
    /// Fragment naming the library a running server most likely holds open.
    pub lock_fragment: String,
}

/// What the version gate decided for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentAction {
    Current,
    Installed {
        version: String,
    },
    /// A newer bundled version exists but auto-update is off; nothing was
    /// touched. `installed` is `None` when the marker could not be read.
    UpdateAvailable {
        installed: Option<String>,
        bundled: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub libraries: ComponentAction,
    pub shell: ComponentAction,
    pub bytes_written: u64,
}

fn required_text<'r>(resources: &'r dyn ResourceStore, id: &str) -> Result<&'r str> {
    resources
        .text(id)
        .with_context(|| format!("embedded resource '{id}' is missing; the distribution is corrupt"))
}

fn required_archive<'r>(resources: &'r dyn ResourceStore, id: &str) -> Result<&'r [u8]> {
    resources
        .archive(id)
        .with_context(|| format!("embedded archive '{id}' is missing; the distribution is corrupt"))
}

/// Runs the provisioning sequence against one resolved home.
///
/// Archives install strictly in order (libraries, shell payload, engine
/// configuration) because later steps assume the earlier directories exist.
/// Nothing here terminates the process; fatal conditions surface as errors
/// to the single top-level exit point.
pub fn provision(
    layout: &HomeLayout,
    resources: &dyn ResourceStore,
    options: &ProvisionOptions,
    progress: &mut dyn FnMut(&str),
) -> Result<ProvisionReport> {
    let lib_dir = options.lib_dir.as_path();
    let bundled_libs = required_text(resources, LIB_VERSION_RESOURCE)?.trim();
    let bundled_shell = required_text(resources, SHELL_VERSION_RESOURCE)?.trim();

    // A run killed mid-unpack leaves intermediates behind (a recurring
    // problem on Windows).
    clean_unpacked(lib_dir);

    let lib_marker = lib_marker_path(lib_dir);
    let mut libraries = ComponentAction::Current;
    let mut update_libs = options.force_update;
    if lib_dir.exists() && !update_libs {
        match check_marker(&lib_marker, bundled_libs) {
            MarkerStatus::Current => {}
            MarkerStatus::Missing => {
                if options.auto_update {
                    update_libs = true;
                } else {
                    libraries = ComponentAction::UpdateAvailable {
                        installed: None,
                        bundled: bundled_libs.to_string(),
                    };
                }
            }
            MarkerStatus::Stale { installed } => {
                if options.auto_update {
                    update_libs = true;
                    delete_marker(&lib_marker)?;
                } else {
                    libraries = ComponentAction::UpdateAvailable {
                        installed: Some(installed),
                        bundled: bundled_libs.to_string(),
                    };
                }
            }
        }
    }

    let mut bytes_written = 0_u64;
    let mut installed_shell_with_libs = false;
    let library_count = list_libraries(lib_dir)?.len();
    if !lib_dir.exists() || library_count < MIN_LIBRARY_COUNT || update_libs {
        check_locked(lib_dir, &options.lock_fragment)?;
        remove_previous(lib_dir)?;

        bytes_written += install_archive(required_archive(resources, LIB_ARCHIVE)?, lib_dir, progress)?;
        bytes_written += install_archive(
            required_archive(resources, SHELL_ARCHIVE)?,
            &layout.shell_dir(),
            progress,
        )?;
        bytes_written += install_archive(
            required_archive(resources, ENGINE_ARCHIVE)?,
            &layout.engine_dir(),
            progress,
        )?;

        write_marker(&lib_marker, bundled_libs)?;
        write_marker(&layout.shell_marker_path(), bundled_shell)?;
        clean_unpacked(lib_dir);

        libraries = ComponentAction::Installed {
            version: bundled_libs.to_string(),
        };
        installed_shell_with_libs = true;
    }

    // The shell payload carries its own marker and can go stale
    // independently of the libraries.
    let mut shell = ComponentAction::Current;
    if installed_shell_with_libs {
        shell = ComponentAction::Installed {
            version: bundled_shell.to_string(),
        };
    } else if layout.shell_dir().exists() {
        let shell_marker = layout.shell_marker_path();
        match check_marker(&shell_marker, bundled_shell) {
            MarkerStatus::Current => {}
            status => {
                if options.auto_update {
                    delete_marker(&shell_marker)?;
                    bytes_written += install_archive(
                        required_archive(resources, SHELL_ARCHIVE)?,
                        &layout.shell_dir(),
                        progress,
                    )?;
                    write_marker(&shell_marker, bundled_shell)?;
                    shell = ComponentAction::Installed {
                        version: bundled_shell.to_string(),
                    };
                } else {
                    let installed = match status {
                        MarkerStatus::Stale { installed } => Some(installed),
                        _ => None,
                    };
                    shell = ComponentAction::UpdateAvailable {
                        installed,
                        bundled: bundled_shell.to_string(),
                    };
                }
            }
        }
    }

    Ok(ProvisionReport {
        libraries,
        shell,
        bytes_written,
    })
}
