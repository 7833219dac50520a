use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const LIB_MARKER_FILE: &str = "version.properties";
pub const SHELL_MARKER_FILE: &str = ".version";

/// Path vocabulary of one resolved installation home.
///
/// The home is fixed once resolved for the process; everything persistent
/// (libraries, shell payload, engine configuration) lives beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLayout {
    home: PathBuf,
}

impl HomeLayout {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.home.join("lib")
    }

    pub fn shell_dir(&self) -> PathBuf {
        self.home.join("shell")
    }

    pub fn engine_dir(&self) -> PathBuf {
        self.home.join("engine")
    }

    pub fn server_config_dir(&self) -> PathBuf {
        self.engine_dir().join("server")
    }

    pub fn web_config_dir(&self, server_name: &str) -> PathBuf {
        self.server_config_dir().join("web").join(server_name)
    }

    pub fn cli_config_dir(&self) -> PathBuf {
        self.engine_dir().join("cli")
    }

    pub fn cli_web_config_dir(&self) -> PathBuf {
        self.cli_config_dir().join("web")
    }

    pub fn shell_marker_path(&self) -> PathBuf {
        self.shell_dir().join(SHELL_MARKER_FILE)
    }

    pub fn ensure_home(&self) -> Result<()> {
        fs::create_dir_all(&self.home)
            .with_context(|| format!("failed to create home directory: {}", self.home.display()))
    }
}

/// The libraries marker lives inside the (overridable) lib directory, so it
/// is addressed relative to that directory rather than the layout.
pub fn lib_marker_path(lib_dir: &Path) -> PathBuf {
    lib_dir.join(LIB_MARKER_FILE)
}

/// `~/.{name}`, or `None` when no user home is available; the caller falls
/// back to the binary's own directory.
pub fn default_user_home(name: &str) -> Option<PathBuf> {
    let variable = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(variable).map(|home| PathBuf::from(home).join(format!(".{name}")))
}
