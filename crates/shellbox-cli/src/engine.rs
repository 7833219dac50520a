use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use shellbox_core::Properties;

use crate::launch;

/// Everything the loader hands to the engine. The loader produces these
/// values and never interprets them further.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub webroot: PathBuf,
    pub server_config_dir: PathBuf,
    pub web_config_dir: PathBuf,
    pub entry_path: PathBuf,
    pub libraries: Vec<PathBuf>,
    pub settings: Properties,
    pub arguments: Vec<String>,
    pub background: bool,
    pub debug: bool,
}

/// Narrow hand-off seam; swapped for a recording fake in tests so nothing
/// upstream depends on the concrete engine.
pub trait EngineInvoker {
    fn invoke(&self, request: &EngineRequest) -> Result<i32>;
}

pub fn library_path_separator() -> &'static str {
    if cfg!(windows) {
        ";"
    } else {
        ":"
    }
}

pub fn join_library_path(libraries: &[PathBuf]) -> String {
    libraries
        .iter()
        .map(|library| library.display().to_string())
        .collect::<Vec<_>>()
        .join(library_path_separator())
}

const ENGINE_ENTRY_CLASS: &str = "org.shellbox.engine.EngineMain";
const READY_MARKER: &str = "Engine is up";
const DEFAULT_LAUNCH_TIMEOUT_MS: u64 = 50_000;

/// Spawns the engine as a JVM process assembled from the resolved library
/// path. This adapter is the only code that knows the engine is JVM-hosted.
pub struct ProcessInvoker {
    timeout: Duration,
}

impl ProcessInvoker {
    pub fn from_properties(properties: &Properties) -> Self {
        let timeout = properties
            .get_no_case("timeout")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_LAUNCH_TIMEOUT_MS);
        Self {
            timeout: Duration::from_millis(timeout),
        }
    }

    pub(crate) fn command(&self, request: &EngineRequest) -> Command {
        let mut command = Command::new("java");
        for (key, value) in request.settings.iter() {
            command.arg(format!("-D{key}={value}"));
        }
        command
            .arg("-cp")
            .arg(join_library_path(&request.libraries))
            .arg(ENGINE_ENTRY_CLASS)
            .arg(format!("-webroot={}", request.webroot.display()))
            .arg(format!(
                "-server-config={}",
                request.server_config_dir.display()
            ))
            .arg(format!("-web-config={}", request.web_config_dir.display()))
            .arg(format!("-uri={}", request.entry_path.display()));
        if request.debug {
            command.arg("-debug=true");
        }
        command.args(&request.arguments);
        command
    }
}

impl EngineInvoker for ProcessInvoker {
    fn invoke(&self, request: &EngineRequest) -> Result<i32> {
        let mut command = self.command(request);
        if request.background {
            return launch::launch_and_watch(&mut command, self.timeout, READY_MARKER);
        }
        let status = command
            .status()
            .context("failed to start the engine process; is a Java runtime on the PATH?")?;
        Ok(status.code().unwrap_or(1))
    }
}
