use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use shellbox_core::{list_contains, map_get_no_case, remove_containing, to_map, Properties};
use shellbox_installer::{
    default_user_home, lib_marker_path, provision, resolve_library_path, ComponentAction,
    HomeLayout, ProvisionOptions, ProvisionReport, ResourceStore,
};

use crate::bundle::{BundledResources, DEFAULT_PROPERTIES};
use crate::engine::{EngineInvoker, EngineRequest, ProcessInvoker};
use crate::render;

const DEFAULT_NAME: &str = "shellbox";
const DEFAULT_SHELL_PATH: &str = "/shell/cli/shell.sbx";
const DEFAULT_SERVER_NAME: &str = "default";
/// The server host library is the one a running process holds open.
const LOCK_FRAGMENT: &str = "server";

/// Immutable bootstrap state, constructed once and passed by parameter.
/// The home directory held here is fixed for the rest of the process.
#[derive(Debug, Clone)]
pub struct BootContext {
    pub name: String,
    pub home: PathBuf,
    pub lib_dir: PathBuf,
    pub shell_path: String,
    pub server_name: String,
    pub debug: bool,
    pub background: bool,
    pub force_update: bool,
    pub auto_update: bool,
    pub properties: Properties,
    /// Arguments the loader did not consume; forwarded untouched.
    pub arguments: Vec<String>,
}

/// Configuration sources snapshotted once per process so the resolution
/// chain stays a pure function of its inputs.
pub(crate) struct ConfigSources {
    pub defaults: Properties,
    pub binary_props: Properties,
    pub env: HashMap<String, String>,
    pub settings: Properties,
    pub exe_dir: PathBuf,
    pub user_home: Option<PathBuf>,
    pub pwd: PathBuf,
}

impl ConfigSources {
    pub(crate) fn from_process() -> Result<Self> {
        let defaults = Properties::parse(DEFAULT_PROPERTIES);
        let name = defaults
            .get_no_case("name")
            .unwrap_or(DEFAULT_NAME)
            .to_string();

        let exe_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        let binary_props = load_binary_props(&exe_dir, &name)?;

        let env_map: HashMap<String, String> = env::vars().collect();
        let settings_var = format!("{}_SETTINGS", name.to_ascii_uppercase());
        let settings = env_map
            .get(&settings_var)
            .map(|raw| Properties::from_delimited(raw))
            .unwrap_or_default();

        let pwd = env::current_dir().context("failed to resolve the working directory")?;
        let user_home = default_user_home(&name);

        Ok(Self {
            defaults,
            binary_props,
            env: env_map,
            settings,
            exe_dir,
            user_home,
            pwd,
        })
    }
}

/// `{name}.properties` next to the binary, falling back to the generic
/// `cli.properties`; empty when neither exists.
fn load_binary_props(exe_dir: &Path, name: &str) -> Result<Properties> {
    let named = exe_dir.join(format!("{}.properties", name.to_ascii_lowercase()));
    let generic = exe_dir.join("cli.properties");
    for candidate in [named, generic] {
        if candidate.is_file() {
            return Properties::load(&candidate);
        }
    }
    Ok(Properties::new())
}

/// Resolves the installation home. First non-empty source wins, in order:
/// command-line override (present-but-empty is a hard error), properties
/// file next to the binary, environment variable, injected process
/// settings, bundled defaults, then a computed per-user default with the
/// binary's own directory as the last resort.
pub(crate) fn resolve_home(
    name: &str,
    config: &HashMap<String, String>,
    sources: &ConfigSources,
) -> Result<PathBuf> {
    let home_key = format!("{name}_home");

    if let Some(value) = map_get_no_case(config, &home_key) {
        if value.trim().is_empty() {
            bail!("the home directory cannot be empty");
        }
        return Ok(PathBuf::from(value));
    }

    let from_binary_props = sources
        .binary_props
        .get_no_case("home")
        .or_else(|| sources.binary_props.get_no_case(&home_key));
    if let Some(value) = non_empty(from_binary_props) {
        return Ok(PathBuf::from(value));
    }

    if let Some(value) = non_empty(map_get_no_case(&sources.env, &home_key)) {
        return Ok(PathBuf::from(value));
    }

    if let Some(value) = non_empty(sources.settings.get_no_case(&home_key)) {
        return Ok(PathBuf::from(value));
    }

    let from_defaults = sources
        .defaults
        .get_no_case(&home_key)
        .or_else(|| sources.defaults.get_no_case("home"));
    if let Some(value) = non_empty(from_defaults) {
        return Ok(PathBuf::from(value));
    }

    Ok(sources
        .user_home
        .clone()
        .unwrap_or_else(|| sources.exe_dir.clone()))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Builds the immutable context: resolves the home, merges the property
/// chain, consumes the loader's own flags, and leaves everything else in
/// the pass-through argument list.
pub(crate) fn build_context(raw_args: &[String], sources: &ConfigSources) -> Result<BootContext> {
    let mut arguments: Vec<String> = raw_args.to_vec();

    let debug = list_contains(&arguments, "-debug") || list_contains(&arguments, "-clidebug");
    remove_containing(&mut arguments, "-debug");
    remove_containing(&mut arguments, "-clidebug");

    let name = sources
        .defaults
        .get_no_case("name")
        .unwrap_or(DEFAULT_NAME)
        .to_string();

    let config = to_map(&arguments);

    // Property chain, last-loaded wins: bundled defaults, then the file
    // next to the binary, then the file inside the home, then injected
    // process settings. Contrast with resolve_home, where the first match
    // wins.
    let mut properties = sources.defaults.clone();
    properties.merge(&sources.binary_props);

    let home = resolve_home(&name, &config, sources)?;
    remove_containing(&mut arguments, &format!("-{name}_home"));

    let home_props = home.join("cli.properties");
    if home_props.is_file() {
        properties.merge(&Properties::load(&home_props)?);
    }
    properties.merge(&sources.settings);

    let force_update =
        list_contains(&arguments, "-update") || list_contains(&arguments, "-cliupdate");
    remove_containing(&mut arguments, "-update");
    remove_containing(&mut arguments, "-cliupdate");

    let background = list_contains(&arguments, "-background");
    remove_containing(&mut arguments, "-background");

    let layout = HomeLayout::new(&home);
    let mut lib_dir = layout.lib_dir();
    if list_contains(&arguments, "-lib") {
        if let Some(value) = config.get("lib") {
            if !value.trim().is_empty() {
                lib_dir = PathBuf::from(value);
            }
        }
        remove_containing(&mut arguments, "-lib");
    }

    let mut shell_path = properties
        .get_no_case("shell")
        .unwrap_or(DEFAULT_SHELL_PATH)
        .to_string();
    for flag in ["-shellpath", "-clishellpath"] {
        if list_contains(&arguments, flag) {
            if let Some(value) = config.get(flag.trim_start_matches('-')) {
                if !value.trim().is_empty() {
                    shell_path = value.to_string();
                }
            }
            remove_containing(&mut arguments, flag);
        }
    }

    let mut server_name = DEFAULT_SERVER_NAME.to_string();
    if list_contains(&arguments, "-name") {
        if let Some(value) = config.get("name") {
            if !value.trim().is_empty() {
                server_name = value.to_string();
            }
        }
        remove_containing(&mut arguments, "-name");
    }

    let auto_update = properties.get_bool("autoupdate");

    properties.set("home", home.display().to_string());
    properties.set("pwd", sources.pwd.display().to_string());
    properties.set("lib", lib_dir.display().to_string());
    properties.set("shell", shell_path.clone());
    properties.set(
        "config.server",
        layout.server_config_dir().display().to_string(),
    );
    properties.set(
        "config.web",
        layout.web_config_dir(&server_name).display().to_string(),
    );
    properties.set("arguments", arguments.join(" "));
    properties.set(
        "arguments.array",
        serde_json::to_string(&arguments).context("failed to encode the argument list")?,
    );

    Ok(BootContext {
        name,
        home,
        lib_dir,
        shell_path,
        server_name,
        debug,
        background,
        force_update,
        auto_update,
        properties,
        arguments,
    })
}

/// The whole bootstrap sequence: context, provisioning, library path,
/// engine hand-off. Returns the engine's exit code; every fatal condition
/// is an error for `main` to report.
pub fn run(raw_args: &[String]) -> Result<i32> {
    let sources = ConfigSources::from_process()?;
    let context = build_context(raw_args, &sources)?;
    render::debug(context.debug, &format!("home: {}", context.home.display()));
    render::debug(
        context.debug,
        &format!("library path: {}", context.lib_dir.display()),
    );

    let layout = HomeLayout::new(&context.home);
    if !context.home.exists() {
        render::status(&format!(
            "Configuring {} home: {} (change with -{}_home=/path/to/dir)",
            context.name,
            context.home.display(),
            context.name
        ));
    }
    layout.ensure_home()?;

    let report = run_provisioning(&layout, &context, &BundledResources)?;
    render_report(&context, &report);

    let libraries = resolve_library_path(&context.lib_dir)?;
    let entry_path = resolve_entry_path(&context)?;
    let request = EngineRequest {
        webroot: sources.pwd.clone(),
        server_config_dir: layout.cli_config_dir(),
        web_config_dir: layout.cli_web_config_dir(),
        entry_path,
        libraries,
        settings: context.properties.clone(),
        arguments: context.arguments.clone(),
        background: context.background,
        debug: context.debug,
    };

    let invoker = ProcessInvoker::from_properties(&context.properties);
    invoker.invoke(&request)
}

fn run_provisioning(
    layout: &HomeLayout,
    context: &BootContext,
    resources: &dyn ResourceStore,
) -> Result<ProvisionReport> {
    let options = ProvisionOptions {
        lib_dir: context.lib_dir.clone(),
        force_update: context.force_update,
        auto_update: context.auto_update,
        lock_fragment: LOCK_FRAGMENT.to_string(),
    };
    let mut spinner = render::ExtractionProgress::new();
    let report = provision(layout, resources, &options, &mut |entry| {
        spinner.entry(entry);
    });
    // Cleared on the error path too; the tick thread must never outlive
    // the extraction.
    spinner.finish();
    report
}

fn render_report(context: &BootContext, report: &ProvisionReport) {
    if let ComponentAction::Installed { version } = &report.libraries {
        render::status(&format!("Libraries initialized (version {version})"));
        render::debug(
            context.debug,
            &format!("wrote {} bytes, marker {}", report.bytes_written, lib_marker_path(&context.lib_dir).display()),
        );
    }
    for (component, action) in [
        ("libraries", &report.libraries),
        ("shell payload", &report.shell),
    ] {
        if let ComponentAction::UpdateAvailable { installed, bundled } = action {
            match installed {
                Some(installed) => render::warn(&format!(
                    "A newer {component} bundle is available ({installed} installed, {bundled} bundled); run '{} -update' to install it",
                    context.name
                )),
                None => render::warn(&format!(
                    "Cannot confirm the installed {component} version; run '{} -update' to reinstall",
                    context.name
                )),
            }
        }
    }
}

/// The entry script resolves inside the home first, then as given; a
/// script that exists nowhere is a fatal configuration problem.
pub(crate) fn resolve_entry_path(context: &BootContext) -> Result<PathBuf> {
    let relative = context.shell_path.trim_start_matches(['/', '\\']);
    let in_home = context.home.join(relative);
    if in_home.exists() {
        return Ok(in_home);
    }
    let direct = PathBuf::from(&context.shell_path);
    if direct.exists() {
        return Ok(direct);
    }
    bail!("could not find shell: {}", context.shell_path);
}
