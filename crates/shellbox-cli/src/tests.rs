use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use shellbox_core::{to_map, Properties};
use shellbox_installer::{
    ResourceStore, ENGINE_ARCHIVE, LIB_ARCHIVE, LIB_VERSION_RESOURCE, SHELL_ARCHIVE,
    SHELL_VERSION_RESOURCE,
};

use crate::bootstrap::{build_context, resolve_entry_path, resolve_home, ConfigSources};
use crate::bundle::BundledResources;
use crate::engine::{join_library_path, EngineRequest, ProcessInvoker};

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|arg| arg.to_string()).collect()
}

fn test_sources() -> ConfigSources {
    ConfigSources {
        defaults: Properties::parse("name=shellbox\nshell=/shell/cli/shell.sbx\nautoupdate=true\n"),
        binary_props: Properties::new(),
        env: HashMap::new(),
        settings: Properties::new(),
        exe_dir: PathBuf::from("/opt/shellbox/bin"),
        user_home: Some(PathBuf::from("/nonexistent/test-homes/.shellbox")),
        pwd: PathBuf::from("/work"),
    }
}

fn temp_dir(label: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "shellbox-cli-tests-{label}-{}-{}",
        std::process::id(),
        nanos
    ))
}

#[test]
fn resolve_home_command_line_override_wins() {
    let mut sources = test_sources();
    sources
        .env
        .insert("shellbox_home".to_string(), "/from-env".to_string());
    let config = to_map(&args(&["-shellbox_home=/opt/box"]));

    let home = resolve_home("shellbox", &config, &sources).expect("must resolve");
    assert_eq!(home, PathBuf::from("/opt/box"));
}

#[test]
fn resolve_home_empty_override_is_a_hard_error() {
    let sources = test_sources();
    let config = to_map(&args(&["-shellbox_home="]));

    let err = resolve_home("shellbox", &config, &sources).expect_err("empty home must fail");
    assert!(
        err.to_string().contains("home directory cannot be empty"),
        "unexpected error: {err}"
    );
}

#[test]
fn resolve_home_walks_the_precedence_chain() {
    let config = HashMap::new();

    let mut sources = test_sources();
    sources.binary_props = Properties::parse("home=/from-binary-props\n");
    sources
        .env
        .insert("SHELLBOX_HOME".to_string(), "/from-env".to_string());
    sources.settings = Properties::parse("shellbox_home=/from-settings\n");
    sources.defaults.set("home", "/from-defaults");

    assert_eq!(
        resolve_home("shellbox", &config, &sources).expect("must resolve"),
        PathBuf::from("/from-binary-props")
    );

    sources.binary_props = Properties::new();
    assert_eq!(
        resolve_home("shellbox", &config, &sources).expect("must resolve"),
        PathBuf::from("/from-env"),
        "environment lookup must be case-insensitive"
    );

    sources.env.clear();
    assert_eq!(
        resolve_home("shellbox", &config, &sources).expect("must resolve"),
        PathBuf::from("/from-settings")
    );

    sources.settings = Properties::new();
    assert_eq!(
        resolve_home("shellbox", &config, &sources).expect("must resolve"),
        PathBuf::from("/from-defaults")
    );
}

#[test]
fn resolve_home_falls_back_to_user_home_then_exe_dir() {
    let config = HashMap::new();
    let mut sources = test_sources();

    assert_eq!(
        resolve_home("shellbox", &config, &sources).expect("must resolve"),
        PathBuf::from("/nonexistent/test-homes/.shellbox")
    );

    sources.user_home = None;
    assert_eq!(
        resolve_home("shellbox", &config, &sources).expect("must resolve"),
        PathBuf::from("/opt/shellbox/bin")
    );
}

#[test]
fn build_context_consumes_loader_flags_and_passes_the_rest_through() {
    let sources = test_sources();
    let context = build_context(
        &args(&[
            "-debug",
            "-update",
            "-lib=/custom/libs",
            "-shellpath=/scripts/main.sbx",
            "version",
            "--verbose",
        ]),
        &sources,
    )
    .expect("must build context");

    assert!(context.debug);
    assert!(context.force_update);
    assert_eq!(context.lib_dir, PathBuf::from("/custom/libs"));
    assert_eq!(context.shell_path, "/scripts/main.sbx");
    assert_eq!(context.arguments, args(&["version", "--verbose"]));
    assert_eq!(
        context.properties.get("arguments.array").map(str::to_string),
        Some(serde_json::to_string(&context.arguments).expect("must encode"))
    );
}

#[test]
fn build_context_accepts_cli_prefixed_flag_spellings() {
    let sources = test_sources();
    let context = build_context(
        &args(&["-clidebug", "-cliupdate", "-clishellpath=/other.sbx"]),
        &sources,
    )
    .expect("must build context");

    assert!(context.debug);
    assert!(context.force_update);
    assert_eq!(context.shell_path, "/other.sbx");
    assert!(context.arguments.is_empty());
}

#[test]
fn build_context_injected_settings_merge_last() {
    let mut sources = test_sources();
    sources.settings = Properties::parse("autoupdate=false\nflavor=nightly\n");

    let context = build_context(&[], &sources).expect("must build context");
    assert!(!context.auto_update);
    assert_eq!(context.properties.get("flavor"), Some("nightly"));
}

#[test]
fn build_context_merges_home_properties_file() {
    let home = temp_dir("home-props");
    fs::create_dir_all(&home).expect("must create home");
    fs::write(
        home.join("cli.properties"),
        "autoupdate=false\nshell=/custom/entry.sbx\n",
    )
    .expect("must write home properties");

    let sources = test_sources();
    let home_flag = format!("-shellbox_home={}", home.display());
    let context = build_context(&args(&[&home_flag]), &sources).expect("must build context");

    assert_eq!(context.home, home);
    assert!(!context.auto_update);
    assert_eq!(context.shell_path, "/custom/entry.sbx");

    let _ = fs::remove_dir_all(&home);
}

#[test]
fn build_context_server_name_feeds_web_config_path() {
    let sources = test_sources();
    let context = build_context(&args(&["-name=staging"]), &sources).expect("must build context");

    assert_eq!(context.server_name, "staging");
    let web_config = context.properties.get("config.web").expect("must be set");
    assert!(
        web_config.ends_with("web/staging") || web_config.ends_with("web\\staging"),
        "unexpected web config path: {web_config}"
    );
    assert!(context.arguments.is_empty());
}

#[test]
fn resolve_entry_path_prefers_the_home_copy() {
    let home = temp_dir("entry-path");
    fs::create_dir_all(home.join("shell/cli")).expect("must create dirs");
    fs::write(home.join("shell/cli/shell.sbx"), b"entry").expect("must write entry");

    let sources = test_sources();
    let home_flag = format!("-shellbox_home={}", home.display());
    let context = build_context(&args(&[&home_flag]), &sources).expect("must build context");

    let entry = resolve_entry_path(&context).expect("must resolve entry");
    assert_eq!(entry, home.join("shell/cli/shell.sbx"));

    let _ = fs::remove_dir_all(&home);
}

#[test]
fn resolve_entry_path_missing_everywhere_is_fatal() {
    let home = temp_dir("entry-missing");
    fs::create_dir_all(&home).expect("must create home");

    let sources = test_sources();
    let home_flag = format!("-shellbox_home={}", home.display());
    let context = build_context(&args(&[&home_flag]), &sources).expect("must build context");

    let err = resolve_entry_path(&context).expect_err("missing entry script must fail");
    assert!(err.to_string().contains("could not find shell"), "unexpected error: {err}");

    let _ = fs::remove_dir_all(&home);
}

#[test]
fn bundle_exposes_all_required_resources() {
    let bundle = BundledResources;
    for id in [LIB_ARCHIVE, SHELL_ARCHIVE, ENGINE_ARCHIVE] {
        assert!(bundle.archive(id).is_some(), "missing embedded archive {id}");
    }
    for id in [LIB_VERSION_RESOURCE, SHELL_VERSION_RESOURCE] {
        let text = bundle.text(id).expect("missing embedded version text");
        assert!(!text.trim().is_empty(), "blank embedded version text {id}");
    }
    assert!(bundle.archive("other.zip").is_none());
    assert!(bundle.text("other.version").is_none());
}

#[cfg(unix)]
#[test]
fn join_library_path_uses_the_platform_separator() {
    let joined = join_library_path(&[PathBuf::from("/a/one.jar"), PathBuf::from("/b/two.jar")]);
    assert_eq!(joined, "/a/one.jar:/b/two.jar");
}

#[test]
fn engine_command_carries_the_handoff_payload() {
    let mut settings = Properties::new();
    settings.set("home", "/opt/box");
    let request = EngineRequest {
        webroot: PathBuf::from("/work"),
        server_config_dir: PathBuf::from("/opt/box/engine/cli"),
        web_config_dir: PathBuf::from("/opt/box/engine/cli/web"),
        entry_path: PathBuf::from("/opt/box/shell/cli/shell.sbx"),
        libraries: vec![PathBuf::from("/opt/box/lib/a.jar"), PathBuf::from("/opt/box/lib/b.jar")],
        settings,
        arguments: args(&["version", "--verbose"]),
        background: false,
        debug: true,
    };

    let invoker = ProcessInvoker::from_properties(&Properties::new());
    let command = invoker.command(&request);

    assert_eq!(command.get_program().to_string_lossy(), "java");
    let rendered: Vec<String> = command
        .get_args()
        .map(|arg| arg.to_string_lossy().to_string())
        .collect();
    assert!(rendered.contains(&"-Dhome=/opt/box".to_string()));
    assert!(rendered.contains(&"-cp".to_string()));
    assert!(rendered.contains(&"-uri=/opt/box/shell/cli/shell.sbx".to_string()));
    assert!(rendered.contains(&"-debug=true".to_string()));
    // Pass-through arguments ride at the end, untouched.
    assert_eq!(
        &rendered[rendered.len() - 2..],
        args(&["version", "--verbose"]).as_slice()
    );
}

#[cfg(unix)]
mod watch {
    use super::*;
    use crate::launch::launch_and_watch;
    use std::process::Command;

    #[test]
    fn returns_zero_once_the_ready_marker_appears() {
        let mut command = Command::new("sh");
        command.arg("-c").arg("echo Engine is up; sleep 3");

        let started = Instant::now();
        let code = launch_and_watch(&mut command, Duration::from_secs(10), "Engine is up")
            .expect("must see ready marker");
        assert_eq!(code, 0);
        assert!(
            started.elapsed() < Duration::from_secs(3),
            "must return before the subprocess finishes"
        );
    }

    #[test]
    fn propagates_the_exit_code_when_the_subprocess_finishes_first() {
        let mut command = Command::new("sh");
        command.arg("-c").arg("echo starting; exit 7");

        let code = launch_and_watch(&mut command, Duration::from_secs(10), "Engine is up")
            .expect("must observe exit");
        assert_eq!(code, 7);
    }

    #[test]
    fn destroys_the_subprocess_on_timeout() {
        let mut command = Command::new("sh");
        command.arg("-c").arg("sleep 30");

        let err = launch_and_watch(&mut command, Duration::from_secs(1), "Engine is up")
            .expect_err("must time out");
        assert!(
            err.to_string().contains("exceeded the timeout"),
            "unexpected error: {err}"
        );
    }
}
