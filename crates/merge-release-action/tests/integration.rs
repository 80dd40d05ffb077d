use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use tempfile::TempDir;
use tiny_http::{Header, Response, Server, StatusCode};

const PACKAGE_JSON: &str = "{\n  \"name\": \"widgets\",\n  \"version\": \"0.0.0-development\"\n}\n";

struct TestRegistry {
    base_url: String,
    handle: thread::JoinHandle<Vec<String>>,
}

impl TestRegistry {
    fn requested_urls(self) -> Vec<String> {
        self.handle.join().expect("join server")
    }
}

/// Serve `expected_requests` registry lookups with the same response.
fn spawn_registry(status: u16, body: &'static str, expected_requests: usize) -> TestRegistry {
    let server = Server::http("127.0.0.1:0").expect("server");
    let base_url = format!("http://{}/", server.server_addr());
    let handle = thread::spawn(move || {
        let mut urls = Vec::new();
        for _ in 0..expected_requests {
            let req = server.recv().expect("request");
            urls.push(req.url().to_string());
            let resp = Response::from_string(body)
                .with_status_code(StatusCode(status))
                .with_header(
                    Header::from_bytes("Content-Type", "application/json").expect("header"),
                );
            req.respond(resp).expect("respond");
        }
        urls
    });
    TestRegistry { base_url, handle }
}

/// A repository checkout with a package.json and an event payload.
struct Workspace {
    _temp_dir: TempDir,
    root: PathBuf,
    output_file: PathBuf,
    event_file: PathBuf,
}

impl Workspace {
    fn new(event_commits: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("repo");
        fs::create_dir_all(&root).expect("Failed to create repo dir");
        fs::write(root.join("package.json"), PACKAGE_JSON).expect("Failed to write package.json");

        let event_file = temp_dir.path().join("event.json");
        fs::write(&event_file, format!("{{\"commits\":{event_commits}}}"))
            .expect("Failed to write event payload");

        let output_file = temp_dir.path().join("github_output");
        Self {
            root,
            output_file,
            event_file,
            _temp_dir: temp_dir,
        }
    }

    fn base_env(&self, registry_url: &str) -> FxHashMap<String, String> {
        let mut env_vars = FxHashMap::default();
        env_vars.insert("NODE_AUTH_TOKEN".to_string(), "npm_test_token".to_string());
        env_vars.insert("GITHUB_SHA".to_string(), "def456".to_string());
        env_vars.insert(
            "GITHUB_WORKSPACE".to_string(),
            self.root.to_string_lossy().to_string(),
        );
        env_vars.insert(
            "GITHUB_OUTPUT".to_string(),
            self.output_file.to_string_lossy().to_string(),
        );
        env_vars.insert(
            "GITHUB_EVENT_PATH".to_string(),
            self.event_file.to_string_lossy().to_string(),
        );
        env_vars.insert("NPM_REGISTRY_URL".to_string(), registry_url.to_string());
        env_vars
    }

    fn package_json(&self) -> String {
        fs::read_to_string(self.root.join("package.json")).expect("read package.json")
    }

    fn output(&self) -> Option<String> {
        fs::read_to_string(&self.output_file).ok()
    }
}

/// Run the action binary with a cleared environment plus `env_vars`.
fn run_action(
    args: &[&str],
    env_vars: &FxHashMap<String, String>,
    working_dir: &Path,
    path_prefix: Option<&Path>,
) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_merge-release"));
    cmd.args(args).current_dir(working_dir);
    cmd.env_clear();

    let system_path = std::env::var("PATH").unwrap_or_default();
    let path = match path_prefix {
        Some(prefix) => format!("{}:{}", prefix.display(), system_path),
        None => system_path,
    };
    cmd.env("PATH", path);
    cmd.envs(env_vars);

    cmd.output().expect("Failed to execute action binary")
}

#[cfg(unix)]
fn install_fake_tools(dir: &Path, npm_exit: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let bin_dir = dir.join("fake-bin");
    fs::create_dir_all(&bin_dir).expect("create fake bin dir");
    let log = dir.join("commands.log");

    for (tool, exit) in [("npm", npm_exit), ("git", 0)] {
        let path = bin_dir.join(tool);
        fs::write(
            &path,
            format!(
                "#!/bin/sh\necho \"{tool} $* [$(basename \"$PWD\")] token=$NODE_AUTH_TOKEN\" >> \"{}\"\nexit {exit}\n",
                log.display()
            ),
        )
        .expect("write fake tool");
        let mut perms = fs::metadata(&path).expect("meta").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod");
    }

    log
}

#[test]
fn test_missing_token_fails_before_any_work() {
    let workspace = Workspace::new("[]");
    let mut env_vars = workspace.base_env("http://127.0.0.1:9/");
    env_vars.remove("NODE_AUTH_TOKEN");

    let output = run_action(&[], &env_vars, &workspace.root, None);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("NODE_AUTH_TOKEN"),
        "Should name the missing credential, got: {}",
        stderr
    );
    assert_eq!(workspace.package_json(), PACKAGE_JSON);
    assert_eq!(workspace.output(), None);
}

#[test]
fn test_dry_run_reports_next_version_without_side_effects() {
    let workspace = Workspace::new(r#"[{"message":"feat: add widget"}]"#);
    let registry = spawn_registry(404, r#"{"error":"Not found"}"#, 1);
    let mut env_vars = workspace.base_env(&registry.base_url);
    env_vars.insert("INPUT_DRY_RUN".to_string(), "true".to_string());

    let output = run_action(&[], &env_vars, &workspace.root, None);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "dry run failed: {}", stderr);
    assert!(
        stderr.contains("0.0.0 -> 0.1.0"),
        "Should report the planned version, got: {}",
        stderr
    );
    assert_eq!(registry.requested_urls(), vec!["/widgets/latest"]);
    assert_eq!(workspace.package_json(), PACKAGE_JSON);
    assert_eq!(workspace.output(), None);
}

#[test]
fn test_already_released_commit_is_skipped() {
    let workspace = Workspace::new(r#"[{"message":"feat: add widget"}]"#);
    let registry = spawn_registry(200, r#"{"name":"widgets","version":"2.5.0","gitHead":"abc123"}"#, 1);
    let mut env_vars = workspace.base_env(&registry.base_url);
    env_vars.insert("GITHUB_SHA".to_string(), "abc123".to_string());

    let output = run_action(&[], &env_vars, &workspace.root, None);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "skip run failed: {}", stderr);
    assert!(
        stderr.contains("skipping"),
        "Should explain the skip, got: {}",
        stderr
    );
    registry.requested_urls();
    assert_eq!(workspace.package_json(), PACKAGE_JSON);
    assert_eq!(workspace.output(), None);
}

#[test]
fn test_registry_outage_is_fatal() {
    let workspace = Workspace::new("[]");
    let registry = spawn_registry(500, "internal error", 1);
    let env_vars = workspace.base_env(&registry.base_url);

    let output = run_action(&[], &env_vars, &workspace.root, None);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Registry error"), "got: {}", stderr);
    registry.requested_urls();
    assert_eq!(workspace.package_json(), PACKAGE_JSON);
}

#[cfg(unix)]
#[test]
fn test_unpublished_feature_is_published_and_tagged() {
    let workspace = Workspace::new(r#"[{"message":"feat: add widget","body":""}]"#);
    let log = install_fake_tools(workspace.root.parent().expect("temp root"), 0);
    let registry = spawn_registry(404, r#"{"error":"Not found"}"#, 1);
    let env_vars = workspace.base_env(&registry.base_url);

    let output = run_action(
        &[],
        &env_vars,
        &workspace.root,
        log.parent().map(|p| p.join("fake-bin")).as_deref(),
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "release failed: {}", stderr);
    registry.requested_urls();

    let commands = fs::read_to_string(&log).expect("read command log");
    let lines: Vec<&str> = commands.lines().collect();
    assert_eq!(
        lines,
        vec![
            "npm publish [repo] token=npm_test_token",
            "git checkout -- package.json [repo] token=npm_test_token",
            "git tag -a 0.1.0 -m Release 0.1.0 [repo] token=npm_test_token",
        ]
    );
    assert_eq!(workspace.output().as_deref(), Some("version=0.1.0\n"));
    // The fake git does not restore the file, so the bumped version is visible.
    assert!(workspace.package_json().contains("\"version\": \"0.1.0\""));
}

#[cfg(unix)]
#[test]
fn test_publish_failure_exits_with_command_status() {
    let workspace = Workspace::new(r#"[{"message":"fix: bug"}]"#);
    let log = install_fake_tools(workspace.root.parent().expect("temp root"), 42);
    let registry = spawn_registry(404, r#"{"error":"Not found"}"#, 1);
    let env_vars = workspace.base_env(&registry.base_url);

    let output = run_action(
        &[],
        &env_vars,
        &workspace.root,
        log.parent().map(|p| p.join("fake-bin")).as_deref(),
    );

    assert_eq!(output.status.code(), Some(42));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("npm publish"), "got: {}", stderr);
    registry.requested_urls();

    let commands = fs::read_to_string(&log).expect("read command log");
    assert!(!commands.contains("git tag"));
    assert_eq!(workspace.output(), None);
}
