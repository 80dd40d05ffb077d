use crate::errors::{ReleaseError, Result, io_error_with_path};
use crate::registry::DEFAULT_NPM_REGISTRY;
use crate::types::EventCommit;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How the next version number is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersionStrategy {
    /// Bump in-process with semver rules.
    #[default]
    Semver,
    /// Delegate to `npm version --git-tag-version=false <level>`.
    Npm,
}

impl FromStr for VersionStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "semver" => Ok(Self::Semver),
            "npm" => Ok(Self::Npm),
            other => Err(format!(
                "unknown version strategy '{other}' (expected 'semver' or 'npm')"
            )),
        }
    }
}

/// Settings for a release run, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    /// Credential exported to the publish command as `NODE_AUTH_TOKEN`.
    pub auth_token: String,
    pub registry_url: String,
    /// Step-output file (`GITHUB_OUTPUT`); `None` falls back to the legacy
    /// `::set-output` workflow command on stdout.
    pub github_output: Option<PathBuf>,
    pub tag_prefix: String,
    pub version_strategy: VersionStrategy,
    pub dry_run: bool,
}

impl ReleaseConfig {
    /// Build a configuration, rejecting a missing or blank credential.
    pub fn new(auth_token: Option<String>) -> Result<Self> {
        let auth_token = auth_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ReleaseError::Config("merge-release requires NODE_AUTH_TOKEN to publish".into())
            })?;
        Ok(Self {
            auth_token,
            registry_url: DEFAULT_NPM_REGISTRY.to_string(),
            github_output: None,
            tag_prefix: String::new(),
            version_strategy: VersionStrategy::default(),
            dry_run: false,
        })
    }

    /// Tag name for a released version.
    pub fn tag_name(&self, version: &str) -> String {
        format!("{}{}", self.tag_prefix, version)
    }
}

/// Facts about the repository and trigger, immutable for the run.
#[derive(Debug, Clone)]
pub struct ReleaseContext {
    pub repository_root: PathBuf,
    /// Directory holding the `package.json` that gets published.
    pub deploy_dir: PathBuf,
    /// Directory holding the source-controlled `package.json`.
    pub source_dir: PathBuf,
    pub current_sha: String,
    pub event_commits: Vec<EventCommit>,
}

impl ReleaseContext {
    /// Build a context; `deploy_dir` and `source_dir` are resolved against the
    /// repository root (absolute values are kept as-is).
    pub fn new(
        repository_root: impl Into<PathBuf>,
        deploy_dir: impl AsRef<Path>,
        source_dir: impl AsRef<Path>,
        current_sha: impl Into<String>,
    ) -> Self {
        let repository_root = repository_root.into();
        Self {
            deploy_dir: repository_root.join(deploy_dir),
            source_dir: repository_root.join(source_dir),
            repository_root,
            current_sha: current_sha.into(),
            event_commits: Vec::new(),
        }
    }

    pub fn with_event_commits(mut self, commits: Vec<EventCommit>) -> Self {
        self.event_commits = commits;
        self
    }

    /// Whether the deploy manifest is a separate file from the source one.
    ///
    /// `Path` equality compares components, so `root/./` and `root` match.
    pub fn has_separate_deploy_dir(&self) -> bool {
        self.deploy_dir != self.source_dir
    }
}

#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    #[serde(default)]
    commits: Option<Vec<EventCommit>>,
}

/// Read the commit list from a CI event payload file.
///
/// Events without a `commits` array (manual dispatch, tag pushes) yield an
/// empty list.
pub fn load_event_commits(path: &Path) -> Result<Vec<EventCommit>> {
    let text = fs::read_to_string(path).map_err(|e| io_error_with_path(e, path))?;
    parse_event_commits(&text).map_err(|e| {
        ReleaseError::Config(format!("invalid event payload {}: {}", path.display(), e))
    })
}

fn parse_event_commits(text: &str) -> std::result::Result<Vec<EventCommit>, serde_json::Error> {
    let payload: EventPayload = serde_json::from_str(text)?;
    Ok(payload.commits.unwrap_or_default())
}
