mod error;

use crate::error::{ActionError, Result};
use clap::{ArgAction, Parser};
use merge_release_core::{
    GitCli, NpmRegistry, ReleaseConfig, ReleaseContext, ReleaseOutcome, SystemRunner,
    VersionStrategy, load_event_commits, run_release,
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

/// merge-release entrypoint
///
/// Computes the next semantic version from the commits merged since the last
/// published release, publishes the package and tags the commit. Every flag
/// can also be provided through the environment of a GitHub Actions step.
#[derive(Debug, Default, Parser)]
#[command(
    name = "merge-release",
    version,
    about = "Publish an npm package with a version derived from commit messages"
)]
struct Cli {
    /// Path to the repository root (defaults to GITHUB_WORKSPACE, then the current directory)
    #[arg(long)]
    working_directory: Option<PathBuf>,

    /// Directory containing the package.json to publish, relative to the root [env: DEPLOY_DIR]
    #[arg(long)]
    deploy_dir: Option<PathBuf>,

    /// Directory containing the source-controlled package.json [env: SRC_PACKAGE_DIR]
    #[arg(long)]
    src_package_dir: Option<PathBuf>,

    /// Registry base URL [env: NPM_REGISTRY_URL]
    #[arg(long)]
    registry_url: Option<String>,

    /// Commit being released (defaults to GITHUB_SHA, then HEAD)
    #[arg(long)]
    sha: Option<String>,

    /// Path to the triggering event payload [env: GITHUB_EVENT_PATH]
    #[arg(long)]
    event_path: Option<PathBuf>,

    /// Prefix prepended to the version to form the tag name (e.g. "v")
    #[arg(long)]
    tag_prefix: Option<String>,

    /// How to compute the next version: "semver" (built in) or "npm" (npm version)
    #[arg(long)]
    version_strategy: Option<VersionStrategy>,

    /// Compute and report the next version without writing, publishing or tagging
    #[arg(long, action = ArgAction::SetTrue)]
    dry_run: bool,
}

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,merge_release_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let env = |key: &str| std::env::var(key).ok();

    let mut cli = Cli::parse();

    // The credential is checked before anything else is looked at.
    let mut config = ReleaseConfig::new(env("NODE_AUTH_TOKEN"))?;

    apply_environment_overrides(&mut cli, env)?;
    apply_cli_to_config(&cli, &mut config);
    config.github_output = env("GITHUB_OUTPUT")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);

    let runner = SystemRunner;
    let workspace = determine_workspace(&cli, env)?;
    let current_sha = match cli.sha.clone() {
        Some(sha) => sha,
        None => GitCli::new(&workspace, &runner).head_sha()?,
    };
    let event_commits = match cli.event_path.as_deref() {
        Some(path) if path.exists() => load_event_commits(path)?,
        _ => Vec::new(),
    };

    let context = ReleaseContext::new(
        &workspace,
        cli.deploy_dir.as_deref().unwrap_or(Path::new("./")),
        cli.src_package_dir.as_deref().unwrap_or(Path::new("./")),
        current_sha,
    )
    .with_event_commits(event_commits);

    let git = GitCli::new(&workspace, &runner);
    let registry = NpmRegistry::new(&config.registry_url)?;

    match run_release(&config, &context, &git, &registry, &runner)? {
        ReleaseOutcome::Skipped { version } => {
            info!("Nothing to release; {} is already published", version);
        }
        ReleaseOutcome::Planned {
            previous,
            bump,
            version,
        } => {
            info!("Dry run complete: {} -> {} ({})", previous, version, bump);
        }
        ReleaseOutcome::Released {
            previous,
            bump,
            version,
            tag,
        } => {
            info!(
                "Released {} -> {} ({}), tagged {}",
                previous, version, bump, tag
            );
        }
    }

    Ok(())
}

/// Fill unset CLI arguments from the CI environment.
fn apply_environment_overrides<F>(cli: &mut Cli, env_var: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| env_var(key).filter(|v| !v.trim().is_empty());

    if cli.working_directory.is_none()
        && let Some(v) = non_empty("INPUT_WORKING_DIRECTORY")
    {
        cli.working_directory = Some(PathBuf::from(v));
    }

    if cli.deploy_dir.is_none()
        && let Some(v) = non_empty("DEPLOY_DIR")
    {
        cli.deploy_dir = Some(PathBuf::from(v));
    }

    if cli.src_package_dir.is_none()
        && let Some(v) = non_empty("SRC_PACKAGE_DIR")
    {
        cli.src_package_dir = Some(PathBuf::from(v));
    }

    if cli.registry_url.is_none() {
        cli.registry_url = non_empty("NPM_REGISTRY_URL");
    }

    if cli.sha.is_none() {
        cli.sha = non_empty("GITHUB_SHA").map(|v| v.trim().to_string());
    }

    if cli.event_path.is_none()
        && let Some(v) = non_empty("GITHUB_EVENT_PATH")
    {
        cli.event_path = Some(PathBuf::from(v));
    }

    if cli.tag_prefix.is_none() {
        cli.tag_prefix = env_var("INPUT_TAG_PREFIX");
    }

    if cli.version_strategy.is_none()
        && let Some(v) = non_empty("INPUT_VERSION_STRATEGY")
    {
        let strategy = v
            .parse::<VersionStrategy>()
            .map_err(|message| ActionError::InvalidInput {
                name: "INPUT_VERSION_STRATEGY",
                message,
            })?;
        cli.version_strategy = Some(strategy);
    }

    if !cli.dry_run
        && let Some(v) = env_var("INPUT_DRY_RUN")
    {
        cli.dry_run = v == "1" || v.eq_ignore_ascii_case("true");
    }

    Ok(())
}

fn apply_cli_to_config(cli: &Cli, config: &mut ReleaseConfig) {
    if let Some(url) = &cli.registry_url {
        config.registry_url = url.clone();
    }
    if let Some(prefix) = &cli.tag_prefix {
        config.tag_prefix = prefix.trim().to_string();
    }
    if let Some(strategy) = cli.version_strategy {
        config.version_strategy = strategy;
    }
    config.dry_run = cli.dry_run;
}

/// Determine the repository root directory
fn determine_workspace<F>(cli: &Cli, env_var: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = cli.working_directory.clone() {
        return Ok(dir);
    }
    if let Some(dir) = env_var("GITHUB_WORKSPACE").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    Ok(std::env::current_dir()?)
}
