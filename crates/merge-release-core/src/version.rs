use crate::config::{ReleaseContext, VersionStrategy};
use crate::errors::{ReleaseError, Result};
use crate::manifest;
use crate::process::{CommandRunner, CommandSpec, run_checked};
use crate::types::Bump;
use semver::{BuildMetadata, Prerelease, Version};
use tracing::info;

/// Version assumed for a package that was never published.
pub const INITIAL_VERSION: &str = "0.0.0";

/// Apply a semver bump to `current`.
///
/// Major zeroes minor and patch, minor zeroes patch. A pre-release of the
/// target version is promoted to that release instead of incremented past it
/// (`2.0.0-rc.1` bumps to `2.0.0`), as `npm version` does. Pre-release and
/// build metadata are dropped.
pub fn bump_version(current: &str, bump: Bump) -> Result<String> {
    let trimmed = current.trim();
    let mut version = Version::parse(trimmed.strip_prefix('v').unwrap_or(trimmed))
        .map_err(|err| ReleaseError::Version(format!("invalid version '{current}': {err}")))?;
    let prerelease = !version.pre.is_empty();

    match bump {
        Bump::Major => {
            if !prerelease || version.minor != 0 || version.patch != 0 {
                version.major += 1;
            }
            version.minor = 0;
            version.patch = 0;
        }
        Bump::Minor => {
            if !prerelease || version.patch != 0 {
                version.minor += 1;
            }
            version.patch = 0;
        }
        Bump::Patch => {
            if !prerelease {
                version.patch += 1;
            }
        }
    }
    version.pre = Prerelease::EMPTY;
    version.build = BuildMetadata::EMPTY;

    Ok(version.to_string())
}

/// Writes versions into the source manifest and, when it lives elsewhere, the
/// deploy manifest, keeping both copies identical.
pub struct VersionWriter<'a, R: CommandRunner + ?Sized> {
    context: &'a ReleaseContext,
    strategy: VersionStrategy,
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> VersionWriter<'a, R> {
    pub fn new(context: &'a ReleaseContext, strategy: VersionStrategy, runner: &'a R) -> Self {
        Self {
            context,
            strategy,
            runner,
        }
    }

    /// Set the baseline, compute the bumped version and persist it.
    ///
    /// Returns the new version string.
    pub fn apply(&self, baseline: &str, bump: Bump) -> Result<String> {
        self.set_version(baseline)?;
        info!("current: {} / bump: {}", baseline, bump);

        let new_version = self.next_version(baseline, bump)?;
        self.set_version(&new_version)?;
        info!("new version: {}", new_version);
        Ok(new_version)
    }

    /// Compute the next version without touching any file (beyond what the
    /// npm strategy does to the source manifest itself).
    pub fn next_version(&self, baseline: &str, bump: Bump) -> Result<String> {
        match self.strategy {
            VersionStrategy::Semver => bump_version(baseline, bump),
            VersionStrategy::Npm => self.npm_version(bump),
        }
    }

    /// Write `version` into every manifest copy.
    pub fn set_version(&self, version: &str) -> Result<()> {
        manifest::write_version(&self.context.source_dir, version)?;
        if self.context.has_separate_deploy_dir() {
            manifest::write_version(&self.context.deploy_dir, version)?;
        }
        Ok(())
    }

    fn npm_version(&self, bump: Bump) -> Result<String> {
        let spec = CommandSpec::new("npm", &self.context.source_dir).args([
            "version",
            "--git-tag-version=false",
            bump.as_str(),
        ]);
        let output = run_checked(self.runner, &spec)?;
        let printed = output
            .stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .unwrap_or_default();
        let version = printed.strip_prefix('v').unwrap_or(printed);
        Version::parse(version).map_err(|err| {
            ReleaseError::Version(format!("npm version printed '{printed}': {err}"))
        })?;
        Ok(version.to_string())
    }
}
