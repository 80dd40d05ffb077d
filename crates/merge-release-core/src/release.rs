use crate::classify::classify;
use crate::config::{ReleaseConfig, ReleaseContext};
use crate::errors::Result;
use crate::git::SourceControl;
use crate::manifest::PackageManifest;
use crate::process::CommandRunner;
use crate::publish::PublishExecutor;
use crate::registry::Registry;
use crate::resolve::{Resolution, resolve};
use crate::types::Bump;
use crate::version::{INITIAL_VERSION, VersionWriter, bump_version};
use tracing::{debug, info};

/// What a release run ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The current commit was already released; nothing was touched.
    Skipped { version: String },
    /// Dry run: the version that would have been published.
    Planned {
        previous: String,
        bump: Bump,
        version: String,
    },
    Released {
        previous: String,
        bump: Bump,
        version: String,
        tag: String,
    },
}

/// Run a complete release for the package in `context.deploy_dir`.
pub fn run_release<G, Reg, R>(
    config: &ReleaseConfig,
    context: &ReleaseContext,
    source_control: &G,
    registry: &Reg,
    runner: &R,
) -> Result<ReleaseOutcome>
where
    G: SourceControl + ?Sized,
    Reg: Registry + ?Sized,
    R: CommandRunner + ?Sized,
{
    info!("            using deploy directory : {}", context.deploy_dir.display());
    info!("using src directory (package.json) : {}", context.source_dir.display());

    let manifest = PackageManifest::load(&context.deploy_dir)?;
    debug!("Releasing {} from {}", manifest.name(), manifest.path().display());

    let (published, messages) =
        match resolve(context, manifest.name(), source_control, registry)? {
            Resolution::AlreadyReleased(release) => {
                info!(
                    "SHA {} matches latest release {}, skipping.",
                    context.current_sha, release.version
                );
                return Ok(ReleaseOutcome::Skipped {
                    version: release.version,
                });
            }
            Resolution::Pending {
                published,
                messages,
            } => (published, messages),
        };

    let bump = classify(&messages);
    let previous = published
        .map(|release| release.version)
        .unwrap_or_else(|| INITIAL_VERSION.to_string());
    info!(
        "{} commit message(s) analyzed, bump level: {}",
        messages.len(),
        bump
    );

    if config.dry_run {
        let version = bump_version(&previous, bump)?;
        info!("Dry run: would release {} as {}", manifest.name(), version);
        return Ok(ReleaseOutcome::Planned {
            previous,
            bump,
            version,
        });
    }

    let writer = VersionWriter::new(context, config.version_strategy, runner);
    let version = writer.apply(&previous, bump)?;

    let tag = PublishExecutor::new(config, context, source_control, runner)
        .execute(&manifest, &version)?;

    Ok(ReleaseOutcome::Released {
        previous,
        bump,
        version,
        tag,
    })
}
