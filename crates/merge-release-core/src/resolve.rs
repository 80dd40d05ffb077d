use crate::config::ReleaseContext;
use crate::errors::Result;
use crate::git::SourceControl;
use crate::registry::Registry;
use crate::types::PublishedRelease;
use tracing::{debug, info};

/// Outcome of inspecting the registry and history for the current commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The current commit is the one the latest release was built from.
    AlreadyReleased(PublishedRelease),
    /// A new release is due.
    Pending {
        /// Latest published release, if any; its version is the baseline.
        published: Option<PublishedRelease>,
        /// Messages to classify, each `subject + "\n" + body`.
        messages: Vec<String>,
    },
}

/// Decide whether the current commit still needs a release and, if so, which
/// commit messages describe the changes since the last one.
pub fn resolve<G, R>(
    context: &ReleaseContext,
    package_name: &str,
    source_control: &G,
    registry: &R,
) -> Result<Resolution>
where
    G: SourceControl + ?Sized,
    R: Registry + ?Sized,
{
    let published = registry.latest(package_name)?;

    let messages = match published.as_ref() {
        Some(release) if release.git_head.as_deref() == Some(context.current_sha.as_str()) => {
            return Ok(Resolution::AlreadyReleased(release.clone()));
        }
        Some(PublishedRelease {
            git_head: Some(git_head),
            version,
            ..
        }) => {
            info!(
                "Latest release {} was built from {}; inspecting history up to {}",
                version, git_head, context.current_sha
            );
            match source_control.log(git_head, &context.current_sha) {
                Ok(commits) => Some(commits.iter().map(|c| c.full_text()).collect()),
                Err(err) => {
                    debug!("History lookup failed, using event commits instead: {err}");
                    None
                }
            }
        }
        Some(release) => {
            debug!(
                "Latest release {} does not record its source commit",
                release.version
            );
            None
        }
        None => {
            info!("{} has not been published yet", package_name);
            None
        }
    };

    let messages = messages.unwrap_or_else(|| {
        context
            .event_commits
            .iter()
            .map(|c| c.full_text())
            .collect()
    });

    Ok(Resolution::Pending {
        published,
        messages,
    })
}
