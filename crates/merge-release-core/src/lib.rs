pub mod classify;
pub mod config;
pub mod errors;
pub mod git;
pub mod manifest;
pub mod output;
pub mod process;
pub mod publish;
pub mod registry;
pub mod release;
pub mod resolve;
pub mod types;
pub mod version;

#[cfg(test)]
mod test_support;

/// User agent sent with registry requests.
pub const USER_AGENT: &str = concat!("merge-release/", env!("CARGO_PKG_VERSION"));

// Re-export commonly used items
pub use classify::classify;
pub use config::{ReleaseConfig, ReleaseContext, VersionStrategy, load_event_commits};
pub use errors::{ReleaseError, Result};
pub use git::{GitCli, SourceControl};
pub use manifest::{PackageManager, PackageManifest};
pub use output::emit_output;
pub use process::{CommandOutput, CommandRunner, CommandSpec, SystemRunner, run_checked};
pub use publish::{PublishExecutor, publish_command};
pub use registry::{DEFAULT_NPM_REGISTRY, NpmRegistry, Registry};
pub use release::{ReleaseOutcome, run_release};
pub use resolve::{Resolution, resolve};
pub use types::{Bump, CommitMessage, EventCommit, PublishedRelease};
pub use version::{INITIAL_VERSION, VersionWriter, bump_version};
