use crate::config::{ReleaseConfig, ReleaseContext};
use crate::errors::Result;
use crate::git::SourceControl;
use crate::manifest::{MANIFEST_FILE, PackageManifest};
use crate::output;
use crate::process::{CommandRunner, CommandSpec, run_checked};
use tracing::info;

/// Build the publish command for the deploy manifest.
///
/// A manifest that declares its own `publish` script gets `<pm> run publish`;
/// anything else gets the plain `<pm> publish`.
pub fn publish_command(
    manifest: &PackageManifest,
    context: &ReleaseContext,
    config: &ReleaseConfig,
) -> CommandSpec {
    let program = manifest.package_manager().program();
    let spec = CommandSpec::new(program, &context.deploy_dir);
    let spec = if manifest.has_publish_script() {
        spec.args(["run", "publish"])
    } else {
        spec.arg("publish")
    };
    spec.env("NODE_AUTH_TOKEN", config.auth_token.as_str())
}

/// Performs the externally visible part of a release in fixed order:
/// publish, revert the source manifest, tag, emit the step output.
pub struct PublishExecutor<'a, G: ?Sized, R: ?Sized> {
    config: &'a ReleaseConfig,
    context: &'a ReleaseContext,
    source_control: &'a G,
    runner: &'a R,
}

impl<'a, G, R> PublishExecutor<'a, G, R>
where
    G: SourceControl + ?Sized,
    R: CommandRunner + ?Sized,
{
    pub fn new(
        config: &'a ReleaseConfig,
        context: &'a ReleaseContext,
        source_control: &'a G,
        runner: &'a R,
    ) -> Self {
        Self {
            config,
            context,
            source_control,
            runner,
        }
    }

    /// Run every step; the first failure aborts the remaining ones.
    ///
    /// Returns the tag that was created.
    pub fn execute(&self, manifest: &PackageManifest, version: &str) -> Result<String> {
        self.publish(manifest)?;
        self.revert_manifest()?;
        let tag = self.tag(version)?;
        output::emit_output(self.config.github_output.as_deref(), "version", version)?;
        Ok(tag)
    }

    pub fn publish(&self, manifest: &PackageManifest) -> Result<()> {
        let spec = publish_command(manifest, self.context, self.config);
        run_checked(self.runner, &spec)?;
        info!("Published {}", manifest.name());
        Ok(())
    }

    pub fn revert_manifest(&self) -> Result<()> {
        self.source_control
            .restore(&self.context.source_dir, MANIFEST_FILE)
    }

    pub fn tag(&self, version: &str) -> Result<String> {
        let tag = self.config.tag_name(version);
        self.source_control
            .tag(&tag, &format!("Release {tag}"))?;
        info!("Created tag {}", tag);
        Ok(tag)
    }
}
