use crate::errors::{ReleaseError, Result};
use crate::process::{CommandRunner, CommandSpec, run_checked};
use crate::types::CommitMessage;
use std::path::{Path, PathBuf};

const FIELD_SEPARATOR: char = '\u{1f}';
const RECORD_SEPARATOR: char = '\u{1e}';

/// Source-control operations needed by a release run.
pub trait SourceControl {
    /// Commits reachable from `to` but not from `from`, i.e. `from` exclusive
    /// and `to` inclusive. Fails when either ref is unknown.
    fn log(&self, from: &str, to: &str) -> Result<Vec<CommitMessage>>;

    /// Discard working-copy edits to `file`, relative to `dir`.
    fn restore(&self, dir: &Path, file: &str) -> Result<()>;

    /// Create an annotated tag on the current commit.
    fn tag(&self, name: &str, message: &str) -> Result<()>;
}

/// [`SourceControl`] backed by the `git` command line.
pub struct GitCli<'a, R: CommandRunner + ?Sized> {
    repo_root: PathBuf,
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> GitCli<'a, R> {
    pub fn new(repo_root: impl Into<PathBuf>, runner: &'a R) -> Self {
        Self {
            repo_root: repo_root.into(),
            runner,
        }
    }

    /// Resolve `HEAD` to a full commit SHA.
    pub fn head_sha(&self) -> Result<String> {
        let spec = CommandSpec::new("git", &self.repo_root).args(["rev-parse", "HEAD"]);
        let output = run_checked(self.runner, &spec)
            .map_err(|err| ReleaseError::Git(format!("unable to resolve HEAD: {err}")))?;
        let sha = output.stdout.trim().to_string();
        if sha.is_empty() {
            return Err(ReleaseError::Git("git rev-parse HEAD printed nothing".into()));
        }
        Ok(sha)
    }
}

impl<R: CommandRunner + ?Sized> SourceControl for GitCli<'_, R> {
    fn log(&self, from: &str, to: &str) -> Result<Vec<CommitMessage>> {
        let spec = CommandSpec::new("git", &self.repo_root)
            .arg("log")
            .arg("--format=%s%x1f%b%x1e")
            .arg(format!("{from}..{to}"))
            .arg("--");
        let output = self.runner.run(&spec)?;
        if !output.success() {
            return Err(ReleaseError::Git(format!(
                "git log {from}..{to} failed: {}",
                output.stderr.trim()
            )));
        }
        Ok(parse_log(&output.stdout))
    }

    fn restore(&self, dir: &Path, file: &str) -> Result<()> {
        let spec = CommandSpec::new("git", dir).args(["checkout", "--", file]);
        run_checked(self.runner, &spec)?;
        Ok(())
    }

    fn tag(&self, name: &str, message: &str) -> Result<()> {
        let spec = CommandSpec::new("git", &self.repo_root).args(["tag", "-a", name, "-m", message]);
        run_checked(self.runner, &spec)?;
        Ok(())
    }
}

/// Parse `git log` output produced with `%s%x1f%b%x1e`.
fn parse_log(stdout: &str) -> Vec<CommitMessage> {
    stdout
        .split(RECORD_SEPARATOR)
        .map(|record| record.trim_start_matches(['\n', '\r']))
        .filter(|record| !record.is_empty())
        .map(|record| {
            let (subject, body) = record.split_once(FIELD_SEPARATOR).unwrap_or((record, ""));
            CommitMessage::new(subject.trim_end(), body.trim_end())
        })
        .collect()
}
