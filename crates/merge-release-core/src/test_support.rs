//! In-memory collaborators for unit tests.

use crate::errors::{ReleaseError, Result};
use crate::git::SourceControl;
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use crate::registry::Registry;
use crate::types::{CommitMessage, PublishedRelease};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Records every command and answers with canned outputs matched by prefix of
/// the displayed command line. Unmatched commands succeed silently.
#[derive(Default)]
pub struct FakeRunner {
    responses: RefCell<Vec<(String, CommandOutput)>>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, prefix: &str, code: i32, stdout: &str, stderr: &str) {
        self.respond_output(
            prefix,
            CommandOutput {
                code: Some(code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        );
    }

    pub fn respond_output(&self, prefix: &str, output: CommandOutput) {
        self.responses
            .borrow_mut()
            .push((prefix.to_string(), output));
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(spec.clone());
        let line = spec.display();
        let output = self
            .responses
            .borrow()
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or(CommandOutput {
                code: Some(0),
                ..CommandOutput::default()
            });
        Ok(output)
    }
}

pub struct FakeRegistry {
    releases: FxHashMap<String, PublishedRelease>,
    failure: Option<String>,
}

impl FakeRegistry {
    pub fn empty() -> Self {
        Self {
            releases: FxHashMap::default(),
            failure: None,
        }
    }

    pub fn with_release(release: PublishedRelease) -> Self {
        let mut registry = Self::empty();
        registry.releases.insert(release.name.clone(), release);
        registry
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::empty()
        }
    }
}

impl Registry for FakeRegistry {
    fn latest(&self, package_name: &str) -> Result<Option<PublishedRelease>> {
        if let Some(message) = &self.failure {
            return Err(ReleaseError::Registry(message.clone()));
        }
        Ok(self.releases.get(package_name).cloned())
    }
}

/// Mutating source-control calls, in the order they were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScmCall {
    Restore(PathBuf, String),
    Tag(String, String),
}

#[derive(Default)]
pub struct FakeSourceControl {
    log: Vec<CommitMessage>,
    fail_log: bool,
    fail_tag: bool,
    log_calls: RefCell<Vec<(String, String)>>,
    calls: RefCell<Vec<ScmCall>>,
}

impl FakeSourceControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(mut self, commits: Vec<CommitMessage>) -> Self {
        self.log = commits;
        self
    }

    pub fn failing_log(mut self) -> Self {
        self.fail_log = true;
        self
    }

    pub fn failing_tag(mut self) -> Self {
        self.fail_tag = true;
        self
    }

    pub fn log_calls(&self) -> Vec<(String, String)> {
        self.log_calls.borrow().clone()
    }

    pub fn calls(&self) -> Vec<ScmCall> {
        self.calls.borrow().clone()
    }
}

impl SourceControl for FakeSourceControl {
    fn log(&self, from: &str, to: &str) -> Result<Vec<CommitMessage>> {
        self.log_calls
            .borrow_mut()
            .push((from.to_string(), to.to_string()));
        if self.fail_log {
            return Err(ReleaseError::Git(format!("bad revision '{from}..{to}'")));
        }
        Ok(self.log.clone())
    }

    fn restore(&self, dir: &Path, file: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(ScmCall::Restore(dir.to_path_buf(), file.to_string()));
        Ok(())
    }

    fn tag(&self, name: &str, message: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(ScmCall::Tag(name.to_string(), message.to_string()));
        if self.fail_tag {
            return Err(ReleaseError::CommandFailed {
                command: format!("git tag -a {name}"),
                args: vec!["tag".into(), "-a".into(), name.into()],
                code: 128,
            });
        }
        Ok(())
    }
}
