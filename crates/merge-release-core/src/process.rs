use crate::errors::{ReleaseError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Creates a `Command` that can resolve `.cmd` and `.bat` scripts on Windows.
///
/// On Windows, npm, pnpm and yarn are installed as `.cmd`/`.bat` batch
/// scripts. Rust's `std::process::Command` only auto-resolves `.exe`
/// extensions (see rust-lang/rust#37519), so the invocation goes through
/// `cmd.exe /C` to resolve them via PATHEXT.
pub fn command(program: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", program]);
        cmd
    } else {
        Command::new(program)
    }
}

/// An external command to run: program, arguments, working directory and
/// extra environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Format the command line for display. Environment values are never
    /// included since they may carry credentials.
    pub fn display(&self) -> String {
        let mut text = self.program.clone();
        for arg in &self.args {
            text.push(' ');
            text.push_str(arg);
        }
        text
    }
}

/// Structured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes external commands.
///
/// Implementations must not retry and must not treat a non-zero exit as an
/// error themselves; callers decide via [`run_checked`].
pub trait CommandRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands as real child processes, capturing their output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let mut cmd = command(&spec.program);
        cmd.args(&spec.args).current_dir(&spec.cwd);
        for (key, value) in &spec.envs {
            cmd.env(key, value);
        }

        let output = cmd.output().map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                ReleaseError::Config(format!(
                    "{} not found in PATH (working directory {})",
                    spec.program,
                    spec.cwd.display()
                ))
            } else {
                ReleaseError::Io(err)
            }
        })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run a command and turn a non-zero exit into [`ReleaseError::CommandFailed`].
///
/// Captured output is logged at debug level on success and at info level on
/// failure so the cause is visible in CI logs.
pub fn run_checked<R: CommandRunner + ?Sized>(
    runner: &R,
    spec: &CommandSpec,
) -> Result<CommandOutput> {
    info!("Running: {} (in {})", spec.display(), spec.cwd.display());
    let output = runner.run(spec)?;

    if output.success() {
        if !output.stdout.trim().is_empty() {
            debug!("stdout: {}", output.stdout.trim_end());
        }
        if !output.stderr.trim().is_empty() {
            debug!("stderr: {}", output.stderr.trim_end());
        }
        return Ok(output);
    }

    if !output.stdout.trim().is_empty() {
        info!("stdout: {}", output.stdout.trim_end());
    }
    if !output.stderr.trim().is_empty() {
        info!("stderr: {}", output.stderr.trim_end());
    }

    Err(ReleaseError::CommandFailed {
        command: spec.display(),
        args: spec.args.clone(),
        code: output.code.unwrap_or(1),
    })
}
