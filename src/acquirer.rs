use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::ProcessError;

/// Flag telling `kinit` to authenticate from the persisted keytab instead of prompting.
pub const KINIT_USE_KEYTAB_FLAG: &str = "-k";

/// Program and arguments of an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandSpec {
    /// `kinit <principal> -k`
    pub fn kinit(program: impl Into<PathBuf>, principal: &str) -> Self {
        Self {
            program: program.into(),
            args: vec![principal.to_owned(), KINIT_USE_KEYTAB_FLAG.to_owned()],
        }
    }

    /// `klist -s -c <ccache>`: silent, the exit code tells whether the cache holds a valid ticket.
    pub fn klist_check(program: impl Into<PathBuf>, ccache: &Path) -> Self {
        Self {
            program: program.into(),
            args: vec!["-s".to_owned(), "-c".to_owned(), ccache.display().to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the program was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs an external program to completion.
///
/// Implementations block the calling thread until the program exits; no timeout is imposed.
pub trait CommandRunner: Send + Sync + 'static {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ProcessError>;
}

/// Spawns real processes, with stdin detached and both output streams captured.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ProcessError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Obtains a TGT by running the acquisition program.
#[derive(Clone)]
pub struct TicketAcquirer {
    runner: Arc<dyn CommandRunner>,
}

impl TicketAcquirer {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Runs `command` and blocks until it exits. Exit code 0 is the only success.
    pub fn acquire(&self, command: &CommandSpec) -> Result<(), ProcessError> {
        let output = self.runner.run(command)?;

        if output.success() {
            Ok(())
        } else {
            Err(ProcessError::NonZeroExit {
                code: output.exit_code,
                stderr: output.stderr.trim().to_owned(),
            })
        }
    }

    /// Same as [TicketAcquirer::acquire], on a blocking worker so the async caller stays responsive.
    pub async fn acquire_on_worker(&self, command: CommandSpec) -> crate::Result<()> {
        let acquirer = self.clone();

        tokio::task::spawn_blocking(move || acquirer.acquire(&command)).await??;

        Ok(())
    }

    /// Runs an auxiliary program (e.g. the cache inspector) on a blocking worker.
    pub async fn run_on_worker(&self, command: CommandSpec) -> crate::Result<CommandOutput> {
        let runner = Arc::clone(&self.runner);

        Ok(tokio::task::spawn_blocking(move || runner.run(&command)).await??)
    }
}

impl std::fmt::Debug for TicketAcquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketAcquirer").finish_non_exhaustive()
    }
}
