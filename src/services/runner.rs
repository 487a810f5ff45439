use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// One accepted webhook, ready for automation: the ticket key plus the two
/// endpoints whose connectivity should be troubleshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationJob {
    /// ServiceNow number or Jira issue key the work is filed under.
    pub record: String,
    pub source_ip: String,
    pub destination_ip: String,
    /// Receipt time, ITSM datetime format.
    pub received_at: String,
    /// Extra (NAME, value) pairs exported into the automation environment.
    pub extra_vars: Vec<(String, String)>,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("automation command could not start: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("automation command exited with {0}")]
    Exit(std::process::ExitStatus),
}

/// Launches the automation working one job. Implementations run in a
/// spawned task, so they may block on the child process.
#[async_trait]
pub trait AutomationRunner: Send + Sync {
    async fn launch(&self, job: AutomationJob) -> Result<(), RunnerError>;
}

/// Logs the job instead of running anything. Default when no automation
/// command is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRunner;

#[async_trait]
impl AutomationRunner for LogRunner {
    async fn launch(&self, job: AutomationJob) -> Result<(), RunnerError> {
        tracing::info!(
            target: "increlay::runner",
            record = %job.record,
            source_ip = %job.source_ip,
            destination_ip = %job.destination_ip,
            "no automation command configured; job logged only"
        );
        Ok(())
    }
}

/// Spawns a configured program per job. Job parameters travel as
/// environment variables: RECORD, SOURCE_IP, DESTINATION_IP, RECEIVED_AT,
/// plus the job's extra vars.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    args: Vec<String>,
}

impl CommandRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// First word is the program, the rest are arguments. None for an empty
    /// command line.
    pub fn from_command_line(parts: &[String]) -> Option<Self> {
        let (program, args) = parts.split_first()?;
        Some(Self::new(program).with_args(args.iter().cloned()))
    }
}

#[async_trait]
impl AutomationRunner for CommandRunner {
    async fn launch(&self, job: AutomationJob) -> Result<(), RunnerError> {
        tracing::info!(
            target: "increlay::runner",
            record = %job.record,
            program = %self.program,
            "launching automation"
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env("RECORD", &job.record)
            .env("SOURCE_IP", &job.source_ip)
            .env("DESTINATION_IP", &job.destination_ip)
            .env("RECEIVED_AT", &job.received_at);
        for (name, value) in &job.extra_vars {
            cmd.env(name, value);
        }

        let status = cmd.status().await?;
        if status.success() {
            tracing::info!(target: "increlay::runner", record = %job.record, "automation finished");
            Ok(())
        } else {
            Err(RunnerError::Exit(status))
        }
    }
}
