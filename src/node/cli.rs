//! One-shot invocations of the node CLI (`init`, `config`, `add`).

use std::process::Stdio;

use tokio::process::Command;

use crate::config::Config;
use crate::error::MonitorError;

/// Runs node subcommands against the configured repository.
#[derive(Debug, Clone)]
pub struct NodeCli {
    program: String,
    env: Vec<(String, String)>,
}

impl NodeCli {
    /// Runs `program` with `env` added to the inherited environment.
    pub fn new(program: impl Into<String>, env: Vec<(String, String)>) -> Self {
        Self {
            program: program.into(),
            env,
        }
    }

    /// CLI for `cfg.program` pointed at `cfg.repo_path`.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.program.clone(), cfg.node_env())
    }

    /// Runs the program with `args` and returns its stdout.
    ///
    /// A non-zero exit becomes [`MonitorError::NodeCommand`] carrying stderr.
    pub async fn run(&self, args: &[&str]) -> Result<String, MonitorError> {
        tracing::debug!(program = %self.program, ?args, "node command");
        let out = Command::new(&self.program)
            .args(args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| MonitorError::Start {
                program: self.program.clone(),
                source,
            })?;

        if !out.status.success() {
            return Err(MonitorError::NodeCommand {
                command: format!("{} {}", self.program, args.join(" ")),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_stdout_with_environment() {
        let cli = NodeCli::new("sh", vec![("IPFS_PATH".to_string(), "/tmp/repo".to_string())]);
        let out = cli.run(&["-c", "echo $IPFS_PATH"]).await.unwrap();
        assert_eq!(out, "/tmp/repo\n");
    }

    #[tokio::test]
    async fn failure_carries_stderr() {
        let cli = NodeCli::new("sh", Vec::new());
        let err = cli.run(&["-c", "echo 'lock held' >&2; exit 3"]).await.unwrap_err();
        match err {
            MonitorError::NodeCommand { command, stderr } => {
                assert!(command.starts_with("sh -c"));
                assert_eq!(stderr, "lock held");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_a_start_error() {
        let cli = NodeCli::new("/nonexistent/node-bin", Vec::new());
        assert!(matches!(cli.run(&["init"]).await, Err(MonitorError::Start { .. })));
    }
}
