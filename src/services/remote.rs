use crate::domain::constants::SSH_CONNECT_TIMEOUT_SECS;
use crate::domain::models::{Node, RecoveryError};
use crate::services::audit::audit_command;
use std::io::Write;
use std::process::{Command, Stdio};

/// Result of one remote command. Every caller inspects this; nothing is
/// assumed to have succeeded.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn ok(&self) -> bool {
        self.status == 0
    }

    /// First stderr line, for error messages. Falls back to the exit code.
    pub fn diagnostic(&self) -> String {
        match self.stderr.lines().next() {
            Some(line) if !line.trim().is_empty() => line.trim().to_string(),
            _ => format!("exit status {}", self.status),
        }
    }
}

/// One remote command at a time against one host. A new transport session
/// per call; retries and timeouts are the caller's concern.
pub trait Remote {
    fn run(&self, node: &Node, command: &str) -> anyhow::Result<CmdOutput>;

    fn run_privileged(&self, node: &Node, command: &str) -> anyhow::Result<CmdOutput> {
        self.run(node, &format!("sudo {}", command))
    }

    /// Write `content` to a root-owned file on the remote host.
    fn write_file(&self, node: &Node, path: &str, content: &str) -> anyhow::Result<CmdOutput>;
}

/// Run a privileged command and fold a non-zero exit into the given error
/// kind. The shared shape of almost every recovery step.
pub fn run_privileged_checked(
    remote: &dyn Remote,
    node: &Node,
    command: &str,
    err: impl Fn(String) -> RecoveryError,
) -> Result<String, RecoveryError> {
    let out = remote
        .run_privileged(node, command)
        .map_err(|e| err(e.to_string()))?;
    if !out.ok() {
        return Err(err(format!("`{}`: {}", command, out.diagnostic())));
    }
    Ok(out.stdout)
}

/// Production executor: one `ssh` invocation per command, operator's
/// ambient credentials, BatchMode so a missing key fails instead of
/// prompting.
pub struct SshExecutor {
    pub connect_timeout_secs: u64,
}

impl Default for SshExecutor {
    fn default() -> Self {
        Self {
            connect_timeout_secs: SSH_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl SshExecutor {
    fn ssh_command(&self, node: &Node) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg("-o")
            .arg("BatchMode=yes")
            .arg("-o")
            .arg(format!("ConnectTimeout={}", self.connect_timeout_secs))
            .arg(&node.hostname);
        cmd
    }

    fn capture(node: &Node, remote_command: &str, out: std::process::Output) -> CmdOutput {
        let result = CmdOutput {
            status: out.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        };
        audit_command(&node.hostname, remote_command, result.status);
        result
    }
}

impl Remote for SshExecutor {
    fn run(&self, node: &Node, command: &str) -> anyhow::Result<CmdOutput> {
        let out = self.ssh_command(node).arg(command).output()?;
        Ok(Self::capture(node, command, out))
    }

    fn write_file(&self, node: &Node, path: &str, content: &str) -> anyhow::Result<CmdOutput> {
        let command = format!("sudo tee {} > /dev/null", path);
        let mut child = self
            .ssh_command(node)
            .arg(&command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(content.as_bytes())?;
        }
        let out = child.wait_with_output()?;
        Ok(Self::capture(node, &command, out))
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Scripted executor for tests: responds from a pattern table and
    /// records every command issued so properties like "no injection after
    /// a failed backup" can be asserted on the transcript.
    #[derive(Default)]
    pub struct ScriptedRemote {
        pub commands: RefCell<Vec<String>>,
        pub writes: RefCell<Vec<(String, String)>>,
        responses: Vec<(String, CmdOutput)>,
    }

    impl ScriptedRemote {
        pub fn new() -> Self {
            Self::default()
        }

        /// First response whose pattern is contained in the command wins;
        /// anything unmatched succeeds with empty output.
        pub fn respond(mut self, pattern: &str, status: i32, stdout: &str) -> Self {
            self.responses.push((
                pattern.to_string(),
                CmdOutput {
                    status,
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                },
            ));
            self
        }

        pub fn ran(&self, pattern: &str) -> bool {
            self.commands.borrow().iter().any(|c| c.contains(pattern))
        }

        pub fn command_count(&self) -> usize {
            self.commands.borrow().len() + self.writes.borrow().len()
        }
    }

    impl Remote for ScriptedRemote {
        fn run(&self, _node: &Node, command: &str) -> anyhow::Result<CmdOutput> {
            self.commands.borrow_mut().push(command.to_string());
            for (pattern, out) in &self.responses {
                if command.contains(pattern.as_str()) {
                    return Ok(out.clone());
                }
            }
            Ok(CmdOutput {
                status: 0,
                stdout: String::new(),
                stderr: String::new(),
            })
        }

        fn write_file(&self, _node: &Node, path: &str, content: &str) -> anyhow::Result<CmdOutput> {
            self.writes
                .borrow_mut()
                .push((path.to_string(), content.to_string()));
            for (pattern, out) in &self.responses {
                if path.contains(pattern.as_str()) {
                    return Ok(out.clone());
                }
            }
            Ok(CmdOutput {
                status: 0,
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn diagnostic_prefers_stderr() {
        let out = CmdOutput {
            status: 1,
            stdout: String::new(),
            stderr: "monmaptool: map not found\nmore context".to_string(),
        };
        assert_eq!(out.diagnostic(), "monmaptool: map not found");

        let silent = CmdOutput {
            status: 3,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(silent.diagnostic(), "exit status 3");
    }
}
