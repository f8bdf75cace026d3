//! External command execution with a hard timeout.

use std::time::Duration;

use tokio::process::Command;

use crate::error_handling::CommandError;

/// Output of a command that exited successfully.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
}

/// Runs `program args...` and captures its stdout.
///
/// The child is killed if it does not finish within `timeout`
/// (`kill_on_drop`), so a hung `fail2ban-client` can never stall a cycle.
///
/// # Errors
///
/// - `CommandError::Spawn` if the binary cannot be started
/// - `CommandError::Timeout` if the deadline passes
/// - `CommandError::NonZeroExit` if the process reports failure
pub async fn run_command(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<CommandOutput, CommandError> {
    let display = display_command(program, args);
    log::trace!("Running `{}`", display);

    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(CommandError::Spawn {
                command: display,
                source,
            })
        }
        Err(_) => {
            return Err(CommandError::Timeout {
                command: display,
                timeout,
            })
        }
    };

    if !output.status.success() {
        return Err(CommandError::NonZeroExit {
            command: display,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
}

fn display_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}
