//! External TPF sanity validator.
//!
//! The validator is any program that takes a TPF path as its last argument.
//! A run fails if the program exits non-zero or prints a line mentioning an
//! error or failure.

use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

/// Run `command` (whitespace-split) with `tpf` appended as the last argument
///
/// # Errors
///
/// Returns an error if the command is empty, cannot be started, exits
/// non-zero, or reports an error or failure in its output.
pub fn check_tpf(command: &str, tpf: &Path) -> anyhow::Result<()> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("Sanity command is empty"))?;

    info!("Checking {} sanity...", tpf.display());
    let output = Command::new(program)
        .args(parts)
        .arg(tpf)
        .output()
        .map_err(|e| anyhow::anyhow!("Failed to run sanity command '{program}': {e}"))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stdout.lines() {
        debug!("{line}");
    }

    if !output.status.success() {
        anyhow::bail!(
            "Sanity check of {} failed ({}):\n{}{}",
            tpf.display(),
            output.status,
            stdout,
            stderr
        );
    }

    let failures: Vec<&str> = stdout
        .lines()
        .chain(stderr.lines())
        .filter(|line| reports_failure(line))
        .collect();
    if !failures.is_empty() {
        anyhow::bail!(
            "Sanity check of {} reported problems:\n{}",
            tpf.display(),
            failures.join("\n")
        );
    }

    Ok(())
}

fn reports_failure(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("error") || lower.contains("fail")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_passing_command() {
        assert!(check_tpf("true", Path::new("assembly.tpf")).is_ok());
    }

    #[test]
    fn test_non_zero_exit_fails() {
        assert!(check_tpf("false", Path::new("assembly.tpf")).is_err());
    }

    #[test]
    fn test_error_output_fails() {
        let result = check_tpf("echo ERROR: bad gap in", Path::new("assembly.tpf"));
        let message = result.unwrap_err().to_string();
        assert!(message.contains("ERROR: bad gap in assembly.tpf"));
    }

    #[test]
    fn test_clean_output_passes() {
        assert!(check_tpf("echo checked", Path::new("assembly.tpf")).is_ok());
    }

    #[test]
    fn test_empty_command() {
        assert!(check_tpf("   ", Path::new("assembly.tpf")).is_err());
    }

    #[test]
    fn test_reports_failure() {
        assert!(reports_failure("Validation FAILED"));
        assert!(reports_failure("error on line 3"));
        assert!(!reports_failure("all good"));
    }
}
