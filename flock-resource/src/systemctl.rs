//! [`UnitManager`] over the `systemctl` binary.
//!
//! Every call runs its own `systemctl` process, so nothing outlives the
//! call. Start and stop run without `--no-block`: systemctl waits for the
//! job to finish and its exit status carries the job result.

use std::path::PathBuf;
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{ResourceError, Result};
use crate::unit::{JobMode, JobResult, UnitFileChange, UnitManager};

/// systemd unit manager driven through `systemctl`.
#[derive(Debug, Clone)]
pub struct Systemctl {
    binary: PathBuf,
}

impl Default for Systemctl {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("systemctl"),
        }
    }
}

impl Systemctl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific systemctl binary.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        debug!(binary = %self.binary.display(), args = ?args, "running systemctl");
        Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ResourceError::Capability(format!("failed to run systemctl: {}", e)))
    }

    /// Run and require a zero exit status.
    async fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResourceError::Capability(format!(
                "systemctl {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(output)
    }

    /// Run a start/stop job.
    ///
    /// Exit status 1 with a `Job for <unit> ..` report is a job that ran and
    /// did not succeed. Any other failure means the job was never queued.
    async fn run_job(&self, verb: &str, unit: &str, mode: JobMode) -> Result<JobResult> {
        let job_mode = format!("--job-mode={}", mode.as_str());
        let output = self.run(&[verb, &job_mode, unit]).await?;
        if output.status.success() {
            return Ok(JobResult::Done);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if output.status.code() == Some(1) {
            if let Some(result) = parse_job_failure(stderr) {
                warn!(unit = %unit, verb = %verb, stderr = %stderr, "systemd job {}", result);
                return Ok(result);
            }
        }

        Err(ResourceError::Capability(format!(
            "systemctl {} {} failed: {}",
            verb, unit, stderr
        )))
    }

    async fn change_unit_files(&self, verb: &str, units: &[String]) -> Result<Vec<UnitFileChange>> {
        let mut args = vec![verb];
        args.extend(units.iter().map(String::as_str));
        let output = self.run_checked(&args).await?;

        // systemctl reports unit file changes on stderr
        let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stdout));
        Ok(parse_unit_file_changes(&text))
    }
}

#[async_trait]
impl UnitManager for Systemctl {
    async fn unit_property(&self, unit: &str, property: &str) -> Result<String> {
        let property_arg = format!("--property={}", property);
        let output = self
            .run_checked(&["show", &property_arg, "--value", unit])
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn start_unit(&self, unit: &str, mode: JobMode) -> Result<JobResult> {
        self.run_job("start", unit, mode).await
    }

    async fn stop_unit(&self, unit: &str, mode: JobMode) -> Result<JobResult> {
        self.run_job("stop", unit, mode).await
    }

    async fn enable_unit_files(&self, units: &[String]) -> Result<Vec<UnitFileChange>> {
        self.change_unit_files("enable", units).await
    }

    async fn disable_unit_files(&self, units: &[String]) -> Result<Vec<UnitFileChange>> {
        self.change_unit_files("disable", units).await
    }

    async fn reload(&self) -> Result<()> {
        self.run_checked(&["daemon-reload"]).await?;
        Ok(())
    }
}

/// Job result from systemctl's report of a finished, unsuccessful job.
fn parse_job_failure(stderr: &str) -> Option<JobResult> {
    let report = stderr.lines().map(str::trim).find(|l| l.starts_with("Job for "))?;
    if report.contains(" canceled") {
        Some(JobResult::Canceled)
    } else if report.contains(" failed") {
        Some(JobResult::Failed)
    } else {
        None
    }
}

/// Parse the unit file changes systemctl reports for enable/disable.
///
/// Understands both `Created symlink A → B.` and the older
/// `Created symlink from A to B.` forms, and `Removed A.` with or without
/// quotes around the path.
pub fn parse_unit_file_changes(text: &str) -> Vec<UnitFileChange> {
    let clean = |s: &str| {
        s.trim()
            .trim_end_matches('.')
            .trim_matches('"')
            .trim_matches('\'')
            .to_string()
    };

    let mut changes = Vec::new();
    for line in text.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("Created symlink from ") {
            if let Some((from, to)) = rest.split_once(" to ") {
                changes.push(UnitFileChange {
                    change_type: "symlink".to_string(),
                    filename: clean(from),
                    destination: clean(to),
                });
            }
        } else if let Some(rest) = line.strip_prefix("Created symlink ") {
            if let Some((from, to)) = rest.split_once(" → ") {
                changes.push(UnitFileChange {
                    change_type: "symlink".to_string(),
                    filename: clean(from),
                    destination: clean(to),
                });
            }
        } else if let Some(rest) = line.strip_prefix("Removed ") {
            changes.push(UnitFileChange {
                change_type: "unlink".to_string(),
                filename: clean(rest),
                destination: String::new(),
            });
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enable_output() {
        let text = "Created symlink /etc/systemd/system/multi-user.target.wants/nginx.service → /lib/systemd/system/nginx.service.\n";
        let changes = parse_unit_file_changes(text);
        assert_eq!(
            changes,
            vec![UnitFileChange {
                change_type: "symlink".to_string(),
                filename: "/etc/systemd/system/multi-user.target.wants/nginx.service".to_string(),
                destination: "/lib/systemd/system/nginx.service".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_legacy_enable_output() {
        let text = "Created symlink from /etc/systemd/system/multi-user.target.wants/sshd.service to /usr/lib/systemd/system/sshd.service.";
        let changes = parse_unit_file_changes(text);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].destination, "/usr/lib/systemd/system/sshd.service");
    }

    #[test]
    fn test_parse_disable_output() {
        let text = "Removed \"/etc/systemd/system/multi-user.target.wants/nginx.service\".\nRemoved /etc/systemd/system/nginx.service.d.\n";
        let changes = parse_unit_file_changes(text);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].change_type, "unlink");
        assert_eq!(
            changes[0].filename,
            "/etc/systemd/system/multi-user.target.wants/nginx.service"
        );
        assert_eq!(changes[1].filename, "/etc/systemd/system/nginx.service.d");
    }

    #[test]
    fn test_parse_ignores_unrelated_lines() {
        let text = "Synchronizing state of nginx.service with SysV service script.\nExecuting: /lib/systemd/systemd-sysv-install enable nginx\n";
        assert!(parse_unit_file_changes(text).is_empty());
    }

    #[tokio::test]
    async fn test_missing_binary_is_capability_error() {
        let systemctl = Systemctl::with_binary("/nonexistent/systemctl");
        let err = systemctl.reload().await.unwrap_err();
        assert!(matches!(err, ResourceError::Capability(_)));
    }

    fn stub(dir: &std::path::Path, script: &str) -> Systemctl {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("systemctl");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        Systemctl::with_binary(path)
    }

    #[test]
    fn test_parse_job_failure() {
        assert_eq!(
            parse_job_failure(
                "Job for nginx.service failed because the control process exited with error code.\nSee \"systemctl status nginx.service\" for details."
            ),
            Some(JobResult::Failed)
        );
        assert_eq!(
            parse_job_failure("Job for nginx.service canceled."),
            Some(JobResult::Canceled)
        );
        assert_eq!(
            parse_job_failure("Failed to connect to bus: No such file or directory"),
            None
        );
    }

    #[tokio::test]
    async fn test_job_failure_is_job_result() {
        let dir = tempfile::tempdir().unwrap();
        let systemctl = stub(
            dir.path(),
            "echo 'Job for nginx.service failed because the control process exited with error code.' >&2; exit 1",
        );
        let result = systemctl
            .start_unit("nginx.service", JobMode::Replace)
            .await
            .unwrap();
        assert_eq!(result, JobResult::Failed);
    }

    #[tokio::test]
    async fn test_bus_failure_is_capability_error() {
        let dir = tempfile::tempdir().unwrap();
        let systemctl = stub(
            dir.path(),
            "echo 'Failed to connect to bus: No such file or directory' >&2; exit 1",
        );
        let err = systemctl
            .start_unit("nginx.service", JobMode::Replace)
            .await
            .unwrap_err();
        assert!(matches!(&err, ResourceError::Capability(msg) if msg.contains("Failed to connect to bus")));
    }

    #[tokio::test]
    async fn test_unit_not_loaded_is_capability_error() {
        let dir = tempfile::tempdir().unwrap();
        let systemctl = stub(
            dir.path(),
            "echo 'Failed to stop nginx.service: Unit nginx.service not loaded.' >&2; exit 5",
        );
        let err = systemctl
            .stop_unit("nginx.service", JobMode::Replace)
            .await
            .unwrap_err();
        assert!(matches!(&err, ResourceError::Capability(msg) if msg.contains("not loaded")));
    }

    #[tokio::test]
    async fn test_job_mode_passed_to_systemctl() {
        let dir = tempfile::tempdir().unwrap();
        let args = dir.path().join("args");
        let systemctl = stub(dir.path(), &format!("echo \"$@\" > {}", args.display()));
        let result = systemctl
            .start_unit("cron.service", JobMode::Fail)
            .await
            .unwrap();
        assert_eq!(result, JobResult::Done);
        assert_eq!(
            std::fs::read_to_string(&args).unwrap().trim(),
            "start --job-mode=fail cron.service"
        );
    }
}
