//! Pidfile + signal implementation of the ProcessHandle port.
//!
//! Each managed process is tracked through a pidfile under the state
//! directory, so a later watcher invocation can stop an instance started
//! by an earlier one. Stdout and stderr go to a per-process log file.

use crate::config::ProcessSpec;
use crate::ports::ProcessHandle;
use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag};
use nix::unistd::Pid;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const STOP_TIMEOUT: Duration = Duration::from_secs(10);
const STOP_POLL: Duration = Duration::from_millis(100);

pub struct ShellProcess {
    spec: ProcessSpec,
    pidfile: PathBuf,
    log_file: PathBuf,
}

impl ShellProcess {
    pub fn new(spec: ProcessSpec, state_dir: &Path) -> Self {
        let pidfile = state_dir.join(format!("{}.pid", spec.name));
        let log_file = state_dir.join("logs").join(format!("{}.log", spec.name));
        Self {
            spec,
            pidfile,
            log_file,
        }
    }

    fn read_pid(&self) -> Option<Pid> {
        let raw = fs::read_to_string(&self.pidfile).ok()?;
        let pid: i32 = raw.trim().parse().ok()?;
        Some(Pid::from_raw(pid))
    }

    fn alive(pid: Pid) -> bool {
        kill(pid, None).is_ok()
    }

    /// Reap the instance if it happens to be our own child; instances
    /// recorded by earlier watcher invocations are not, and ECHILD is fine.
    fn reap(pid: Pid) {
        let _ = waitpid(pid, Some(WaitPidFlag::WNOHANG));
    }

    fn clear_pidfile(&self) {
        let _ = fs::remove_file(&self.pidfile);
    }
}

impl ProcessHandle for ShellProcess {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn is_running(&self) -> bool {
        self.read_pid()
            .map(|pid| {
                Self::reap(pid);
                Self::alive(pid)
            })
            .unwrap_or(false)
    }

    fn stop(&self) -> Result<()> {
        let Some(pid) = self.read_pid() else {
            debug!(process = %self.spec.name, "no pidfile, nothing to stop");
            return Ok(());
        };

        Self::reap(pid);
        if !Self::alive(pid) {
            self.clear_pidfile();
            return Ok(());
        }

        debug!(process = %self.spec.name, pid = pid.as_raw(), "sending SIGTERM");
        match kill(pid, Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => return Err(e).with_context(|| format!("failed to signal pid {}", pid)),
        }

        let start = Instant::now();
        while start.elapsed() < STOP_TIMEOUT {
            Self::reap(pid);
            if !Self::alive(pid) {
                self.clear_pidfile();
                return Ok(());
            }
            std::thread::sleep(STOP_POLL);
        }

        warn!(
            process = %self.spec.name,
            pid = pid.as_raw(),
            "did not exit after SIGTERM, sending SIGKILL"
        );
        match kill(pid, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => return Err(e).with_context(|| format!("failed to kill pid {}", pid)),
        }
        for _ in 0..10 {
            Self::reap(pid);
            if !Self::alive(pid) {
                break;
            }
            std::thread::sleep(STOP_POLL);
        }
        self.clear_pidfile();
        Ok(())
    }

    fn start(&self) -> Result<()> {
        if let Some(log_dir) = self.log_file.parent() {
            fs::create_dir_all(log_dir)
                .with_context(|| format!("failed to create log dir {}", log_dir.display()))?;
        }

        let stdout = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .with_context(|| format!("failed to open log file {}", self.log_file.display()))?;
        let stderr = stdout.try_clone().context("failed to clone log handle")?;

        let mut cmd = Command::new(&self.spec.command);
        cmd.args(&self.spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));
        if let Some(dir) = &self.spec.workdir {
            cmd.current_dir(dir);
        }

        // Detach into its own session so the instance outlives the watcher.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            unsafe {
                cmd.pre_exec(|| {
                    nix::libc::setsid();
                    Ok(())
                });
            }
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn '{}'", self.spec.command.display()))?;
        fs::write(&self.pidfile, child.id().to_string())
            .with_context(|| format!("failed to write pidfile {}", self.pidfile.display()))?;
        debug!(process = %self.spec.name, pid = child.id(), "started");

        // Intentionally not waited on.
        drop(child);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sleeper(state_dir: &Path) -> ShellProcess {
        let spec = ProcessSpec {
            name: "napper".to_string(),
            command: PathBuf::from("sleep"),
            args: vec!["30".to_string()],
            workdir: None,
        };
        ShellProcess::new(spec, state_dir)
    }

    #[test]
    fn start_then_stop_roundtrip() {
        let state = TempDir::new().unwrap();
        let process = sleeper(state.path());

        process.start().unwrap();
        assert!(process.is_running());
        assert!(state.path().join("napper.pid").exists());

        process.stop().unwrap();
        assert!(!process.is_running());
        assert!(!state.path().join("napper.pid").exists());
    }

    #[test]
    fn stop_without_pidfile_is_a_no_op() {
        let state = TempDir::new().unwrap();
        let process = sleeper(state.path());

        process.stop().unwrap();
        assert!(!process.is_running());
    }

    #[test]
    fn stop_twice_is_idempotent() {
        let state = TempDir::new().unwrap();
        let process = sleeper(state.path());

        process.start().unwrap();
        process.stop().unwrap();
        process.stop().unwrap();
    }

    #[test]
    fn garbage_pidfile_reads_as_stopped() {
        let state = TempDir::new().unwrap();
        let process = sleeper(state.path());
        fs::write(state.path().join("napper.pid"), "not-a-pid").unwrap();

        assert!(!process.is_running());
        process.stop().unwrap();
    }

    #[test]
    fn start_captures_output_in_log_file() {
        let state = TempDir::new().unwrap();
        let spec = ProcessSpec {
            name: "echoer".to_string(),
            command: PathBuf::from("sh"),
            args: vec!["-c".to_string(), "echo hello".to_string()],
            workdir: None,
        };
        let process = ShellProcess::new(spec, state.path());

        process.start().unwrap();
        // Give the short-lived process a moment to run and flush.
        std::thread::sleep(Duration::from_millis(300));

        let log = fs::read_to_string(state.path().join("logs").join("echoer.log")).unwrap();
        assert!(log.contains("hello"));
    }

    #[test]
    fn spawn_failure_is_an_error() {
        let state = TempDir::new().unwrap();
        let spec = ProcessSpec {
            name: "ghost".to_string(),
            command: PathBuf::from("/definitely/not/here"),
            args: vec![],
            workdir: None,
        };
        let process = ShellProcess::new(spec, state.path());

        assert!(process.start().is_err());
        assert!(!state.path().join("ghost.pid").exists());
    }
}
