//! Process management - list, kill, spawn detached

use crate::traits::ProcessControl;
use crate::{OsError, OsResult};
use async_trait::async_trait;
use queue_pilot_client::ProcessInspector;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use sysinfo::{Process, System};
use tokio::process::Command;
use tokio::task;
use tracing::{debug, info, warn};

/// Process table access backed by `sysinfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcesses;

impl SystemProcesses {
    pub fn new() -> Self {
        Self
    }
}

/// Match on the reported process name or on the executable's file name; the
/// kernel truncates names on some platforms.
fn matches_executable(process: &Process, executable: &str) -> bool {
    if process.name().eq_ignore_ascii_case(executable) {
        return true;
    }
    process
        .exe()
        .and_then(Path::file_name)
        .map(|file| file.to_string_lossy().eq_ignore_ascii_case(executable))
        .unwrap_or(false)
}

fn snapshot() -> System {
    let mut system = System::new_all();
    system.refresh_all();
    system
}

/// Executable file name per pid, for window ownership lookups.
pub async fn executable_names(pids: Vec<u32>) -> OsResult<HashMap<u32, String>> {
    task::spawn_blocking(move || {
        let system = snapshot();
        let names = system
            .processes()
            .iter()
            .filter(|(pid, _)| pids.contains(&pid.as_u32()))
            .map(|(pid, process)| {
                let name = process
                    .exe()
                    .and_then(Path::file_name)
                    .map(|file| file.to_string_lossy().to_string())
                    .unwrap_or_else(|| process.name().to_string());
                (pid.as_u32(), name)
            })
            .collect();
        Ok(names)
    })
    .await
    .map_err(|e| OsError::OperationFailed(e.to_string()))?
}

#[async_trait]
impl ProcessInspector for SystemProcesses {
    async fn command_lines(&self, executable: &str) -> Vec<Vec<String>> {
        let executable = executable.to_string();
        let result = task::spawn_blocking(move || {
            snapshot()
                .processes()
                .values()
                .filter(|process| matches_executable(process, &executable))
                .map(|process| process.cmd().to_vec())
                .collect::<Vec<Vec<String>>>()
        })
        .await;

        match result {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Process inspection failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ProcessControl for SystemProcesses {
    async fn terminate(&self, name: &str) -> OsResult<usize> {
        if name.trim().is_empty() {
            return Err(OsError::InvalidArgument(
                "process name cannot be empty".to_string(),
            ));
        }

        let name = name.to_string();
        task::spawn_blocking(move || {
            let system = snapshot();
            let killed = system
                .processes()
                .values()
                .filter(|process| matches_executable(process, &name))
                .filter(|process| process.kill())
                .count();
            if killed > 0 {
                info!("Terminated {} process(es) named {}", killed, name);
            } else {
                debug!("No running process named {}", name);
            }
            Ok(killed)
        })
        .await
        .map_err(|e| OsError::OperationFailed(e.to_string()))?
    }

    async fn spawn_detached(&self, program: &Path, args: &[String]) -> OsResult<u32> {
        if !program.is_file() {
            return Err(OsError::NotFound(format!(
                "executable {} does not exist",
                program.display()
            )));
        }
        for arg in args {
            if arg.contains('\0') || arg.contains('\n') {
                return Err(OsError::InvalidArgument(
                    "argument contains invalid control characters".to_string(),
                ));
            }
        }

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);

        #[cfg(unix)]
        command.process_group(0);
        #[cfg(windows)]
        {
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
            command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        }

        let child = command.spawn()?;
        child
            .id()
            .ok_or_else(|| OsError::OperationFailed("Failed to get process ID".to_string()))
    }
}
