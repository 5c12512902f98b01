//! OS integration: runtime prerequisite, shortcuts and detached launch.
//!
//! The orchestrator only talks to the [`PlatformIntegration`] trait, so tests can
//! swap the real shell-outs for an in-process fake. [`NativePlatform`] is the
//! implementation used by the CLI.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::{DependencyInstallError, InstallerError};

/// PowerShell steps that bootstrap a Java runtime through scoop.
pub const RUNTIME_BOOTSTRAP_STEPS: &[&str] = &[
    "Set-ExecutionPolicy RemoteSigned -scope CurrentUser -Force",
    "iwr -useb get.scoop.sh | iex",
    "scoop install git",
    "scoop bucket add java",
    "scoop install adoptopenjdk-hotspot",
    "scoop uninstall git",
];

/// Reloads `$env:Path` from the registry so a step sees what earlier steps installed.
const REFRESH_PATH: &str = "$env:Path = [Environment]::GetEnvironmentVariable('Path', 'Machine') + ';' + [Environment]::GetEnvironmentVariable('Path', 'User')";

/// Upper bound for one PowerShell invocation; the whole bootstrap runs as one.
const POWERSHELL_TIMEOUT: Duration = Duration::from_secs(3600);

/// OS-specific collaborator used by the install pipeline.
pub trait PlatformIntegration: Send + Sync {
    /// Whether the Java runtime the wallet needs is already present.
    fn runtime_installed(&self) -> impl Future<Output = bool> + Send;

    /// Install the Java runtime.
    fn install_runtime(&self) -> impl Future<Output = Result<(), DependencyInstallError>> + Send;

    /// Create a shell link at `link` pointing at `target`.
    fn create_shortcut(
        &self,
        link: &Path,
        target: &Path,
    ) -> impl Future<Output = Result<(), InstallerError>> + Send;

    /// Start `binary` as a detached process and return without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Launch`] if the process cannot be spawned.
    fn launch(&self, binary: &Path) -> Result<(), InstallerError>;
}

/// Integration backed by the real operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativePlatform;

impl NativePlatform {
    async fn powershell(command: &str) -> Result<(), DependencyInstallError> {
        tracing::debug!("Executing command: powershell -NoProfile -Command {command}");

        let output = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", command])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = match timeout(POWERSHELL_TIMEOUT, output).await {
            Ok(result) => result.map_err(|source| DependencyInstallError::Spawn {
                command: command.to_string(),
                source,
            })?,
            Err(_) => {
                return Err(DependencyInstallError::CommandFailed {
                    command: command.to_string(),
                    reason: format!("timed out after {} seconds", POWERSHELL_TIMEOUT.as_secs()),
                });
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(DependencyInstallError::CommandFailed {
                command: command.to_string(),
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }
        if !stderr.trim().is_empty() {
            return Err(DependencyInstallError::CommandFailed {
                command: command.to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        tracing::trace!("stdout: {}", String::from_utf8_lossy(&output.stdout).trim());
        Ok(())
    }
}

impl PlatformIntegration for NativePlatform {
    async fn runtime_installed(&self) -> bool {
        match which::which("java") {
            Ok(java) => {
                // A bare java.exe without javaw.exe is a JRE stub that cannot run the wallet.
                let installed = java.with_file_name("javaw.exe").exists();
                tracing::debug!("Found java at {}, javaw present: {installed}", java.display());
                installed
            }
            Err(e) => {
                tracing::debug!("java not found on PATH: {e}");
                false
            }
        }
    }

    async fn install_runtime(&self) -> Result<(), DependencyInstallError> {
        tracing::info!("Bootstrapping Java runtime: {}", RUNTIME_BOOTSTRAP_STEPS.join("; "));
        Self::powershell(&bootstrap_script(RUNTIME_BOOTSTRAP_STEPS)).await
    }

    async fn create_shortcut(&self, link: &Path, target: &Path) -> Result<(), InstallerError> {
        let script = shortcut_script(link, target);
        Self::powershell(&script).await.map_err(|e| InstallerError::Shortcut {
            path: link.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn launch(&self, binary: &Path) -> Result<(), InstallerError> {
        let mut cmd = std::process::Command::new(binary);
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
        if let Some(dir) = binary.parent() {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            cmd.creation_flags(DETACHED_PROCESS);
        }

        let child = cmd.spawn().map_err(|source| InstallerError::Launch {
            path: binary.to_path_buf(),
            source,
        })?;
        tracing::info!("Launched {} (pid {})", binary.display(), child.id());
        Ok(())
    }
}

/// One script running every step in the same session.
///
/// Scoop only updates the registry `Path` and the current session, so each step
/// reloads `$env:Path` first. A step fails the script on a terminating error or
/// a non-zero `$LASTEXITCODE`.
fn bootstrap_script(steps: &[&str]) -> String {
    let mut script = String::from("$ErrorActionPreference = 'Stop'\n");
    for (i, step) in steps.iter().enumerate() {
        script.push_str(REFRESH_PATH);
        script.push('\n');
        script.push_str("$global:LASTEXITCODE = 0\n");
        script.push_str(step);
        script.push('\n');
        script.push_str(&format!(
            "if ($LASTEXITCODE -ne 0) {{ throw \"Bootstrap step {} failed with exit code $LASTEXITCODE\" }}\n",
            i + 1
        ));
    }
    script
}

/// WScript.Shell script creating a shell link.
fn shortcut_script(link: &Path, target: &Path) -> String {
    let working_dir = target.parent().unwrap_or(target);
    format!(
        "$s = (New-Object -COM WScript.Shell).CreateShortcut('{}'); $s.TargetPath = '{}'; $s.WorkingDirectory = '{}'; $s.Save()",
        ps_quote(link),
        ps_quote(target),
        ps_quote(working_dir)
    )
}

/// Escape a path for a single-quoted PowerShell string.
fn ps_quote(path: &Path) -> String {
    path.display().to_string().replace('\'', "''")
}
