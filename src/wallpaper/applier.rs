use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::ApplierConfig;
use crate::error::{ApplyError, Result};
use crate::wallpaper::store::SavedWallpapers;

/// Monitor index of the upper panel
pub const UPPER_MONITOR: u8 = 0;
/// Monitor index of the lower panel
pub const LOWER_MONITOR: u8 = 1;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Sets the saved panels as desktop backgrounds
///
/// Implementations receive both files at once and must apply the upper
/// panel before the lower one.
pub trait WallpaperApplier: Send + Sync {
    /// Returns the name of this applier for logs
    fn name(&self) -> &str;

    /// Apply both wallpapers
    fn apply(&self, wallpapers: &SavedWallpapers) -> Result<()>;
}

/// Builds a boxed applier from the config: an external command when
/// `exe_path` is set, otherwise nothing is applied.
pub fn applier_from_config(config: &ApplierConfig) -> Box<dyn WallpaperApplier> {
    match &config.exe_path {
        Some(exe) => Box::new(ExternalCommandApplier::new(
            exe,
            Duration::from_millis(config.delay_ms),
            Duration::from_secs(config.timeout_secs),
        )),
        None => Box::new(NoopApplier),
    }
}

/// Runs `<exe> -m <monitor> <file>` once per panel
#[derive(Debug, Clone)]
pub struct ExternalCommandApplier {
    exe: PathBuf,
    delay: Duration,
    timeout: Duration,
}

impl ExternalCommandApplier {
    pub fn new<P: Into<PathBuf>>(exe: P, delay: Duration, timeout: Duration) -> Self {
        Self {
            exe: exe.into(),
            delay,
            timeout,
        }
    }

    /// Arguments passed for one monitor
    pub fn command_args(monitor: u8, file: &Path) -> Vec<OsString> {
        vec![
            OsString::from("-m"),
            OsString::from(monitor.to_string()),
            file.as_os_str().to_os_string(),
        ]
    }

    fn run_for_monitor(&self, monitor: u8, file: &Path) -> Result<()> {
        let mut child = Command::new(&self.exe)
            .args(Self::command_args(monitor, file))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ApplyError::CommandFailed {
                monitor,
                stderr: format!("failed to start {}: {}", self.exe.display(), e),
            })?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill() {
                    warn!("Failed to kill wallpaper tool: {}", e);
                }
                let _ = child.wait();
                return Err(ApplyError::TimedOut {
                    monitor,
                    seconds: self.timeout.as_secs(),
                }
                .into());
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            return Err(ApplyError::CommandFailed {
                monitor,
                stderr: stderr.trim().to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl WallpaperApplier for ExternalCommandApplier {
    fn name(&self) -> &str {
        "external-command"
    }

    fn apply(&self, wallpapers: &SavedWallpapers) -> Result<()> {
        if !self.exe.is_file() {
            return Err(ApplyError::ExecutableNotFound {
                path: self.exe.clone(),
            }
            .into());
        }

        for file in [&wallpapers.upper, &wallpapers.lower] {
            if !file.is_file() {
                return Err(ApplyError::MissingFile { path: file.clone() }.into());
            }
        }

        info!("Applying wallpaper to upper screen (monitor {})...", UPPER_MONITOR);
        self.run_for_monitor(UPPER_MONITOR, &wallpapers.upper)?;

        // The tool needs a moment before the second call
        std::thread::sleep(self.delay);

        info!("Applying wallpaper to lower screen (monitor {})...", LOWER_MONITOR);
        self.run_for_monitor(LOWER_MONITOR, &wallpapers.lower)?;

        info!("Wallpapers applied to both screens");
        Ok(())
    }
}

/// Leaves the saved files alone
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopApplier;

impl WallpaperApplier for NoopApplier {
    fn name(&self) -> &str {
        "none"
    }

    fn apply(&self, wallpapers: &SavedWallpapers) -> Result<()> {
        info!(
            "No wallpaper tool configured; panels left at {} and {}",
            wallpapers.upper.display(),
            wallpapers.lower.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WallpaperError;
    use tempfile::tempdir;

    fn saved_in(dir: &Path) -> SavedWallpapers {
        let upper = dir.join("upper.jpg");
        let lower = dir.join("lower.jpg");
        std::fs::write(&upper, b"u").unwrap();
        std::fs::write(&lower, b"l").unwrap();
        SavedWallpapers { upper, lower }
    }

    #[test]
    fn test_command_args() {
        let args = ExternalCommandApplier::command_args(1, Path::new("/tmp/lower.jpg"));
        assert_eq!(args, vec!["-m", "1", "/tmp/lower.jpg"]);
    }

    #[test]
    fn test_missing_executable() {
        let dir = tempdir().unwrap();
        let applier = ExternalCommandApplier::new(
            dir.path().join("WallpaperChanger.exe"),
            Duration::ZERO,
            Duration::from_secs(1),
        );

        let result = applier.apply(&saved_in(dir.path()));
        assert!(matches!(
            result,
            Err(WallpaperError::Apply(ApplyError::ExecutableNotFound { .. }))
        ));
    }

    #[test]
    fn test_missing_wallpaper_file() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("tool");
        std::fs::write(&exe, b"").unwrap();

        let applier = ExternalCommandApplier::new(&exe, Duration::ZERO, Duration::from_secs(1));
        let wallpapers = SavedWallpapers {
            upper: dir.path().join("absent_upper.jpg"),
            lower: dir.path().join("absent_lower.jpg"),
        };

        assert!(matches!(
            applier.apply(&wallpapers),
            Err(WallpaperError::Apply(ApplyError::MissingFile { .. }))
        ));
    }

    #[test]
    fn test_applier_from_config() {
        let mut config = ApplierConfig::default();
        assert_eq!(applier_from_config(&config).name(), "none");

        config.exe_path = Some(PathBuf::from("/usr/bin/setter"));
        assert_eq!(applier_from_config(&config).name(), "external-command");
    }

    #[test]
    fn test_noop_applier() {
        let dir = tempdir().unwrap();
        assert!(NoopApplier.apply(&saved_in(dir.path())).is_ok());
    }

    // Scripts are written and executed in a single test so no concurrently
    // forked test process can hold one of them open for writing.
    #[cfg(unix)]
    #[test]
    fn test_external_command_scripts() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let wallpapers = saved_in(dir.path());
        let log = dir.path().join("calls.log");

        let write_script = |name: &str, body: &str| {
            let path = dir.path().join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        };

        let recorder = write_script("record.sh", &format!("echo \"$@\" >> '{}'", log.display()));
        let failing = write_script("fail.sh", "echo boom >&2\nexit 3");
        let hanging = write_script("hang.sh", "sleep 5");

        // Upper first, then lower
        ExternalCommandApplier::new(&recorder, Duration::ZERO, Duration::from_secs(5))
            .apply(&wallpapers)
            .unwrap();
        let calls = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = calls.lines().collect();
        assert_eq!(
            lines,
            vec![
                format!("-m 0 {}", wallpapers.upper.display()),
                format!("-m 1 {}", wallpapers.lower.display()),
            ]
        );

        match ExternalCommandApplier::new(&failing, Duration::ZERO, Duration::from_secs(5))
            .apply(&wallpapers)
        {
            Err(WallpaperError::Apply(ApplyError::CommandFailed { monitor, stderr })) => {
                assert_eq!(monitor, UPPER_MONITOR);
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }

        let result = ExternalCommandApplier::new(&hanging, Duration::ZERO, Duration::from_secs(1))
            .apply(&wallpapers);
        assert!(matches!(
            result,
            Err(WallpaperError::Apply(ApplyError::TimedOut { monitor: 0, .. }))
        ));
    }
}
