//! Host capability probes.

use std::path::Path;

/// Directory that exists only when systemd is the running init system.
pub const SYSTEMD_RUNTIME_DIR: &str = "/run/systemd/system";

/// True if `runtime_dir` marks a systemd-booted host.
pub fn systemd_booted_at(runtime_dir: &Path) -> bool {
    runtime_dir.is_dir()
}

/// True if the host was booted with systemd.
pub fn systemd_booted() -> bool {
    systemd_booted_at(Path::new(SYSTEMD_RUNTIME_DIR))
}
