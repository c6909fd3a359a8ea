use std::path::{Path, PathBuf};
use tracing::debug;

/// Locates external executables (ffmpeg, ffprobe) on the host.
///
/// Search order:
/// 1. The directories on `PATH`.
/// 2. The WinGet install location for Gyan.FFmpeg under `%LOCALAPPDATA%`
///    (WinGet installs land there before the shell reloads `PATH`).
/// 3. The bare name, letting the eventual spawn fail with a
///    tool-not-found error.
pub fn resolve(name: &str) -> PathBuf {
    if let Some(found) = search_path(name) {
        debug!("Resolved {} on PATH: {}", name, found.display());
        return found;
    }

    if let Some(found) = search_winget(name) {
        debug!("Resolved {} via WinGet fallback: {}", name, found.display());
        return found;
    }

    PathBuf::from(name)
}

/// Search the `PATH` entries for an executable named `name`.
fn search_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        for candidate in candidates(&dir, name) {
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Glob the WinGet Gyan.FFmpeg package directories for `name`.
fn search_winget(name: &str) -> Option<PathBuf> {
    let local_app_data = std::env::var_os("LOCALAPPDATA")?;
    let pattern = Path::new(&local_app_data)
        .join("Microsoft")
        .join("WinGet")
        .join("Packages")
        .join("Gyan.FFmpeg*")
        .join("ffmpeg-*")
        .join("bin");
    let pattern = pattern.to_str()?;

    for bin_dir in glob::glob(pattern).ok()?.flatten() {
        let candidate = bin_dir.join(format!("{}.exe", name));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![dir.join(format!("{}.exe", name)), dir.join(name)]
    } else {
        vec![dir.join(name)]
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
