// loganyapp - platform/fs.rs
//
// Filesystem side effects of activation: every file output needs its parent
// directory and every directory output needs its directory. Run after the
// configuration is fully built and before the backend opens anything.

use crate::core::model::{OutputKind, OutputSpec};
use crate::util::error::{LogAnyAppError, Result};
use std::path::{Path, PathBuf};

/// The directory each output needs, in output order, without duplicates.
pub fn required_dirs(specs: &[OutputSpec]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for spec in specs {
        let dir = match &spec.kind {
            OutputKind::File { path, .. } => path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf),
            OutputKind::Dir { path, .. } => Some(path.clone()),
            OutputKind::Screen { .. } | OutputKind::Syslog { .. } => None,
        };
        if let Some(dir) = dir {
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
    }
    dirs
}

/// Create every directory the outputs need. Existing directories are fine.
pub fn prepare_output_dirs(specs: &[OutputSpec]) -> Result<Vec<PathBuf>> {
    let dirs = required_dirs(specs);
    for dir in &dirs {
        ensure_dir(dir)?;
    }
    Ok(dirs)
}

/// Create `dir` and any missing ancestors.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|source| LogAnyAppError::Io {
        path: dir.to_path_buf(),
        operation: "create directory",
        source,
    })?;
    tracing::debug!(path = %dir.display(), "Output directory created");
    Ok(())
}
