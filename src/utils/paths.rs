//! Path utilities: build file discovery

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::MessageLevel;
use crate::error::MyrmexError;

/// Make `path` absolute against `base` without touching the filesystem
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Find `suffix` in `start` or the closest parent directory containing it.
///
/// Progress is reported to `out`: the search itself at `Info`, every
/// directory visited at `Verbose`. Fails with
/// [`MyrmexError::BuildFileNotFound`] once the filesystem root has been
/// checked without a match.
pub fn find_build_file(
    start: &Path,
    suffix: &str,
    level: MessageLevel,
    out: &mut dyn Write,
) -> Result<PathBuf, MyrmexError> {
    if level >= MessageLevel::Info {
        writeln!(out, "Searching for {} ...", suffix)?;
    }

    let start = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir()?.join(start)
    };

    let mut dir = start.as_path();
    let mut candidate = dir.join(suffix);

    while !candidate.exists() {
        match dir.parent() {
            Some(parent) => dir = parent,
            None => {
                return Err(MyrmexError::BuildFileNotFound {
                    suffix: suffix.to_string(),
                    start: start.clone(),
                })
            }
        }

        if level >= MessageLevel::Verbose {
            writeln!(out, "Searching in {}", dir.display())?;
        }
        candidate = dir.join(suffix);
    }

    Ok(candidate)
}
