//! Helper functions for story and save state files
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use regex::Regex;
use tempfile::NamedTempFile;

use crate::{config::Config, error::*, fatal_error};

/// Find a configuration file in `~/.zmachine`
///
/// # Arguments
/// * `name` - File name
///
/// # Returns
/// [Option] with the path to the file, if it exists
pub fn config_file(name: &str) -> Option<PathBuf> {
    let filename = dirs::home_dir()?.join(".zmachine").join(name);
    match filename.try_exists() {
        Ok(true) => Some(filename),
        Ok(false) => None,
        Err(e) => {
            info!(target: "app::state", "Error checking existence of {:?}: {}", filename, e);
            None
        }
    }
}

/// Strip the extension from a story file name
fn base_name(story: &Path) -> Result<String, RuntimeError> {
    let name = match story.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => {
            return fatal_error!(
                ErrorCode::InvalidFilename,
                "Story file name {:?} is not valid",
                story
            )
        }
    };

    let extension = match Regex::new(r"\.[^.]+$") {
        Ok(r) => r,
        Err(e) => return fatal_error!(ErrorCode::InvalidFilename, "{}", e),
    };
    let base = extension.replace(name, "").to_string();
    if base.is_empty() {
        fatal_error!(
            ErrorCode::InvalidFilename,
            "Story file name {:?} has no base name",
            story
        )
    } else {
        Ok(base)
    }
}

/// Path of the save state for a story: `<base name>.sav` in the configured save
/// directory, or beside the story.
///
/// # Arguments
/// * `story` - Story file path
/// * `config` - Runtime configuration
///
/// # Returns
/// [Result] with the save state path or a [RuntimeError]
pub fn save_path(story: &Path, config: &Config) -> Result<PathBuf, RuntimeError> {
    let file_name = format!("{}.sav", base_name(story)?);
    let directory = match config.save_directory() {
        Some(d) => d.clone(),
        None => story.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Ok(directory.join(file_name))
}

/// Read a whole file
pub fn read_file(path: &Path) -> Result<Vec<u8>, RuntimeError> {
    match fs::read(path) {
        Ok(data) => Ok(data),
        Err(e) => fatal_error!(ErrorCode::FileError, "Error reading {:?}: {}", path, e),
    }
}

/// Write a file atomically: the data is written to a temporary file in the same
/// directory, which then replaces `path`.
///
/// # Arguments
/// * `path` - Destination path
/// * `data` - File contents
///
/// # Returns
/// Empty [Result] or a [RuntimeError]
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), RuntimeError> {
    let directory = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut file = match NamedTempFile::new_in(&directory) {
        Ok(f) => f,
        Err(e) => {
            return fatal_error!(
                ErrorCode::FileError,
                "Error creating temporary file in {:?}: {}",
                directory,
                e
            )
        }
    };

    if let Err(e) = file.write_all(data).and_then(|_| file.flush()) {
        return fatal_error!(ErrorCode::FileError, "Error writing {:?}: {}", path, e);
    }

    match file.persist(path) {
        Ok(_) => {
            debug!(target: "app::state", "Wrote {} bytes to {:?}", data.len(), path);
            Ok(())
        }
        Err(e) => fatal_error!(ErrorCode::FileError, "Error writing {:?}: {}", path, e),
    }
}

/// Remove a file if it exists
pub fn remove(path: &Path) -> Result<(), RuntimeError> {
    match fs::remove_file(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => fatal_error!(ErrorCode::FileError, "Error removing {:?}: {}", path, e),
    }
}

#[cfg(test)]
mod tests {
    use crate::{assert_ok, assert_ok_eq};

    use super::*;

    #[test]
    fn test_save_path() {
        let config = Config::default();
        assert_ok_eq!(
            save_path(Path::new("games/zork1.z3"), &config),
            PathBuf::from("games/zork1.sav")
        );
        assert_ok_eq!(
            save_path(Path::new("minizork.v1.z3"), &config),
            PathBuf::from("minizork.v1.sav")
        );
        assert_ok_eq!(
            save_path(Path::new("story"), &config),
            PathBuf::from("story.sav")
        );
    }

    #[test]
    fn test_save_path_directory() {
        let config = Config::new(false, None, Some(PathBuf::from("/var/saves")));
        assert_ok_eq!(
            save_path(Path::new("games/zork1.z3"), &config),
            PathBuf::from("/var/saves/zork1.sav")
        );
    }

    #[test]
    fn test_save_path_invalid() {
        let config = Config::default();
        assert_eq!(
            save_path(Path::new(".z3"), &config).unwrap_err().code(),
            ErrorCode::InvalidFilename
        );
        assert_eq!(
            save_path(Path::new("/"), &config).unwrap_err().code(),
            ErrorCode::InvalidFilename
        );
    }

    #[test]
    fn test_write_atomic_and_remove() {
        let directory = assert_ok!(tempfile::tempdir());
        let path = directory.path().join("story.sav");
        assert_ok!(write_atomic(&path, b"first"));
        assert_ok!(write_atomic(&path, b"second"));
        assert_ok_eq!(read_file(&path), b"second".to_vec());
        assert_ok!(remove(&path));
        assert!(!path.exists());
        assert_ok!(remove(&path));
        assert_eq!(read_file(&path).unwrap_err().code(), ErrorCode::FileError);
    }
}
