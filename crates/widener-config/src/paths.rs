//! Platform-specific locations of the state file, presets and tables.
//!
//! # Directory Structure
//!
//! | What | Linux | macOS | Windows |
//! |------|-------|-------|---------|
//! | config | `~/.config/widener/` | `~/Library/Application Support/widener/` | `%APPDATA%\widener\` |
//! | state | `<config>/state.toml` | | |
//! | user presets | `<config>/presets/` | | |
//! | decorrelation tables | `<config>/tables/` | | |
//! | system presets | `/usr/share/widener/presets/` | `/Library/Application Support/widener/presets/` | `%PROGRAMDATA%\widener\presets\` |
//!
//! ```rust,no_run
//! use widener_config::paths;
//!
//! println!("state lives in {}", paths::state_file_path().display());
//! if let Some(path) = paths::find_preset("my_room") {
//!     println!("found {}", path.display());
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "widener";

const PRESETS_SUBDIR: &str = "presets";
const TABLES_SUBDIR: &str = "tables";
const STATE_FILE: &str = "state.toml";

/// Returns the user configuration directory, `<config>/widener/`.
///
/// Falls back to `./widener` when the platform config directory is unknown.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the user presets directory.
pub fn user_presets_dir() -> PathBuf {
    user_config_dir().join(PRESETS_SUBDIR)
}

/// Returns the directory for precomputed decorrelation tables.
pub fn user_tables_dir() -> PathBuf {
    user_config_dir().join(TABLES_SUBDIR)
}

/// Returns the path of the persisted control state.
pub fn state_file_path() -> PathBuf {
    user_config_dir().join(STATE_FILE)
}

/// Returns the system-wide (read-only) presets directory.
pub fn system_presets_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/usr/share")
            .join(APP_NAME)
            .join(PRESETS_SUBDIR)
    }
    #[cfg(target_os = "macos")]
    {
        PathBuf::from("/Library/Application Support")
            .join(APP_NAME)
            .join(PRESETS_SUBDIR)
    }
    #[cfg(target_os = "windows")]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData"))
            .join(APP_NAME)
            .join(PRESETS_SUBDIR)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
            .join(PRESETS_SUBDIR)
    }
}

/// Finds a preset file by path or name.
///
/// An existing file path is returned as is. Otherwise `name` (with `.toml`
/// appended if missing) is looked up in the user presets directory, then in
/// the system presets directory.
pub fn find_preset(name: &str) -> Option<PathBuf> {
    find_file(name, &[user_presets_dir(), system_presets_dir()])
}

/// Finds a decorrelation table by path or by name in the user tables directory.
pub fn find_table(name: &str) -> Option<PathBuf> {
    find_file(name, &[user_tables_dir()])
}

fn find_file(name: &str, search: &[PathBuf]) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if Path::new(name).extension().is_some() {
        name.to_string()
    } else {
        format!("{name}.toml")
    };
    search
        .iter()
        .map(|dir| dir.join(&filename))
        .find(|candidate| candidate.is_file())
}

/// Creates `dir` and its parents if missing.
///
/// # Errors
///
/// Returns [`ConfigError::CreateDir`] if the directory cannot be created.
pub fn ensure_dir(dir: &Path) -> Result<(), ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::create_dir(dir, e))?;
    }
    Ok(())
}

/// Ensures the user presets directory exists and returns it.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_presets_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_presets_dir();
    ensure_dir(&dir)?;
    Ok(dir)
}

/// Ensures the user configuration directory exists and returns it.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_config_dir();
    ensure_dir(&dir)?;
    Ok(dir)
}

/// Lists `.toml` files in the user presets directory.
pub fn list_user_presets() -> Vec<PathBuf> {
    list_presets_in_dir(&user_presets_dir())
}

/// Lists `.toml` files in the system presets directory.
pub fn list_system_presets() -> Vec<PathBuf> {
    list_presets_in_dir(&system_presets_dir())
}

/// User presets followed by system presets. Duplicates are kept; the
/// first occurrence of a name takes precedence.
pub fn list_all_presets() -> Vec<PathBuf> {
    let mut presets = list_user_presets();
    presets.extend(list_system_presets());
    presets
}

/// Lists `.toml` files in `dir`, sorted by path.
///
/// Missing or unreadable directories yield an empty list.
pub fn list_presets_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut presets: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    presets.sort();
    presets
}

/// Preset name (file stem) of `path`.
///
/// ```rust
/// use std::path::Path;
/// use widener_config::paths::preset_name_from_path;
///
/// assert_eq!(
///     preset_name_from_path(Path::new("/presets/wide_pad.toml")),
///     Some("wide_pad".to_string())
/// );
/// ```
pub fn preset_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn dirs_are_under_app_name() {
        assert!(user_config_dir().ends_with("widener"));
        assert!(user_presets_dir().ends_with("widener/presets"));
        assert!(user_tables_dir().ends_with("widener/tables"));
        assert!(state_file_path().ends_with("widener/state.toml"));
        assert!(system_presets_dir().to_string_lossy().contains("widener"));
    }

    #[test]
    fn find_existing_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("room.toml");
        fs::write(&path, "version = 1").unwrap();

        assert_eq!(find_preset(path.to_str().unwrap()), Some(path));
    }

    #[test]
    fn find_in_search_dirs_adds_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("room.toml");
        fs::write(&path, "version = 1").unwrap();

        let search = [PathBuf::from("/nonexistent/12345"), temp_dir.path().to_path_buf()];
        assert_eq!(find_file("room", &search), Some(path.clone()));
        assert_eq!(find_file("room.toml", &search), Some(path));
        assert_eq!(find_file("hall", &search), None);
    }

    #[test]
    fn find_missing_preset() {
        assert!(find_preset("nonexistent_widener_preset_12345").is_none());
    }

    #[test]
    fn list_only_toml_sorted() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.toml"), "").unwrap();
        fs::write(temp_dir.path().join("a.toml"), "").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(temp_dir.path().join("dir.toml")).unwrap();

        let presets = list_presets_in_dir(temp_dir.path());
        let names: Vec<_> = presets
            .iter()
            .filter_map(|p| preset_name_from_path(p))
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn list_missing_dir_is_empty() {
        assert!(list_presets_in_dir(Path::new("/nonexistent/path/12345")).is_empty());
    }

    #[test]
    fn ensure_dir_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // Second call is a no-op.
        ensure_dir(&nested).unwrap();
    }
}
