//! Theme preference stored as a one-word file under the user config dir.

use std::fs;
use std::path::{Path, PathBuf};

use toolchat::theme::{STORAGE_KEY, Theme, ThemeStore};

#[derive(Debug, Clone)]
pub struct FileThemeStore {
    path: Option<PathBuf>,
}

impl FileThemeStore {
    /// `<config dir>/toolchat/theme`, or no persistence when the platform has
    /// no config dir.
    pub fn user_default() -> Self {
        Self { path: dirs::config_dir().map(|dir| dir.join("toolchat").join(STORAGE_KEY)) }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: Some(path.into()) }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl ThemeStore for FileThemeStore {
    fn load(&self) -> Option<Theme> {
        let raw = fs::read_to_string(self.path.as_ref()?).ok()?;
        Theme::parse(&raw)
    }

    fn save(&self, theme: Theme) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(error = %e, path = %parent.display(), "theme dir create failed");
                return;
            }
        }
        if let Err(e) = fs::write(path, theme.as_str()) {
            tracing::warn!(error = %e, path = %path.display(), "theme save failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileThemeStore::at(dir.path().join("theme"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn save_creates_parent_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("theme");
        let store = FileThemeStore::at(&path);

        store.save(Theme::Dark);
        assert_eq!(fs::read_to_string(&path).unwrap(), "dark");
        assert_eq!(store.load(), Some(Theme::Dark));
    }

    #[test]
    fn garbage_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme");
        fs::write(&path, "purple").unwrap();
        assert_eq!(FileThemeStore::at(&path).load(), None);
    }

    #[test]
    fn user_default_ends_with_theme_key() {
        if let Some(path) = FileThemeStore::user_default().path() {
            assert!(path.ends_with("toolchat/theme"));
        }
    }
}
