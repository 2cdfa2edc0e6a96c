//! File-backed [`ConfigSource`] for the lint manager.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use catlint_lint::{ConfigSource, path_for_document};
use catlint_types::{AnalyzerSettings, DocumentId, LintSettings};

use crate::file::{CatlintConfig, ConfigError, ConfigLocations, RawConfig};

/// Modification time and size of a config file when it was parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

#[derive(Debug, Clone)]
struct CachedLayer {
    stamp: FileStamp,
    raw: RawConfig,
}

/// Checks configuration on every lookup, so edits apply to the next analysis
/// without a restart.
///
/// Each lookup still stats the candidate files synchronously; a file is only
/// re-read and re-parsed when its modification time or size changed.
#[derive(Debug, Clone, Default)]
pub struct FileConfigSource {
    locations: ConfigLocations,
    layers: RefCell<HashMap<PathBuf, CachedLayer>>,
}

impl FileConfigSource {
    #[must_use]
    pub fn new(locations: ConfigLocations) -> Self {
        Self {
            locations,
            layers: RefCell::default(),
        }
    }

    #[must_use]
    pub fn locations(&self) -> &ConfigLocations {
        &self.locations
    }

    /// Lint settings effective in `start_dir`; defaults if the files are unusable.
    #[must_use]
    pub fn lint_settings(&self, start_dir: Option<&Path>) -> LintSettings {
        match self.load(start_dir).map(|config| config.lint()) {
            Some(Ok(settings)) => settings,
            Some(Err(err)) => {
                tracing::warn!("Ignoring lint settings in {:?}: {}", err.path(), err);
                LintSettings::default()
            }
            None => LintSettings::default(),
        }
    }

    fn read_layer(&self, path: &Path) -> Result<Option<RawConfig>, ConfigError> {
        let Ok(metadata) = fs::metadata(path) else {
            self.layers.borrow_mut().remove(path);
            return Ok(None);
        };
        let stamp = FileStamp {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        };

        if let Some(cached) = self.layers.borrow().get(path)
            && cached.stamp == stamp
        {
            return Ok(Some(cached.raw.clone()));
        }

        let raw = RawConfig::load_file(path)?;
        if let Some(raw) = &raw {
            self.layers.borrow_mut().insert(
                path.to_path_buf(),
                CachedLayer {
                    stamp,
                    raw: raw.clone(),
                },
            );
        }
        Ok(raw)
    }

    fn load(&self, start_dir: Option<&Path>) -> Option<CatlintConfig> {
        match self
            .locations
            .load_with(start_dir, |path| self.read_layer(path))
        {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!("Failed to load config at {:?}: {}", err.path(), err);
                None
            }
        }
    }
}

impl ConfigSource for FileConfigSource {
    fn analyzer_for(&self, document: &DocumentId) -> Option<AnalyzerSettings> {
        let start_dir: Option<PathBuf> =
            path_for_document(document).and_then(|path| path.parent().map(Path::to_path_buf));
        let config = self.load(start_dir.as_deref())?;
        match config.analyzer() {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!("Invalid analyzer settings in {:?}: {}", err.path(), err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    use catlint_lint::document_id_for_path;
    use tempfile::TempDir;

    fn source_without_global() -> FileConfigSource {
        FileConfigSource::new(ConfigLocations::default().with_global(None))
    }

    #[test]
    fn workspace_file_enables_analysis() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".catlint.toml"),
            "[analyzer]\npath = \"/opt/catlua/main.py\"\n",
        )
        .unwrap();
        let document = document_id_for_path(&dir.path().join("door.cat")).unwrap();

        let settings = source_without_global().analyzer_for(&document).unwrap();
        assert_eq!(settings.program(), "/opt/catlua/main.py");
    }

    #[test]
    fn no_files_means_not_configured() {
        let dir = TempDir::new().unwrap();
        let document = document_id_for_path(&dir.path().join("door.cat")).unwrap();
        assert!(source_without_global().analyzer_for(&document).is_none());
    }

    #[test]
    fn broken_file_means_not_configured() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".catlint.toml"), "[analyzer\n").unwrap();
        let document = document_id_for_path(&dir.path().join("door.cat")).unwrap();
        assert!(source_without_global().analyzer_for(&document).is_none());
    }

    #[test]
    fn edits_apply_on_next_lookup() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join(".catlint.toml");
        let document = document_id_for_path(&dir.path().join("door.cat")).unwrap();
        let source = source_without_global();

        fs::write(&config, "[analyzer]\npath = \"/a/main.py\"\n").unwrap();
        assert_eq!(source.analyzer_for(&document).unwrap().program(), "/a/main.py");

        fs::write(&config, "[analyzer]\npath = \"/bb/main.py\"\n").unwrap();
        assert_eq!(source.analyzer_for(&document).unwrap().program(), "/bb/main.py");
    }

    #[test]
    fn unchanged_file_is_served_from_cache() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join(".catlint.toml");
        fs::write(&config, "[analyzer]\npath = \"/a/main.py\"\n").unwrap();
        let document = document_id_for_path(&dir.path().join("door.cat")).unwrap();
        let source = source_without_global();

        assert!(source.analyzer_for(&document).is_some());
        assert!(source.layers.borrow().contains_key(&config));

        // Plant a different cached value under the current stamp.
        source
            .layers
            .borrow_mut()
            .get_mut(&config)
            .unwrap()
            .raw
            .analyzer
            .as_mut()
            .unwrap()
            .path = Some("/cached/main.py".to_string());
        assert_eq!(
            source.analyzer_for(&document).unwrap().program(),
            "/cached/main.py"
        );

        fs::write(&config, "[analyzer]\npath = \"/edited/main.py\"\n").unwrap();
        assert_eq!(
            source.analyzer_for(&document).unwrap().program(),
            "/edited/main.py"
        );
    }

    #[test]
    fn lint_settings_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".catlint.toml"), "[lint]\nlanguage_id = \"\"\n").unwrap();
        let settings = source_without_global().lint_settings(Some(dir.path()));
        assert_eq!(settings, LintSettings::default());

        fs::write(dir.path().join(".catlint.toml"), "[lint]\ndebounce_ms = 50\n").unwrap();
        let settings = source_without_global().lint_settings(Some(dir.path()));
        assert_eq!(settings.debounce(), Duration::from_millis(50));
    }
}
