//! On-disk configuration format and layered loading.
//!
//! ```toml
//! [analyzer]
//! path = "${HOME}/catlua/compiler/main.py"
//! interpreter = "python3"
//! timeout_secs = 30
//!
//! [lint]
//! language_id = "catlua"
//! debounce_ms = 500
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use catlint_types::{
    AnalyzerSettings, DEFAULT_DEBOUNCE_MS, DEFAULT_LANGUAGE_ID, DEFAULT_TIMEOUT_SECS,
    LintSettings, SettingsError,
};
use serde::Deserialize;

/// Per-workspace configuration file name.
pub const WORKSPACE_CONFIG_FILE: &str = ".catlint.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid setting in {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        source: SettingsError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawConfig {
    pub analyzer: Option<RawAnalyzer>,
    pub lint: Option<RawLint>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawAnalyzer {
    /// Analyzer executable or script. Analysis is disabled without it.
    pub path: Option<String>,
    /// Program that runs `path`, e.g. `python3`.
    pub interpreter: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawLint {
    pub language_id: Option<String>,
    pub debounce_ms: Option<u64>,
}

impl RawConfig {
    /// Parse one file. A missing file is `Ok(None)`.
    pub fn load_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        Self::read(path).map(Some)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Field-wise merge; values set in `over` win.
    #[must_use]
    pub fn overlay(self, over: RawConfig) -> RawConfig {
        let analyzer = match (self.analyzer, over.analyzer) {
            (Some(base), Some(over)) => Some(RawAnalyzer {
                path: over.path.or(base.path),
                interpreter: over.interpreter.or(base.interpreter),
                timeout_secs: over.timeout_secs.or(base.timeout_secs),
            }),
            (base, over) => over.or(base),
        };
        let lint = match (self.lint, over.lint) {
            (Some(base), Some(over)) => Some(RawLint {
                language_id: over.language_id.or(base.language_id),
                debounce_ms: over.debounce_ms.or(base.debounce_ms),
            }),
            (base, over) => over.or(base),
        };
        RawConfig { analyzer, lint }
    }
}

/// Replace `${VAR}` with the variable's value (empty if unset).
///
/// An unterminated `${` is kept as written.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

/// `~/.catlint/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".catlint").join("config.toml"))
}

/// Nearest `.catlint.toml` in `start` or any of its ancestors.
pub fn find_workspace_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(WORKSPACE_CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

/// Where configuration files are looked up.
#[derive(Debug, Clone, Default)]
pub struct ConfigLocations {
    explicit: Option<PathBuf>,
    global: Option<PathBuf>,
}

impl ConfigLocations {
    /// Global file plus per-workspace discovery.
    #[must_use]
    pub fn discover() -> Self {
        Self {
            explicit: None,
            global: global_config_path(),
        }
    }

    /// A single file, bypassing global and workspace lookup. It must exist.
    #[must_use]
    pub fn explicit(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit: Some(path.into()),
            global: None,
        }
    }

    #[must_use]
    pub fn with_global(mut self, global: Option<PathBuf>) -> Self {
        self.global = global;
        self
    }

    /// Load the effective configuration for a document in `start_dir`.
    pub fn load(&self, start_dir: Option<&Path>) -> Result<CatlintConfig, ConfigError> {
        self.load_with(start_dir, RawConfig::load_file)
    }

    /// Like [`load`](Self::load), with each file read through `read_layer`,
    /// which returns `Ok(None)` for a missing file.
    pub fn load_with<F>(
        &self,
        start_dir: Option<&Path>,
        mut read_layer: F,
    ) -> Result<CatlintConfig, ConfigError>
    where
        F: FnMut(&Path) -> Result<Option<RawConfig>, ConfigError>,
    {
        if let Some(path) = &self.explicit {
            let Some(raw) = read_layer(path)? else {
                return Err(ConfigError::Read {
                    path: path.clone(),
                    source: std::io::ErrorKind::NotFound.into(),
                });
            };
            return Ok(CatlintConfig {
                raw,
                origin: Some(path.clone()),
            });
        }

        let mut raw = RawConfig::default();
        let mut origin = None;

        if let Some(global) = &self.global
            && let Some(layer) = read_layer(global)?
        {
            raw = raw.overlay(layer);
            origin = Some(global.clone());
        }

        if let Some(workspace) = start_dir.and_then(find_workspace_config)
            && let Some(layer) = read_layer(&workspace)?
        {
            tracing::debug!(path = %workspace.display(), "Using workspace config");
            raw = raw.overlay(layer);
            origin = Some(workspace);
        }

        Ok(CatlintConfig { raw, origin })
    }
}

/// Effective configuration after layering.
#[derive(Debug, Clone, Default)]
pub struct CatlintConfig {
    raw: RawConfig,
    /// Most specific file that contributed, for error reporting.
    origin: Option<PathBuf>,
}

impl CatlintConfig {
    #[must_use]
    pub fn raw(&self) -> &RawConfig {
        &self.raw
    }

    #[must_use]
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Validated analyzer settings, or `Ok(None)` when no analyzer path is set.
    pub fn analyzer(&self) -> Result<Option<AnalyzerSettings>, ConfigError> {
        let Some(raw) = &self.raw.analyzer else {
            return Ok(None);
        };
        let Some(path) = &raw.path else {
            return Ok(None);
        };

        let program = expand_env_vars(path);
        let interpreter = raw.interpreter.as_deref().map(expand_env_vars);
        let timeout = Duration::from_secs(raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        AnalyzerSettings::new(program, interpreter, timeout)
            .map(Some)
            .map_err(|source| self.invalid(source))
    }

    pub fn lint(&self) -> Result<LintSettings, ConfigError> {
        let raw = self.raw.lint.clone().unwrap_or_default();
        let language_id = raw
            .language_id
            .unwrap_or_else(|| DEFAULT_LANGUAGE_ID.to_string());
        let debounce = Duration::from_millis(raw.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS));
        LintSettings::new(language_id, debounce).map_err(|source| self.invalid(source))
    }

    fn invalid(&self, source: SettingsError) -> ConfigError {
        ConfigError::Invalid {
            path: self.origin.clone().unwrap_or_default(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn expand_env_vars_no_vars() {
        assert_eq!(expand_env_vars("plain/path.py"), "plain/path.py");
    }

    #[test]
    fn expand_env_vars_replaces_and_blanks() {
        unsafe {
            std::env::set_var("CATLINT_TEST_ROOT", "/opt/cat");
            std::env::remove_var("CATLINT_TEST_MISSING");
        }
        assert_eq!(
            expand_env_vars("${CATLINT_TEST_ROOT}/main.py"),
            "/opt/cat/main.py"
        );
        assert_eq!(expand_env_vars("a${CATLINT_TEST_MISSING}b"), "ab");
        unsafe {
            std::env::remove_var("CATLINT_TEST_ROOT");
        }
    }

    #[test]
    fn expand_env_vars_unterminated_kept() {
        assert_eq!(expand_env_vars("x ${OPEN"), "x ${OPEN");
        assert_eq!(expand_env_vars("${}y"), "y");
    }

    #[test]
    fn missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(
            RawConfig::load_file(&dir.path().join("nope.toml"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn parse_error_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "bad.toml", "[analyzer\npath = 1");
        let err = RawConfig::load_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), &path);
    }

    #[test]
    fn no_analyzer_path_means_unconfigured() {
        let config = CatlintConfig::default();
        assert!(config.analyzer().unwrap().is_none());

        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "c.toml", "[analyzer]\ninterpreter = \"python3\"\n");
        let config = ConfigLocations::explicit(&path).load(None).unwrap();
        assert!(config.analyzer().unwrap().is_none());
    }

    #[test]
    fn explicit_file_full() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "c.toml",
            r#"
[analyzer]
path = "/opt/catlua/compiler/main.py"
interpreter = "python3"
timeout_secs = 5

[lint]
language_id = "catlua2"
debounce_ms = 250
"#,
        );
        let config = ConfigLocations::explicit(&path).load(None).unwrap();

        let analyzer = config.analyzer().unwrap().unwrap();
        assert_eq!(analyzer.program(), "/opt/catlua/compiler/main.py");
        assert_eq!(analyzer.interpreter(), Some("python3"));
        assert_eq!(analyzer.timeout(), Duration::from_secs(5));

        let lint = config.lint().unwrap();
        assert_eq!(lint.language_id(), "catlua2");
        assert_eq!(lint.debounce(), Duration::from_millis(250));
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = ConfigLocations::explicit(dir.path().join("absent.toml"))
            .load(None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn lint_defaults() {
        let lint = CatlintConfig::default().lint().unwrap();
        assert_eq!(lint.language_id(), DEFAULT_LANGUAGE_ID);
        assert_eq!(lint.debounce(), Duration::from_millis(DEFAULT_DEBOUNCE_MS));
    }

    #[test]
    fn workspace_overrides_global_field_by_field() {
        let dir = TempDir::new().unwrap();
        let global = write(
            dir.path(),
            "home/config.toml",
            "[analyzer]\npath = \"/global/main.py\"\ninterpreter = \"python3\"\n\n[lint]\ndebounce_ms = 900\n",
        );
        write(
            dir.path(),
            "game/.catlint.toml",
            "[analyzer]\npath = \"/workspace/main.py\"\n",
        );
        let nested = dir.path().join("game/levels/one");
        fs::create_dir_all(&nested).unwrap();

        let config = ConfigLocations::default()
            .with_global(Some(global))
            .load(Some(&nested))
            .unwrap();

        let analyzer = config.analyzer().unwrap().unwrap();
        assert_eq!(analyzer.program(), "/workspace/main.py");
        assert_eq!(analyzer.interpreter(), Some("python3"));
        assert_eq!(config.lint().unwrap().debounce(), Duration::from_millis(900));
        assert_eq!(
            config.origin(),
            Some(dir.path().join("game/.catlint.toml").as_path())
        );
    }

    #[test]
    fn invalid_value_names_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "c.toml",
            "[analyzer]\npath = \"/x/main.py\"\ntimeout_secs = 0\n",
        );
        let config = ConfigLocations::explicit(&path).load(None).unwrap();
        let err = config.analyzer().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                source: SettingsError::ZeroTimeout,
                ..
            }
        ));
        assert_eq!(err.path(), &path);
    }
}
