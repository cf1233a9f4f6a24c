use crate::config::schema::{PlanConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A plan file that could not be read, parsed or validated.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    /// The plan file involved, when the plan came from disk.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } => Some(path),
            ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }

    fn at(mut self, file: &Path) -> Self {
        if let ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } = &mut self {
            path.get_or_insert_with(|| file.to_path_buf());
        }
        self
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = match self.path() {
            Some(path) => format!(" {}", path.display()),
            None => String::new(),
        };
        match self {
            ConfigError::Io { source, .. } => write!(f, "cannot read plan{location}: {source}"),
            ConfigError::Toml { source, .. } => {
                write!(f, "plan{location} is not valid TOML: {source}")
            }
            ConfigError::Validation { source, .. } => {
                write!(f, "plan{location} is invalid: {source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

/// Parse and validate a plan.
pub fn load_from_str(input: &str) -> Result<PlanConfig, ConfigError> {
    let config: PlanConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

/// Read, parse and validate the plan at `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<PlanConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.at(path))
}
