//! Plan applicator: runs a plan's requests through a session per source file.

use crate::config::schema::PlanConfig;
use crate::imports::AmbiguousImportCombination;
use crate::session::{GenerationResult, Session};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of running a plan against one file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FileReport should be checked for success/failure"]
pub struct FileReport {
    pub file: PathBuf,
    pub original: String,
    pub result: GenerationResult,
    /// The generated code was written back to `file`.
    pub written: bool,
}

impl FileReport {
    /// Generation succeeded and produced different text.
    pub fn changed(&self) -> bool {
        self.result
            .code
            .as_deref()
            .is_some_and(|code| code != self.original)
    }
}

/// Errors that stop a plan before or around generation.
#[derive(Debug)]
pub enum PlanError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A request carries an import with both a default and a namespace specifier.
    AmbiguousImport {
        request: usize,
        source: AmbiguousImportCombination,
    },
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            PlanError::AmbiguousImport { request, source } => {
                write!(f, "request #{request}: {source}")
            }
        }
    }
}

impl std::error::Error for PlanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlanError::Io { source, .. } => Some(source),
            PlanError::AmbiguousImport { source, .. } => Some(source),
        }
    }
}

/// Queue every request of `plan` on a fresh session over `source` and generate.
pub fn apply_plan(plan: &PlanConfig, source: &str) -> Result<GenerationResult, PlanError> {
    let mut session = Session::with_options(source, plan.options.clone());
    for (index, request) in plan.to_requests().into_iter().enumerate() {
        session
            .push_request(request)
            .map_err(|source| PlanError::AmbiguousImport {
                request: index + 1,
                source,
            })?;
    }
    Ok(session.generate())
}

/// Run `plan` against the file at `path`, writing the result back when `write`
/// is set and generation succeeded with a change.
pub fn apply_plan_to_file(plan: &PlanConfig, path: &Path, write: bool) -> Result<FileReport, PlanError> {
    let original = fs::read_to_string(path).map_err(|source| PlanError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let result = apply_plan(plan, &original)?;
    let mut report = FileReport {
        file: path.to_path_buf(),
        original,
        result,
        written: false,
    };

    if write && report.result.success && report.changed() {
        if let Some(code) = &report.result.code {
            atomic_write(path, code.as_bytes()).map_err(|source| PlanError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            report.written = true;
            info!(file = %path.display(), "wrote generated code");
        }
    } else {
        debug!(file = %path.display(), changed = report.changed(), "left file untouched");
    }

    Ok(report)
}

/// Tempfile in the same directory, fsync, rename.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_from_str;

    const PLAN: &str = r#"
[[requests]]
type = "replace-text"
search = "Hello"
replace = "Goodbye"
"#;

    #[test]
    fn writes_only_when_asked() {
        let plan = load_from_str(PLAN).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("App.tsx");
        fs::write(&path, "const App = () => <p>Hello</p>;\n").unwrap();

        let report = apply_plan_to_file(&plan, &path, false).unwrap();
        assert!(report.changed());
        assert!(!report.written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "const App = () => <p>Hello</p>;\n");

        let report = apply_plan_to_file(&plan, &path, true).unwrap();
        assert!(report.written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "const App = () => <p>Goodbye</p>;\n");
    }

    #[test]
    fn ambiguous_import_is_a_hard_error() {
        let mut plan = load_from_str(PLAN).unwrap();
        plan.requests.insert(
            0,
            crate::config::RequestDefinition::AddImport(
                crate::imports::ImportSpec::new("react")
                    .with_default("React")
                    .with_namespace("R"),
            ),
        );

        let err = apply_plan(&plan, "const x = 1;").unwrap_err();
        assert!(matches!(err, PlanError::AmbiguousImport { request: 1, .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let plan = load_from_str(PLAN).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = apply_plan_to_file(&plan, &dir.path().join("absent.tsx"), false).unwrap_err();
        assert!(matches!(err, PlanError::Io { .. }));
    }
}
