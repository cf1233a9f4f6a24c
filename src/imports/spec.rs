use crate::imports::existing::ImportStyle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A requested import: module path plus the specifiers wanted from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    /// Module source path exactly as written in the import, e.g. `react` or `@/components/AuthGuard`.
    #[serde(alias = "source")]
    pub module: String,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub named: Vec<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

/// A single spec asked for both a default and a namespace specifier.
///
/// This is a caller bug, not a data condition, so it is raised synchronously
/// instead of being collected into a generation result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("import from '{module}' requests both default '{default}' and namespace '{namespace}'")]
pub struct AmbiguousImportCombination {
    pub module: String,
    pub default: String,
    pub namespace: String,
}

impl ImportSpec {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default = Some(name.into());
        self
    }

    pub fn with_named<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.named.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_namespace(mut self, name: impl Into<String>) -> Self {
        self.namespace = Some(name.into());
        self
    }

    /// Reject a default specifier combined with a namespace specifier.
    pub fn validate(&self) -> Result<(), AmbiguousImportCombination> {
        match (&self.default, &self.namespace) {
            (Some(default), Some(namespace)) => Err(AmbiguousImportCombination {
                module: self.module.clone(),
                default: default.clone(),
                namespace: namespace.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Nothing is requested besides the module itself.
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.namespace.is_none() && self.named.is_empty()
    }

    /// Render as a standalone statement.
    ///
    /// A namespace specifier is only rendered when nothing else is requested;
    /// the resolver never builds a statement that mixes it with other specifiers.
    pub fn render(&self, style: ImportStyle) -> String {
        let mut clause = Vec::new();
        if let Some(default) = &self.default {
            clause.push(default.clone());
        }
        if !self.named.is_empty() {
            clause.push(format!("{{ {} }}", self.named.join(", ")));
        }
        if clause.is_empty() {
            if let Some(namespace) = &self.namespace {
                clause.push(format!("* as {namespace}"));
            }
        }

        let quote = style.quote.as_char();
        let terminator = if style.semicolon { ";" } else { "" };
        if clause.is_empty() {
            format!("import {quote}{}{quote}{terminator}", self.module)
        } else {
            format!(
                "import {} from {quote}{}{quote}{terminator}",
                clause.join(", "),
                self.module
            )
        }
    }
}
