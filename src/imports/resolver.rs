use crate::edit::Edit;
use crate::imports::existing::{ExistingImport, ImportStyle};
use crate::imports::spec::{AmbiguousImportCombination, ImportSpec};
use crate::ts::SyntaxTree;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// How a module's export is bound by an import clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecifierKind {
    Default,
    Namespace,
    Named,
}

impl fmt::Display for SpecifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecifierKind::Default => f.write_str("default"),
            SpecifierKind::Namespace => f.write_str("namespace"),
            SpecifierKind::Named => f.write_str("named"),
        }
    }
}

/// A requested default or namespace name that collides with what a module's
/// imports already bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportConflict {
    pub module: String,
    #[serde(rename = "specifier")]
    pub kind: SpecifierKind,
    pub existing: String,
    pub requested: String,
}

impl fmt::Display for ImportConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' already binds '{}' as a {} import, cannot add '{}'",
            self.module, self.existing, self.kind, self.requested
        )
    }
}

/// Outcome of merging one module's requested specifiers into a file.
#[derive(Debug, Clone, Default)]
pub struct ImportResolution {
    /// Insertions into existing statements, anchored to the original source.
    pub edits: Vec<Edit>,
    /// Statements to emit in the import block.
    pub new_statements: Vec<ImportSpec>,
    pub conflicts: Vec<ImportConflict>,
}

impl ImportResolution {
    /// Nothing to change: every requested specifier is already present.
    pub fn is_noop(&self) -> bool {
        self.edits.is_empty() && self.new_statements.is_empty()
    }
}

/// Resolve a single caller-supplied spec against a file's existing imports.
///
/// `existing` may list imports of every module; only those whose path equals
/// `spec.module` character for character are considered.
pub fn resolve_import(
    spec: &ImportSpec,
    existing: &[ExistingImport],
) -> Result<ImportResolution, AmbiguousImportCombination> {
    spec.validate()?;
    Ok(resolve_module(spec, existing))
}

/// Merge without the single-spec ambiguity check.
///
/// Used for the combined per-module request built by [`group_by_module`], which
/// may legitimately carry a default from one request and a namespace from another.
pub(crate) fn resolve_module(spec: &ImportSpec, existing: &[ExistingImport]) -> ImportResolution {
    let same_module: Vec<&ExistingImport> =
        existing.iter().filter(|i| i.module == spec.module).collect();
    let targets: Vec<&ExistingImport> = same_module
        .iter()
        .copied()
        .filter(|i| i.is_merge_target())
        .collect();

    let mut resolution = ImportResolution::default();
    let mut fresh = ImportSpec::new(spec.module.clone());

    if let Some(default) = &spec.default {
        match targets.iter().find_map(|i| i.default.as_deref()) {
            Some(present) if present == default => {
                debug!(module = %spec.module, default = %default, "default import already present");
            }
            Some(present) => resolution.conflicts.push(ImportConflict {
                module: spec.module.clone(),
                kind: SpecifierKind::Default,
                existing: present.to_string(),
                requested: default.clone(),
            }),
            None if targets.iter().any(|i| i.binds(default)) => {
                resolution.conflicts.push(ImportConflict {
                    module: spec.module.clone(),
                    kind: SpecifierKind::Named,
                    existing: default.clone(),
                    requested: default.clone(),
                });
            }
            None => match targets
                .iter()
                .find_map(|i| i.clause_start.filter(|_| i.default.is_none()))
            {
                Some(at) => resolution.edits.push(Edit::insert(at, format!("{default}, "))),
                None => fresh.default = Some(default.clone()),
            },
        }
    }

    let mut namespace_statement = None;
    if let Some(namespace) = &spec.namespace {
        match targets.iter().find_map(|i| i.namespace.as_deref()) {
            Some(present) if present == namespace => {
                debug!(module = %spec.module, namespace = %namespace, "namespace import already present");
            }
            Some(present) => resolution.conflicts.push(ImportConflict {
                module: spec.module.clone(),
                kind: SpecifierKind::Namespace,
                existing: present.to_string(),
                requested: namespace.clone(),
            }),
            None => {
                namespace_statement =
                    Some(ImportSpec::new(spec.module.clone()).with_namespace(namespace.clone()))
            }
        }
    }

    let mut missing: Vec<String> = Vec::new();
    for name in &spec.named {
        if missing.contains(name) || targets.iter().any(|i| i.binds(name)) {
            continue;
        }
        missing.push(name.clone());
    }

    if !missing.is_empty() {
        let list = missing.join(", ");
        let with_braces = targets
            .iter()
            .find_map(|i| i.braces.map(|braces| (i.last_named_end, braces)));
        let default_only = targets
            .iter()
            .find(|i| i.default.is_some() && i.namespace.is_none() && i.braces.is_none());

        if let Some((last_named_end, (open, close))) = with_braces {
            let edit = match last_named_end {
                Some(end) => Edit::insert(end, format!(", {list}")),
                // `{}` or `{ }`: write inside the closing brace
                None if close - open <= 2 => Edit::insert(close - 1, format!(" {list} ")),
                None => Edit::insert(close - 1, format!("{list} ")),
            };
            resolution.edits.push(edit);
        } else if let Some(end) = default_only.and_then(|i| i.default_end) {
            resolution.edits.push(Edit::insert(end, format!(", {{ {list} }}")));
        } else {
            fresh.named = missing;
        }
    }

    let side_effect_only = spec.is_empty() && same_module.is_empty();
    if !fresh.is_empty() || side_effect_only {
        resolution.new_statements.push(fresh);
    }
    resolution.new_statements.extend(namespace_statement);

    debug!(
        module = %spec.module,
        edits = resolution.edits.len(),
        new_statements = resolution.new_statements.len(),
        conflicts = resolution.conflicts.len(),
        "resolved import"
    );

    resolution
}

/// Combine queued specs into one spec per module path, in first-appearance order.
///
/// Named specifiers are unioned in request order. When two requests name a
/// different default (or namespace) for the same module, the first one wins and
/// the later one is reported as a conflict.
pub fn group_by_module(specs: &[ImportSpec]) -> (Vec<ImportSpec>, Vec<ImportConflict>) {
    let mut grouped: Vec<ImportSpec> = Vec::new();
    let mut conflicts = Vec::new();

    for spec in specs {
        let Some(index) = grouped.iter().position(|g| g.module == spec.module) else {
            let mut first = ImportSpec::new(spec.module.clone());
            first.default = spec.default.clone();
            first.namespace = spec.namespace.clone();
            for name in &spec.named {
                if !first.named.contains(name) {
                    first.named.push(name.clone());
                }
            }
            grouped.push(first);
            continue;
        };
        let entry = &mut grouped[index];

        for (kind, slot, requested) in [
            (SpecifierKind::Default, &mut entry.default, &spec.default),
            (SpecifierKind::Namespace, &mut entry.namespace, &spec.namespace),
        ] {
            let Some(requested) = requested else {
                continue;
            };
            match slot {
                Some(existing) if existing != requested => conflicts.push(ImportConflict {
                    module: spec.module.clone(),
                    kind,
                    existing: existing.clone(),
                    requested: requested.clone(),
                }),
                Some(_) => {}
                None => *slot = Some(requested.clone()),
            }
        }

        for name in &spec.named {
            if !entry.named.contains(name) {
                entry.named.push(name.clone());
            }
        }
    }

    (grouped, conflicts)
}

/// Where new import statements are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPlacement {
    /// Directly after the last top-level import.
    AfterImports(usize),
    /// After a leading header comment, directive prologue (`'use client';`) or hashbang.
    AfterPrologue(usize),
    FileStart,
}

impl ImportPlacement {
    pub fn offset(self) -> usize {
        match self {
            ImportPlacement::AfterImports(at) | ImportPlacement::AfterPrologue(at) => at,
            ImportPlacement::FileStart => 0,
        }
    }
}

/// Pick the insertion point for new statements.
pub fn placement(tree: &SyntaxTree, imports: &[ExistingImport]) -> ImportPlacement {
    if let Some(last) = imports.iter().map(|i| i.byte_end).max() {
        return ImportPlacement::AfterImports(last);
    }

    let source = tree.source();
    let root = tree.root_node();
    let mut cursor = root.walk();
    let mut prologue_end = None;
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            // A comment directly above code documents that code; one followed
            // by a blank line is a file header.
            "comment" => {
                if followed_by_blank_line(source, child.end_byte()) {
                    prologue_end = Some(child.end_byte());
                }
            }
            "hash_bang_line" => prologue_end = Some(child.end_byte()),
            "expression_statement"
                if child.named_child(0).is_some_and(|e| e.kind() == "string") =>
            {
                prologue_end = Some(child.end_byte())
            }
            _ => break,
        }
    }

    prologue_end.map_or(ImportPlacement::FileStart, ImportPlacement::AfterPrologue)
}

fn followed_by_blank_line(source: &str, offset: usize) -> bool {
    let rest = source[offset..].trim_start_matches([' ', '\t']);
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'));
    rest.is_some_and(|rest| {
        let rest = rest.trim_start_matches([' ', '\t']);
        rest.starts_with('\n') || rest.starts_with("\r\n") || rest.is_empty()
    })
}

/// Render statements as the text inserted at `placement`.
pub fn render_statements(
    statements: &[ImportSpec],
    style: ImportStyle,
    placement: ImportPlacement,
    eol: &str,
) -> String {
    let block = statements
        .iter()
        .map(|s| s.render(style))
        .collect::<Vec<_>>()
        .join(eol);

    match placement {
        ImportPlacement::AfterImports(_) | ImportPlacement::AfterPrologue(_) => format!("{eol}{block}"),
        ImportPlacement::FileStart => format!("{block}{eol}{eol}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::TsxParser;

    /// Resolve `spec` against `source` and splice the result.
    fn merge(source: &str, spec: &ImportSpec) -> (String, ImportResolution) {
        let tree = TsxParser::new().unwrap().parse_source(source).unwrap();
        let existing = ExistingImport::collect(&tree);
        let resolution = resolve_import(spec, &existing).unwrap();

        let mut edits = resolution.edits.clone();
        if !resolution.new_statements.is_empty() {
            let at = placement(&tree, &existing);
            edits.push(Edit::insert(
                at.offset(),
                render_statements(&resolution.new_statements, ImportStyle::detect(&existing), at, "\n"),
            ));
        }
        (Edit::apply_batch(source, edits).unwrap(), resolution)
    }

    #[test]
    fn appends_named_after_existing_ones() {
        let (out, _) = merge(
            "import { useState } from 'react';\n",
            &ImportSpec::new("react").with_named(["useEffect"]),
        );
        assert_eq!(out, "import { useState, useEffect } from 'react';\n");
    }

    #[test]
    fn present_names_are_skipped() {
        let (out, resolution) = merge(
            "import { useState } from 'react';\n",
            &ImportSpec::new("react").with_named(["useState", "useState"]),
        );
        assert!(resolution.is_noop());
        assert_eq!(out, "import { useState } from 'react';\n");
    }

    #[test]
    fn new_statement_goes_after_last_import() {
        let (out, _) = merge(
            "import React from \"react\"\nimport x from \"./x\"\n\nexport default function App() {}\n",
            &ImportSpec::new("@/components/AuthGuard").with_default("AuthGuard"),
        );
        assert_eq!(
            out,
            "import React from \"react\"\nimport x from \"./x\"\nimport AuthGuard from \"@/components/AuthGuard\"\n\nexport default function App() {}\n"
        );
    }

    #[test]
    fn new_statement_at_file_start() {
        let (out, _) = merge(
            "export function App() {}\n",
            &ImportSpec::new("react").with_named(["useState"]),
        );
        assert_eq!(out, "import { useState } from 'react';\n\nexport function App() {}\n");
    }

    #[test]
    fn new_statement_after_directive() {
        let (out, _) = merge(
            "'use client';\n\nexport function App() {}\n",
            &ImportSpec::new("react").with_named(["useState"]),
        );
        assert_eq!(
            out,
            "'use client';\nimport { useState } from 'react';\n\nexport function App() {}\n"
        );
    }

    #[test]
    fn new_statement_after_header_comment() {
        let (out, _) = merge(
            "/**\n * Copyright Acme\n */\n\nexport function App() {}\n",
            &ImportSpec::new("react").with_named(["useState"]),
        );
        assert_eq!(
            out,
            "/**\n * Copyright Acme\n */\nimport { useState } from 'react';\n\nexport function App() {}\n"
        );
    }

    #[test]
    fn attached_doc_comment_stays_with_its_code() {
        let (out, _) = merge(
            "/** The app. */\nexport function App() {}\n",
            &ImportSpec::new("react").with_named(["useState"]),
        );
        assert_eq!(
            out,
            "import { useState } from 'react';\n\n/** The app. */\nexport function App() {}\n"
        );
    }

    #[test]
    fn default_already_bound_as_named_is_a_conflict() {
        let (out, resolution) = merge(
            "import { Card } from './card';\n",
            &ImportSpec::new("./card").with_default("Card"),
        );
        assert_eq!(out, "import { Card } from './card';\n");
        assert_eq!(
            resolution.conflicts,
            vec![ImportConflict {
                module: "./card".into(),
                kind: SpecifierKind::Named,
                existing: "Card".into(),
                requested: "Card".into(),
            }]
        );
        assert_eq!(
            resolution.conflicts[0].to_string(),
            "'./card' already binds 'Card' as a named import, cannot add 'Card'"
        );
    }

    #[test]
    fn different_default_is_a_conflict() {
        let (out, resolution) = merge(
            "import Foo from 'm';\n",
            &ImportSpec::new("m").with_default("Bar"),
        );
        assert_eq!(out, "import Foo from 'm';\n");
        assert_eq!(
            resolution.conflicts,
            vec![ImportConflict {
                module: "m".into(),
                kind: SpecifierKind::Default,
                existing: "Foo".into(),
                requested: "Bar".into(),
            }]
        );
    }

    #[test]
    fn different_namespace_is_a_conflict() {
        let (_, resolution) = merge(
            "import * as A from 'm';\n",
            &ImportSpec::new("m").with_namespace("B"),
        );
        assert_eq!(resolution.conflicts.len(), 1);
        assert_eq!(resolution.conflicts[0].kind, SpecifierKind::Namespace);
    }

    #[test]
    fn default_joins_named_only_import() {
        let (out, _) = merge("import { a } from 'm';", &ImportSpec::new("m").with_default("D"));
        assert_eq!(out, "import D, { a } from 'm';");
    }

    #[test]
    fn named_joins_default_only_import() {
        let (out, _) = merge(
            "import React from 'react';",
            &ImportSpec::new("react").with_named(["useState", "useEffect"]),
        );
        assert_eq!(out, "import React, { useState, useEffect } from 'react';");
    }

    #[test]
    fn named_fills_empty_braces() {
        let (out, _) = merge("import {} from 'm';", &ImportSpec::new("m").with_named(["a"]));
        assert_eq!(out, "import { a } from 'm';");
    }

    #[test]
    fn type_only_imports_are_not_merge_targets() {
        let (out, _) = merge(
            "import type { Props } from './card';\n",
            &ImportSpec::new("./card").with_named(["Card"]),
        );
        assert_eq!(
            out,
            "import type { Props } from './card';\nimport { Card } from './card';\n"
        );
    }

    #[test]
    fn namespace_gets_its_own_statement() {
        let (out, _) = merge(
            "import { a } from 'm';",
            &ImportSpec::new("m").with_namespace("M"),
        );
        assert_eq!(out, "import { a } from 'm';\nimport * as M from 'm';");
    }

    #[test]
    fn module_match_is_exact() {
        let (out, _) = merge(
            "import { a } from './m';",
            &ImportSpec::new("m").with_named(["a"]),
        );
        assert_eq!(out, "import { a } from './m';\nimport { a } from 'm';");
    }

    #[test]
    fn ambiguous_spec_is_rejected_synchronously() {
        let tree = TsxParser::new().unwrap().parse_source("").unwrap();
        let existing = ExistingImport::collect(&tree);
        let spec = ImportSpec::new("react")
            .with_default("React")
            .with_namespace("ReactNS");

        assert!(resolve_import(&spec, &existing).is_err());
    }

    #[test]
    fn grouping_unions_named_and_reports_default_conflicts() {
        let (grouped, conflicts) = group_by_module(&[
            ImportSpec::new("react").with_named(["useState"]),
            ImportSpec::new("./a").with_default("A"),
            ImportSpec::new("react").with_named(["useEffect", "useState"]),
            ImportSpec::new("./a").with_default("B"),
            ImportSpec::new("./a").with_default("A"),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].module, "react");
        assert_eq!(grouped[0].named, ["useState", "useEffect"]);
        assert_eq!(grouped[1].default.as_deref(), Some("A"));
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].requested, "B");
    }
}
