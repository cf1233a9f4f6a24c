use crate::ts::{NodeQuery, SyntaxTree};
use serde::Serialize;
use tree_sitter::Node;

/// String delimiter used for module paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Quote {
    #[default]
    Single,
    Double,
}

impl Quote {
    pub fn as_char(self) -> char {
        match self {
            Quote::Single => '\'',
            Quote::Double => '"',
        }
    }
}

/// Formatting conventions for newly emitted import statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportStyle {
    pub quote: Quote,
    pub semicolon: bool,
}

impl Default for ImportStyle {
    fn default() -> Self {
        Self {
            quote: Quote::Single,
            semicolon: true,
        }
    }
}

impl ImportStyle {
    /// Style of the first import in the file, or the default.
    pub fn detect(imports: &[ExistingImport]) -> Self {
        imports.first().map(|i| i.style).unwrap_or_default()
    }
}

/// One `name` or `name as alias` entry inside `{ ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedSpecifier {
    pub name: String,
    pub alias: Option<String>,
}

impl NamedSpecifier {
    /// The binding this specifier introduces.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A top-level import statement already present in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExistingImport {
    pub module: String,
    pub byte_start: usize,
    pub byte_end: usize,
    pub default: Option<String>,
    pub namespace: Option<String>,
    pub named: Vec<NamedSpecifier>,
    /// `import type { ... }`, never merged into.
    pub type_only: bool,
    pub style: ImportStyle,
    #[serde(skip)]
    pub(crate) clause_start: Option<usize>,
    #[serde(skip)]
    pub(crate) default_end: Option<usize>,
    #[serde(skip)]
    pub(crate) braces: Option<(usize, usize)>,
    #[serde(skip)]
    pub(crate) last_named_end: Option<usize>,
}

impl ExistingImport {
    /// All top-level imports of a tree, in document order.
    pub fn collect(tree: &SyntaxTree) -> Vec<ExistingImport> {
        NodeQuery::new(tree)
            .find_imports()
            .into_iter()
            .filter_map(|node| Self::from_node(tree, node))
            .collect()
    }

    /// Read an `import_statement` node. Returns `None` for other node kinds.
    pub fn from_node(tree: &SyntaxTree, node: Node<'_>) -> Option<Self> {
        if node.kind() != "import_statement" {
            return None;
        }

        let source = node.child_by_field_name("source")?;
        let raw = tree.node_text(source);
        let quote = if raw.starts_with('"') {
            Quote::Double
        } else {
            Quote::Single
        };
        let module = raw
            .get(1..raw.len().saturating_sub(1))
            .unwrap_or_default()
            .to_string();

        let mut import = ExistingImport {
            module,
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            default: None,
            namespace: None,
            named: Vec::new(),
            type_only: false,
            style: ImportStyle {
                quote,
                semicolon: tree.node_text(node).trim_end().ends_with(';'),
            },
            clause_start: None,
            default_end: None,
            braces: None,
            last_named_end: None,
        };

        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "type" | "typeof" => import.type_only = true,
                "import_clause" => import.read_clause(tree, child),
                _ => {}
            }
        }

        Some(import)
    }

    fn read_clause(&mut self, tree: &SyntaxTree, clause: Node<'_>) {
        self.clause_start = Some(clause.start_byte());

        let mut cursor = clause.walk();
        for part in clause.named_children(&mut cursor) {
            match part.kind() {
                "identifier" => {
                    self.default = Some(tree.node_text(part).to_string());
                    self.default_end = Some(part.end_byte());
                }
                "namespace_import" => {
                    let mut inner = part.walk();
                    let name = part
                        .named_children(&mut inner)
                        .find(|n| n.kind() == "identifier");
                    self.namespace = name.map(|n| tree.node_text(n).to_string());
                }
                "named_imports" => {
                    self.braces = Some((part.start_byte(), part.end_byte()));
                    let mut inner = part.walk();
                    for specifier in part.named_children(&mut inner) {
                        if specifier.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name) = specifier.child_by_field_name("name") else {
                            continue;
                        };
                        self.named.push(NamedSpecifier {
                            name: tree.node_text(name).to_string(),
                            alias: specifier
                                .child_by_field_name("alias")
                                .map(|a| tree.node_text(a).to_string()),
                        });
                        self.last_named_end = Some(specifier.end_byte());
                    }
                }
                _ => {}
            }
        }
    }

    /// Whether the statement has a clause that specifiers can be added to.
    pub fn is_merge_target(&self) -> bool {
        !self.type_only && self.clause_start.is_some()
    }

    /// The statement binds `name` locally.
    pub fn binds(&self, name: &str) -> bool {
        self.default.as_deref() == Some(name)
            || self.namespace.as_deref() == Some(name)
            || self.named.iter().any(|s| s.local_name() == name)
    }
}
