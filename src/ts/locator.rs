use crate::ts::parser::SyntaxTree;
use serde::{Deserialize, Serialize};
use std::fmt;
use tree_sitter::{Node, TreeCursor};

/// Node kinds that count as markup elements for tag lookups.
pub const ELEMENT_KINDS: &[&str] = &["jsx_element", "jsx_self_closing_element"];

/// Attributes consulted by the identifier filter of an [`ElementLocator`].
const IDENTIFIER_ATTRIBUTES: &[&str] = &["className", "class", "id"];

/// Minimum Jaro-Winkler similarity for a tag-name suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Semantic description of a markup element: tag name plus optional filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementLocator {
    pub tag: String,
    /// Substring of the element's `className`, `class` or `id` attribute value.
    #[serde(default)]
    pub identifier: Option<String>,
    /// Substring of the element's full text.
    #[serde(default)]
    pub content: Option<String>,
}

impl ElementLocator {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            identifier: None,
            content: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

impl fmt::Display for ElementLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.tag)?;
        if let Some(identifier) = &self.identifier {
            write!(f, " with identifier '{identifier}'")?;
        }
        if let Some(content) = &self.content {
            write!(f, " containing '{content}'")?;
        }
        Ok(())
    }
}

/// A function (declaration or function-valued binding) located by name.
#[derive(Debug, Clone, Copy)]
pub struct FunctionMatch<'t> {
    /// The `function_declaration` or `variable_declarator` node.
    pub declaration: Node<'t>,
    /// The function node itself (same as `declaration` for declarations).
    pub function: Node<'t>,
    /// The body: a `statement_block`, or an expression for concise arrows.
    pub body: Node<'t>,
}

impl FunctionMatch<'_> {
    pub fn has_block_body(&self) -> bool {
        self.body.kind() == "statement_block"
    }
}

/// Semantic and generic search over one session's syntax tree.
#[derive(Clone, Copy)]
pub struct NodeQuery<'t> {
    tree: &'t SyntaxTree,
}

impl<'t> NodeQuery<'t> {
    pub fn new(tree: &'t SyntaxTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    /// Every node of exactly `kind`, in pre-order.
    pub fn find_nodes(&self, kind: &str) -> Vec<Node<'t>> {
        preorder(self.tree.root_node())
            .filter(|node| node.kind() == kind)
            .collect()
    }

    /// The first markup element in pre-order whose tag name equals `tag`.
    pub fn find_component(&self, tag: &str) -> Option<Node<'t>> {
        preorder(self.tree.root_node())
            .find(|node| self.element_tag(*node) == Some(tag))
    }

    /// The first markup element in pre-order satisfying every filter of `locator`.
    pub fn find_element(&self, locator: &ElementLocator) -> Option<Node<'t>> {
        preorder(self.tree.root_node()).find(|node| self.matches(*node, locator))
    }

    /// Check one node against a locator.
    pub fn matches(&self, node: Node<'t>, locator: &ElementLocator) -> bool {
        if self.element_tag(node) != Some(locator.tag.as_str()) {
            return false;
        }
        if let Some(identifier) = &locator.identifier {
            let found = IDENTIFIER_ATTRIBUTES.iter().any(|attr| {
                self.attribute_value(node, attr)
                    .is_some_and(|value| value.contains(identifier.as_str()))
            });
            if !found {
                return false;
            }
        }
        if let Some(content) = &locator.content {
            if !self.tree.node_text(node).contains(content.as_str()) {
                return false;
            }
        }
        true
    }

    /// Locate `function name` or `const name = () => ...` / `function () {}`.
    ///
    /// Bindings wrapped in a call such as `memo(() => ...)` resolve to the
    /// wrapped function.
    pub fn find_function(&self, name: &str) -> Option<FunctionMatch<'t>> {
        preorder(self.tree.root_node()).find_map(|node| match node.kind() {
            "function_declaration" => {
                let ident = node.child_by_field_name("name")?;
                (self.tree.node_text(ident) == name).then(|| function_match(node, node))?
            }
            "variable_declarator" => {
                let ident = node.child_by_field_name("name")?;
                if ident.kind() != "identifier" || self.tree.node_text(ident) != name {
                    return None;
                }
                let function = function_value(node.child_by_field_name("value")?)?;
                function_match(node, function)
            }
            _ => None,
        })
    }

    /// The component a state/effect request targets when it names none.
    ///
    /// Preference: the default export, then the first exported function, then the
    /// first function whose name starts with an uppercase letter.
    pub fn find_default_component(&self) -> Option<FunctionMatch<'t>> {
        let exports = self.find_nodes("export_statement");

        for export in &exports {
            let is_default = {
                let mut cursor = export.walk();
                let found = export.children(&mut cursor).any(|c| c.kind() == "default");
                found
            };
            if !is_default {
                continue;
            }
            if let Some(found) = self.exported_function(*export) {
                return Some(found);
            }
            if let Some(value) = export.child_by_field_name("value") {
                if value.kind() == "identifier" {
                    if let Some(found) = self.find_function(self.tree.node_text(value)) {
                        return Some(found);
                    }
                } else if let Some(function) = function_value(value) {
                    if let Some(found) = function_match(*export, function) {
                        return Some(found);
                    }
                }
            }
        }

        if let Some(found) = exports.iter().find_map(|export| self.exported_function(*export)) {
            return Some(found);
        }

        preorder(self.tree.root_node()).find_map(|node| {
            let ident = match node.kind() {
                "function_declaration" | "variable_declarator" => {
                    node.child_by_field_name("name")?
                }
                _ => return None,
            };
            let starts_upper = self
                .tree
                .node_text(ident)
                .chars()
                .next()
                .is_some_and(char::is_uppercase);
            if !starts_upper {
                return None;
            }
            self.find_function(self.tree.node_text(ident))
                .filter(|found| found.declaration.id() == node.id())
        })
    }

    /// Top-level import statements in document order.
    pub fn find_imports(&self) -> Vec<Node<'t>> {
        let root = self.tree.root_node();
        let mut cursor = root.walk();
        let imports = root
            .named_children(&mut cursor)
            .filter(|node| node.kind() == "import_statement")
            .collect();
        imports
    }

    /// Names a function binds at the top level of its body: parameters,
    /// `const`/`let`/`var` declarators (destructuring included), and nested
    /// function and class declarations.
    pub fn bound_names(&self, function: &FunctionMatch<'t>) -> Vec<&'t str> {
        let mut names = Vec::new();
        let node = function.function;
        if let Some(params) = node.child_by_field_name("parameters") {
            let mut cursor = params.walk();
            for param in params.named_children(&mut cursor) {
                self.pattern_names(param, &mut names);
            }
        } else if let Some(param) = node.child_by_field_name("parameter") {
            self.pattern_names(param, &mut names);
        }

        if !function.has_block_body() {
            return names;
        }
        let mut cursor = function.body.walk();
        for stmt in function.body.named_children(&mut cursor) {
            match stmt.kind() {
                "lexical_declaration" | "variable_declaration" => {
                    let mut inner = stmt.walk();
                    for declarator in stmt.named_children(&mut inner) {
                        if let Some(name) = declarator.child_by_field_name("name") {
                            self.pattern_names(name, &mut names);
                        }
                    }
                }
                "function_declaration" | "class_declaration" => {
                    if let Some(name) = stmt.child_by_field_name("name") {
                        names.push(self.tree.node_text(name));
                    }
                }
                _ => {}
            }
        }
        names
    }

    /// Identifiers introduced by a binding pattern.
    fn pattern_names(&self, pattern: Node<'t>, names: &mut Vec<&'t str>) {
        match pattern.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                names.push(self.tree.node_text(pattern));
            }
            "pair_pattern" => {
                if let Some(value) = pattern.child_by_field_name("value") {
                    self.pattern_names(value, names);
                }
            }
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(left) = pattern.child_by_field_name("left") {
                    self.pattern_names(left, names);
                }
            }
            "required_parameter" | "optional_parameter" => {
                if let Some(inner) = pattern.child_by_field_name("pattern") {
                    self.pattern_names(inner, names);
                }
            }
            "array_pattern" | "object_pattern" | "rest_pattern" => {
                let mut cursor = pattern.walk();
                for child in pattern.named_children(&mut cursor) {
                    self.pattern_names(child, names);
                }
            }
            _ => {}
        }
    }

    /// The tag name of a markup element, or `None` for other nodes and fragments.
    pub fn element_tag(&self, node: Node<'t>) -> Option<&'t str> {
        let name = match node.kind() {
            "jsx_element" => node
                .child_by_field_name("open_tag")?
                .child_by_field_name("name")?,
            "jsx_self_closing_element" => node.child_by_field_name("name")?,
            _ => return None,
        };
        Some(self.tree.node_text(name))
    }

    /// The value of attribute `name` on an element, without string quotes.
    pub fn attribute_value(&self, node: Node<'t>, name: &str) -> Option<&'t str> {
        let tag = match node.kind() {
            "jsx_element" => node.child_by_field_name("open_tag")?,
            "jsx_self_closing_element" => node,
            _ => return None,
        };

        let mut cursor = tag.walk();
        let attribute = tag.named_children(&mut cursor).find(|child| {
            child.kind() == "jsx_attribute"
                && child
                    .named_child(0)
                    .is_some_and(|attr_name| self.tree.node_text(attr_name) == name)
        })?;

        let value = attribute.named_child(1)?;
        let text = self.tree.node_text(value);
        let unquoted = match value.kind() {
            "string" => text
                .get(1..text.len().saturating_sub(1))
                .unwrap_or_default(),
            "jsx_expression" => text
                .strip_prefix('{')
                .and_then(|t| t.strip_suffix('}'))
                .unwrap_or(text),
            _ => text,
        };
        Some(unquoted)
    }

    /// The closest element tag name in the tree to `tag`, if one is similar enough.
    pub fn suggest_tag(&self, tag: &str) -> Option<String> {
        let mut best: Option<(f64, &str)> = None;
        for node in preorder(self.tree.root_node()) {
            let Some(candidate) = self.element_tag(node) else {
                continue;
            };
            if candidate == tag {
                continue;
            }
            let score = strsim::jaro_winkler(tag, candidate);
            if score >= SUGGESTION_THRESHOLD && best.map_or(true, |(s, _)| score > s) {
                best = Some((score, candidate));
            }
        }
        best.map(|(_, candidate)| candidate.to_string())
    }

    fn exported_function(&self, export: Node<'t>) -> Option<FunctionMatch<'t>> {
        let declaration = export.child_by_field_name("declaration")?;
        match declaration.kind() {
            "function_declaration" => function_match(declaration, declaration),
            "lexical_declaration" | "variable_declaration" => {
                let mut cursor = declaration.walk();
                let found = declaration
                    .named_children(&mut cursor)
                    .filter(|child| child.kind() == "variable_declarator")
                    .find_map(|declarator| {
                        let function = function_value(declarator.child_by_field_name("value")?)?;
                        function_match(declarator, function)
                    });
                found
            }
            _ => None,
        }
    }
}

fn function_match<'t>(declaration: Node<'t>, function: Node<'t>) -> Option<FunctionMatch<'t>> {
    Some(FunctionMatch {
        declaration,
        function,
        body: function.child_by_field_name("body")?,
    })
}

/// Unwrap a declarator value to the function it holds, looking through one call
/// (`memo(...)`, `forwardRef(...)`).
fn function_value(value: Node<'_>) -> Option<Node<'_>> {
    match value.kind() {
        "arrow_function" | "function_expression" | "function" => Some(value),
        "call_expression" => {
            let arguments = value.child_by_field_name("arguments")?;
            let first = arguments.named_child(0)?;
            matches!(first.kind(), "arrow_function" | "function_expression" | "function")
                .then_some(first)
        }
        _ => None,
    }
}

/// Pre-order traversal over a subtree.
pub fn preorder(root: Node<'_>) -> Preorder<'_> {
    Preorder {
        cursor: root.walk(),
        done: false,
    }
}

pub struct Preorder<'t> {
    cursor: TreeCursor<'t>,
    done: bool,
}

impl<'t> Iterator for Preorder<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        if self.done {
            return None;
        }
        let node = self.cursor.node();
        if !self.cursor.goto_first_child() {
            while !self.cursor.goto_next_sibling() {
                if !self.cursor.goto_parent() {
                    self.done = true;
                    break;
                }
            }
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::parser::TsxParser;

    fn parse(source: &str) -> SyntaxTree {
        TsxParser::new().unwrap().parse_source(source).unwrap()
    }

    const APP: &str = r#"import React from 'react';

function Helper() {
  return <span>helper</span>;
}

export default function App() {
  return (
    <div className="container main">
      <h1 id="title">My App</h1>
      <div className="inner">
        <Button label="go" />
      </div>
    </div>
  );
}
"#;

    #[test]
    fn find_nodes_collects_in_preorder() {
        let tree = parse(APP);
        let query = NodeQuery::new(&tree);

        let elements = query.find_nodes("jsx_element");
        assert_eq!(elements.len(), 4);
        assert!(elements.windows(2).all(|w| w[0].start_byte() < w[1].start_byte()));
        assert_eq!(query.find_nodes("jsx_self_closing_element").len(), 1);
    }

    #[test]
    fn find_component_returns_first_in_preorder() {
        let tree = parse(APP);
        let query = NodeQuery::new(&tree);

        let first = query.find_component("div").unwrap();
        assert!(tree.node_text(first).starts_with("<div className=\"container main\">"));

        // Repeated and interleaved lookups keep returning the same node.
        let _ = query.find_component("h1");
        let _ = query.find_nodes("identifier");
        assert_eq!(query.find_component("div").unwrap().id(), first.id());
    }

    #[test]
    fn find_component_is_case_sensitive() {
        let tree = parse(APP);
        let query = NodeQuery::new(&tree);

        assert!(query.find_component("Div").is_none());
        assert!(query.find_component("Button").is_some());
        assert!(query.find_component("section").is_none());
    }

    #[test]
    fn find_element_with_filters() {
        let tree = parse(APP);
        let query = NodeQuery::new(&tree);

        let inner = query
            .find_element(&ElementLocator::tag("div").with_identifier("inner"))
            .unwrap();
        assert!(tree.node_text(inner).starts_with("<div className=\"inner\">"));

        let title = query
            .find_element(&ElementLocator::tag("h1").with_identifier("title"))
            .unwrap();
        assert_eq!(tree.node_text(title), "<h1 id=\"title\">My App</h1>");

        let by_content = query
            .find_element(&ElementLocator::tag("div").with_content("Button"))
            .unwrap();
        assert_eq!(by_content.start_byte(), query.find_component("div").unwrap().start_byte());

        assert!(query
            .find_element(&ElementLocator::tag("div").with_identifier("missing"))
            .is_none());
    }

    #[test]
    fn find_function_declaration_and_binding() {
        let tree = parse(
            "function App() { return null; }\nconst Card = () => <p />;\nconst Wrapped = memo(function () { return null; });\nconst n = 3;",
        );
        let query = NodeQuery::new(&tree);

        let app = query.find_function("App").unwrap();
        assert!(app.has_block_body());
        assert_eq!(app.declaration.kind(), "function_declaration");

        let card = query.find_function("Card").unwrap();
        assert_eq!(card.declaration.kind(), "variable_declarator");
        assert!(!card.has_block_body());

        assert!(query.find_function("Wrapped").unwrap().has_block_body());
        assert!(query.find_function("n").is_none());
        assert!(query.find_function("Missing").is_none());
    }

    #[test]
    fn default_component_prefers_default_export() {
        let tree = parse(APP);
        let query = NodeQuery::new(&tree);
        let found = query.find_default_component().unwrap();
        let name = found.declaration.child_by_field_name("name").unwrap();
        assert_eq!(tree.node_text(name), "App");

        let tree = parse("const Page = () => { return <main />; };\nexport default Page;");
        let query = NodeQuery::new(&tree);
        let found = query.find_default_component().unwrap();
        assert_eq!(found.declaration.kind(), "variable_declarator");

        let tree = parse("function helper() {}\nfunction Widget() { return <i />; }");
        let query = NodeQuery::new(&tree);
        let found = query.find_default_component().unwrap();
        let name = found.declaration.child_by_field_name("name").unwrap();
        assert_eq!(tree.node_text(name), "Widget");
    }

    #[test]
    fn find_imports_lists_top_level_statements() {
        let tree = parse(APP);
        let imports = NodeQuery::new(&tree).find_imports();
        assert_eq!(imports.len(), 1);
        assert_eq!(tree.node_text(imports[0]), "import React from 'react';");
    }

    #[test]
    fn bound_names_cover_params_and_declarations() {
        let tree = parse(
            r#"function Counter({ initial, step: by = 1, ...rest }, ref) {
  let [count, setCount] = useState(initial);
  const total = 1, { a, b: [c] } = rest;
  var legacy;
  function helper() {}
  if (count) { const nested = 1; }
  return <p />;
}
const Arrow = (value: string) => { const { x = 2 } = props; return null; };
const Concise = item => <li />;"#,
        );
        let query = NodeQuery::new(&tree);

        let counter = query.find_function("Counter").unwrap();
        assert_eq!(
            query.bound_names(&counter),
            ["initial", "by", "rest", "ref", "count", "setCount", "total", "a", "c", "legacy", "helper"]
        );

        let arrow = query.find_function("Arrow").unwrap();
        assert_eq!(query.bound_names(&arrow), ["value", "x"]);

        let concise = query.find_function("Concise").unwrap();
        assert_eq!(query.bound_names(&concise), ["item"]);
    }

    #[test]
    fn attribute_values_are_unquoted() {
        let tree = parse("const x = <input id=\"email\" className={styles.field} />;");
        let query = NodeQuery::new(&tree);
        let input = query.find_component("input").unwrap();

        assert_eq!(query.attribute_value(input, "id"), Some("email"));
        assert_eq!(query.attribute_value(input, "className"), Some("styles.field"));
        assert_eq!(query.attribute_value(input, "type"), None);
    }

    #[test]
    fn suggest_close_tag_names() {
        let tree = parse(APP);
        let query = NodeQuery::new(&tree);

        assert_eq!(query.suggest_tag("Buton").as_deref(), Some("Button"));
        assert_eq!(query.suggest_tag("zzzzzz"), None);
    }
}
