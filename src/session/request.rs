use crate::imports::ImportSpec;
use crate::ts::{ElementLocator, NodeSpan};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The element a wrap, insert or delete request acts on.
///
/// A span pins one node of the session's tree; a locator is resolved against
/// that same tree when the session generates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementTarget {
    Node(NodeSpan),
    Locate(ElementLocator),
}

impl From<NodeSpan> for ElementTarget {
    fn from(span: NodeSpan) -> Self {
        ElementTarget::Node(span)
    }
}

impl From<ElementLocator> for ElementTarget {
    fn from(locator: ElementLocator) -> Self {
        ElementTarget::Locate(locator)
    }
}

impl From<tree_sitter::Node<'_>> for ElementTarget {
    fn from(node: tree_sitter::Node<'_>) -> Self {
        ElementTarget::Node(NodeSpan::from(node))
    }
}

impl fmt::Display for ElementTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementTarget::Node(span) => fmt::Display::fmt(span, f),
            ElementTarget::Locate(locator) => fmt::Display::fmt(locator, f),
        }
    }
}

/// Where markup goes relative to its target element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsertPosition {
    Before,
    After,
    StartOfChildren,
    EndOfChildren,
}

impl fmt::Display for InsertPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InsertPosition::Before => "before",
            InsertPosition::After => "after",
            InsertPosition::StartOfChildren => "start of children of",
            InsertPosition::EndOfChildren => "end of children of",
        };
        f.write_str(name)
    }
}

/// `const [name, setter] = useState(initial_value);`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateVariable {
    pub name: String,
    pub setter: String,
    pub initial_value: String,
    /// Component function to add the state to; the default component when absent.
    #[serde(default)]
    pub component: Option<String>,
}

impl StateVariable {
    pub fn new(
        name: impl Into<String>,
        setter: impl Into<String>,
        initial_value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            setter: setter.into(),
            initial_value: initial_value.into(),
            component: None,
        }
    }

    pub fn in_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

/// `useEffect(() => { body }, [dependencies]);`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseEffect {
    pub body: String,
    /// `None` omits the dependency array; `Some(vec![])` renders `[]`.
    #[serde(default)]
    pub dependencies: Option<Vec<String>>,
    #[serde(default)]
    pub component: Option<String>,
}

impl UseEffect {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            dependencies: None,
            component: None,
        }
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = Some(dependencies.into_iter().map(Into::into).collect());
        self
    }

    pub fn in_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

/// The component a target gets wrapped in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapOptions {
    pub component: String,
    /// Attribute text placed in the opening tag, e.g. `role="admin"`.
    #[serde(default)]
    pub props: Option<String>,
    /// Import that provides `component`.
    #[serde(default)]
    pub import: Option<ImportSpec>,
}

impl WrapOptions {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            props: None,
            import: None,
        }
    }

    pub fn with_props(mut self, props: impl Into<String>) -> Self {
        self.props = Some(props.into());
        self
    }

    /// Import `component` as the default export of `module`.
    pub fn default_import_from(mut self, module: impl Into<String>) -> Self {
        self.import = Some(ImportSpec::new(module).with_default(self.component.clone()));
        self
    }

    /// Import `component` as a named export of `module`.
    pub fn named_import_from(mut self, module: impl Into<String>) -> Self {
        self.import = Some(ImportSpec::new(module).with_named([self.component.clone()]));
        self
    }

    pub fn with_import(mut self, import: ImportSpec) -> Self {
        self.import = Some(import);
        self
    }
}

/// One queued, unresolved modification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModificationRequest {
    AddImport(ImportSpec),
    AddStateVariable(StateVariable),
    AddUseEffect(UseEffect),
    WrapElement {
        target: ElementTarget,
        options: WrapOptions,
    },
    InsertMarkup {
        target: ElementTarget,
        position: InsertPosition,
        markup: String,
    },
    DeleteElement(ElementTarget),
    ReplaceText {
        search: String,
        replace: String,
    },
}

impl fmt::Display for ModificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModificationRequest::AddImport(spec) => write!(f, "add import from '{}'", spec.module),
            ModificationRequest::AddStateVariable(state) => {
                write!(f, "add state '{}'", state.name)
            }
            ModificationRequest::AddUseEffect(effect) => match &effect.component {
                Some(component) => write!(f, "add effect to {component}"),
                None => f.write_str("add effect"),
            },
            ModificationRequest::WrapElement { target, options } => {
                write!(f, "wrap {target} in <{}>", options.component)
            }
            ModificationRequest::InsertMarkup {
                target, position, ..
            } => write!(f, "insert markup {position} {target}"),
            ModificationRequest::DeleteElement(target) => write!(f, "delete {target}"),
            ModificationRequest::ReplaceText { search, .. } => {
                write!(f, "replace text {search:?}")
            }
        }
    }
}
