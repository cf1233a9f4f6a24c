use crate::imports::{AmbiguousImportCombination, ImportSpec};
use crate::pool;
use crate::session::generator;
use crate::session::options::SessionOptions;
use crate::session::request::{
    ElementTarget, InsertPosition, ModificationRequest, StateVariable, UseEffect, WrapOptions,
};
use crate::session::result::GenerationResult;
use crate::ts::{NodeQuery, SyntaxTree};
use tracing::{debug, warn};

/// One parse of one source file plus the requests queued against it.
///
/// The tree is never re-parsed or mutated; every request is resolved against
/// it when [`Session::generate`] consumes the session.
#[derive(Debug)]
pub struct Session {
    source: String,
    tree: Option<SyntaxTree>,
    parse_failure: Option<String>,
    options: SessionOptions,
    queue: Vec<ModificationRequest>,
}

impl Session {
    /// Parse `source` with default options.
    pub fn initialize(source: impl Into<String>) -> Self {
        Self::with_options(source, SessionOptions::default())
    }

    /// Parse `source`. A parse failure is kept and reported by `generate`.
    pub fn with_options(source: impl Into<String>, options: SessionOptions) -> Self {
        let source = source.into();

        let (tree, parse_failure) = match pool::parse(&source) {
            Ok(tree) if options.strict_parse && tree.has_errors() => {
                let count = tree.error_nodes().len();
                (Some(tree), Some(format!("source has {count} syntax error(s)")))
            }
            Ok(tree) => (Some(tree), None),
            Err(e) => (None, Some(e.to_string())),
        };

        if let Some(message) = &parse_failure {
            warn!(%message, "session source failed to parse");
        }

        Self {
            source,
            tree,
            parse_failure,
            options,
            queue: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The session's syntax tree, absent only when the grammar produced none.
    pub fn tree(&self) -> Option<&SyntaxTree> {
        self.tree.as_ref()
    }

    /// Node queries bound to this session's tree.
    pub fn query(&self) -> Option<NodeQuery<'_>> {
        self.tree.as_ref().map(NodeQuery::new)
    }

    pub fn parse_failure(&self) -> Option<&str> {
        self.parse_failure.as_deref()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Requests queued so far, implicit imports included, in queue order.
    pub fn requests(&self) -> &[ModificationRequest] {
        &self.queue
    }

    pub fn add_import(&mut self, spec: ImportSpec) -> Result<&mut Self, AmbiguousImportCombination> {
        spec.validate()?;
        self.push(ModificationRequest::AddImport(spec));
        Ok(self)
    }

    /// Queue a state declaration and the state hook's import.
    pub fn add_state_variable(&mut self, state: StateVariable) -> &mut Self {
        self.push(ModificationRequest::AddStateVariable(state));
        let hook = self.hook_import(&self.options.hooks.state);
        self.push(ModificationRequest::AddImport(hook));
        self
    }

    /// Queue an effect call and the effect hook's import.
    pub fn add_use_effect(&mut self, effect: UseEffect) -> &mut Self {
        self.push(ModificationRequest::AddUseEffect(effect));
        let hook = self.hook_import(&self.options.hooks.effect);
        self.push(ModificationRequest::AddImport(hook));
        self
    }

    /// Queue a wrap of `target` and, when given, the wrapper's import.
    pub fn wrap_element(
        &mut self,
        target: impl Into<ElementTarget>,
        options: WrapOptions,
    ) -> Result<&mut Self, AmbiguousImportCombination> {
        if let Some(import) = &options.import {
            import.validate()?;
        }
        let import = options.import.clone();
        self.push(ModificationRequest::WrapElement {
            target: target.into(),
            options,
        });
        if let Some(import) = import {
            self.push(ModificationRequest::AddImport(import));
        }
        Ok(self)
    }

    pub fn insert_markup(
        &mut self,
        target: impl Into<ElementTarget>,
        position: InsertPosition,
        markup: impl Into<String>,
    ) -> &mut Self {
        self.push(ModificationRequest::InsertMarkup {
            target: target.into(),
            position,
            markup: markup.into(),
        });
        self
    }

    pub fn delete_element(&mut self, target: impl Into<ElementTarget>) -> &mut Self {
        self.push(ModificationRequest::DeleteElement(target.into()));
        self
    }

    /// Queue a literal, case-sensitive, all-occurrence substitution on the generated text.
    pub fn replace_text(&mut self, search: impl Into<String>, replace: impl Into<String>) -> &mut Self {
        self.push(ModificationRequest::ReplaceText {
            search: search.into(),
            replace: replace.into(),
        });
        self
    }

    /// Queue an already-built request, expanding implicit imports.
    pub fn push_request(
        &mut self,
        request: ModificationRequest,
    ) -> Result<&mut Self, AmbiguousImportCombination> {
        match request {
            ModificationRequest::AddImport(spec) => self.add_import(spec),
            ModificationRequest::AddStateVariable(state) => Ok(self.add_state_variable(state)),
            ModificationRequest::AddUseEffect(effect) => Ok(self.add_use_effect(effect)),
            ModificationRequest::WrapElement { target, options } => {
                self.wrap_element(target, options)
            }
            other => {
                self.push(other);
                Ok(self)
            }
        }
    }

    /// Resolve every queued request and emit the result. Ends the session.
    pub fn generate(self) -> GenerationResult {
        generator::generate(
            &self.source,
            self.tree.as_ref(),
            self.parse_failure.as_deref(),
            &self.options,
            &self.queue,
        )
    }

    fn push(&mut self, request: ModificationRequest) {
        debug!(position = self.queue.len(), request = %request, "queued request");
        self.queue.push(request);
    }

    fn hook_import(&self, hook: &str) -> ImportSpec {
        ImportSpec::new(self.options.hooks.module.clone()).with_named([hook])
    }
}
