//! Code Generator: turns a session's queue into one edit list over the original
//! source, splices it right-to-left, then runs textual substitutions.

use crate::edit::Edit;
use crate::imports::{self, resolver::resolve_module, ExistingImport, ImportSpec, ImportStyle};
use crate::session::layout;
use crate::session::options::SessionOptions;
use crate::session::request::{
    ElementTarget, InsertPosition, ModificationRequest, StateVariable, UseEffect, WrapOptions,
};
use crate::session::result::{GenerationError, GenerationResult};
use crate::text_patch::{self, TextPatchError};
use crate::ts::locator::ELEMENT_KINDS;
use crate::ts::{FunctionMatch, NodeQuery, SyntaxTree};
use crate::validate::{self, SnippetCategory, ValidationError};
use std::ops::Range;
use tracing::{debug, info_span, warn};
use tree_sitter::Node;

const BAND: i64 = 1 << 32;

/// Where an insertion sorts among others at the same offset.
///
/// At one offset the output reads: closing wrap tags, text attached after the
/// preceding element, text attached before the next element, opening wrap tags.
/// Within a slot, queue order decides, except that closing tags nest in reverse.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Close,
    Trailing,
    Leading,
    Open,
}

impl Slot {
    fn order(self, seq: i64) -> i64 {
        match self {
            Slot::Close => -seq,
            Slot::Trailing => BAND + seq,
            Slot::Leading => 2 * BAND + seq,
            Slot::Open => 3 * BAND + seq,
        }
    }
}

/// A structural request resolved to concrete edits.
#[derive(Debug)]
struct Planned {
    label: String,
    edits: Vec<Edit>,
    /// Original-source ranges the request depends on staying intact.
    anchors: Vec<Range<usize>>,
    /// (component body start, name) pairs this request binds.
    declares: Vec<(usize, String)>,
}

impl Planned {
    fn removals(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.edits
            .iter()
            .filter(|edit| !edit.is_insertion())
            .map(Edit::range)
    }

    /// The range where `self` and `other` collide, if they do.
    fn conflict_with(&self, other: &Planned) -> Option<Range<usize>> {
        let one_way = |a: &Planned, b: &Planned| {
            a.removals().find_map(|removal| {
                b.anchors
                    .iter()
                    .find(|anchor| invalidates(&removal, anchor))
                    .cloned()
            })
        };

        one_way(self, other)
            .or_else(|| one_way(other, self))
            .or_else(|| {
                self.edits.iter().find_map(|edit| {
                    other
                        .edits
                        .iter()
                        .any(|o| edit.overlaps(o))
                        .then(|| edit.range())
                })
            })
    }
}

/// A removal invalidates an anchor when it cuts across it or swallows it.
/// Edits strictly inside an anchored element leave the element's edges alone.
fn invalidates(removal: &Range<usize>, anchor: &Range<usize>) -> bool {
    if anchor.is_empty() {
        return removal.start < anchor.start && anchor.start < removal.end;
    }
    let overlaps = removal.start < anchor.end && anchor.start < removal.end;
    let strictly_inside =
        anchor.start <= removal.start && removal.end <= anchor.end && removal != anchor;
    overlaps && !strictly_inside
}

struct Context<'a> {
    source: &'a str,
    tree: &'a SyntaxTree,
    query: NodeQuery<'a>,
    options: &'a SessionOptions,
    /// Line ending of the source, used for every line break inserted.
    eol: &'static str,
    declared: Vec<(usize, String)>,
}

pub(crate) fn generate(
    source: &str,
    tree: Option<&SyntaxTree>,
    parse_failure: Option<&str>,
    options: &SessionOptions,
    queue: &[ModificationRequest],
) -> GenerationResult {
    let span = info_span!("generate", requests = queue.len(), bytes = source.len());
    let _enter = span.enter();

    if let Some(message) = parse_failure {
        return GenerationResult::failed(vec![GenerationError::ParseFailure {
            message: message.to_string(),
        }]);
    }
    let Some(tree) = tree else {
        return GenerationResult::failed(vec![GenerationError::ParseFailure {
            message: "no syntax tree was produced".to_string(),
        }]);
    };

    if queue.is_empty() {
        return GenerationResult::emitted(source.to_string(), Vec::new());
    }

    let mut ctx = Context {
        source,
        tree,
        query: NodeQuery::new(tree),
        options,
        eol: layout::line_ending(source),
        declared: Vec::new(),
    };

    let mut errors = Vec::new();
    let mut import_specs: Vec<ImportSpec> = Vec::new();
    let mut substitutions: Vec<(&str, &str)> = Vec::new();
    let mut accepted: Vec<Planned> = Vec::new();

    for (index, request) in queue.iter().enumerate() {
        let seq = index as i64 + 1;
        let label = format!("#{seq} {request}");

        let planned = match request {
            ModificationRequest::AddImport(spec) => {
                import_specs.push(spec.clone());
                continue;
            }
            ModificationRequest::ReplaceText { search, replace } => {
                substitutions.push((search.as_str(), replace.as_str()));
                continue;
            }
            ModificationRequest::AddStateVariable(state) => ctx.plan_state(state, seq, label),
            ModificationRequest::AddUseEffect(effect) => ctx.plan_effect(effect, seq, label),
            ModificationRequest::WrapElement { target, options } => {
                ctx.plan_wrap(target, options, seq, label)
            }
            ModificationRequest::InsertMarkup {
                target,
                position,
                markup,
            } => ctx.plan_markup(target, *position, markup, seq, label),
            ModificationRequest::DeleteElement(target) => ctx.plan_delete(target, label),
        };

        let planned = match planned {
            Ok(planned) => planned,
            Err(error) => {
                warn!(%error, "skipping request");
                errors.push(error);
                continue;
            }
        };

        if options.validate_output {
            if let Err(error) = screen(source, &planned) {
                warn!(%error, "dropping edit that breaks syntax");
                errors.push(error);
                continue;
            }
        }

        let conflict = accepted
            .iter()
            .find_map(|other| planned.conflict_with(other).map(|range| (other, range)));
        if let Some((other, range)) = conflict {
            let error = GenerationError::RangeConflict {
                request: planned.label.clone(),
                other: other.label.clone(),
                byte_start: range.start,
                byte_end: range.end,
            };
            warn!(%error, "rejecting overlapping request");
            errors.push(error);
            continue;
        }

        debug!(request = %planned.label, edits = planned.edits.len(), "accepted request");
        ctx.declared.extend(planned.declares.iter().cloned());
        accepted.push(planned);
    }

    let mut edits = import_edits(tree, ctx.eol, &import_specs, &accepted, &mut errors);
    edits.extend(accepted.into_iter().flat_map(|planned| planned.edits));

    let mut code = match Edit::apply_batch(source, edits) {
        Ok(code) => code,
        Err(e) => {
            errors.push(GenerationError::InvalidEdit {
                request: "splice".to_string(),
                message: e.to_string(),
            });
            return GenerationResult::failed(errors);
        }
    };

    for (search, replace) in substitutions {
        match text_patch::replace_all(&code, search, replace) {
            Ok(patch) => {
                debug!(search, occurrences = patch.occurrences, "replaced text");
                code = patch.text;
            }
            Err(TextPatchError::TextNotFound { search }) => {
                warn!(search = %search, "text not found");
                errors.push(GenerationError::TextNotFound { search });
            }
        }
    }

    if options.validate_output {
        match validate::validate_output(source, &code) {
            Ok(()) => {}
            Err(ValidationError::ParseErrorIntroduced { count, .. }) => {
                errors.push(GenerationError::SyntaxRegression { count });
                return GenerationResult::failed(errors);
            }
            Err(e) => {
                errors.push(GenerationError::ParseFailure {
                    message: e.to_string(),
                });
                return GenerationResult::failed(errors);
            }
        }
    }

    GenerationResult::emitted(code, errors)
}

/// Trial-apply one request's edits to the original and re-parse.
fn screen(source: &str, planned: &Planned) -> Result<(), GenerationError> {
    let invalid = |message: String| GenerationError::InvalidEdit {
        request: planned.label.clone(),
        message,
    };

    match planned.edits.as_slice() {
        [edit] => validate::validate_edit(source, edit.byte_start, edit.byte_end, &edit.new_text)
            .map_err(|e| invalid(e.to_string())),
        edits => {
            let edited =
                Edit::apply_batch(source, edits.to_vec()).map_err(|e| invalid(e.to_string()))?;
            validate::validate_output(source, &edited).map_err(|e| invalid(e.to_string()))
        }
    }
}

/// One merged edit set per module path, plus a single insertion for new statements.
fn import_edits(
    tree: &SyntaxTree,
    eol: &str,
    specs: &[ImportSpec],
    accepted: &[Planned],
    errors: &mut Vec<GenerationError>,
) -> Vec<Edit> {
    if specs.is_empty() {
        return Vec::new();
    }

    let (grouped, conflicts) = imports::group_by_module(specs);
    errors.extend(conflicts.into_iter().map(GenerationError::ImportConflict));

    let existing = ExistingImport::collect(tree);
    let mut edits = Vec::new();
    let mut statements = Vec::new();

    for spec in &grouped {
        let resolution = resolve_module(spec, &existing);
        errors.extend(
            resolution
                .conflicts
                .into_iter()
                .map(GenerationError::ImportConflict),
        );

        let label = format!("import merge for '{}'", spec.module);
        for edit in resolution.edits {
            if !blocked(&edit, &label, accepted, errors) {
                edits.push(edit);
            }
        }
        statements.extend(resolution.new_statements);
    }

    if !statements.is_empty() {
        let placement = imports::placement(tree, &existing);
        let block =
            imports::render_statements(&statements, ImportStyle::detect(&existing), placement, eol);
        let edit = Edit::insert(placement.offset(), block).with_order(i64::MIN);
        if !blocked(&edit, "new import statements", accepted, errors) {
            debug!(count = statements.len(), offset = placement.offset(), "emitting import statements");
            edits.push(edit);
        }
    }

    edits
}

/// An import insertion that lands inside text another request removes.
fn blocked(edit: &Edit, label: &str, accepted: &[Planned], errors: &mut Vec<GenerationError>) -> bool {
    let point = edit.range();
    let Some(other) = accepted
        .iter()
        .find(|planned| planned.removals().any(|removal| invalidates(&removal, &point)))
    else {
        return false;
    };

    errors.push(GenerationError::RangeConflict {
        request: label.to_string(),
        other: other.label.clone(),
        byte_start: point.start,
        byte_end: point.end,
    });
    true
}

impl<'a> Context<'a> {
    fn resolve_target(&self, target: &ElementTarget, label: &str) -> Result<Node<'a>, GenerationError> {
        let found = match target {
            ElementTarget::Node(span) => self.tree.resolve(span),
            ElementTarget::Locate(locator) => self.query.find_element(locator),
        };

        found.ok_or_else(|| GenerationError::TargetNotFound {
            request: label.to_string(),
            target: target.to_string(),
            suggestion: match target {
                ElementTarget::Locate(locator) if self.query.find_component(&locator.tag).is_none() => {
                    self.query.suggest_tag(&locator.tag)
                }
                _ => None,
            },
        })
    }

    /// The component a state or effect goes into; it must have a statement body.
    fn resolve_component(
        &self,
        name: Option<&str>,
        label: &str,
    ) -> Result<(FunctionMatch<'a>, String), GenerationError> {
        let found = match name {
            Some(name) => self.query.find_function(name),
            None => self.query.find_default_component(),
        };
        let found = found.ok_or_else(|| GenerationError::TargetNotFound {
            request: label.to_string(),
            target: name.map_or_else(|| "default component".to_string(), |n| format!("component {n}")),
            suggestion: None,
        })?;

        let component = found
            .declaration
            .child_by_field_name("name")
            .map_or_else(|| "default export".to_string(), |n| self.tree.node_text(n).to_string());

        if !found.has_block_body() {
            return Err(GenerationError::InvalidEdit {
                request: label.to_string(),
                message: format!("{component} has an expression body, statements cannot be added"),
            });
        }
        Ok((found, component))
    }

    fn plan_state(&self, state: &StateVariable, seq: i64, label: String) -> Result<Planned, GenerationError> {
        let (component, name) = self.resolve_component(state.component.as_deref(), &label)?;
        let body = component.body;

        let bound = self.query.bound_names(&component);
        let taken = [&state.name, &state.setter].into_iter().find(|candidate| {
            bound.contains(&candidate.as_str())
                || self
                    .declared
                    .iter()
                    .any(|(scope, declared)| *scope == body.start_byte() && declared == *candidate)
        });
        if let Some(taken) = taken {
            return Err(GenerationError::DuplicateDeclaration {
                name: taken.clone(),
                component: name,
            });
        }

        let indent = self.body_indent(body);
        let statement = format!(
            "const [{}, {}] = {}({});",
            state.name, state.setter, self.options.hooks.state, state.initial_value
        );
        let at = body.start_byte() + 1;
        let eol = self.eol;

        Ok(Planned {
            label,
            edits: vec![Edit::insert(at, format!("{eol}{indent}{statement}")).with_order(Slot::Trailing.order(seq))],
            anchors: vec![at..at],
            declares: vec![
                (body.start_byte(), state.name.clone()),
                (body.start_byte(), state.setter.clone()),
            ],
        })
    }

    fn plan_effect(&self, effect: &UseEffect, seq: i64, label: String) -> Result<Planned, GenerationError> {
        let (component, _) = self.resolve_component(effect.component.as_deref(), &label)?;
        let body = component.body;
        let indent = self.body_indent(body);
        let call = render_effect(&self.options.hooks.effect, effect, &indent, self.eol);
        let eol = self.eol;

        let mut cursor = body.walk();
        let statements: Vec<Node<'a>> = body
            .named_children(&mut cursor)
            .filter(|node| node.kind() != "comment")
            .collect();

        let last_hook = statements.iter().rev().find(|stmt| self.is_hook_statement(**stmt));
        let terminal_return = statements.last().filter(|stmt| stmt.kind() == "return_statement");

        let (at, text, slot) = if let Some(stmt) = last_hook {
            (stmt.end_byte(), format!("{eol}{eol}{indent}{call}"), Slot::Trailing)
        } else if let Some(ret) = terminal_return {
            let text = if layout::starts_line(self.source, ret.start_byte()) {
                format!("{call}{eol}{eol}{indent}")
            } else {
                format!("{call} ")
            };
            (ret.start_byte(), text, Slot::Leading)
        } else if let Some(last) = statements.last() {
            (last.end_byte(), format!("{eol}{eol}{indent}{call}"), Slot::Trailing)
        } else {
            (body.start_byte() + 1, format!("{eol}{indent}{call}"), Slot::Leading)
        };

        Ok(Planned {
            label,
            edits: vec![Edit::insert(at, text).with_order(slot.order(seq))],
            anchors: vec![at..at],
            declares: Vec::new(),
        })
    }

    fn plan_wrap(
        &self,
        target: &ElementTarget,
        options: &WrapOptions,
        seq: i64,
        label: String,
    ) -> Result<Planned, GenerationError> {
        let component = options.component.trim();
        if component.is_empty() {
            return Err(GenerationError::InvalidEdit {
                request: label,
                message: "wrapper component name is empty".to_string(),
            });
        }

        let node = self.resolve_target(target, &label)?;
        let open = match options.props.as_deref().map(str::trim) {
            Some(props) if !props.is_empty() => format!("<{component} {props}>"),
            _ => format!("<{component}>"),
        };
        let close = format!("</{component}>");

        Ok(Planned {
            label,
            edits: vec![
                Edit::insert(node.start_byte(), open).with_order(Slot::Open.order(seq)),
                Edit::insert(node.end_byte(), close).with_order(Slot::Close.order(seq)),
            ],
            anchors: vec![node.byte_range()],
            declares: Vec::new(),
        })
    }

    fn plan_markup(
        &self,
        target: &ElementTarget,
        position: InsertPosition,
        markup: &str,
        seq: i64,
        label: String,
    ) -> Result<Planned, GenerationError> {
        let invalid = |message: String| GenerationError::InvalidEdit {
            request: label.clone(),
            message,
        };

        if markup.trim().is_empty() {
            return Err(invalid("markup is empty".to_string()));
        }
        validate::validate_snippet(markup, SnippetCategory::Markup).map_err(|e| invalid(e.to_string()))?;

        let node = self.resolve_target(target, &label)?;
        let src = self.source;
        let eol = self.eol;
        let (start, end) = (node.start_byte(), node.end_byte());
        let indent = layout::line_indent(src, start);
        let on_own_lines = layout::starts_line(src, start) && layout::ends_line(src, end);

        let (at, text, slot) = match position {
            InsertPosition::Before if layout::starts_line(src, start) => {
                let block = layout::reindent(markup, indent, eol);
                let first = block.strip_prefix(indent).unwrap_or(&block);
                (start, format!("{first}{eol}{indent}"), Slot::Leading)
            }
            InsertPosition::Before => (start, markup.trim().to_string(), Slot::Leading),
            InsertPosition::After if on_own_lines => {
                (end, format!("{eol}{}", layout::reindent(markup, indent, eol)), Slot::Trailing)
            }
            InsertPosition::After => (end, markup.trim().to_string(), Slot::Trailing),
            InsertPosition::StartOfChildren | InsertPosition::EndOfChildren => {
                let (open, close) = match (
                    node.child_by_field_name("open_tag"),
                    node.child_by_field_name("close_tag"),
                ) {
                    (Some(open), Some(close)) if node.kind() == "jsx_element" => (open, close),
                    _ => return Err(invalid(format!("{} has no children", NodeDisplay(self.tree, node)))),
                };
                let child_indent = self.child_indent(node, indent);

                if position == InsertPosition::StartOfChildren {
                    let at = open.end_byte();
                    if layout::ends_line(src, at) {
                        (at, format!("{eol}{}", layout::reindent(markup, &child_indent, eol)), Slot::Leading)
                    } else {
                        (at, markup.trim().to_string(), Slot::Leading)
                    }
                } else {
                    let close_start = close.start_byte();
                    let content_end = src[..close_start].trim_end().len().max(open.end_byte());
                    if src[content_end..close_start].contains('\n') {
                        (
                            content_end,
                            format!("{eol}{}", layout::reindent(markup, &child_indent, eol)),
                            Slot::Trailing,
                        )
                    } else {
                        (close_start, markup.trim().to_string(), Slot::Trailing)
                    }
                }
            }
        };

        Ok(Planned {
            label,
            edits: vec![Edit::insert(at, text).with_order(slot.order(seq))],
            anchors: vec![start..end],
            declares: Vec::new(),
        })
    }

    fn plan_delete(&self, target: &ElementTarget, label: String) -> Result<Planned, GenerationError> {
        let node = self.resolve_target(target, &label)?;
        let src = self.source;
        let (start, end) = (node.start_byte(), node.end_byte());

        // Alone on its lines: take the whole lines so no blank line is left behind.
        let range = if layout::starts_line(src, start) && layout::ends_line(src, end) {
            layout::line_start(src, start)..layout::line_end_inclusive(src, end)
        } else {
            start..end
        };

        Ok(Planned {
            label,
            edits: vec![Edit::new(range.start, range.end, "", &src[range.clone()])],
            anchors: vec![range],
            declares: Vec::new(),
        })
    }

    /// Indentation of statements inside a function body.
    fn body_indent(&self, body: Node<'a>) -> String {
        let mut cursor = body.walk();
        let first = body.named_children(&mut cursor).next();
        match first {
            Some(stmt) if layout::starts_line(self.source, stmt.start_byte()) => {
                layout::line_indent(self.source, stmt.start_byte()).to_string()
            }
            _ => layout::nested_indent(layout::line_indent(self.source, body.start_byte())),
        }
    }

    /// Indentation of an element's children: that of the first child element on
    /// its own line, else one level below the element.
    fn child_indent(&self, element: Node<'a>, indent: &str) -> String {
        let mut cursor = element.walk();
        let child = element.named_children(&mut cursor).find(|child| {
            (ELEMENT_KINDS.contains(&child.kind()) || child.kind() == "jsx_expression")
                && layout::starts_line(self.source, child.start_byte())
        });
        match child {
            Some(child) => layout::line_indent(self.source, child.start_byte()).to_string(),
            None => layout::nested_indent(indent),
        }
    }

    /// `useX(...);` or `const a = useX(...);`
    fn is_hook_statement(&self, stmt: Node<'a>) -> bool {
        let value = match stmt.kind() {
            "expression_statement" => stmt.named_child(0),
            "lexical_declaration" | "variable_declaration" => {
                let mut cursor = stmt.walk();
                let value = stmt
                    .named_children(&mut cursor)
                    .filter(|child| child.kind() == "variable_declarator")
                    .find_map(|declarator| declarator.child_by_field_name("value"));
                value
            }
            _ => None,
        };
        value.is_some_and(|expr| self.is_hook_call(expr))
    }

    fn is_hook_call(&self, expr: Node<'a>) -> bool {
        if expr.kind() != "call_expression" {
            return false;
        }
        let Some(callee) = expr.child_by_field_name("function") else {
            return false;
        };
        let name = match callee.kind() {
            "identifier" => Some(callee),
            "member_expression" => callee.child_by_field_name("property"),
            _ => None,
        };
        name.map(|n| self.tree.node_text(n))
            .is_some_and(is_hook_name)
    }
}

/// `use` followed by an uppercase letter, or `use` itself.
fn is_hook_name(name: &str) -> bool {
    match name.strip_prefix("use") {
        Some(rest) => rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_uppercase()),
        None => false,
    }
}

fn render_effect(hook: &str, effect: &UseEffect, indent: &str, eol: &str) -> String {
    let body = layout::reindent(&effect.body, &layout::nested_indent(indent), eol);
    let dependencies = match &effect.dependencies {
        Some(deps) => format!(", [{}]", deps.join(", ")),
        None => String::new(),
    };

    if body.is_empty() {
        format!("{hook}(() => {{}}{dependencies});")
    } else {
        format!("{hook}(() => {{{eol}{body}{eol}{indent}}}{dependencies});")
    }
}

/// `<tag>` of an element for messages.
struct NodeDisplay<'t>(&'t SyntaxTree, Node<'t>);

impl std::fmt::Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match NodeQuery::new(self.0).element_tag(self.1) {
            Some(tag) => write!(f, "<{tag} />"),
            None => write!(f, "{}", self.1.kind()),
        }
    }
}
