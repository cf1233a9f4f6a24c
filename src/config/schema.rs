use crate::imports::ImportSpec;
use crate::session::{
    ElementTarget, InsertPosition, ModificationRequest, SessionOptions, StateVariable, UseEffect,
    WrapOptions,
};
use crate::ts::ElementLocator;
use serde::Deserialize;
use std::fmt;

/// A plan file: session options plus the requests to queue, in order.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct PlanConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub options: SessionOptions,
    #[serde(default)]
    pub requests: Vec<RequestDefinition>,
}

impl PlanConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.requests.is_empty() {
            issues.push(ValidationIssue::EmptyRequestList);
        }

        for (index, request) in self.requests.iter().enumerate() {
            request.collect_issues(index + 1, &mut issues);
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// The queue this plan describes.
    pub fn to_requests(&self) -> Vec<ModificationRequest> {
        self.requests.iter().map(RequestDefinition::to_request).collect()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RequestDefinition {
    AddImport(ImportSpec),
    AddState(StateVariable),
    AddEffect(UseEffect),
    WrapElement {
        target: ElementLocator,
        #[serde(flatten)]
        options: WrapOptions,
    },
    InsertMarkup {
        target: ElementLocator,
        position: InsertPosition,
        markup: String,
    },
    DeleteElement {
        target: ElementLocator,
    },
    ReplaceText {
        search: String,
        #[serde(default)]
        replace: String,
    },
}

impl RequestDefinition {
    pub fn to_request(&self) -> ModificationRequest {
        match self.clone() {
            RequestDefinition::AddImport(spec) => ModificationRequest::AddImport(spec),
            RequestDefinition::AddState(state) => ModificationRequest::AddStateVariable(state),
            RequestDefinition::AddEffect(effect) => ModificationRequest::AddUseEffect(effect),
            RequestDefinition::WrapElement { target, options } => ModificationRequest::WrapElement {
                target: ElementTarget::Locate(target),
                options,
            },
            RequestDefinition::InsertMarkup {
                target,
                position,
                markup,
            } => ModificationRequest::InsertMarkup {
                target: ElementTarget::Locate(target),
                position,
                markup,
            },
            RequestDefinition::DeleteElement { target } => {
                ModificationRequest::DeleteElement(ElementTarget::Locate(target))
            }
            RequestDefinition::ReplaceText { search, replace } => {
                ModificationRequest::ReplaceText { search, replace }
            }
        }
    }

    fn collect_issues(&self, request: usize, issues: &mut Vec<ValidationIssue>) {
        let mut require = |value: &str, field: &'static str| {
            if value.trim().is_empty() {
                issues.push(ValidationIssue::MissingField { request, field });
            }
        };

        match self {
            RequestDefinition::AddImport(spec) => require(&spec.module, "module"),
            RequestDefinition::AddState(state) => {
                require(&state.name, "name");
                require(&state.setter, "setter");
                require(&state.initial_value, "initial_value");
            }
            RequestDefinition::AddEffect(effect) => require(&effect.body, "body"),
            RequestDefinition::WrapElement { target, options } => {
                require(&target.tag, "target.tag");
                require(&options.component, "component");
                if let Some(import) = &options.import {
                    require(&import.module, "import.module");
                }
            }
            RequestDefinition::InsertMarkup { target, markup, .. } => {
                require(&target.tag, "target.tag");
                require(markup, "markup");
            }
            RequestDefinition::DeleteElement { target } => require(&target.tag, "target.tag"),
            RequestDefinition::ReplaceText { search, .. } => require(search, "search"),
        }

        let import = match self {
            RequestDefinition::AddImport(spec) => Some(spec),
            RequestDefinition::WrapElement { options, .. } => options.import.as_ref(),
            _ => None,
        };
        if let Some(Err(e)) = import.map(ImportSpec::validate) {
            issues.push(ValidationIssue::InvalidCombo {
                request,
                message: e.to_string(),
            });
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// One problem in a plan; `request` is the 1-based position in `requests`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyRequestList,
    MissingField {
        request: usize,
        field: &'static str,
    },
    InvalidCombo {
        request: usize,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRequestList => write!(f, "plan contains no requests"),
            ValidationIssue::MissingField { request, field } => {
                write!(f, "request #{request} missing required field '{field}'")
            }
            ValidationIssue::InvalidCombo { request, message } => {
                write!(f, "request #{request} has invalid configuration: {message}")
            }
        }
    }
}
