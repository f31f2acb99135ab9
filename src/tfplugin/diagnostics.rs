//! Diagnostic collection for RPC responses.

use super::proto::tfplugin6::{attribute_path, diagnostic::Severity, AttributePath, Diagnostic};
use crate::errors::ProviderError;

/// Diagnostics accumulated while serving one RPC.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute_error<S: Into<String>, D: Into<String>>(
        &mut self,
        attribute: &str,
        summary: S,
        detail: D,
    ) {
        self.push(Severity::Error, summary.into(), detail.into(), Some(attribute));
    }

    /// Record an error with its message as detail, pointing at the offending
    /// attribute when the error names one.
    pub fn from_error<S: Into<String>>(&mut self, summary: S, error: &ProviderError) {
        self.push(Severity::Error, summary.into(), error.to_string(), error.attribute());
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error as i32)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.items
    }

    fn push(&mut self, severity: Severity, summary: String, detail: String, attribute: Option<&str>) {
        self.items.push(Diagnostic {
            severity: severity as i32,
            summary,
            detail,
            attribute: attribute.map(attribute_path),
        });
    }
}

/// Path to a top-level attribute
pub fn attribute_path(name: &str) -> AttributePath {
    AttributePath {
        steps: vec![attribute_path::Step {
            selector: Some(attribute_path::step::Selector::AttributeName(name.to_string())),
        }],
    }
}
