// provider/src/framework/diagnostics.rs

use std::fmt;

use crate::server::tfplugin6;
use crate::server::tfplugin6::attribute_path::step::Selector;
use crate::server::tfplugin6::attribute_path::Step;

/// One problem reported back to Terraform for the current call. Every
/// diagnostic is an error: a call either succeeds cleanly or fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub summary: String,
    pub detail: String,
    /// Root attribute the problem refers to, if any.
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute = Some(name.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attr) => write!(f, "{} ({}): {}", self.summary, attr, self.detail),
            None => write!(f, "{}: {}", self.summary, self.detail),
        }
    }
}

impl From<Diagnostic> for tfplugin6::Diagnostic {
    fn from(diag: Diagnostic) -> Self {
        tfplugin6::Diagnostic {
            severity: tfplugin6::diagnostic::Severity::Error as i32,
            summary: diag.summary,
            detail: diag.detail,
            attribute: diag.attribute.map(|name| tfplugin6::AttributePath {
                steps: vec![Step {
                    selector: Some(Selector::AttributeName(name)),
                }],
            }),
        }
    }
}

/// Diagnostics accumulated during a single call. Used as the error half of
/// every lifecycle `Result`: a non-empty collection means the call produced
/// no output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.0.push(diag);
    }

    pub fn append(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_error(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Collects the outcome of two independent extractions, reporting the
    /// failures of both before giving up.
    pub fn join<A, B>(
        a: Result<A, Diagnostics>,
        b: Result<B, Diagnostics>,
    ) -> Result<(A, B), Diagnostics> {
        match (a, b) {
            (Ok(a), Ok(b)) => Ok((a, b)),
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
            (Err(mut e1), Err(e2)) => {
                e1.append(e2);
                Err(e1)
            }
        }
    }

    pub fn into_proto(self) -> Vec<tfplugin6::Diagnostic> {
        self.0.into_iter().map(Into::into).collect()
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diag: Diagnostic) -> Self {
        Self(vec![diag])
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diag) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", diag)?;
        }
        Ok(())
    }
}
