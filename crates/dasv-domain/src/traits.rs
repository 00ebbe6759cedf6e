//! Trait definitions for external collaborators
//!
//! Rendering and publication live outside the pipeline. The pipeline only
//! hands over immutable records.

use crate::{Finding, ValidationVerdict};
use serde::{Deserialize, Serialize};

/// A rendered document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Suggested title
    pub title: String,
    /// Media type of `body`, e.g. `text/markdown`
    pub media_type: String,
    /// Rendered content
    pub body: String,
}

/// Turns a finding and its verdict into a document
///
/// Implementations must be pure: no I/O and no pipeline side effects.
pub trait Renderer {
    /// Render one finding
    fn render(&self, finding: &Finding, verdict: &ValidationVerdict) -> Document;
}
