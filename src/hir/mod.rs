//! Evaluated build objects and their correlation with the syntax tree.
//!
//! ```text
//! EvaluationEngine ──evaluate──▶ EvaluatedProject
//!                                      │
//!                 XsTree + LineIndex ──┴──▶ ObjectLocator
//! ```
//!
//! The engine is injected; [`StaticEvaluator`] is the in-crate reference
//! implementation. The locator is rebuilt after every evaluation and simply
//! absent when the XML is invalid or evaluation failed.

mod diagnostics;
mod engine;
mod locator;
mod model;
mod source;

pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity, codes};
pub use engine::{EvaluationEngine, EvaluationError, StaticEvaluator};
pub use locator::{LocatedObject, ObjectLocator};
pub use model::{
    EvaluatedObject, EvaluatedProject, EvaluatedProperty, GlobalProperties, ObjectKind,
    PropertyDeclaration, Provenance,
};
pub use source::FileSet;
