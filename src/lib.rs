//! # msproj-base
//!
//! Position-aware semantic model for MSBuild project files: an error
//! tolerant XML syntax tree, location inspection for completion, the
//! embedded expression language, and lookup of evaluated objects by
//! position.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide     → Location inspector, document snapshots, goto/hover/symbols
//!   ↓
//! hir     → Evaluated objects, evaluation engine, object locator
//!   ↓
//! expr    → Expression parser ($(), @(), %(), conditions, simple lists)
//!   ↓
//! syntax  → XML lexer + error-tolerant parser, XS-tree view
//!   ↓
//! base    → Primitives (FileId, offsets, positions, LineIndex)
//! ```
//!
//! `project` sits beside `ide`: settings, schema help and the workspace
//! loader.

/// Foundation types: FileId, offsets, line/column positions
pub mod base;

/// XML syntax tree: lexer, parser, XS nodes and paths
pub mod syntax;

/// The embedded expression language
pub mod expr;

/// Evaluated project model and the object locator
pub mod hir;

/// IDE features: location inspection, goto, hover, symbols
pub mod ide;

/// Settings, schema help and workspace loading
pub mod project;

// Re-export foundation types
pub use base::{FileId, LineCol, LineIndex, Position, Range, TextRange, TextSize};
pub use ide::{AnalysisHost, DocumentSnapshot, XmlLocation};
pub use syntax::{XsPath, XsTree};
