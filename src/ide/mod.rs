//! IDE features: high-level APIs for language-server handlers.
//!
//! This module provides the interface between the evaluated model (HIR)
//! and an editor. Each function corresponds to an editor request.
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: Take a snapshot in, return data out
//! 2. **No LSP types**: Uses our own types, converted at the LSP boundary
//! 3. **Snapshots, not locks**: Features run on an immutable
//!    [`DocumentSnapshot`]; only [`Document`] touches the lock
//!
//! ## Usage
//!
//! ```
//! use msproj::base::Position;
//! use msproj::ide::{AnalysisHost, LocationKind};
//!
//! let host = AnalysisHost::default();
//! let (file, _) = host.open("/src/app.csproj", "<Project><PropertyGroup /></Project>", 1);
//!
//! let snapshot = host.snapshot(file).unwrap();
//! let location = snapshot.inspect(Position::zero_based(0, 12)).unwrap();
//! assert_eq!(location.kind(), LocationKind::ElementName { closing: false });
//! ```

mod analysis;
mod document_links;
mod folding;
mod goto;
mod hover;
mod location;
mod symbols;

pub use analysis::{
    AnalysisHost, Document, DocumentSnapshot, LoadOutcome, LocatorUnavailable, QueryError, Version,
};
pub use document_links::{DocumentLink, document_links};
pub use folding::{FoldingRange, folding_ranges};
pub use goto::{GotoResult, GotoTarget, goto_definition};
pub use hover::{HoverResult, hover};
pub use location::{
    AttributeCompletion, ElementCompletion, ExpressionLocation, GapKind, ListItemLocation,
    LocationKind, Padding, XmlLocation, inspect,
};
pub use symbols::{SymbolInfo, document_symbols};
