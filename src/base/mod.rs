//! Foundation types for the msproj toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`FileId`] - Document identifiers
//! - [`TextRange`], [`TextSize`] - Byte offsets into a document
//! - [`LineCol`], [`Position`], [`Range`] - Line/column positions
//! - [`LineIndex`] - The text-position index (offset ↔ line/column)
//!
//! This module has NO dependencies on other msproj modules.

mod file_id;
mod span;

pub use file_id::FileId;
pub use span::{
    LineCol, LineIndex, Position, PositionError, PositionOrigin, Range, TextRange, TextSize,
};

// Re-export text-size types for convenience
pub use text_size;
