//! The expression language embedded in attribute values and element text.
//!
//! The parser establishes structure and position only; it never evaluates
//! anything. Results are not cached: inputs are short, so callers re-parse
//! on demand.

mod lexer;
mod node;
mod parser;

pub use node::{
    BoolOp, CompareOp, ExpressionError, ExpressionNode, ExpressionTree, SimpleList,
};
pub use parser::{parse_attribute_or_text, parse_condition, parse_simple_list};
