//! Project XML syntax: lexer, error-tolerant parser and the XS-tree view.

mod kind;
mod lexer;
mod nodes;
mod parser;
mod path;
mod tree;

pub use kind::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, XmlLanguage};
pub use nodes::{
    XsAttribute, XsCData, XsComment, XsElement, XsNode, XsNodeKind, XsText, XsWhitespace,
};
pub use parser::SyntaxError;
pub use path::XsPath;
pub use tree::XsTree;
