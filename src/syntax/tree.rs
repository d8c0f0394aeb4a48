//! Parsed document: green tree plus syntax errors.

use std::sync::Arc;

use rowan::GreenNode;

use super::kind::SyntaxNode;
use super::nodes::{XsElement, XsNode};
use super::parser::{self, SyntaxError};
use crate::base::TextSize;

/// An immutable parse of one text version.
///
/// Holds only the green tree, which is `Send + Sync`; rowan cursors are
/// created per query through [`XsTree::syntax`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XsTree {
    green: GreenNode,
    errors: Arc<[SyntaxError]>,
}

impl XsTree {
    /// Parse `text`. Never fails; malformed input shows up in [`errors`](Self::errors).
    pub fn parse(text: &str) -> Self {
        let (green, errors) = parser::parse(text);
        Self {
            green,
            errors: errors.into(),
        }
    }

    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    /// The errors as a shared slice, for callers that outlive the tree.
    pub fn shared_errors(&self) -> Arc<[SyntaxError]> {
        self.errors.clone()
    }

    /// No syntax errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> TextSize {
        self.green.text_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == TextSize::from(0)
    }

    /// The first element at document level.
    pub fn root_element(&self) -> Option<XsElement> {
        self.syntax().children().find_map(XsElement::cast)
    }

    /// Every element in document order.
    pub fn elements(&self) -> impl Iterator<Item = XsElement> + use<> {
        self.syntax().descendants().filter_map(XsElement::cast)
    }

    /// Every XS node in document order, attributes before content.
    pub fn nodes(&self) -> impl Iterator<Item = XsNode> + use<> {
        self.syntax().descendants().filter_map(XsNode::cast)
    }

    pub fn text(&self) -> String {
        self.syntax().text().to_string()
    }
}
