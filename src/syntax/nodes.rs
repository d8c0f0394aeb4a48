//! Typed view (the XS-tree) over the rowan syntax tree.
//!
//! Each wrapper holds a rowan [`SyntaxNode`]. Children are owned by the
//! green tree; the upward links used for paths and siblings are rowan's
//! non-owning parent pointers, so dropping a wrapper never affects the tree.

use rowan::Direction;
use smol_str::SmolStr;

use super::kind::SyntaxKind::{self, *};
use super::kind::{SyntaxNode, SyntaxToken};
use super::path::XsPath;
use crate::base::TextRange;

macro_rules! xs_node {
    ($(#[$attr:meta])* $name:ident => $kind:ident) => {
        $(#[$attr])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl $name {
            pub fn cast(node: SyntaxNode) -> Option<Self> {
                (node.kind() == $kind).then(|| Self(node))
            }

            pub fn syntax(&self) -> &SyntaxNode {
                &self.0
            }

            pub fn range(&self) -> TextRange {
                self.0.text_range()
            }
        }

        impl From<$name> for XsNode {
            fn from(node: $name) -> Self {
                XsNode::$name(node)
            }
        }
    };
}

xs_node!(
    /// An element, possibly malformed.
    XsElement => ELEMENT
);
xs_node!(
    /// `name="value"` inside a start tag.
    XsAttribute => ATTRIBUTE
);
xs_node!(
    /// Non-whitespace character data.
    XsText => CONTENT_TEXT
);
xs_node!(
    /// Whitespace-only character data.
    XsWhitespace => CONTENT_WHITESPACE
);
xs_node!(XsComment => COMMENT);
xs_node!(XsCData => CDATA);

/// Discriminant of an [`XsNode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum XsNodeKind {
    Element,
    Attribute,
    Text,
    Whitespace,
    Comment,
    CData,
}

/// Any node of the XS-tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum XsNode {
    XsElement(XsElement),
    XsAttribute(XsAttribute),
    XsText(XsText),
    XsWhitespace(XsWhitespace),
    XsComment(XsComment),
    XsCData(XsCData),
}

impl XsNode {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        let node = match node.kind() {
            ELEMENT => Self::XsElement(XsElement(node)),
            ATTRIBUTE => Self::XsAttribute(XsAttribute(node)),
            CONTENT_TEXT => Self::XsText(XsText(node)),
            CONTENT_WHITESPACE => Self::XsWhitespace(XsWhitespace(node)),
            COMMENT => Self::XsComment(XsComment(node)),
            CDATA => Self::XsCData(XsCData(node)),
            _ => return None,
        };
        Some(node)
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Self::XsElement(n) => n.syntax(),
            Self::XsAttribute(n) => n.syntax(),
            Self::XsText(n) => n.syntax(),
            Self::XsWhitespace(n) => n.syntax(),
            Self::XsComment(n) => n.syntax(),
            Self::XsCData(n) => n.syntax(),
        }
    }

    pub fn kind(&self) -> XsNodeKind {
        match self {
            Self::XsElement(_) => XsNodeKind::Element,
            Self::XsAttribute(_) => XsNodeKind::Attribute,
            Self::XsText(_) => XsNodeKind::Text,
            Self::XsWhitespace(_) => XsNodeKind::Whitespace,
            Self::XsComment(_) => XsNodeKind::Comment,
            Self::XsCData(_) => XsNodeKind::CData,
        }
    }

    pub fn range(&self) -> TextRange {
        self.syntax().text_range()
    }

    /// The enclosing element; `None` at document level.
    pub fn parent(&self) -> Option<XsElement> {
        enclosing_element(self.syntax())
    }

    /// Structural path of the node.
    ///
    /// Elements include their own name; attributes append `@name` to their
    /// element's path; content nodes use the enclosing element's path.
    pub fn path(&self) -> XsPath {
        match self {
            Self::XsElement(e) => e.path(),
            Self::XsAttribute(a) => a.path(),
            _ => self.parent().map_or_else(XsPath::root, |e| e.path()),
        }
    }

    pub fn previous_sibling(&self) -> Option<XsNode> {
        sibling(self.syntax(), Direction::Prev)
    }

    pub fn next_sibling(&self) -> Option<XsNode> {
        sibling(self.syntax(), Direction::Next)
    }

    pub fn as_element(&self) -> Option<&XsElement> {
        match self {
            Self::XsElement(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_attribute(&self) -> Option<&XsAttribute> {
        match self {
            Self::XsAttribute(a) => Some(a),
            _ => None,
        }
    }

    /// Raw text for text-like nodes; `None` for elements and attributes.
    pub fn text(&self) -> Option<String> {
        match self {
            Self::XsElement(_) | Self::XsAttribute(_) => None,
            _ => Some(self.syntax().text().to_string()),
        }
    }
}

fn sibling(node: &SyntaxNode, direction: Direction) -> Option<XsNode> {
    node.siblings(direction).skip(1).find_map(XsNode::cast)
}

fn enclosing_element(node: &SyntaxNode) -> Option<XsElement> {
    node.ancestors().skip(1).find_map(XsElement::cast)
}

fn token_of(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|t| t.kind() == kind)
}

impl XsElement {
    fn start_tag(&self) -> Option<SyntaxNode> {
        self.0.children().find(|n| n.kind() == START_TAG)
    }

    fn end_tag(&self) -> Option<SyntaxNode> {
        self.0.children().find(|n| n.kind() == END_TAG)
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        token_of(&self.start_tag()?, NAME)
    }

    /// Element name; empty for `<` with no name yet.
    pub fn name(&self) -> SmolStr {
        self.name_token()
            .map(|t| SmolStr::new(t.text()))
            .unwrap_or_default()
    }

    pub fn name_range(&self) -> Option<TextRange> {
        self.name_token().map(|t| t.text_range())
    }

    pub fn start_tag_range(&self) -> TextRange {
        self.start_tag()
            .map_or_else(|| self.range(), |tag| tag.text_range())
    }

    pub fn end_tag_range(&self) -> Option<TextRange> {
        self.end_tag().map(|tag| tag.text_range())
    }

    /// Name inside the end tag, when it has one.
    pub fn end_tag_name_range(&self) -> Option<TextRange> {
        token_of(&self.end_tag()?, NAME).map(|t| t.text_range())
    }

    /// Text between the start tag's `>` and the end tag (or the element's
    /// end when the end tag is missing). `None` for self-closing and
    /// unterminated start tags.
    pub fn content_range(&self) -> Option<TextRange> {
        let start_tag = self.start_tag()?;
        let last = start_tag.last_token()?;
        if last.kind() != R_ANGLE {
            return None;
        }
        let start = start_tag.text_range().end();
        let end = self
            .end_tag_range()
            .map_or(self.range().end(), |r| r.start());
        Some(TextRange::new(start, end))
    }

    /// Raw text of the content range.
    pub fn inner_text(&self) -> String {
        let Some(content) = self.content_range() else {
            return String::new();
        };
        let offset = self.range().start();
        let text = self.0.text().to_string();
        let range = content - offset;
        text[range].to_string()
    }

    pub fn attributes(&self) -> impl Iterator<Item = XsAttribute> + use<> {
        self.start_tag()
            .into_iter()
            .flat_map(|tag| tag.children())
            .filter_map(XsAttribute::cast)
    }

    pub fn attribute(&self, name: &str) -> Option<XsAttribute> {
        self.attributes().find(|a| a.name() == name)
    }

    /// Content nodes in document order.
    pub fn children(&self) -> impl Iterator<Item = XsNode> + use<> {
        self.0.children().filter_map(XsNode::cast)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = XsElement> + use<> {
        self.0.children().filter_map(XsElement::cast)
    }

    pub fn is_self_closing(&self) -> bool {
        self.start_tag()
            .and_then(|tag| tag.last_token())
            .is_some_and(|t| t.kind() == SLASH_R_ANGLE)
    }

    pub fn has_end_tag(&self) -> bool {
        self.end_tag().is_some()
    }

    /// Well-formed: named, terminated, closed by a matching end tag (or
    /// self-closing) and every attribute valid.
    pub fn is_valid(&self) -> bool {
        let Some(start_tag) = self.start_tag() else {
            return false;
        };
        let Some(name) = self.name_token() else {
            return false;
        };
        if start_tag.children().any(|n| n.kind() == ERROR) {
            return false;
        }
        if !self.attributes().all(|a| a.is_valid()) {
            return false;
        }
        if self.is_self_closing() {
            return true;
        }
        match self.end_tag() {
            Some(end) => {
                let closed = end.last_token().is_some_and(|t| t.kind() == R_ANGLE);
                let end_name = token_of(&end, NAME);
                closed && end_name.is_some_and(|t| t.text() == name.text())
            }
            None => false,
        }
    }

    pub fn parent_element(&self) -> Option<XsElement> {
        enclosing_element(&self.0)
    }

    pub fn path(&self) -> XsPath {
        let mut segments: Vec<SmolStr> = self
            .0
            .ancestors()
            .filter_map(XsElement::cast)
            .map(|e| e.name())
            .collect();
        segments.reverse();
        XsPath::absolute(segments)
    }

    /// Concatenated character data of direct text and CDATA children.
    pub fn text_content(&self) -> String {
        self.children()
            .filter_map(|child| match child {
                XsNode::XsText(t) => Some(t.text()),
                XsNode::XsWhitespace(w) => Some(w.text()),
                XsNode::XsCData(c) => Some(c.value()),
                _ => None,
            })
            .collect()
    }
}

impl XsAttribute {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        token_of(&self.0, NAME)
    }

    pub fn name(&self) -> SmolStr {
        self.name_token()
            .map(|t| SmolStr::new(t.text()))
            .unwrap_or_default()
    }

    pub fn name_range(&self) -> TextRange {
        self.name_token()
            .map_or_else(|| TextRange::empty(self.range().start()), |t| t.text_range())
    }

    fn value_node(&self) -> Option<SyntaxNode> {
        self.0.children().find(|n| n.kind() == ATTRIBUTE_VALUE)
    }

    pub fn has_value(&self) -> bool {
        self.value_node().is_some()
    }

    /// Raw text between the quotes. Entities are not decoded.
    pub fn value(&self) -> Option<SmolStr> {
        let node = self.value_node()?;
        let text = token_of(&node, VALUE_TEXT).map(|t| SmolStr::new(t.text()));
        Some(text.unwrap_or_default())
    }

    /// Range between the quotes, empty for `""`.
    pub fn value_range(&self) -> Option<TextRange> {
        let node = self.value_node()?;
        let mut quotes = node
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| t.kind() == QUOTE);
        let open = quotes.next()?;
        let end = quotes
            .next()
            .map_or(node.text_range().end(), |close| close.text_range().start());
        Some(TextRange::new(open.text_range().end(), end))
    }

    /// Whether the value has its closing quote.
    pub fn is_value_closed(&self) -> bool {
        self.value_node().is_some_and(|node| {
            node.children_with_tokens()
                .filter(|it| it.kind() == QUOTE)
                .count()
                == 2
        })
    }

    pub fn is_valid(&self) -> bool {
        self.name_token()
            .is_some_and(|t| super::parser::is_valid_name(t.text()))
            && token_of(&self.0, EQ).is_some()
            && self.is_value_closed()
    }

    pub fn element(&self) -> Option<XsElement> {
        enclosing_element(&self.0)
    }

    pub fn path(&self) -> XsPath {
        let element = self.element().map_or_else(XsPath::root, |e| e.path());
        element.child(format!("@{}", self.name()))
    }
}

impl XsText {
    pub fn text(&self) -> String {
        self.0.text().to_string()
    }
}

impl XsWhitespace {
    pub fn text(&self) -> String {
        self.0.text().to_string()
    }
}

impl XsComment {
    pub fn text(&self) -> String {
        self.0.text().to_string()
    }
}

impl XsCData {
    pub fn text(&self) -> String {
        self.0.text().to_string()
    }

    /// Text between `<![CDATA[` and `]]>`.
    pub fn value(&self) -> String {
        let text = self.text();
        let inner = text.strip_prefix("<![CDATA[").unwrap_or(&text);
        inner.strip_suffix("]]>").unwrap_or(inner).to_string()
    }
}
