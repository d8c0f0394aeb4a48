//! Location inspector: "what is at this offset".
//!
//! The inspector resolves an offset to a single token and classifies it.
//! At a boundary between two tokens the left token wins when typing at
//! its end would extend it (a name, character data, value text, whitespace,
//! `<`, `</` or an opening quote); otherwise the right token wins. A
//! completion triggered right after a typed character therefore sees the
//! token being typed, not the one that follows.

use rowan::TokenAtOffset;

use crate::base::{TextRange, TextSize};
use crate::expr::{self, ExpressionNode, ExpressionTree, SimpleList};
use crate::syntax::SyntaxKind::*;
use crate::syntax::{SyntaxNode, SyntaxToken, XsAttribute, XsElement, XsNode, XsPath, XsTree};

/// Where in the markup an insertion point is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GapKind {
    /// Between content nodes: a new child element may go here.
    Content,
    /// Inside a start tag: a new attribute may go here.
    Attributes,
}

/// Classification of an offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocationKind {
    /// On an element name, or right after `<` / `</`.
    ElementName { closing: bool },
    AttributeName,
    /// Between the quotes of an attribute value.
    AttributeValue,
    /// On text, whitespace, a comment or CDATA.
    ElementContent,
    InsertableGap(GapKind),
    None,
}

/// Whether a new attribute needs whitespace around it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Padding {
    None,
    /// Insert a space before the attribute.
    Leading,
    /// Insert a space after the attribute.
    Trailing,
    Both,
}

impl Padding {
    fn from_flags(leading: bool, trailing: bool) -> Self {
        match (leading, trailing) {
            (false, false) => Padding::None,
            (true, false) => Padding::Leading,
            (false, true) => Padding::Trailing,
            (true, true) => Padding::Both,
        }
    }
}

/// Result of [`XmlLocation::can_complete_element`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementCompletion {
    /// Element the new child goes into; `None` at document level.
    pub parent: Option<XsElement>,
    /// Existing (possibly malformed) element the completion replaces.
    pub replace: Option<XsElement>,
}

/// Result of [`XmlLocation::can_complete_attribute`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeCompletion {
    pub element: XsElement,
    pub replace: Option<XsAttribute>,
    pub padding: Padding,
}

/// An offset classified against a tree.
#[derive(Clone, Debug)]
pub struct XmlLocation {
    offset: TextSize,
    kind: LocationKind,
    /// The node at the offset; for content gaps, the containing element.
    node: Option<XsNode>,
    token: Option<SyntaxToken>,
}

/// Classify `offset` in `tree`. Offsets past the end are clamped.
pub fn inspect(tree: &XsTree, offset: TextSize) -> XmlLocation {
    let root = tree.syntax();
    let offset = offset.min(tree.len());

    let token = match root.token_at_offset(offset) {
        TokenAtOffset::None => None,
        TokenAtOffset::Single(token) => Some(token),
        TokenAtOffset::Between(left, right) => Some(if is_extendable(&left) { left } else { right }),
    };
    let Some(token) = token else {
        return XmlLocation {
            offset,
            kind: LocationKind::InsertableGap(GapKind::Content),
            node: None,
            token: None,
        };
    };

    let (kind, node) = classify(&token, offset);
    XmlLocation {
        offset,
        kind,
        node,
        token: Some(token),
    }
}

fn is_extendable(token: &SyntaxToken) -> bool {
    token.kind().is_extendable() || is_opening_quote(token)
}

fn is_opening_quote(token: &SyntaxToken) -> bool {
    token.kind() == QUOTE && token.prev_sibling_or_token().is_none()
}

fn enclosing_element(node: &SyntaxNode) -> Option<XsElement> {
    node.ancestors().find_map(XsElement::cast)
}

/// Element owning an end tag; `None` for a stray end tag.
fn end_tag_owner(end_tag: &SyntaxNode) -> Option<XsElement> {
    end_tag.parent().and_then(XsElement::cast)
}

fn content_gap(container: Option<XsElement>) -> (LocationKind, Option<XsNode>) {
    (
        LocationKind::InsertableGap(GapKind::Content),
        container.map(XsNode::from),
    )
}

fn classify(token: &SyntaxToken, offset: TextSize) -> (LocationKind, Option<XsNode>) {
    let range = token.text_range();
    let at_start = offset == range.start();
    let at_end = offset == range.end();
    let Some(parent) = token.parent() else {
        return (LocationKind::None, None);
    };
    let element = || enclosing_element(&parent);
    let as_node = |e: Option<XsElement>| e.map(XsNode::from);

    match (token.kind(), parent.kind()) {
        (NAME, START_TAG) => (LocationKind::ElementName { closing: false }, as_node(element())),
        (NAME, END_TAG) => match end_tag_owner(&parent) {
            Some(owner) => (LocationKind::ElementName { closing: true }, Some(owner.into())),
            None => (LocationKind::None, as_node(element())),
        },
        (NAME, ATTRIBUTE) => (LocationKind::AttributeName, XsNode::cast(parent)),

        (L_ANGLE, START_TAG) if at_start => {
            content_gap(element().and_then(|e| e.parent_element()))
        }
        (L_ANGLE, START_TAG) => (LocationKind::ElementName { closing: false }, as_node(element())),

        (L_ANGLE_SLASH, END_TAG) if at_start => content_gap(element()),
        (L_ANGLE_SLASH, END_TAG) => match end_tag_owner(&parent) {
            Some(owner) => (LocationKind::ElementName { closing: true }, Some(owner.into())),
            None => (LocationKind::None, as_node(element())),
        },

        (CHAR_DATA, CONTENT_TEXT) | (WHITESPACE, CONTENT_WHITESPACE) => {
            (LocationKind::ElementContent, XsNode::cast(parent))
        }
        (WHITESPACE, START_TAG) => (
            LocationKind::InsertableGap(GapKind::Attributes),
            as_node(element()),
        ),

        (VALUE_TEXT, _) => (LocationKind::AttributeValue, attribute_node(&parent)),
        (QUOTE, _) if is_opening_quote(token) => {
            if at_end {
                (LocationKind::AttributeValue, attribute_node(&parent))
            } else {
                (LocationKind::None, attribute_node(&parent))
            }
        }
        (QUOTE, _) if at_end => (
            LocationKind::InsertableGap(GapKind::Attributes),
            as_node(element()),
        ),
        (QUOTE, _) => (LocationKind::AttributeValue, attribute_node(&parent)),

        (R_ANGLE | SLASH_R_ANGLE, START_TAG) if at_start => (
            LocationKind::InsertableGap(GapKind::Attributes),
            as_node(element()),
        ),
        (R_ANGLE, START_TAG) if at_end => content_gap(element()),
        (SLASH_R_ANGLE, START_TAG) if at_end => {
            content_gap(element().and_then(|e| e.parent_element()))
        }
        (R_ANGLE, END_TAG) if at_end => match end_tag_owner(&parent) {
            Some(owner) => content_gap(owner.parent_element()),
            None => content_gap(element()),
        },

        (COMMENT_TOKEN | CDATA_TOKEN, _) if at_start => content_gap(element()),
        (COMMENT_TOKEN | CDATA_TOKEN, _) if at_end && is_terminated(token) => {
            content_gap(element())
        }
        (COMMENT_TOKEN | CDATA_TOKEN, _) => (LocationKind::ElementContent, XsNode::cast(parent)),
        (PI_TOKEN | DOCTYPE_TOKEN, _) if at_start => content_gap(element()),

        _ => (
            LocationKind::None,
            parent.ancestors().find_map(XsNode::cast),
        ),
    }
}

fn attribute_node(node: &SyntaxNode) -> Option<XsNode> {
    node.ancestors().find_map(XsAttribute::cast).map(XsNode::from)
}

fn is_terminated(token: &SyntaxToken) -> bool {
    let text = token.text();
    match token.kind() {
        COMMENT_TOKEN => text.len() >= 7 && text.ends_with("-->"),
        CDATA_TOKEN => text.len() >= 12 && text.ends_with("]]>"),
        _ => true,
    }
}

fn path_matches(pattern: Option<&XsPath>, element: Option<&XsElement>) -> bool {
    match pattern {
        None => true,
        Some(pattern) => {
            let path = element.map_or_else(XsPath::root, |e| e.path());
            pattern.matches(&path)
        }
    }
}

impl XmlLocation {
    pub fn offset(&self) -> TextSize {
        self.offset
    }

    pub fn kind(&self) -> LocationKind {
        self.kind
    }

    /// The node at the offset; for a content gap, the containing element.
    pub fn node(&self) -> Option<&XsNode> {
        self.node.as_ref()
    }

    pub fn token(&self) -> Option<&SyntaxToken> {
        self.token.as_ref()
    }

    /// The element this location is about.
    pub fn element(&self) -> Option<XsElement> {
        match self.node.as_ref()? {
            XsNode::XsElement(e) => Some(e.clone()),
            XsNode::XsAttribute(a) => a.element(),
            other => other.parent(),
        }
    }

    pub fn attribute(&self) -> Option<XsAttribute> {
        self.node.as_ref()?.as_attribute().cloned()
    }

    /// Structural parent of whatever is at the offset.
    pub fn parent(&self) -> Option<XsElement> {
        let node = self.node.as_ref()?;
        match self.kind {
            LocationKind::InsertableGap(GapKind::Content) => node.as_element().cloned(),
            LocationKind::InsertableGap(GapKind::Attributes) => node.as_element().cloned(),
            LocationKind::AttributeName | LocationKind::AttributeValue => {
                node.as_attribute().and_then(|a| a.element())
            }
            _ => node.parent(),
        }
    }

    pub fn previous_sibling(&self) -> Option<XsNode> {
        match self.kind {
            LocationKind::InsertableGap(gap) => self
                .gap_neighbours(gap)
                .into_iter()
                .rev()
                .find(|n| n.range().end() <= self.offset),
            _ => self.node.as_ref()?.previous_sibling(),
        }
    }

    pub fn next_sibling(&self) -> Option<XsNode> {
        match self.kind {
            LocationKind::InsertableGap(gap) => self
                .gap_neighbours(gap)
                .into_iter()
                .find(|n| n.range().start() >= self.offset),
            _ => self.node.as_ref()?.next_sibling(),
        }
    }

    fn gap_neighbours(&self, gap: GapKind) -> Vec<XsNode> {
        match (gap, self.node.as_ref()) {
            (GapKind::Attributes, Some(XsNode::XsElement(e))) => {
                e.attributes().map(XsNode::from).collect()
            }
            (GapKind::Content, Some(XsNode::XsElement(e))) => e.children().collect(),
            (GapKind::Content, None) => match self.document() {
                Some(root) => root.children().filter_map(XsNode::cast).collect(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn document(&self) -> Option<SyntaxNode> {
        self.token.as_ref()?.parent()?.ancestors().last()
    }

    /// Can an element be completed here under a parent matching
    /// `parent_path` (`None` accepts any parent)?
    ///
    /// On the opening name of an existing element, that element is to be
    /// replaced, even when it is malformed. In content whitespace or a
    /// content gap a new element is inserted.
    pub fn can_complete_element(&self, parent_path: Option<&XsPath>) -> Option<ElementCompletion> {
        let (parent, replace) = match (self.kind, self.node.as_ref()) {
            (LocationKind::ElementName { closing: false }, Some(XsNode::XsElement(e))) => {
                (e.parent_element(), Some(e.clone()))
            }
            (LocationKind::ElementContent, Some(node @ XsNode::XsWhitespace(_))) => {
                (node.parent(), None)
            }
            (LocationKind::InsertableGap(GapKind::Content), node) => {
                (node.and_then(|n| n.as_element().cloned()), None)
            }
            _ => return None,
        };
        path_matches(parent_path, parent.as_ref()).then_some(ElementCompletion { parent, replace })
    }

    /// Can an attribute be completed here on an element matching
    /// `element_path` (`None` accepts any element)?
    pub fn can_complete_attribute(
        &self,
        element_path: Option<&XsPath>,
    ) -> Option<AttributeCompletion> {
        let completion = match (self.kind, self.node.as_ref()) {
            (LocationKind::AttributeName, Some(XsNode::XsAttribute(a))) => AttributeCompletion {
                element: a.element()?,
                replace: Some(a.clone()),
                padding: Padding::None,
            },
            (LocationKind::InsertableGap(GapKind::Attributes), Some(XsNode::XsElement(e))) => {
                AttributeCompletion {
                    element: e.clone(),
                    replace: None,
                    padding: self.attribute_padding(),
                }
            }
            _ => return None,
        };
        path_matches(element_path, Some(&completion.element)).then_some(completion)
    }

    fn attribute_padding(&self) -> Padding {
        let Some(token) = self.token.as_ref() else {
            return Padding::None;
        };
        let range = token.text_range();
        let left = if self.offset > range.start() {
            Some(token.clone())
        } else {
            token.prev_token()
        };
        let right = if self.offset < range.end() {
            Some(token.clone())
        } else {
            token.next_token()
        };
        let leading = left.is_some_and(|t| t.kind() != WHITESPACE);
        let trailing = right.is_some_and(|t| t.kind() == NAME);
        Padding::from_flags(leading, trailing)
    }

    /// Text and absolute start of the attribute value or text node at the
    /// offset, and whether it is a `Condition` value.
    fn expression_source(&self) -> Option<(String, TextSize, bool)> {
        match (self.kind, self.node.as_ref()?) {
            (LocationKind::AttributeValue, XsNode::XsAttribute(a)) => Some((
                a.value()?.to_string(),
                a.value_range()?.start(),
                a.name().eq_ignore_ascii_case("Condition"),
            )),
            (LocationKind::ElementContent, XsNode::XsText(t)) => {
                Some((t.text(), t.range().start(), false))
            }
            _ => None,
        }
    }

    /// Parse the value or text at the offset as an expression.
    ///
    /// `None` when the location is not a value or text, when the text is
    /// not an expression, or when no expression node covers the offset.
    /// Nothing is cached; every call re-parses.
    pub fn expression(&self) -> Option<ExpressionLocation> {
        let (text, base, is_condition) = self.expression_source()?;
        let tree = if is_condition {
            expr::parse_condition(&text)
        } else {
            expr::parse_attribute_or_text(&text)
        }
        .ok()?;
        let relative = self.offset.checked_sub(base)?;
        tree.find_deepest_at(relative)?;
        Some(ExpressionLocation {
            tree,
            base,
            relative,
        })
    }

    /// The simple-list item of the attribute value or text at the offset.
    pub fn list_item(&self) -> Option<ListItemLocation> {
        let (text, base, _) = self.expression_source()?;
        let list = expr::parse_simple_list(&text);
        let relative = self.offset.checked_sub(base)?;
        let item = list.find_item_at(relative)?;
        let index = list.items().iter().position(|i| std::ptr::eq(i, item))?;
        Some(ListItemLocation { list, index, base })
    }
}

/// An expression under the cursor, with ranges made absolute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpressionLocation {
    tree: ExpressionTree,
    base: TextSize,
    relative: TextSize,
}

impl ExpressionLocation {
    pub fn tree(&self) -> &ExpressionTree {
        &self.tree
    }

    /// Absolute offset the expression's relative ranges start from.
    pub fn base(&self) -> TextSize {
        self.base
    }

    /// Deepest node at the offset.
    pub fn node(&self) -> &ExpressionNode {
        self.tree
            .find_deepest_at(self.relative)
            .unwrap_or_else(|| self.tree.root())
    }

    /// Absolute range of [`node`](Self::node).
    pub fn range(&self) -> TextRange {
        self.to_absolute(self.node().range())
    }

    /// Innermost `$()`, `@()` or `%()` reference at the offset.
    pub fn reference(&self) -> Option<&ExpressionNode> {
        self.tree
            .descendants()
            .into_iter()
            .filter(|n| n.is_reference())
            .filter(|n| n.range().start() <= self.relative && self.relative <= n.range().end())
            .min_by_key(|n| n.range().len())
    }

    pub fn to_absolute(&self, range: TextRange) -> TextRange {
        range + self.base
    }
}

/// A simple-list item under the cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListItemLocation {
    list: SimpleList,
    index: usize,
    base: TextSize,
}

impl ListItemLocation {
    pub fn list(&self) -> &SimpleList {
        &self.list
    }

    /// `SimpleListItem` or `EmptyListItem`.
    pub fn item(&self) -> &ExpressionNode {
        &self.list.items[self.index]
    }

    /// Absolute range of the trimmed item; for an empty item, its segment.
    pub fn range(&self) -> TextRange {
        self.item().range() + self.base
    }

    /// Item text, empty for an `EmptyListItem`.
    pub fn value(&self) -> &str {
        match self.item() {
            ExpressionNode::SimpleListItem { value, .. } => value,
            _ => "",
        }
    }
}
