//! Expression tree types.
//!
//! All ranges are relative to the start of the parsed string; callers add
//! the start of the containing attribute value or text node.

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::{TextRange, TextSize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
    Not,
}

/// A node of the embedded expression language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpressionNode {
    /// Plain text, whitespace included.
    Literal { range: TextRange, value: SmolStr },
    /// A name inside a reference or a function call.
    Symbol { range: TextRange, name: SmolStr },
    /// `$(Name)`. Property functions (`$(Name.Trim())`,
    /// `$([System.IO.Path]::Combine(..))`) span the whole `$(...)`.
    PropertyReference {
        range: TextRange,
        name: Option<Box<ExpressionNode>>,
        is_function: bool,
    },
    /// `@(Type)`, `@(Type->'%(Filename)')`, `@(Type, ';')`.
    ItemGroupReference {
        range: TextRange,
        item_type: Option<Box<ExpressionNode>>,
        transform: Option<Box<ExpressionNode>>,
        separator: Option<Box<ExpressionNode>>,
    },
    /// `%(Name)` or `%(Type.Name)`.
    ItemMetadataReference {
        range: TextRange,
        item_type: Option<Box<ExpressionNode>>,
        metadata: Option<Box<ExpressionNode>>,
    },
    /// `'...'` with its content.
    QuotedString {
        range: TextRange,
        parts: Vec<ExpressionNode>,
    },
    /// `Exists('...')`.
    FunctionCall {
        range: TextRange,
        name: Box<ExpressionNode>,
        arguments: Vec<ExpressionNode>,
    },
    /// `( ... )`
    Group {
        range: TextRange,
        inner: Box<ExpressionNode>,
    },
    /// Literal text and references written back to back.
    Concat {
        range: TextRange,
        parts: Vec<ExpressionNode>,
    },
    Compare {
        range: TextRange,
        op: CompareOp,
        left: Box<ExpressionNode>,
        right: Box<ExpressionNode>,
    },
    /// `And`/`Or` have two operands, `!` has one.
    BooleanOp {
        range: TextRange,
        op: BoolOp,
        operands: Vec<ExpressionNode>,
    },
    SimpleList(SimpleList),
    /// A non-empty list segment. `range` is the trimmed item, `segment`
    /// the text between the separators.
    SimpleListItem {
        range: TextRange,
        segment: TextRange,
        value: SmolStr,
        expression: Box<ExpressionNode>,
    },
    /// An empty or whitespace-only segment; zero-length for `;;`.
    EmptyListItem { range: TextRange },
}

impl ExpressionNode {
    pub fn range(&self) -> TextRange {
        match self {
            Self::Literal { range, .. }
            | Self::Symbol { range, .. }
            | Self::PropertyReference { range, .. }
            | Self::ItemGroupReference { range, .. }
            | Self::ItemMetadataReference { range, .. }
            | Self::QuotedString { range, .. }
            | Self::FunctionCall { range, .. }
            | Self::Group { range, .. }
            | Self::Concat { range, .. }
            | Self::Compare { range, .. }
            | Self::BooleanOp { range, .. }
            | Self::SimpleListItem { range, .. }
            | Self::EmptyListItem { range } => *range,
            Self::SimpleList(list) => list.range,
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&ExpressionNode> {
        fn opt(node: &Option<Box<ExpressionNode>>) -> Option<&ExpressionNode> {
            node.as_deref()
        }
        match self {
            Self::Literal { .. } | Self::Symbol { .. } | Self::EmptyListItem { .. } => Vec::new(),
            Self::PropertyReference { name, .. } => opt(name).into_iter().collect(),
            Self::ItemGroupReference {
                item_type,
                transform,
                separator,
                ..
            } => [opt(item_type), opt(transform), opt(separator)]
                .into_iter()
                .flatten()
                .collect(),
            Self::ItemMetadataReference {
                item_type,
                metadata,
                ..
            } => [opt(item_type), opt(metadata)].into_iter().flatten().collect(),
            Self::QuotedString { parts, .. } | Self::Concat { parts, .. } => parts.iter().collect(),
            Self::FunctionCall {
                name, arguments, ..
            } => std::iter::once(name.as_ref()).chain(arguments).collect(),
            Self::Group { inner, .. } => vec![inner.as_ref()],
            Self::Compare { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Self::BooleanOp { operands, .. } => operands.iter().collect(),
            Self::SimpleList(list) => list.items.iter().collect(),
            Self::SimpleListItem { expression, .. } => vec![expression.as_ref()],
        }
    }

    /// Name of a symbol, or of the symbol a reference or call names.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Symbol { name, .. } => Some(name),
            Self::PropertyReference { name, .. } => name.as_deref()?.name(),
            Self::ItemGroupReference { item_type, .. } => item_type.as_deref()?.name(),
            Self::ItemMetadataReference { metadata, .. } => metadata.as_deref()?.name(),
            Self::FunctionCall { name, .. } => name.name(),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Self::PropertyReference { .. }
                | Self::ItemGroupReference { .. }
                | Self::ItemMetadataReference { .. }
        )
    }

    /// Preorder walk including `self`.
    pub fn descendants(&self) -> Vec<&ExpressionNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children().into_iter().rev());
        }
        out
    }

    /// Deepest node whose range contains `offset`, end inclusive.
    ///
    /// When the offset is shared by two siblings (the end of one and the
    /// start of the next) the left one wins, so a position right after a
    /// typed character resolves to the node being typed.
    pub fn find_deepest_at(&self, offset: TextSize) -> Option<&ExpressionNode> {
        if !contains_inclusive(self.range(), offset) {
            return None;
        }
        let mut node = self;
        while let Some(child) = node
            .children()
            .into_iter()
            .find(|c| contains_inclusive(c.range(), offset))
        {
            node = child;
        }
        Some(node)
    }
}

fn contains_inclusive(range: TextRange, offset: TextSize) -> bool {
    range.start() <= offset && offset <= range.end()
}

/// A semicolon-separated list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleList {
    pub range: TextRange,
    /// `SimpleListItem` and `EmptyListItem` nodes in order.
    pub items: Vec<ExpressionNode>,
}

impl SimpleList {
    pub fn items(&self) -> &[ExpressionNode] {
        &self.items
    }

    /// The item whose segment contains `offset`, end inclusive.
    ///
    /// Segments are separated by at least one `;`, so at most one matches.
    pub fn find_item_at(&self, offset: TextSize) -> Option<&ExpressionNode> {
        self.items.iter().find(|item| {
            let segment = match item {
                ExpressionNode::SimpleListItem { segment, .. } => *segment,
                other => other.range(),
            };
            contains_inclusive(segment, offset)
        })
    }

    /// Trimmed values of the non-empty items.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            ExpressionNode::SimpleListItem { value, .. } => Some(value.as_str()),
            _ => None,
        })
    }
}

/// A successfully parsed attribute value or text node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpressionTree {
    root: ExpressionNode,
}

impl ExpressionTree {
    pub(crate) fn new(root: ExpressionNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &ExpressionNode {
        &self.root
    }

    pub fn into_root(self) -> ExpressionNode {
        self.root
    }

    pub fn find_deepest_at(&self, offset: TextSize) -> Option<&ExpressionNode> {
        self.root.find_deepest_at(offset)
    }

    pub fn descendants(&self) -> Vec<&ExpressionNode> {
        self.root.descendants()
    }

    pub fn property_references(&self) -> impl Iterator<Item = &ExpressionNode> {
        self.descendants()
            .into_iter()
            .filter(|n| matches!(n, ExpressionNode::PropertyReference { .. }))
    }

    pub fn item_references(&self) -> impl Iterator<Item = &ExpressionNode> {
        self.descendants()
            .into_iter()
            .filter(|n| matches!(n, ExpressionNode::ItemGroupReference { .. }))
    }

    pub fn metadata_references(&self) -> impl Iterator<Item = &ExpressionNode> {
        self.descendants()
            .into_iter()
            .filter(|n| matches!(n, ExpressionNode::ItemMetadataReference { .. }))
    }
}

/// The input is not an expression.
///
/// A routine negative result, not a fault.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ExpressionError {
    pub message: String,
    /// Relative offset where parsing stopped.
    pub offset: TextSize,
}

impl ExpressionError {
    pub(crate) fn new(message: impl Into<String>, offset: TextSize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}
