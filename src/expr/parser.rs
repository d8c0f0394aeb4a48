//! Recursive-descent parser for attribute values and element text.
//!
//! A value is first split on top-level `;`. Each segment is then read
//! either as a condition (`'$(A)' == 'x' And !Exists('f')`) when it
//! contains condition syntax, or as a text run in which literal text and
//! `$()`, `@()`, `%()` references alternate and whitespace is literal.
//! A segment that only contains operators in the middle of other text is
//! tried as a condition first and read as a text run if that fails.
//! `Condition` attributes go through [`parse_condition`] instead, which
//! never splits and never falls back.
//!
//! Input is raw attribute or text content, so `&lt;`, `&gt;`, `&apos;`
//! and `&quot;` act as the characters they encode and every other entity
//! reference is literal text.

use smol_str::SmolStr;

use super::lexer::{Lexed, Tok, tokenize};
use super::node::{BoolOp, CompareOp, ExpressionError, ExpressionNode, ExpressionTree, SimpleList};
use crate::base::{TextRange, TextSize};

type ParseResult<T> = Result<T, ExpressionError>;

/// Parse an attribute value or text node.
///
/// A value with top-level `;` becomes a [`ExpressionNode::SimpleList`];
/// otherwise the single expression is the root.
pub fn parse_attribute_or_text(text: &str) -> Result<ExpressionTree, ExpressionError> {
    let tokens = tokenize(text);
    let segments = split_segments(&tokens, TextSize::of(text));

    if segments.len() == 1 {
        let seg = &segments[0];
        let root = Parser::new(text, &tokens[seg.tokens.clone()], seg.range).segment()?;
        return Ok(ExpressionTree::new(root));
    }

    let mut items = Vec::with_capacity(segments.len());
    for seg in &segments {
        let parser = Parser::new(text, &tokens[seg.tokens.clone()], seg.range);
        items.push(list_item(text, seg, parser.segment()?));
    }
    let list = SimpleList {
        range: TextRange::up_to(TextSize::of(text)),
        items,
    };
    Ok(ExpressionTree::new(ExpressionNode::SimpleList(list)))
}

/// Parse the value of a `Condition` attribute.
///
/// The whole value is one condition; an empty value is a literal.
pub fn parse_condition(text: &str) -> Result<ExpressionTree, ExpressionError> {
    let tokens = tokenize(text);
    let range = TextRange::up_to(TextSize::of(text));
    let mut parser = Parser::new(text, &tokens, range);
    parser.skip_ws();
    if parser.peek().is_none() {
        return Ok(ExpressionTree::new(parser.literal(range)));
    }
    Ok(ExpressionTree::new(parser.condition()?))
}

/// Parse a semicolon-separated list. Never fails; segments that are not
/// valid expressions keep their trimmed text as a literal.
pub fn parse_simple_list(text: &str) -> SimpleList {
    let tokens = tokenize(text);
    let items = split_segments(&tokens, TextSize::of(text))
        .iter()
        .map(|seg| {
            let parser = Parser::new(text, &tokens[seg.tokens.clone()], seg.range);
            let expression = parser.segment().unwrap_or_else(|_| {
                let range = trim(text, seg.range);
                ExpressionNode::Literal {
                    range,
                    value: SmolStr::new(&text[range]),
                }
            });
            list_item(text, seg, expression)
        })
        .collect();
    SimpleList {
        range: TextRange::up_to(TextSize::of(text)),
        items,
    }
}

fn list_item(text: &str, seg: &Segment, expression: ExpressionNode) -> ExpressionNode {
    let range = trim(text, seg.range);
    if range.is_empty() {
        return ExpressionNode::EmptyListItem { range: seg.range };
    }
    ExpressionNode::SimpleListItem {
        range,
        segment: seg.range,
        value: SmolStr::new(&text[range]),
        expression: Box::new(expression),
    }
}

fn trim(text: &str, range: TextRange) -> TextRange {
    let slice = &text[range];
    let leading = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim();
    let start = range.start() + TextSize::try_from(leading).unwrap_or_default();
    TextRange::at(start, TextSize::of(trimmed))
}

struct Segment {
    range: TextRange,
    tokens: std::ops::Range<usize>,
}

/// Split at `;` outside quotes and parentheses.
fn split_segments(tokens: &[Lexed], len: TextSize) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = TextSize::from(0);
    let mut first = 0;

    for (i, tok) in tokens.iter().enumerate() {
        match tok.kind {
            Tok::Quote => in_quote = !in_quote,
            kind if kind.opens() && !in_quote => depth += 1,
            Tok::RParen if !in_quote => depth = depth.saturating_sub(1),
            Tok::Semicolon if depth == 0 && !in_quote => {
                segments.push(Segment {
                    range: TextRange::new(start, tok.range.start()),
                    tokens: first..i,
                });
                start = tok.range.end();
                first = i + 1;
            }
            _ => {}
        }
    }
    segments.push(Segment {
        range: TextRange::new(start, len),
        tokens: first..tokens.len(),
    });
    segments
}

/// How a segment reads before parsing.
enum Shape {
    /// Starts like a condition: a quote, a parenthesis, `!` or a call.
    Condition,
    /// Has comparison or `and`/`or` operators somewhere inside.
    Operators,
    Text,
}

struct Parser<'a> {
    text: &'a str,
    tokens: &'a [Lexed],
    pos: usize,
    range: TextRange,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, tokens: &'a [Lexed], range: TextRange) -> Self {
        Self {
            text,
            tokens,
            pos: 0,
            range,
        }
    }

    fn peek(&self) -> Option<Lexed> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<Tok> {
        self.peek().map(|t| t.kind)
    }

    fn nth_kind(&self, n: usize) -> Option<Tok> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<Lexed> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    /// Offset of the next token, or the end of the segment.
    fn offset(&self) -> TextSize {
        self.peek().map_or(self.range.end(), |t| t.range.start())
    }

    fn slice(&self, range: TextRange) -> &'a str {
        &self.text[range]
    }

    fn skip_ws(&mut self) {
        while self.peek_kind() == Some(Tok::Whitespace) {
            self.pos += 1;
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> ParseResult<T> {
        Err(ExpressionError::new(message, self.offset()))
    }

    fn is_keyword(&self, tok: Lexed, keyword: &str) -> bool {
        tok.kind == Tok::Ident && self.slice(tok.range).eq_ignore_ascii_case(keyword)
    }

    // ------------------------------------------------------------------
    // Segment
    // ------------------------------------------------------------------

    fn segment(mut self) -> ParseResult<ExpressionNode> {
        match self.shape() {
            Shape::Condition => return self.condition(),
            Shape::Operators => {
                let mut attempt = Parser::new(self.text, self.tokens, self.range);
                if let Ok(node) = attempt.condition() {
                    return Ok(node);
                }
            }
            Shape::Text => {}
        }

        let start = self.range.start();
        let parts = self.text_run(|_| false)?;
        Ok(self.concat(parts, TextRange::new(start, self.range.end())))
    }

    /// A whole condition; trailing tokens are an error.
    fn condition(&mut self) -> ParseResult<ExpressionNode> {
        self.skip_ws();
        let node = self.or_expr()?;
        self.skip_ws();
        if let Some(tok) = self.peek() {
            let found = self.slice(tok.range);
            return self.error(format!("unexpected `{found}`"));
        }
        Ok(node)
    }

    fn shape(&self) -> Shape {
        let first = self
            .tokens
            .iter()
            .position(|t| t.kind != Tok::Whitespace);
        let Some(first) = first else {
            return Shape::Text;
        };
        match self.tokens[first].kind {
            Tok::Quote | Tok::LParen | Tok::Bang => return Shape::Condition,
            Tok::Ident if self.tokens.get(first + 1).map(|t| t.kind) == Some(Tok::LParen) => {
                return Shape::Condition;
            }
            _ => {}
        }

        let mut depth = 0usize;
        let mut in_quote = false;
        for (i, tok) in self.tokens.iter().enumerate() {
            match tok.kind {
                Tok::Quote => in_quote = !in_quote,
                _ if in_quote => {}
                kind if kind.opens() => depth += 1,
                Tok::RParen => depth = depth.saturating_sub(1),
                kind if depth == 0 && kind.is_comparison() => return Shape::Operators,
                Tok::Ident if depth == 0 => {
                    let spaced = |j: Option<usize>| {
                        j.and_then(|j| self.tokens.get(j))
                            .is_some_and(|t| t.kind == Tok::Whitespace)
                    };
                    let keyword = self.is_keyword(*tok, "and") || self.is_keyword(*tok, "or");
                    if keyword && spaced(i.checked_sub(1)) && spaced(Some(i + 1)) {
                        return Shape::Operators;
                    }
                }
                _ => {}
            }
        }
        Shape::Text
    }

    fn concat(&self, mut parts: Vec<ExpressionNode>, range: TextRange) -> ExpressionNode {
        match parts.len() {
            0 => ExpressionNode::Literal {
                range,
                value: SmolStr::default(),
            },
            1 => parts.remove(0),
            _ => {
                let range = parts[0].range().cover(parts[parts.len() - 1].range());
                ExpressionNode::Concat { range, parts }
            }
        }
    }

    /// Literal text and references until `stop` matches or input ends.
    fn text_run(&mut self, stop: impl Fn(Tok) -> bool) -> ParseResult<Vec<ExpressionNode>> {
        let mut parts = Vec::new();
        let mut literal: Option<TextRange> = None;

        while let Some(tok) = self.peek() {
            if stop(tok.kind) {
                break;
            }
            let reference = match tok.kind {
                Tok::PropertyOpen => Some(self.property_reference()?),
                Tok::ItemOpen => Some(self.item_reference()?),
                Tok::MetadataOpen => Some(self.metadata_reference()?),
                _ => None,
            };
            match reference {
                Some(node) => {
                    if let Some(range) = literal.take() {
                        parts.push(self.literal(range));
                    }
                    parts.push(node);
                }
                None => {
                    self.bump();
                    literal = Some(literal.map_or(tok.range, |r| r.cover(tok.range)));
                }
            }
        }
        if let Some(range) = literal {
            parts.push(self.literal(range));
        }
        Ok(parts)
    }

    fn literal(&self, range: TextRange) -> ExpressionNode {
        ExpressionNode::Literal {
            range,
            value: SmolStr::new(self.slice(range)),
        }
    }

    fn symbol(&mut self) -> Option<Box<ExpressionNode>> {
        let tok = self.peek().filter(|t| t.kind == Tok::Ident)?;
        self.bump();
        Some(Box::new(ExpressionNode::Symbol {
            range: tok.range,
            name: SmolStr::new(self.slice(tok.range)),
        }))
    }

    fn expect_close(&mut self, what: &str) -> ParseResult<TextSize> {
        match self.bump() {
            Some(tok) if tok.kind == Tok::RParen => Ok(tok.range.end()),
            Some(tok) => Err(ExpressionError::new(
                format!("unexpected `{}` in {what}", self.slice(tok.range)),
                tok.range.start(),
            )),
            None => self.error(format!("unterminated {what}")),
        }
    }

    /// Skip to the `)` matching an already consumed opener, honouring
    /// nested parentheses and quotes.
    fn skip_balanced(&mut self, what: &str) -> ParseResult<TextSize> {
        let mut depth = 1usize;
        let mut in_quote = false;
        while let Some(tok) = self.bump() {
            match tok.kind {
                Tok::Quote => in_quote = !in_quote,
                _ if in_quote => {}
                kind if kind.opens() => depth += 1,
                Tok::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(tok.range.end());
                    }
                }
                _ => {}
            }
        }
        self.error(format!("unterminated {what}"))
    }

    // ------------------------------------------------------------------
    // References
    // ------------------------------------------------------------------

    fn property_reference(&mut self) -> ParseResult<ExpressionNode> {
        let start = self.bump().map_or(self.offset(), |t| t.range.start());
        self.skip_ws();
        let name = self.symbol();
        self.skip_ws();

        let (end, is_function) = match self.peek_kind() {
            Some(Tok::RParen) => (self.expect_close("property reference")?, false),
            None => return self.error("unterminated property reference"),
            Some(Tok::Dot) if name.is_some() => (self.skip_balanced("property reference")?, true),
            Some(Tok::Text) if name.is_none() && self.peek_starts_with('[') => {
                (self.skip_balanced("property reference")?, true)
            }
            Some(_) => {
                let found = self.peek().map_or("", |t| self.slice(t.range));
                return self.error(format!("unexpected `{found}` in property reference"));
            }
        };

        Ok(ExpressionNode::PropertyReference {
            range: TextRange::new(start, end),
            name,
            is_function,
        })
    }

    fn peek_starts_with(&self, c: char) -> bool {
        self.peek()
            .is_some_and(|t| self.slice(t.range).starts_with(c))
    }

    fn item_reference(&mut self) -> ParseResult<ExpressionNode> {
        let start = self.bump().map_or(self.offset(), |t| t.range.start());
        self.skip_ws();
        let item_type = self.symbol();
        self.skip_ws();

        let mut transform = None;
        if self.peek_kind() == Some(Tok::Arrow) {
            self.bump();
            self.skip_ws();
            transform = Some(Box::new(self.transform()?));
            self.skip_ws();
        }

        let mut separator = None;
        if self.peek_kind() == Some(Tok::Comma) {
            self.bump();
            self.skip_ws();
            if self.peek_kind() != Some(Tok::Quote) {
                return self.error("expected a quoted separator");
            }
            separator = Some(Box::new(self.quoted_string()?));
            self.skip_ws();
        }

        let end = self.expect_close("item reference")?;
        Ok(ExpressionNode::ItemGroupReference {
            range: TextRange::new(start, end),
            item_type,
            transform,
            separator,
        })
    }

    /// `'%(Filename)%(Extension)'` or an item function such as `Distinct()`.
    fn transform(&mut self) -> ParseResult<ExpressionNode> {
        match self.peek_kind() {
            Some(Tok::Quote) => self.quoted_string(),
            Some(Tok::Ident) if self.nth_kind(1) == Some(Tok::LParen) => {
                let name = self.symbol().ok_or_else(|| {
                    ExpressionError::new("expected an item function", self.offset())
                })?;
                let start = name.range().start();
                self.bump();
                let arguments = self.arguments()?;
                let end = self.expect_close("item function")?;
                Ok(ExpressionNode::FunctionCall {
                    range: TextRange::new(start, end),
                    name,
                    arguments,
                })
            }
            _ => self.error("expected a transform"),
        }
    }

    fn metadata_reference(&mut self) -> ParseResult<ExpressionNode> {
        let start = self.bump().map_or(self.offset(), |t| t.range.start());
        self.skip_ws();
        let first = self.symbol();
        self.skip_ws();

        let (item_type, metadata) = if self.peek_kind() == Some(Tok::Dot) {
            self.bump();
            self.skip_ws();
            let metadata = self.symbol();
            self.skip_ws();
            (first, metadata)
        } else {
            (None, first)
        };

        let end = self.expect_close("metadata reference")?;
        Ok(ExpressionNode::ItemMetadataReference {
            range: TextRange::new(start, end),
            item_type,
            metadata,
        })
    }

    // ------------------------------------------------------------------
    // Conditions
    // ------------------------------------------------------------------

    fn or_expr(&mut self) -> ParseResult<ExpressionNode> {
        let mut left = self.and_expr()?;
        while self.at_keyword("or") {
            self.bump();
            self.skip_ws();
            let right = self.and_expr()?;
            left = binary(BoolOp::Or, left, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> ParseResult<ExpressionNode> {
        let mut left = self.not_expr()?;
        while self.at_keyword("and") {
            self.bump();
            self.skip_ws();
            let right = self.not_expr()?;
            left = binary(BoolOp::And, left, right);
        }
        Ok(left)
    }

    fn at_keyword(&mut self, keyword: &str) -> bool {
        self.skip_ws();
        self.peek().is_some_and(|t| self.is_keyword(t, keyword))
    }

    fn not_expr(&mut self) -> ParseResult<ExpressionNode> {
        self.skip_ws();
        if self.peek_kind() == Some(Tok::Bang) {
            let start = self.bump().map_or(self.offset(), |t| t.range.start());
            let operand = self.not_expr()?;
            return Ok(ExpressionNode::BooleanOp {
                range: TextRange::new(start, operand.range().end()),
                op: BoolOp::Not,
                operands: vec![operand],
            });
        }
        self.compare_expr()
    }

    fn compare_expr(&mut self) -> ParseResult<ExpressionNode> {
        let left = self.operand()?;
        self.skip_ws();
        let op = match self.peek_kind() {
            Some(Tok::EqEq) => CompareOp::Eq,
            Some(Tok::NotEq) => CompareOp::NotEq,
            Some(Tok::Lt) => CompareOp::Lt,
            Some(Tok::LtEq) => CompareOp::LtEq,
            Some(Tok::Gt) => CompareOp::Gt,
            Some(Tok::GtEq) => CompareOp::GtEq,
            _ => return Ok(left),
        };
        self.bump();
        self.skip_ws();
        let right = self.operand()?;
        Ok(ExpressionNode::Compare {
            range: left.range().cover(right.range()),
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn operand(&mut self) -> ParseResult<ExpressionNode> {
        self.skip_ws();
        match self.peek_kind() {
            None => self.error("missing operand"),
            Some(Tok::Quote) => self.quoted_string(),
            Some(Tok::LParen) => {
                let start = self.bump().map_or(self.offset(), |t| t.range.start());
                let inner = self.or_expr()?;
                self.skip_ws();
                let end = match self.bump() {
                    Some(tok) if tok.kind == Tok::RParen => tok.range.end(),
                    _ => return self.error("unbalanced parenthesis"),
                };
                Ok(ExpressionNode::Group {
                    range: TextRange::new(start, end),
                    inner: Box::new(inner),
                })
            }
            Some(Tok::Ident) if self.nth_kind(1) == Some(Tok::LParen) => self.function_call(),
            Some(_) => {
                if let Some(tok) = self.peek() {
                    if self.is_keyword(tok, "and") || self.is_keyword(tok, "or") {
                        return self.error("missing operand");
                    }
                }
                let start = self.offset();
                let parts = self.text_run(|kind| {
                    kind == Tok::Whitespace
                        || kind == Tok::Quote
                        || kind == Tok::Bang
                        || kind == Tok::LParen
                        || kind == Tok::RParen
                        || kind == Tok::Comma
                        || kind.is_comparison()
                })?;
                if parts.is_empty() {
                    return self.error("missing operand");
                }
                Ok(self.concat(parts, TextRange::empty(start)))
            }
        }
    }

    fn function_call(&mut self) -> ParseResult<ExpressionNode> {
        let name = self
            .symbol()
            .ok_or_else(|| ExpressionError::new("expected a function name", self.offset()))?;
        let start = name.range().start();
        self.bump(); // `(`
        let arguments = self.arguments()?;
        let end = match self.bump() {
            Some(tok) if tok.kind == Tok::RParen => tok.range.end(),
            _ => return self.error("unbalanced parenthesis"),
        };
        Ok(ExpressionNode::FunctionCall {
            range: TextRange::new(start, end),
            name,
            arguments,
        })
    }

    /// Comma-separated arguments up to, not including, `)`.
    fn arguments(&mut self) -> ParseResult<Vec<ExpressionNode>> {
        let mut arguments = Vec::new();
        self.skip_ws();
        if self.peek_kind() == Some(Tok::RParen) {
            return Ok(arguments);
        }
        loop {
            arguments.push(self.or_expr()?);
            self.skip_ws();
            if self.peek_kind() == Some(Tok::Comma) {
                self.bump();
                continue;
            }
            return Ok(arguments);
        }
    }

    fn quoted_string(&mut self) -> ParseResult<ExpressionNode> {
        let start = self.bump().map_or(self.offset(), |t| t.range.start());
        let parts = self.text_run(|kind| kind == Tok::Quote)?;
        let end = match self.bump() {
            Some(tok) if tok.kind == Tok::Quote => tok.range.end(),
            _ => return self.error("unterminated quote"),
        };
        Ok(ExpressionNode::QuotedString {
            range: TextRange::new(start, end),
            parts,
        })
    }
}

fn binary(op: BoolOp, left: ExpressionNode, right: ExpressionNode) -> ExpressionNode {
    ExpressionNode::BooleanOp {
        range: left.range().cover(right.range()),
        op,
        operands: vec![left, right],
    }
}
