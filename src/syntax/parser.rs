//! Error-tolerant parser producing a lossless rowan tree.
//!
//! The parser never fails. Malformed input is recorded as [`SyntaxError`]s
//! and recovered from so that the location inspector keeps working while a
//! document is being typed:
//!
//! - an unterminated start tag closes its element with no content;
//! - an end tag naming an ancestor closes every element opened since;
//! - an end tag naming nothing open is wrapped in an `ERROR` node;
//! - `</` without a name closes the current element.

use rowan::{GreenNode, GreenNodeBuilder};
use rustc_hash::FxHashSet;
use thiserror::Error;

use super::kind::SyntaxKind::{self, *};
use super::lexer::{Token, tokenize};
use crate::base::{TextRange, TextSize};

/// A malformed-XML diagnostic.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

pub(crate) fn parse(text: &str) -> (GreenNode, Vec<SyntaxError>) {
    if is_binary(text) {
        let mut builder = GreenNodeBuilder::new();
        builder.start_node(DOCUMENT.into());
        if !text.is_empty() {
            builder.token(ERROR_TOKEN.into(), text);
        }
        builder.finish_node();
        let error = SyntaxError::new(
            "document is not XML text",
            TextRange::up_to(TextSize::of(text)),
        );
        return (builder.finish(), vec![error]);
    }

    let mut parser = Parser::new(tokenize(text));
    parser.document();
    (parser.builder.finish(), parser.errors)
}

fn is_binary(text: &str) -> bool {
    text.chars()
        .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
}

/// XML name check: a start character followed by name characters.
pub(crate) fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c == ':' || unicode_ident::is_xid_start(c) => {}
        _ => return false,
    }
    chars.all(|c| matches!(c, '-' | '.' | ':' | '_') || unicode_ident::is_xid_continue(c))
}

fn is_xml_whitespace(text: &str) -> bool {
    text.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
}

enum TagEnd {
    Open,
    SelfClosed,
    Unterminated,
}

struct Parser<'t> {
    tokens: Vec<Token<'t>>,
    pos: usize,
    offset: TextSize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
    /// Names of the elements whose content is being parsed, outermost first.
    open: Vec<&'t str>,
}

impl<'t> Parser<'t> {
    fn new(tokens: Vec<Token<'t>>) -> Self {
        Self {
            tokens,
            pos: 0,
            offset: TextSize::from(0),
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            open: Vec::new(),
        }
    }

    fn nth(&self, n: usize) -> Option<Token<'t>> {
        self.tokens.get(self.pos + n).copied()
    }

    fn current(&self) -> Option<SyntaxKind> {
        self.nth(0).map(|t| t.kind)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == Some(kind)
    }

    fn current_range(&self) -> TextRange {
        let len = self.nth(0).map_or(TextSize::from(0), |t| TextSize::of(t.text));
        TextRange::at(self.offset, len)
    }

    fn bump(&mut self) {
        if let Some(token) = self.nth(0) {
            self.bump_as(token.kind);
        }
    }

    fn bump_as(&mut self, kind: SyntaxKind) {
        if let Some(token) = self.nth(0) {
            self.builder.token(kind.into(), token.text);
            self.offset += TextSize::of(token.text);
            self.pos += 1;
        }
    }

    fn start(&mut self, kind: SyntaxKind) {
        self.builder.start_node(kind.into());
    }

    fn finish(&mut self) {
        self.builder.finish_node();
    }

    fn error(&mut self, message: impl Into<String>, range: TextRange) {
        self.errors.push(SyntaxError::new(message, range));
    }

    /// Name of the end tag at the cursor; `Some(None)` for a nameless `</`.
    fn end_tag_name(&self) -> Option<Option<&'t str>> {
        if !self.at(L_ANGLE_SLASH) {
            return None;
        }
        Some(self.nth(1).filter(|t| t.kind == NAME).map(|t| t.text))
    }

    fn document(&mut self) {
        self.start(DOCUMENT);
        let mut roots = 0usize;

        while let Some(kind) = self.current() {
            match kind {
                L_ANGLE => {
                    let range = self.current_range();
                    self.element();
                    roots += 1;
                    if roots == 2 {
                        self.error("document has more than one root element", range);
                    }
                }
                L_ANGLE_SLASH => self.stray_end_tag(),
                CHAR_DATA if !is_xml_whitespace(self.nth(0).map_or("", |t| t.text)) => {
                    let range = self.current_range();
                    self.error("text is not allowed outside the root element", range);
                    self.content_item();
                }
                _ => self.content_item(),
            }
        }

        if roots == 0 {
            self.error("document has no root element", TextRange::empty(self.offset));
        }
        self.finish();
    }

    fn element(&mut self) {
        self.start(ELEMENT);
        self.start(START_TAG);
        self.bump(); // `<`

        let name = match self.nth(0) {
            Some(token) if token.kind == NAME => {
                if !is_valid_name(token.text) {
                    let range = self.current_range();
                    self.error(format!("`{}` is not a valid element name", token.text), range);
                }
                self.bump();
                Some(token.text)
            }
            _ => {
                self.error("expected an element name", TextRange::empty(self.offset));
                None
            }
        };

        let mut seen = FxHashSet::default();
        let end = loop {
            match self.current() {
                Some(WHITESPACE) => self.bump(),
                Some(NAME) => self.attribute(&mut seen),
                Some(R_ANGLE) => {
                    self.bump();
                    break TagEnd::Open;
                }
                Some(SLASH_R_ANGLE) => {
                    self.bump();
                    break TagEnd::SelfClosed;
                }
                Some(STRING | EQ | ERROR_TOKEN) => {
                    let range = self.current_range();
                    self.error("unexpected text in start tag", range);
                    self.start(ERROR);
                    self.bump_as(ERROR_TOKEN);
                    self.finish();
                }
                _ => {
                    let tag = name.unwrap_or("");
                    self.error(
                        format!("start tag `<{tag}` is not terminated"),
                        TextRange::empty(self.offset),
                    );
                    break TagEnd::Unterminated;
                }
            }
        };
        self.finish(); // START_TAG

        match (end, name) {
            (TagEnd::Open, Some(name)) => {
                self.open.push(name);
                self.element_content(name);
                self.open.pop();
            }
            (TagEnd::Open, None) => {}
            (TagEnd::SelfClosed | TagEnd::Unterminated, _) => {}
        }
        self.finish(); // ELEMENT
    }

    fn element_content(&mut self, name: &'t str) {
        loop {
            match self.current() {
                None => {
                    self.error(
                        format!("element `{name}` is not closed"),
                        TextRange::empty(self.offset),
                    );
                    return;
                }
                Some(L_ANGLE) => self.element(),
                Some(L_ANGLE_SLASH) => match self.end_tag_name() {
                    Some(None) => {
                        self.end_tag(Some(name));
                        return;
                    }
                    Some(Some(end)) if end == name => {
                        self.end_tag(Some(name));
                        return;
                    }
                    Some(Some(end)) if self.closes_ancestor(end) => {
                        let range = self.current_range();
                        self.error(format!("element `{name}` is not closed"), range);
                        return;
                    }
                    _ => self.stray_end_tag(),
                },
                Some(_) => self.content_item(),
            }
        }
    }

    fn closes_ancestor(&self, end: &str) -> bool {
        let ancestors = &self.open[..self.open.len().saturating_sub(1)];
        ancestors.iter().any(|open| *open == end)
    }

    fn end_tag(&mut self, expected: Option<&str>) {
        self.start(END_TAG);
        self.bump(); // `</`
        match self.nth(0) {
            Some(token) if token.kind == NAME => self.bump(),
            _ => {
                if let Some(expected) = expected {
                    self.error(
                        format!("expected `{expected}` in end tag"),
                        TextRange::empty(self.offset),
                    );
                }
            }
        }
        loop {
            match self.current() {
                Some(WHITESPACE) => self.bump(),
                Some(R_ANGLE) => {
                    self.bump();
                    break;
                }
                Some(NAME | EQ | STRING | ERROR_TOKEN | SLASH_R_ANGLE) => {
                    let range = self.current_range();
                    self.error("unexpected text in end tag", range);
                    self.start(ERROR);
                    self.bump_as(ERROR_TOKEN);
                    self.finish();
                }
                _ => {
                    self.error("end tag is not terminated", TextRange::empty(self.offset));
                    break;
                }
            }
        }
        self.finish();
    }

    fn stray_end_tag(&mut self) {
        let start = self.offset;
        let name = self.end_tag_name().flatten().unwrap_or("");
        self.start(ERROR);
        self.end_tag(None);
        self.finish();
        self.error(
            format!("unexpected end tag `</{name}>`"),
            TextRange::new(start, self.offset),
        );
    }

    fn attribute(&mut self, seen: &mut FxHashSet<&'t str>) {
        self.start(ATTRIBUTE);
        if let Some(token) = self.nth(0) {
            let range = self.current_range();
            if !is_valid_name(token.text) {
                self.error(format!("`{}` is not a valid attribute name", token.text), range);
            }
            if !seen.insert(token.text) {
                self.error(format!("duplicate attribute `{}`", token.text), range);
            }
        }
        self.bump(); // NAME

        if self.at(WHITESPACE) && self.nth(1).is_some_and(|t| t.kind == EQ) {
            self.bump();
        }
        if self.at(EQ) {
            self.bump();
            if self.at(WHITESPACE) && self.nth(1).is_some_and(|t| t.kind == STRING) {
                self.bump();
            }
            if self.at(STRING) {
                self.attribute_value();
            } else {
                self.error("expected an attribute value", TextRange::empty(self.offset));
            }
        } else {
            self.error("expected `=` after attribute name", TextRange::empty(self.offset));
        }
        self.finish();
    }

    /// Split a lexed quoted string into `QUOTE VALUE_TEXT? QUOTE?`.
    fn attribute_value(&mut self) {
        let Some(token) = self.nth(0) else {
            return;
        };
        let text = token.text;
        let quote = &text[..1];
        let closed = text.len() >= 2 && text.ends_with(quote);
        let inner_end = if closed { text.len() - 1 } else { text.len() };

        self.start(ATTRIBUTE_VALUE);
        self.builder.token(QUOTE.into(), quote);
        if inner_end > 1 {
            self.builder.token(VALUE_TEXT.into(), &text[1..inner_end]);
        }
        if closed {
            self.builder.token(QUOTE.into(), &text[inner_end..]);
        }
        self.finish();

        let range = self.current_range();
        self.offset += TextSize::of(text);
        self.pos += 1;
        if !closed {
            self.error("attribute value is not terminated", range);
        }
    }

    fn content_item(&mut self) {
        let Some(token) = self.nth(0) else {
            return;
        };
        let range = self.current_range();
        match token.kind {
            CHAR_DATA if is_xml_whitespace(token.text) => {
                self.start(CONTENT_WHITESPACE);
                self.bump_as(WHITESPACE);
                self.finish();
            }
            CHAR_DATA => {
                self.start(CONTENT_TEXT);
                self.bump();
                self.finish();
            }
            COMMENT_TOKEN => {
                self.raw_node(COMMENT);
                if token.text.len() < 7 || !token.text.ends_with("-->") {
                    self.error("comment is not terminated", range);
                }
            }
            CDATA_TOKEN => {
                self.raw_node(CDATA);
                if token.text.len() < 12 || !token.text.ends_with("]]>") {
                    self.error("CDATA section is not terminated", range);
                }
            }
            PI_TOKEN => {
                self.raw_node(PROCESSING_INSTRUCTION);
                if token.text.len() < 4 || !token.text.ends_with("?>") {
                    self.error("processing instruction is not terminated", range);
                }
            }
            DOCTYPE_TOKEN => self.raw_node(DOCTYPE),
            _ => {
                self.error(format!("unexpected `{}`", token.text), range);
                self.start(ERROR);
                self.bump_as(ERROR_TOKEN);
                self.finish();
            }
        }
    }

    fn raw_node(&mut self, kind: SyntaxKind) {
        self.start(kind);
        self.bump();
        self.finish();
    }
}
