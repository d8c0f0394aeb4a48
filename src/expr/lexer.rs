//! Tokenizer for embedded expressions.

use logos::Logos;

use crate::base::{TextRange, TextSize};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tok {
    #[token("$(")]
    PropertyOpen,
    #[token("@(")]
    ItemOpen,
    #[token("%(")]
    MetadataOpen,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("'")]
    #[token("&apos;")]
    #[token("&quot;")]
    Quote,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    #[token("&lt;")]
    Lt,
    #[token("<=")]
    #[token("&lt;=")]
    LtEq,
    #[token(">")]
    #[token("&gt;")]
    Gt,
    #[token(">=")]
    #[token("&gt;=")]
    GtEq,
    #[token("!")]
    Bang,
    #[token("->")]
    Arrow,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,
    #[regex(r"[ \t\r\n]+")]
    Whitespace,
    /// `-` may join name characters but never ends a name, so `X->` is
    /// `X` followed by an arrow.
    #[regex(r"[A-Za-z_]([A-Za-z0-9_]|-[A-Za-z0-9_])*")]
    Ident,
    #[regex(r"[0-9]+")]
    Number,
    /// Anything the grammar gives no meaning to. Character and entity
    /// references other than the operator and quote entities are kept
    /// whole so their `;` never splits a list.
    #[regex(r"&(#[0-9]+|#x[0-9A-Fa-f]+|[A-Za-z_][A-Za-z0-9_.-]*);", priority = 1)]
    Text,
}

impl Tok {
    pub(crate) fn is_comparison(self) -> bool {
        matches!(
            self,
            Tok::EqEq | Tok::NotEq | Tok::Lt | Tok::LtEq | Tok::Gt | Tok::GtEq
        )
    }

    pub(crate) fn opens(self) -> bool {
        matches!(
            self,
            Tok::PropertyOpen | Tok::ItemOpen | Tok::MetadataOpen | Tok::LParen
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Lexed {
    pub kind: Tok,
    pub range: TextRange,
}

pub(crate) fn tokenize(text: &str) -> Vec<Lexed> {
    let mut lexer = Tok::lexer(text);
    let mut tokens: Vec<Lexed> = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let range = TextRange::new(
            TextSize::try_from(span.start).unwrap_or_default(),
            TextSize::try_from(span.end).unwrap_or_default(),
        );
        let kind = result.unwrap_or(Tok::Text);
        // Adjacent unrecognized characters form one text token.
        if kind == Tok::Text {
            if let Some(last) = tokens.last_mut().filter(|t| t.kind == Tok::Text) {
                last.range = last.range.cover(range);
                continue;
            }
        }
        tokens.push(Lexed { kind, range });
    }
    tokens
}
