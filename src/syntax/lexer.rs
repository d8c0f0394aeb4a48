//! Two-mode XML tokenizer built on logos.
//!
//! Outside of tags the lexer recognises markup openers and character data;
//! after `<` or `</` it morphs into the tag lexer (names, `=`, quoted
//! strings, whitespace) until `>` or `/>` morphs it back. Every byte of the
//! input ends up in exactly one token.

use logos::Logos;

use super::kind::SyntaxKind;

/// A token and the slice of source text it covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum ContentToken {
    #[token("<")]
    LAngle,
    #[token("</")]
    LAngleSlash,
    #[token("<!--", |lex| skip_past(lex, "-->"))]
    Comment,
    #[token("<![CDATA[", |lex| skip_past(lex, "]]>"))]
    CData,
    #[token("<?", |lex| skip_past(lex, "?>"))]
    ProcessingInstruction,
    #[token("<!", |lex| skip_past(lex, ">"))]
    Doctype,
    #[regex(r"[^<]+")]
    CharData,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum TagToken {
    #[token("<")]
    LAngle,
    #[token("</")]
    LAngleSlash,
    #[token(">")]
    RAngle,
    #[token("/>")]
    SlashRAngle,
    #[token("=")]
    Eq,
    #[regex(r#""[^"<]*"?"#)]
    #[regex(r#"'[^'<]*'?"#)]
    String,
    #[regex(r"[ \t\r\n]+")]
    Whitespace,
    #[regex(r#"[^ \t\r\n<>/="']+"#)]
    Name,
}

/// Consume up to and including `terminator`, or the rest of the input.
fn skip_past(lex: &mut logos::Lexer<'_, ContentToken>, terminator: &str) {
    let rest = lex.remainder();
    let len = rest
        .find(terminator)
        .map_or(rest.len(), |idx| idx + terminator.len());
    lex.bump(len);
}

impl From<ContentToken> for SyntaxKind {
    fn from(token: ContentToken) -> Self {
        match token {
            ContentToken::LAngle => SyntaxKind::L_ANGLE,
            ContentToken::LAngleSlash => SyntaxKind::L_ANGLE_SLASH,
            ContentToken::Comment => SyntaxKind::COMMENT_TOKEN,
            ContentToken::CData => SyntaxKind::CDATA_TOKEN,
            ContentToken::ProcessingInstruction => SyntaxKind::PI_TOKEN,
            ContentToken::Doctype => SyntaxKind::DOCTYPE_TOKEN,
            ContentToken::CharData => SyntaxKind::CHAR_DATA,
        }
    }
}

impl From<TagToken> for SyntaxKind {
    fn from(token: TagToken) -> Self {
        match token {
            TagToken::LAngle => SyntaxKind::L_ANGLE,
            TagToken::LAngleSlash => SyntaxKind::L_ANGLE_SLASH,
            TagToken::RAngle => SyntaxKind::R_ANGLE,
            TagToken::SlashRAngle => SyntaxKind::SLASH_R_ANGLE,
            TagToken::Eq => SyntaxKind::EQ,
            TagToken::String => SyntaxKind::STRING,
            TagToken::Whitespace => SyntaxKind::WHITESPACE,
            TagToken::Name => SyntaxKind::NAME,
        }
    }
}

/// Tokenize project XML.
pub(crate) fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut content = ContentToken::lexer(text);

    'outer: loop {
        loop {
            let Some(result) = content.next() else {
                break 'outer;
            };
            let kind = result.map_or(SyntaxKind::ERROR_TOKEN, SyntaxKind::from);
            tokens.push(Token {
                kind,
                text: content.slice(),
            });
            if matches!(kind, SyntaxKind::L_ANGLE | SyntaxKind::L_ANGLE_SLASH) {
                break;
            }
        }

        let mut tag: logos::Lexer<'_, TagToken> = content.morph();
        loop {
            let Some(result) = tag.next() else {
                break 'outer;
            };
            let kind = result.map_or(SyntaxKind::ERROR_TOKEN, SyntaxKind::from);
            tokens.push(Token {
                kind,
                text: tag.slice(),
            });
            if matches!(kind, SyntaxKind::R_ANGLE | SyntaxKind::SLASH_R_ANGLE) {
                break;
            }
        }
        content = tag.morph();
    }

    tokens
}
