//! Syntax kinds and the rowan language tag for project XML.

/// Kinds of tokens and nodes in the lossless XML tree.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // Tokens
    /// `<`
    L_ANGLE = 0,
    /// `</`
    L_ANGLE_SLASH,
    /// `>`
    R_ANGLE,
    /// `/>`
    SLASH_R_ANGLE,
    /// `=`
    EQ,
    /// `"` or `'` around an attribute value
    QUOTE,
    NAME,
    WHITESPACE,
    CHAR_DATA,
    /// Attribute value text between the quotes
    VALUE_TEXT,
    /// A quoted string as produced by the lexer; split by the parser
    STRING,
    COMMENT_TOKEN,
    CDATA_TOKEN,
    PI_TOKEN,
    DOCTYPE_TOKEN,
    ERROR_TOKEN,

    // Nodes
    DOCUMENT,
    ELEMENT,
    START_TAG,
    END_TAG,
    ATTRIBUTE,
    ATTRIBUTE_VALUE,
    CONTENT_TEXT,
    CONTENT_WHITESPACE,
    COMMENT,
    CDATA,
    PROCESSING_INSTRUCTION,
    DOCTYPE,
    ERROR,
}

use SyntaxKind::*;

impl SyntaxKind {
    const ALL: [SyntaxKind; 29] = [
        L_ANGLE,
        L_ANGLE_SLASH,
        R_ANGLE,
        SLASH_R_ANGLE,
        EQ,
        QUOTE,
        NAME,
        WHITESPACE,
        CHAR_DATA,
        VALUE_TEXT,
        STRING,
        COMMENT_TOKEN,
        CDATA_TOKEN,
        PI_TOKEN,
        DOCTYPE_TOKEN,
        ERROR_TOKEN,
        DOCUMENT,
        ELEMENT,
        START_TAG,
        END_TAG,
        ATTRIBUTE,
        ATTRIBUTE_VALUE,
        CONTENT_TEXT,
        CONTENT_WHITESPACE,
        COMMENT,
        CDATA,
        PROCESSING_INSTRUCTION,
        DOCTYPE,
        ERROR,
    ];

    fn from_raw(raw: u16) -> Self {
        Self::ALL.get(raw as usize).copied().unwrap_or(ERROR)
    }

    pub fn is_token(self) -> bool {
        (self as u16) < (DOCUMENT as u16)
    }

    /// Tokens that typing at their end would make longer.
    ///
    /// Used for the left-preference tie-break when an offset sits between
    /// two tokens.
    pub fn is_extendable(self) -> bool {
        matches!(
            self,
            NAME | CHAR_DATA | VALUE_TEXT | WHITESPACE | L_ANGLE | L_ANGLE_SLASH
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Rowan language tag for project XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum XmlLanguage {}

impl rowan::Language for XmlLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> SyntaxKind {
        SyntaxKind::from_raw(raw.0)
    }

    fn kind_to_raw(kind: SyntaxKind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<XmlLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<XmlLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<XmlLanguage>;
