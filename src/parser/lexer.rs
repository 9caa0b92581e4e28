//! Logos-based lexer for the model notation
//!
//! Fast tokenization using the logos crate. Unterminated block comments,
//! strings and quoted names surface as `ERROR` tokens so the scanner can
//! report them with a precise location.

use super::syntax_kind::SyntaxKind;
use logos::Logos;
use text_size::TextSize;

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: TextSize,
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = TextSize::new(self.inner.span().start as u32);

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => SyntaxKind::ERROR,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Consume a block comment body up to and including the closing `*/`.
///
/// Returns `false` when the input ends first, which logos turns into an
/// error token spanning the rest of the file.
fn lex_block_comment(lex: &mut logos::Lexer<LogosToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

/// Logos token enum - maps to SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", lex_block_comment)]
    BlockComment,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"'([^'\\\n]|\\.)*'")]
    UnrestrictedName,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    Decimal,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION (must come before single-char)
    // =========================================================================
    #[token("::>")]
    ColonColonGt,

    #[token(":>>")]
    ColonGtGt,

    #[token(":>")]
    ColonGt,

    #[token("::")]
    ColonColon,

    #[token(":=")]
    ColonEq,

    #[token("..")]
    DotDot,

    #[token("**")]
    StarStar,

    #[regex(r"==|!=|<=|>=|->|&&|\|\||[+\-/%^!&|?$]")]
    Operator,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("*")]
    Star,
    #[token("~")]
    Tilde,
    #[token("#")]
    Hash,
    #[token("@")]
    At,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("abstract")]
    AbstractKw,
    #[token("accept")]
    AcceptKw,
    #[token("action")]
    ActionKw,
    #[token("alias")]
    AliasKw,
    #[token("attribute")]
    AttributeKw,
    #[token("by")]
    ByKw,
    #[token("case")]
    CaseKw,
    #[token("comment")]
    CommentKw,
    #[token("constant")]
    ConstantKw,
    #[token("constraint")]
    ConstraintKw,
    #[token("def")]
    DefKw,
    #[token("defined")]
    DefinedKw,
    #[token("do")]
    DoKw,
    #[token("doc")]
    DocKw,
    #[token("end")]
    EndKw,
    #[token("entry")]
    EntryKw,
    #[token("exhibit")]
    ExhibitKw,
    #[token("exit")]
    ExitKw,
    #[token("expose")]
    ExposeKw,
    #[token("first")]
    FirstKw,
    #[token("for")]
    ForKw,
    #[token("import")]
    ImportKw,
    #[token("in")]
    InKw,
    #[token("inout")]
    InoutKw,
    #[token("interface")]
    InterfaceKw,
    #[token("item")]
    ItemKw,
    #[token("language")]
    LanguageKw,
    #[token("occurrence")]
    OccurrenceKw,
    #[token("out")]
    OutKw,
    #[token("package")]
    PackageKw,
    #[token("part")]
    PartKw,
    #[token("perform")]
    PerformKw,
    #[token("port")]
    PortKw,
    #[token("private")]
    PrivateKw,
    #[token("protected")]
    ProtectedKw,
    #[token("public")]
    PublicKw,
    #[token("ref")]
    RefKw,
    #[token("rep")]
    RepKw,
    #[token("requirement")]
    RequirementKw,
    #[token("satisfy")]
    SatisfyKw,
    #[token("specializes")]
    SpecializesKw,
    #[token("state")]
    StateKw,
    #[token("then")]
    ThenKw,
    #[token("transition")]
    TransitionKw,
    #[token("use")]
    UseKw,
    #[token("via")]
    ViaKw,
    #[token("view")]
    ViewKw,
    #[token("viewpoint")]
    ViewpointKw,
}

impl From<LogosToken> for SyntaxKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Whitespace => SyntaxKind::WHITESPACE,
            LogosToken::LineComment => SyntaxKind::LINE_COMMENT,
            LogosToken::BlockComment => SyntaxKind::BLOCK_COMMENT,
            LogosToken::Ident | LogosToken::UnrestrictedName => SyntaxKind::IDENT,
            LogosToken::Integer => SyntaxKind::INTEGER,
            LogosToken::Decimal => SyntaxKind::DECIMAL,
            LogosToken::String => SyntaxKind::STRING,

            LogosToken::ColonColonGt => SyntaxKind::COLON_COLON_GT,
            LogosToken::ColonGtGt => SyntaxKind::COLON_GT_GT,
            LogosToken::ColonGt => SyntaxKind::COLON_GT,
            LogosToken::ColonColon => SyntaxKind::COLON_COLON,
            LogosToken::ColonEq => SyntaxKind::COLON_EQ,
            LogosToken::DotDot => SyntaxKind::DOT_DOT,
            LogosToken::StarStar => SyntaxKind::STAR_STAR,
            LogosToken::Operator => SyntaxKind::OPERATOR,

            LogosToken::LBrace => SyntaxKind::L_BRACE,
            LogosToken::RBrace => SyntaxKind::R_BRACE,
            LogosToken::LBracket => SyntaxKind::L_BRACKET,
            LogosToken::RBracket => SyntaxKind::R_BRACKET,
            LogosToken::LParen => SyntaxKind::L_PAREN,
            LogosToken::RParen => SyntaxKind::R_PAREN,
            LogosToken::Semicolon => SyntaxKind::SEMICOLON,
            LogosToken::Colon => SyntaxKind::COLON,
            LogosToken::Dot => SyntaxKind::DOT,
            LogosToken::Comma => SyntaxKind::COMMA,
            LogosToken::Eq => SyntaxKind::EQ,
            LogosToken::Lt => SyntaxKind::LT,
            LogosToken::Gt => SyntaxKind::GT,
            LogosToken::Star => SyntaxKind::STAR,
            LogosToken::Tilde => SyntaxKind::TILDE,
            LogosToken::Hash => SyntaxKind::HASH,
            LogosToken::At => SyntaxKind::AT,

            LogosToken::AbstractKw => SyntaxKind::ABSTRACT_KW,
            LogosToken::AcceptKw => SyntaxKind::ACCEPT_KW,
            LogosToken::ActionKw => SyntaxKind::ACTION_KW,
            LogosToken::AliasKw => SyntaxKind::ALIAS_KW,
            LogosToken::AttributeKw => SyntaxKind::ATTRIBUTE_KW,
            LogosToken::ByKw => SyntaxKind::BY_KW,
            LogosToken::CaseKw => SyntaxKind::CASE_KW,
            LogosToken::CommentKw => SyntaxKind::COMMENT_KW,
            LogosToken::ConstantKw => SyntaxKind::CONSTANT_KW,
            LogosToken::ConstraintKw => SyntaxKind::CONSTRAINT_KW,
            LogosToken::DefKw => SyntaxKind::DEF_KW,
            LogosToken::DefinedKw => SyntaxKind::DEFINED_KW,
            LogosToken::DoKw => SyntaxKind::DO_KW,
            LogosToken::DocKw => SyntaxKind::DOC_KW,
            LogosToken::EndKw => SyntaxKind::END_KW,
            LogosToken::EntryKw => SyntaxKind::ENTRY_KW,
            LogosToken::ExhibitKw => SyntaxKind::EXHIBIT_KW,
            LogosToken::ExitKw => SyntaxKind::EXIT_KW,
            LogosToken::ExposeKw => SyntaxKind::EXPOSE_KW,
            LogosToken::FirstKw => SyntaxKind::FIRST_KW,
            LogosToken::ForKw => SyntaxKind::FOR_KW,
            LogosToken::ImportKw => SyntaxKind::IMPORT_KW,
            LogosToken::InKw => SyntaxKind::IN_KW,
            LogosToken::InoutKw => SyntaxKind::INOUT_KW,
            LogosToken::InterfaceKw => SyntaxKind::INTERFACE_KW,
            LogosToken::ItemKw => SyntaxKind::ITEM_KW,
            LogosToken::LanguageKw => SyntaxKind::LANGUAGE_KW,
            LogosToken::OccurrenceKw => SyntaxKind::OCCURRENCE_KW,
            LogosToken::OutKw => SyntaxKind::OUT_KW,
            LogosToken::PackageKw => SyntaxKind::PACKAGE_KW,
            LogosToken::PartKw => SyntaxKind::PART_KW,
            LogosToken::PerformKw => SyntaxKind::PERFORM_KW,
            LogosToken::PortKw => SyntaxKind::PORT_KW,
            LogosToken::PrivateKw => SyntaxKind::PRIVATE_KW,
            LogosToken::ProtectedKw => SyntaxKind::PROTECTED_KW,
            LogosToken::PublicKw => SyntaxKind::PUBLIC_KW,
            LogosToken::RefKw => SyntaxKind::REF_KW,
            LogosToken::RepKw => SyntaxKind::REP_KW,
            LogosToken::RequirementKw => SyntaxKind::REQUIREMENT_KW,
            LogosToken::SatisfyKw => SyntaxKind::SATISFY_KW,
            LogosToken::SpecializesKw => SyntaxKind::SPECIALIZES_KW,
            LogosToken::StateKw => SyntaxKind::STATE_KW,
            LogosToken::ThenKw => SyntaxKind::THEN_KW,
            LogosToken::TransitionKw => SyntaxKind::TRANSITION_KW,
            LogosToken::UseKw => SyntaxKind::USE_KW,
            LogosToken::ViaKw => SyntaxKind::VIA_KW,
            LogosToken::ViewKw => SyntaxKind::VIEW_KW,
            LogosToken::ViewpointKw => SyntaxKind::VIEWPOINT_KW,
        }
    }
}
