//! Token kinds produced by the lexer
//!
//! This enum defines every token kind the element scanner understands,
//! following the SysML v2 keyword set used by the model notation.

/// All token kinds of the model notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    WHITESPACE = 0,
    LINE_COMMENT,

    // =========================================================================
    // LITERALS
    // =========================================================================
    BLOCK_COMMENT, // /* ... */ (doc text and fragment bodies)
    IDENT,         // identifier or 'unrestricted name'
    INTEGER,       // 42
    DECIMAL,       // 3.14
    STRING,        // "hello"

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    L_BRACE,        // {
    R_BRACE,        // }
    L_BRACKET,      // [
    R_BRACKET,      // ]
    L_PAREN,        // (
    R_PAREN,        // )
    SEMICOLON,      // ;
    COLON,          // :
    COLON_COLON,    // ::
    COLON_GT,       // :>  (specializes/subsets)
    COLON_GT_GT,    // :>> (redefines)
    COLON_COLON_GT, // ::> (references)
    COLON_EQ,       // :=
    DOT,            // .
    DOT_DOT,        // ..
    COMMA,          // ,
    EQ,             // =
    LT,             // <
    GT,             // >
    STAR,           // *
    STAR_STAR,      // **
    TILDE,          // ~
    HASH,           // #
    AT,             // @
    OPERATOR,       // any other expression operator (+ - / == -> ...)

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    ABSTRACT_KW,
    ACCEPT_KW,
    ACTION_KW,
    ALIAS_KW,
    ATTRIBUTE_KW,
    BY_KW,
    CASE_KW,
    COMMENT_KW,
    CONSTANT_KW,
    CONSTRAINT_KW,
    DEF_KW,
    DEFINED_KW,
    DO_KW,
    DOC_KW,
    END_KW,
    ENTRY_KW,
    EXHIBIT_KW,
    EXIT_KW,
    EXPOSE_KW,
    FIRST_KW,
    FOR_KW,
    IMPORT_KW,
    IN_KW,
    INOUT_KW,
    INTERFACE_KW,
    ITEM_KW,
    LANGUAGE_KW,
    OCCURRENCE_KW,
    OUT_KW,
    PACKAGE_KW,
    PART_KW,
    PERFORM_KW,
    PORT_KW,
    PRIVATE_KW,
    PROTECTED_KW,
    PUBLIC_KW,
    REF_KW,
    REP_KW,
    REQUIREMENT_KW,
    SATISFY_KW,
    SPECIALIZES_KW,
    STATE_KW,
    THEN_KW,
    TRANSITION_KW,
    USE_KW,
    VIA_KW,
    VIEW_KW,
    VIEWPOINT_KW,

    // =========================================================================
    // SPECIAL
    // =========================================================================
    ERROR,
}

impl SyntaxKind {
    /// Check if this is trivia (whitespace or line comment)
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::LINE_COMMENT)
    }

    /// Check if this is a keyword
    pub fn is_keyword(self) -> bool {
        (self as u16) >= (Self::ABSTRACT_KW as u16) && (self as u16) <= (Self::VIEWPOINT_KW as u16)
    }

    /// Identifiers, plus keywords used where only a name can follow
    pub fn is_name(self) -> bool {
        self == Self::IDENT || self.is_keyword()
    }

    /// Check if this token can open a namespace-visibility or modifier prefix
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            Self::ABSTRACT_KW | Self::PRIVATE_KW | Self::PROTECTED_KW | Self::PUBLIC_KW | Self::REF_KW
        )
    }

    /// Check if this token starts an element declaration
    pub fn is_declaration_start(self) -> bool {
        matches!(
            self,
            Self::PACKAGE_KW
                | Self::PART_KW
                | Self::PORT_KW
                | Self::INTERFACE_KW
                | Self::VIEW_KW
                | Self::VIEWPOINT_KW
                | Self::CONSTRAINT_KW
                | Self::USE_KW
                | Self::OCCURRENCE_KW
                | Self::ACTION_KW
                | Self::STATE_KW
                | Self::ITEM_KW
                | Self::REQUIREMENT_KW
        )
    }

    /// Check if this token is a parameter/feature direction
    pub fn is_direction(self) -> bool {
        matches!(self, Self::IN_KW | Self::OUT_KW | Self::INOUT_KW)
    }
}
