//! Recursive descent element scanner
//!
//! Walks the token stream of one source unit and emits a flat list of
//! [`Element`]s with resolved qualified names. Per-declaration state (member
//! lists, the "current state" of a machine body, transitions waiting for a
//! source) lives in an explicit [`ElementBuilder`] accumulator that is
//! threaded through the scan and finished into an immutable element.
//!
//! Block comments are single opaque tokens, so fragment bodies and doc text
//! never take part in brace balancing.

use std::path::Path;

use smol_str::SmolStr;
use text_size::TextSize;
use tracing::trace;

use super::errors::{ErrorCode, ParseError};
use super::lexer::{Lexer, Token};
use super::syntax_kind::SyntaxKind;
use crate::base::constants::{normalize_reference, strip_quotes};
use crate::base::{LineIndex, Position, SourceLocation, Span};
use crate::syntax::{
    Alias, Attribute, Cardinality, Constant, ConstraintParam, Direction, Element, ElementData,
    ElementKind, FlowKind, FlowProperty, Fragment, InterfaceEnd, Parameter, PerformData,
    PerformUsage, SatisfyRef, StatePort, TransitionDecl,
};

type ParseResult<T> = Result<T, ParseError>;

/// Parse one source unit into its elements, ordered by declaration offset.
pub fn parse_unit(path: &Path, text: &str) -> ParseResult<Vec<Element>> {
    let tokens: Vec<Token<'_>> = Lexer::new(text)
        .filter(|t| !t.kind.is_trivia())
        .collect();
    let mut parser = Parser::new(path, text, &tokens);
    let mut out = Vec::new();
    parser.parse_source_file(&mut out)?;
    out.sort_by_key(|(offset, _)| *offset);
    trace!(file = %path.display(), elements = out.len(), "parsed source unit");
    Ok(out.into_iter().map(|(_, element)| element).collect())
}

// ============================================================================
// Element accumulator
// ============================================================================

/// An `accept` found in a state body that has no current state of its own.
/// It is handed to the enclosing machine with this state as its source.
#[derive(Debug, Clone)]
struct PendingAccept {
    name: Option<SmolStr>,
    signal: String,
    target: SmolStr,
    location: SourceLocation,
}

/// Accumulator for one declaration while its body is scanned
#[derive(Debug)]
struct ElementBuilder {
    offset: TextSize,
    qname: String,
    name: SmolStr,
    short_name: Option<SmolStr>,
    is_def: bool,
    supertypes: Vec<String>,
    doc: Option<String>,
    satisfies: Vec<SatisfyRef>,
    start: Position,
    data: ElementData,
    /// Most recently declared child state
    current_state: Option<SmolStr>,
    pending_accepts: Vec<PendingAccept>,
}

impl ElementBuilder {
    fn kind(&self) -> ElementKind {
        self.data.kind()
    }

    fn finish(self, location: SourceLocation) -> Element {
        Element {
            qname: self.qname,
            name: self.name,
            short_name: self.short_name,
            is_def: self.is_def,
            supertypes: self.supertypes,
            doc: self.doc,
            satisfies: self.satisfies,
            location,
            data: self.data,
        }
    }
}

/// Elements collected so far, keyed by declaration offset
type Collected = Vec<(TextSize, Element)>;

// ============================================================================
// Parser
// ============================================================================

/// Token cursor over one source unit
struct Parser<'a> {
    path: &'a Path,
    text: &'a str,
    tokens: &'a [Token<'a>],
    pos: usize,
    line_index: LineIndex,
}

impl<'a> Parser<'a> {
    fn new(path: &'a Path, text: &'a str, tokens: &'a [Token<'a>]) -> Self {
        Self {
            path,
            text,
            tokens,
            pos: 0,
            line_index: LineIndex::new(text),
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> SyntaxKind {
        self.nth(0)
    }

    fn current_text(&self) -> &'a str {
        self.current().map(|t| t.text).unwrap_or("")
    }

    fn nth(&self, n: usize) -> SyntaxKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::ERROR)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        !self.at_eof() && self.current_kind() == kind
    }

    /// At an identifier or a keyword standing in name position
    fn at_name(&self) -> bool {
        !self.at_eof() && self.current_kind().is_name()
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind, code: ErrorCode, what: &str) -> ParseResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error_here(code, format!("expected {what}")))
        }
    }

    fn expect_semicolon(&mut self) -> ParseResult<()> {
        self.expect(SyntaxKind::SEMICOLON, ErrorCode::E0201, "';'")
    }

    // =========================================================================
    // Positions and errors
    // =========================================================================

    fn offset(&self) -> TextSize {
        self.current()
            .map(|t| t.offset)
            .unwrap_or_else(|| TextSize::new(self.text.len() as u32))
    }

    fn position_at(&self, offset: TextSize) -> Position {
        let lc = self.line_index.line_col(offset);
        Position::new(lc.line as usize, lc.col as usize)
    }

    /// End position of the previously consumed token
    fn previous_end(&self) -> Position {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(t) => self.position_at(t.offset + TextSize::of(t.text)),
            None => Position::new(0, 0),
        }
    }

    fn location_at(&self, offset: TextSize) -> SourceLocation {
        let start = self.position_at(offset);
        SourceLocation::new(self.path, Span::new(start, start))
    }

    fn error_at(&self, offset: TextSize, code: ErrorCode, message: impl Into<String>) -> ParseError {
        ParseError::new(self.location_at(offset), code, message)
    }

    fn error_here(&self, code: ErrorCode, message: impl Into<String>) -> ParseError {
        if self.at(SyntaxKind::ERROR) {
            return self.lexical_error();
        }
        let found = if self.at_eof() {
            "end of file".to_string()
        } else {
            format!("'{}'", self.current_text())
        };
        self.error_at(self.offset(), code, format!("{}, found {found}", message.into()))
    }

    /// Error for an `ERROR` token produced by the lexer
    fn lexical_error(&self) -> ParseError {
        let text = self.current_text();
        let (code, message) = if text.starts_with("/*") {
            (ErrorCode::E0103, "unterminated block comment or fragment body".to_string())
        } else if text.starts_with('"') {
            (ErrorCode::E0102, ErrorCode::E0102.default_message().to_string())
        } else if text.starts_with('\'') {
            (ErrorCode::E0101, "unterminated quoted name".to_string())
        } else {
            (ErrorCode::E0101, format!("invalid character '{text}'"))
        };
        self.error_at(self.offset(), code, message)
    }

    fn misplaced(&self, offset: TextSize, statement: &str, owner: Option<ElementKind>) -> ParseError {
        let context = match owner {
            Some(kind) => format!("a {kind}"),
            None => "the top level".to_string(),
        };
        self.error_at(
            offset,
            ErrorCode::E0304,
            format!("'{statement}' is not valid in {context}"),
        )
    }

    /// Source text between two offsets, trimmed
    fn slice(&self, start: TextSize, end: TextSize) -> String {
        self.text[usize::from(start)..usize::from(end)].trim().to_string()
    }

    // =========================================================================
    // Grammar rules: names and references
    // =========================================================================

    /// Name = IDENT | Keyword | 'quoted name'
    fn parse_name(&mut self) -> ParseResult<SmolStr> {
        if self.at_name() {
            let name = strip_quotes(self.current_text());
            self.bump();
            Ok(SmolStr::new(name))
        } else {
            Err(self.error_here(ErrorCode::E0301, "expected a name"))
        }
    }

    /// ShortName = '<' Name '>'
    fn parse_short_name(&mut self) -> ParseResult<Option<SmolStr>> {
        if !self.eat(SyntaxKind::LT) {
            return Ok(None);
        }
        let name = self.parse_name()?;
        self.expect(SyntaxKind::GT, ErrorCode::E0902, "'>'")?;
        Ok(Some(name))
    }

    /// Reference = '~'? Name (('::' | '.') (Name | '*' | '**'))*
    ///
    /// Returned in normalized dot-separated form.
    fn parse_reference(&mut self) -> ParseResult<String> {
        self.eat(SyntaxKind::TILDE);
        if !self.at_name() {
            return Err(self.error_here(ErrorCode::E0301, "expected a reference"));
        }
        let start = self.offset();
        self.bump();
        while matches!(self.current_kind(), SyntaxKind::COLON_COLON | SyntaxKind::DOT)
            && !self.at_eof()
        {
            match self.nth(1) {
                kind if kind.is_name() => {
                    self.bump();
                    self.bump();
                }
                SyntaxKind::STAR | SyntaxKind::STAR_STAR => {
                    self.bump();
                    self.bump();
                }
                _ => break,
            }
        }
        let end = self.prev_token_end();
        Ok(normalize_reference(&self.text[usize::from(start)..usize::from(end)]))
    }

    fn prev_token_end(&self) -> TextSize {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(t) => t.offset + TextSize::of(t.text),
            None => TextSize::new(0),
        }
    }

    /// Multiplicity = '[' (INTEGER | '*') ('..' (INTEGER | '*'))? ']'
    fn parse_cardinality(&mut self) -> ParseResult<Cardinality> {
        if !self.eat(SyntaxKind::L_BRACKET) {
            return Ok(Cardinality::One);
        }
        let lower = self.parse_bound()?;
        let upper = if self.eat(SyntaxKind::DOT_DOT) {
            self.parse_bound()?
        } else {
            lower
        };
        self.expect(SyntaxKind::R_BRACKET, ErrorCode::E0902, "']'")?;
        Ok(match (lower, upper) {
            (_, None) => Cardinality::Many,
            (Some(0), Some(1)) => Cardinality::Optional,
            (_, Some(n)) if n > 1 => Cardinality::Many,
            _ => Cardinality::One,
        })
    }

    /// A multiplicity bound; `None` means unbounded
    fn parse_bound(&mut self) -> ParseResult<Option<u64>> {
        match self.current_kind() {
            SyntaxKind::STAR if !self.at_eof() => {
                self.bump();
                Ok(None)
            }
            SyntaxKind::INTEGER if !self.at_eof() => {
                let value = self.current_text().parse::<u64>().unwrap_or(u64::MAX);
                self.bump();
                Ok(Some(value))
            }
            _ => Err(self.error_here(ErrorCode::E0902, "expected a multiplicity bound")),
        }
    }

    /// TypedBy = ':' Reference Multiplicity?
    fn parse_typed_by(&mut self) -> ParseResult<(Option<String>, Cardinality)> {
        let mut cardinality = self.parse_cardinality()?;
        let mut ty = None;
        if self.eat(SyntaxKind::COLON) || self.eat(SyntaxKind::COLON_GT) {
            ty = Some(self.parse_reference()?);
            if cardinality == Cardinality::One {
                cardinality = self.parse_cardinality()?;
            }
        }
        Ok((ty, cardinality))
    }

    /// Text up to (not including) the next `;` or `{` at depth zero
    fn parse_value_text(&mut self) -> ParseResult<String> {
        let start = self.offset();
        let mut depth = 0usize;
        while !self.at_eof() {
            match self.current_kind() {
                SyntaxKind::SEMICOLON | SyntaxKind::L_BRACE if depth == 0 => break,
                SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET => depth += 1,
                SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET => depth = depth.saturating_sub(1),
                SyntaxKind::R_BRACE => break,
                SyntaxKind::ERROR => return Err(self.lexical_error()),
                _ => {}
            }
            self.bump();
        }
        Ok(self.slice(start, self.offset()))
    }

    /// Consume `;` or a `{ ... }` body that is not scanned for members
    fn parse_statement_end(&mut self) -> ParseResult<()> {
        if self.at(SyntaxKind::L_BRACE) {
            self.skip_block()
        } else {
            self.expect_semicolon()
        }
    }

    // =========================================================================
    // Recovery-free skipping
    // =========================================================================

    /// Skip a balanced `{ ... }` block starting at the current `{`
    fn skip_block(&mut self) -> ParseResult<()> {
        let open = self.offset();
        self.bump();
        let mut depth = 1usize;
        while depth > 0 {
            if self.at_eof() {
                return Err(self.error_at(open, ErrorCode::E0202, "unclosed brace"));
            }
            match self.current_kind() {
                SyntaxKind::L_BRACE => depth += 1,
                SyntaxKind::R_BRACE => depth -= 1,
                SyntaxKind::ERROR => return Err(self.lexical_error()),
                _ => {}
            }
            self.bump();
        }
        Ok(())
    }

    /// Skip an unsupported statement: up to `;` or through one balanced block
    fn skip_statement(&mut self) -> ParseResult<()> {
        let start = self.offset();
        while !self.at_eof() {
            match self.current_kind() {
                SyntaxKind::SEMICOLON => {
                    self.bump();
                    return Ok(());
                }
                SyntaxKind::L_BRACE => return self.skip_block(),
                SyntaxKind::R_BRACE => return Ok(()),
                SyntaxKind::ERROR => return Err(self.lexical_error()),
                _ => self.bump(),
            }
        }
        Err(self.error_at(start, ErrorCode::E0201, "statement is not terminated"))
    }

    // =========================================================================
    // Grammar rules: source file and bodies
    // =========================================================================

    /// SourceFile = Member*
    fn parse_source_file(&mut self, out: &mut Collected) -> ParseResult<()> {
        while !self.at_eof() {
            if self.at(SyntaxKind::R_BRACE) {
                return Err(self.error_here(ErrorCode::E0205, "unexpected closing brace"));
            }
            self.parse_member(None, out)?;
        }
        Ok(())
    }

    /// Body = '{' Member* '}'
    fn parse_body(&mut self, owner: &mut ElementBuilder, out: &mut Collected) -> ParseResult<()> {
        let open = self.offset();
        self.bump();
        loop {
            if self.at_eof() {
                return Err(self
                    .error_at(open, ErrorCode::E0202, "unclosed brace")
                    .with_hint(format!("the body of '{}' is never closed", owner.qname)));
            }
            if self.eat(SyntaxKind::R_BRACE) {
                return Ok(());
            }
            self.parse_member(Some(&mut *owner), out)?;
        }
    }

    /// Member = Modifier* (Declaration | MemberStatement)
    fn parse_member(
        &mut self,
        mut owner: Option<&mut ElementBuilder>,
        out: &mut Collected,
    ) -> ParseResult<()> {
        let start = self.offset();
        while self.current_kind().is_modifier() && !self.at_eof() {
            self.bump();
        }
        if self.at_eof() {
            return Err(self.error_here(ErrorCode::E0901, "expected a declaration"));
        }
        let owner_kind = owner.as_ref().map(|b| b.kind());

        match self.current_kind() {
            SyntaxKind::ERROR => Err(self.lexical_error()),
            SyntaxKind::BLOCK_COMMENT => {
                self.bump();
                Ok(())
            }
            SyntaxKind::PACKAGE_KW => self.parse_declaration(ElementKind::Package, owner, out),
            SyntaxKind::PART_KW => self.parse_declaration(ElementKind::Part, owner, out),
            SyntaxKind::PORT_KW => self.parse_declaration(ElementKind::Port, owner, out),
            SyntaxKind::INTERFACE_KW => self.parse_declaration(ElementKind::Interface, owner, out),
            SyntaxKind::VIEW_KW => self.parse_declaration(ElementKind::View, owner, out),
            SyntaxKind::VIEWPOINT_KW => self.parse_declaration(ElementKind::Viewpoint, owner, out),
            SyntaxKind::CONSTRAINT_KW => {
                self.parse_declaration(ElementKind::Constraint, owner, out)
            }
            SyntaxKind::OCCURRENCE_KW => {
                self.parse_declaration(ElementKind::Occurrence, owner, out)
            }
            SyntaxKind::ACTION_KW => self.parse_declaration(ElementKind::Action, owner, out),
            SyntaxKind::STATE_KW => self.parse_declaration(ElementKind::State, owner, out),
            SyntaxKind::ITEM_KW => self.parse_declaration(ElementKind::Item, owner, out),
            SyntaxKind::REQUIREMENT_KW => {
                self.parse_declaration(ElementKind::Requirement, owner, out)
            }
            SyntaxKind::USE_KW if self.nth(1) == SyntaxKind::CASE_KW => {
                self.bump();
                self.parse_declaration(ElementKind::UseCase, owner, out)
            }
            SyntaxKind::ATTRIBUTE_KW if self.nth(1) == SyntaxKind::DEF_KW => {
                self.parse_declaration(ElementKind::AttributeDef, owner, out)
            }
            SyntaxKind::ATTRIBUTE_KW => self.parse_attribute_member(owner, start, owner_kind),
            SyntaxKind::CONSTANT_KW => self.parse_constant(owner, start, owner_kind),
            SyntaxKind::PERFORM_KW => self.parse_perform(owner, start, owner_kind, out),
            SyntaxKind::EXHIBIT_KW => self.parse_exhibit(owner, start, owner_kind),
            SyntaxKind::REP_KW => self.parse_fragment(owner, start, owner_kind),
            SyntaxKind::IN_KW | SyntaxKind::OUT_KW | SyntaxKind::INOUT_KW => {
                self.parse_directed_member(owner, start, owner_kind)
            }
            SyntaxKind::ACCEPT_KW => self.parse_accept(owner, start, owner_kind),
            SyntaxKind::TRANSITION_KW => self.parse_transition(owner, start),
            SyntaxKind::ENTRY_KW | SyntaxKind::DO_KW | SyntaxKind::EXIT_KW => {
                self.parse_state_action(owner, start, owner_kind)
            }
            SyntaxKind::END_KW => self.parse_interface_end(owner, start, owner_kind),
            SyntaxKind::EXPOSE_KW => self.parse_expose(owner, start, owner_kind),
            SyntaxKind::SATISFY_KW => self.parse_satisfy(owner, start, owner_kind),
            SyntaxKind::ALIAS_KW => self.parse_alias(owner, start, owner_kind),
            SyntaxKind::DOC_KW => {
                let doc = self.parse_doc()?;
                if let Some(owner) = owner.as_deref_mut() {
                    owner.doc.get_or_insert(doc);
                }
                Ok(())
            }
            SyntaxKind::COMMENT_KW => self.parse_comment(),
            _ => {
                trace!(token = self.current_text(), "skipping unsupported statement");
                self.skip_statement()
            }
        }
    }

    // =========================================================================
    // Grammar rules: declarations
    // =========================================================================

    /// Declaration = Keyword 'def'? ShortName? Name Multiplicity? Specialization* (';' | Body)
    fn parse_declaration(
        &mut self,
        kind: ElementKind,
        mut parent: Option<&mut ElementBuilder>,
        out: &mut Collected,
    ) -> ParseResult<()> {
        let offset = self.offset();
        let start = self.position_at(offset);
        self.bump();
        let is_def = self.eat(SyntaxKind::DEF_KW);
        let short_name = self.parse_short_name()?;

        // Anonymous and redefining usages carry no name to index.
        if !is_def && !self.at_name() && !self.at(SyntaxKind::ERROR) {
            trace!(kind = %kind, "skipping anonymous usage");
            return self.skip_statement();
        }
        let name = self.parse_name()?;
        self.parse_cardinality()?;
        let supertypes = self.parse_specializations()?;

        let kind = if kind == ElementKind::AttributeDef
            && supertypes.is_empty()
            && self.at(SyntaxKind::SEMICOLON)
        {
            ElementKind::Signal
        } else {
            kind
        };

        let qname = match parent.as_deref() {
            Some(p) => format!("{}.{}", p.qname, name),
            None => name.to_string(),
        };
        let mut builder = ElementBuilder {
            offset,
            qname,
            name,
            short_name,
            is_def,
            supertypes,
            doc: None,
            satisfies: Vec::new(),
            start,
            data: ElementData::empty(kind),
            current_state: None,
            pending_accepts: Vec::new(),
        };

        if self.at(SyntaxKind::L_BRACE) {
            self.parse_body(&mut builder, out)?;
        } else if !self.eat(SyntaxKind::SEMICOLON) {
            return Err(self.error_here(ErrorCode::E0307, "expected ';' or '{'"));
        }

        if kind == ElementKind::State {
            if let Some(parent) = parent.as_deref_mut() {
                attach_child_state(parent, &mut builder);
            }
        }
        if let Some(pending) = builder.pending_accepts.first() {
            return Err(ParseError::new(
                pending.location.clone(),
                ErrorCode::E0703,
                format!(
                    "accept of '{}' in '{}' has no source state",
                    pending.signal, builder.qname
                ),
            ));
        }

        let location = SourceLocation::new(self.path, Span::new(builder.start, self.previous_end()));
        trace!(qname = %builder.qname, kind = %kind, "declared element");
        out.push((builder.offset, builder.finish(location)));
        Ok(())
    }

    /// Specialization = (':' | ':>' | ':>>' | '::>' | 'specializes' | 'defined' 'by') Reference (',' Reference)*
    fn parse_specializations(&mut self) -> ParseResult<Vec<String>> {
        let mut supertypes = Vec::new();
        loop {
            match self.current_kind() {
                _ if self.at_eof() => break,
                SyntaxKind::COLON
                | SyntaxKind::COLON_GT
                | SyntaxKind::COLON_GT_GT
                | SyntaxKind::COLON_COLON_GT
                | SyntaxKind::SPECIALIZES_KW => self.bump(),
                SyntaxKind::DEFINED_KW => {
                    self.bump();
                    self.expect(SyntaxKind::BY_KW, ErrorCode::E0902, "'by'")?;
                }
                SyntaxKind::EQ | SyntaxKind::COLON_EQ => {
                    // Value bindings on usages are not captured.
                    self.bump();
                    self.parse_value_text()?;
                    continue;
                }
                _ => break,
            }
            loop {
                supertypes.push(self.parse_reference()?);
                self.parse_cardinality()?;
                if !self.eat(SyntaxKind::COMMA) {
                    break;
                }
            }
        }
        Ok(supertypes)
    }

    // =========================================================================
    // Grammar rules: member statements
    // =========================================================================

    /// Attribute = 'attribute' Name TypedBy? (('=' | ':=') Value)? (';' | '{' doc? '}')
    fn parse_attribute_member(
        &mut self,
        owner: Option<&mut ElementBuilder>,
        start: TextSize,
        owner_kind: Option<ElementKind>,
    ) -> ParseResult<()> {
        self.bump();
        if matches!(
            self.current_kind(),
            SyntaxKind::COLON_GT_GT | SyntaxKind::COLON_GT | SyntaxKind::COLON_COLON_GT
        ) {
            // `attribute :>> x = 1;` redefinitions are not captured
            return self.skip_statement();
        }
        if !self.at_name() {
            return Err(self.error_here(ErrorCode::E0301, "expected an attribute name"));
        }
        let name = self.parse_name()?;
        let (ty, cardinality) = self.parse_typed_by()?;
        let default = if self.eat(SyntaxKind::EQ) || self.eat(SyntaxKind::COLON_EQ) {
            Some(self.parse_value_text()?)
        } else {
            None
        };
        let doc = if self.at(SyntaxKind::L_BRACE) {
            self.parse_annotation_block()?
        } else {
            self.expect_semicolon()?;
            None
        };
        let attribute = Attribute {
            name,
            ty,
            cardinality,
            default,
            doc,
        };
        match owner.map(|b| &mut b.data) {
            Some(ElementData::Part(d)) => d.attributes.push(attribute),
            Some(ElementData::Port(d)) => d.attributes.push(attribute),
            Some(
                ElementData::Occurrence(d) | ElementData::AttributeDef(d) | ElementData::Item(d),
            ) => d.attributes.push(attribute),
            _ => return Err(self.misplaced(start, "attribute", owner_kind)),
        }
        Ok(())
    }

    /// A `{ ... }` block after a feature; only its `doc` is kept
    fn parse_annotation_block(&mut self) -> ParseResult<Option<String>> {
        let open = self.offset();
        self.bump();
        let mut doc = None;
        loop {
            if self.at_eof() {
                return Err(self.error_at(open, ErrorCode::E0202, "unclosed brace"));
            }
            match self.current_kind() {
                SyntaxKind::R_BRACE => {
                    self.bump();
                    return Ok(doc);
                }
                SyntaxKind::DOC_KW => {
                    let text = self.parse_doc()?;
                    doc.get_or_insert(text);
                }
                SyntaxKind::BLOCK_COMMENT => self.bump(),
                SyntaxKind::ERROR => return Err(self.lexical_error()),
                _ => self.skip_statement()?,
            }
        }
    }

    /// Constant = 'constant' Name ':' Type '=' Value ';'
    fn parse_constant(
        &mut self,
        owner: Option<&mut ElementBuilder>,
        start: TextSize,
        owner_kind: Option<ElementKind>,
    ) -> ParseResult<()> {
        self.bump();
        let name = self.parse_name()?;
        let (ty, _) = self.parse_typed_by()?;
        let Some(ty) = ty else {
            return Err(self.error_here(ErrorCode::E0305, "expected ':' and a type for constant"));
        };
        self.expect(SyntaxKind::EQ, ErrorCode::E0902, "'=' and a value for constant")?;
        let value = self.parse_value_text()?;
        self.parse_statement_end()?;
        match owner.map(|b| &mut b.data) {
            Some(ElementData::Part(d)) => d.constants.push(Constant { name, ty, value }),
            _ => return Err(self.misplaced(start, "constant", owner_kind)),
        }
        Ok(())
    }

    /// Perform = 'perform' 'action'? Name (':' Reference)? (';' | Body)
    fn parse_perform(
        &mut self,
        owner: Option<&mut ElementBuilder>,
        start: TextSize,
        owner_kind: Option<ElementKind>,
        out: &mut Collected,
    ) -> ParseResult<()> {
        let start_pos = self.position_at(start);
        self.bump();
        if self.nth(1).is_name() {
            self.eat(SyntaxKind::ACTION_KW);
        }
        let reference = self.parse_reference()?;
        let behavior = if self.eat(SyntaxKind::COLON) || self.eat(SyntaxKind::COLON_GT) {
            self.parse_reference()?
        } else {
            reference.clone()
        };
        self.parse_statement_end()?;

        let Some(owner) = owner else {
            return Err(self.misplaced(start, "perform", owner_kind));
        };
        let ElementData::Part(part) = &mut owner.data else {
            return Err(self.misplaced(start, "perform", owner_kind));
        };
        let usage = SmolStr::new(crate::base::constants::last_segment(&reference));
        part.performs.push(PerformUsage {
            usage: usage.clone(),
            behavior: behavior.clone(),
        });

        let location = SourceLocation::new(self.path, Span::new(start_pos, self.previous_end()));
        let element = Element {
            qname: format!("{}.{}", owner.qname, usage),
            name: usage,
            short_name: None,
            is_def: false,
            supertypes: Vec::new(),
            doc: None,
            satisfies: Vec::new(),
            location,
            data: ElementData::PerformAction(PerformData { behavior }),
        };
        out.push((start, element));
        Ok(())
    }

    /// Exhibit = 'exhibit' 'state'? Name (':' Reference)? (';' | Body)
    fn parse_exhibit(
        &mut self,
        owner: Option<&mut ElementBuilder>,
        start: TextSize,
        owner_kind: Option<ElementKind>,
    ) -> ParseResult<()> {
        self.bump();
        if self.nth(1).is_name() {
            self.eat(SyntaxKind::STATE_KW);
        }
        let name = self.parse_reference()?;
        let target = if self.eat(SyntaxKind::COLON) || self.eat(SyntaxKind::COLON_GT) {
            self.parse_reference()?
        } else {
            name
        };
        self.parse_statement_end()?;
        match owner.map(|b| &mut b.data) {
            Some(ElementData::Part(d)) => d.exhibits.push(target),
            _ => return Err(self.misplaced(start, "exhibit", owner_kind)),
        }
        Ok(())
    }

    /// Fragment = 'rep' Name 'language' STRING BLOCK_COMMENT
    fn parse_fragment(
        &mut self,
        owner: Option<&mut ElementBuilder>,
        start: TextSize,
        owner_kind: Option<ElementKind>,
    ) -> ParseResult<()> {
        self.bump();
        let name = self.parse_name()?;
        self.expect(SyntaxKind::LANGUAGE_KW, ErrorCode::E0902, "'language'")?;
        if !self.at(SyntaxKind::STRING) {
            return Err(self.error_here(ErrorCode::E0902, "expected a language string"));
        }
        let language = self.current_text().trim_matches('"').trim().to_string();
        self.bump();
        if self.at(SyntaxKind::ERROR) {
            return Err(self.lexical_error());
        }
        if !self.at(SyntaxKind::BLOCK_COMMENT) {
            return Err(self
                .error_here(ErrorCode::E0309, format!("expected a /* ... */ body for fragment '{name}'")));
        }
        let raw = self.current_text();
        let body = raw[2..raw.len() - 2].to_string();
        self.bump();
        self.eat(SyntaxKind::SEMICOLON);

        let fragment = Fragment {
            name,
            language: SmolStr::new(language),
            body,
        };
        match owner.map(|b| &mut b.data) {
            Some(ElementData::Part(d)) => d.fragments.push(fragment),
            Some(ElementData::Action(d)) => d.fragments.push(fragment),
            _ => return Err(self.misplaced(start, "rep", owner_kind)),
        }
        Ok(())
    }

    /// DirectedMember = ('in' | 'out' | 'inout') ('attribute' | 'item')? ':>'? Name TypedBy? (';' | Body)
    ///
    /// A parameter in actions, a state port in states, a flow property in
    /// ports and a parameter in constraints.
    fn parse_directed_member(
        &mut self,
        owner: Option<&mut ElementBuilder>,
        start: TextSize,
        owner_kind: Option<ElementKind>,
    ) -> ParseResult<()> {
        let direction = match self.current_kind() {
            SyntaxKind::IN_KW => Direction::In,
            SyntaxKind::OUT_KW => Direction::Out,
            _ => Direction::InOut,
        };
        self.bump();
        // `in item : T;` names the parameter `item`
        let prefixed = self.nth(1).is_name() || self.nth(1) == SyntaxKind::COLON_GT;
        let flow_kind = if prefixed && self.eat(SyntaxKind::ITEM_KW) {
            FlowKind::Item
        } else {
            if prefixed {
                self.eat(SyntaxKind::ATTRIBUTE_KW);
            }
            FlowKind::Attribute
        };
        self.eat(SyntaxKind::COLON_GT);
        let name = self.parse_name()?;
        let (ty, cardinality) = self.parse_typed_by()?;
        if self.eat(SyntaxKind::EQ) || self.eat(SyntaxKind::COLON_EQ) {
            self.parse_value_text()?;
        }
        self.parse_statement_end()?;

        let missing_type = |p: &Self| {
            p.error_at(
                start,
                ErrorCode::E0305,
                format!("'{name}' needs a type in this context"),
            )
        };
        match owner.map(|b| &mut b.data) {
            Some(ElementData::Action(d)) => d.params.push(Parameter {
                direction,
                name,
                ty,
                cardinality,
            }),
            Some(ElementData::State(d)) => {
                let ty = ty.ok_or_else(|| missing_type(self))?;
                d.ports.push(StatePort { direction, name, ty });
            }
            Some(ElementData::Port(d)) => {
                let ty = ty.ok_or_else(|| missing_type(self))?;
                d.flow_properties.push(FlowProperty {
                    direction,
                    kind: flow_kind,
                    name,
                    ty,
                });
            }
            Some(ElementData::Constraint(d)) => {
                let ty = ty.ok_or_else(|| missing_type(self))?;
                d.params.push(ConstraintParam { name, ty });
            }
            _ => return Err(self.misplaced(start, direction.as_str(), owner_kind)),
        }
        Ok(())
    }

    /// Accept = 'accept' (Name ':')? Reference ('via' Reference)? 'then' Name ';'
    fn parse_accept(
        &mut self,
        owner: Option<&mut ElementBuilder>,
        start: TextSize,
        owner_kind: Option<ElementKind>,
    ) -> ParseResult<()> {
        self.bump();
        let (signal, target) = self.parse_accept_tail()?;
        let Some(owner) = owner else {
            return Err(self.outside_state(start, &signal));
        };
        if owner_kind != Some(ElementKind::State) {
            return Err(self.outside_state(start, &signal));
        }
        match owner.current_state.clone() {
            Some(source) => {
                if let ElementData::State(d) = &mut owner.data {
                    d.transitions.push(TransitionDecl {
                        name: None,
                        source,
                        signal,
                        target,
                    });
                }
            }
            None => owner.pending_accepts.push(PendingAccept {
                name: None,
                signal,
                target,
                location: self.location_at(start),
            }),
        }
        Ok(())
    }

    /// Signal, optional `via`, `then` target and the closing `;`
    fn parse_accept_tail(&mut self) -> ParseResult<(String, SmolStr)> {
        if !self.at_name() || self.at(SyntaxKind::THEN_KW) {
            return Err(self.error_here(ErrorCode::E0703, "expected a signal after 'accept'"));
        }
        let mut signal = self.parse_reference()?;
        if self.eat(SyntaxKind::COLON) {
            signal = self.parse_reference()?;
        }
        if self.eat(SyntaxKind::VIA_KW) {
            self.parse_reference()?;
        }
        if !self.eat(SyntaxKind::THEN_KW) {
            return Err(self.error_here(ErrorCode::E0704, format!("expected 'then' after accept of '{signal}'")));
        }
        let target = self.parse_name()?;
        self.expect_semicolon()?;
        Ok((signal, target))
    }

    fn outside_state(&self, start: TextSize, signal: &str) -> ParseError {
        self.error_at(
            start,
            ErrorCode::E0706,
            format!("transition on '{signal}' is declared outside any state"),
        )
    }

    /// Transition = 'transition' Name? 'first' Name 'accept' Accept
    fn parse_transition(
        &mut self,
        owner: Option<&mut ElementBuilder>,
        start: TextSize,
    ) -> ParseResult<()> {
        self.bump();
        let name = if self.at(SyntaxKind::IDENT) {
            Some(self.parse_name()?)
        } else {
            None
        };
        self.expect(SyntaxKind::FIRST_KW, ErrorCode::E0703, "'first' and a source state")?;
        let source = self.parse_name()?;
        self.expect(SyntaxKind::ACCEPT_KW, ErrorCode::E0703, "'accept' and a signal")?;
        let (signal, target) = self.parse_accept_tail()?;
        match owner.map(|b| &mut b.data) {
            Some(ElementData::State(d)) => d.transitions.push(TransitionDecl {
                name,
                source,
                signal,
                target,
            }),
            _ => return Err(self.outside_state(start, &signal)),
        }
        Ok(())
    }

    /// StateAction = 'entry' ';' 'then' Name ';'
    ///             | ('entry' | 'do' | 'exit') 'action'? Reference (':' Reference)? (';' | Body)
    fn parse_state_action(
        &mut self,
        owner: Option<&mut ElementBuilder>,
        start: TextSize,
        owner_kind: Option<ElementKind>,
    ) -> ParseResult<()> {
        let keyword = self.current_kind();
        let keyword_text = self.current_text();
        self.bump();

        let Some(owner) = owner else {
            return Err(self.misplaced(start, keyword_text, owner_kind));
        };
        let qname = owner.qname.clone();
        let ElementData::State(state) = &mut owner.data else {
            return Err(self.misplaced(start, keyword_text, owner_kind));
        };

        if keyword == SyntaxKind::ENTRY_KW && self.eat(SyntaxKind::SEMICOLON) {
            self.expect(SyntaxKind::THEN_KW, ErrorCode::E0704, "'then' after 'entry;'")?;
            let target = self.parse_name()?;
            self.expect_semicolon()?;
            if let Some(existing) = &state.initial {
                return Err(self.error_at(
                    start,
                    ErrorCode::E0705,
                    format!("'{qname}' already has initial state '{existing}'"),
                ));
            }
            state.initial = Some(target);
            return Ok(());
        }

        if self.at(SyntaxKind::L_BRACE) {
            // Inline behavior bodies are not captured.
            return self.skip_block();
        }
        if self.nth(1).is_name() {
            self.eat(SyntaxKind::ACTION_KW);
        }
        let mut action = self.parse_reference()?;
        if self.eat(SyntaxKind::COLON) || self.eat(SyntaxKind::COLON_GT) {
            action = self.parse_reference()?;
        }
        self.parse_statement_end()?;
        let slot = match keyword {
            SyntaxKind::ENTRY_KW => &mut state.entry_action,
            SyntaxKind::DO_KW => &mut state.do_action,
            _ => &mut state.exit_action,
        };
        slot.get_or_insert(action);
        Ok(())
    }

    /// InterfaceEnd = 'end' 'port'? Name ':' Reference ';'
    fn parse_interface_end(
        &mut self,
        owner: Option<&mut ElementBuilder>,
        start: TextSize,
        owner_kind: Option<ElementKind>,
    ) -> ParseResult<()> {
        self.bump();
        if self.nth(1).is_name() {
            self.eat(SyntaxKind::PORT_KW);
        }
        let role = self.parse_name()?;
        let (ty, _) = self.parse_typed_by()?;
        let Some(port_type) = ty else {
            return Err(self.error_here(ErrorCode::E0305, format!("expected a port type for end '{role}'")));
        };
        self.parse_statement_end()?;
        match owner.map(|b| &mut b.data) {
            Some(ElementData::Interface(d)) => d.ends.push(InterfaceEnd { role, port_type }),
            _ => return Err(self.misplaced(start, "end", owner_kind)),
        }
        Ok(())
    }

    /// Expose = 'expose' Reference ';'
    fn parse_expose(
        &mut self,
        owner: Option<&mut ElementBuilder>,
        start: TextSize,
        owner_kind: Option<ElementKind>,
    ) -> ParseResult<()> {
        self.bump();
        let reference = self.parse_reference()?;
        self.parse_statement_end()?;
        match owner.map(|b| &mut b.data) {
            Some(ElementData::View(d)) => d.exposes.push(reference),
            _ => return Err(self.misplaced(start, "expose", owner_kind)),
        }
        Ok(())
    }

    /// Satisfy = 'satisfy' 'requirement'? Reference ('by' Reference)? ';'
    fn parse_satisfy(
        &mut self,
        owner: Option<&mut ElementBuilder>,
        start: TextSize,
        owner_kind: Option<ElementKind>,
    ) -> ParseResult<()> {
        self.bump();
        if self.nth(1).is_name() {
            self.eat(SyntaxKind::REQUIREMENT_KW);
        }
        let requirement = self.parse_reference()?;
        let by = if self.eat(SyntaxKind::BY_KW) {
            Some(self.parse_reference()?)
        } else {
            None
        };
        self.parse_statement_end()?;
        match owner {
            Some(owner) => owner.satisfies.push(SatisfyRef { requirement, by }),
            None => return Err(self.misplaced(start, "satisfy", owner_kind)),
        }
        Ok(())
    }

    /// Alias = 'alias' Name 'for' Reference ';'
    fn parse_alias(
        &mut self,
        owner: Option<&mut ElementBuilder>,
        start: TextSize,
        owner_kind: Option<ElementKind>,
    ) -> ParseResult<()> {
        self.bump();
        let name = self.parse_name()?;
        if !self.eat(SyntaxKind::FOR_KW) {
            return Err(self.error_here(ErrorCode::E0503, format!("expected 'for' in alias '{name}'")));
        }
        let target = self.parse_reference()?;
        self.parse_statement_end()?;
        match owner.map(|b| &mut b.data) {
            Some(ElementData::Package(d)) => d.aliases.push(Alias { name, target }),
            _ => return Err(self.misplaced(start, "alias", owner_kind)),
        }
        Ok(())
    }

    /// Doc = 'doc' Name? BLOCK_COMMENT
    fn parse_doc(&mut self) -> ParseResult<String> {
        self.bump();
        self.parse_short_name()?;
        if self.at(SyntaxKind::IDENT) {
            self.bump();
        }
        if !self.at(SyntaxKind::BLOCK_COMMENT) {
            return Err(self.error_here(ErrorCode::E0902, "expected a /* ... */ doc body"));
        }
        let raw = self.current_text();
        self.bump();
        Ok(clean_doc(&raw[2..raw.len() - 2]))
    }

    /// Comment = 'comment' Name? ('about' References)? BLOCK_COMMENT
    fn parse_comment(&mut self) -> ParseResult<()> {
        let start = self.offset();
        self.bump();
        while !self.at_eof() {
            match self.current_kind() {
                SyntaxKind::BLOCK_COMMENT => {
                    self.bump();
                    return Ok(());
                }
                SyntaxKind::SEMICOLON | SyntaxKind::R_BRACE => break,
                SyntaxKind::ERROR => return Err(self.lexical_error()),
                _ => self.bump(),
            }
        }
        Err(self.error_at(start, ErrorCode::E0902, "expected a /* ... */ comment body"))
    }
}

/// A finished child state becomes the machine's current state; accepts it
/// could not source itself are handed to the machine with it as source.
fn attach_child_state(parent: &mut ElementBuilder, child: &mut ElementBuilder) {
    let ElementData::State(machine) = &mut parent.data else {
        return;
    };
    for pending in child.pending_accepts.drain(..) {
        machine.transitions.push(TransitionDecl {
            name: pending.name,
            source: child.name.clone(),
            signal: pending.signal,
            target: pending.target,
        });
    }
    parent.current_state = Some(child.name.clone());
}

/// Left-align documentation text and drop surrounding blank lines.
fn clean_doc(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
