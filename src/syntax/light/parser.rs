//! Structure builder for the reference provider.
//!
//! A forgiving recursive-descent pass over the lexemes. It recognizes the
//! statement, declaration and expression forms rules inspect and steps over
//! everything else, failing only on unbalanced delimiters and a handful of
//! required keywords.

use super::lexer::{LexKind, Lexeme, OPERATOR_CHARS};
use crate::syntax::{
    Attribute, AttributeKind, ElementKind, StructureElement, StructureKind, StructureNode, SyntaxError, TokenKind,
};
use crate::types::ByteRange;

const VALUE_KEYWORDS: &[&str] = &["self", "Self", "super", "true", "false", "nil", "_", "init"];

const MODIFIERS: &[&str] = &[
    "weak",
    "unowned",
    "lazy",
    "final",
    "static",
    "class",
    "override",
    "mutating",
    "nonmutating",
    "private",
    "fileprivate",
    "internal",
    "public",
    "open",
    "dynamic",
    "required",
    "convenience",
    "indirect",
];

const DECLARATION_KEYWORDS: &[&str] = &[
    "let",
    "var",
    "func",
    "init",
    "deinit",
    "subscript",
    "class",
    "struct",
    "enum",
    "extension",
    "protocol",
    "actor",
    "typealias",
    "case",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    TopLevel,
    TypeBody,
    FunctionBody,
}

impl Scope {
    fn variable_kind(self) -> StructureKind {
        match self {
            Scope::TopLevel => StructureKind::VarGlobal,
            Scope::TypeBody => StructureKind::VarInstance,
            Scope::FunctionBody => StructureKind::VarLocal,
        }
    }

    fn function_kind(self) -> StructureKind {
        match self {
            Scope::TypeBody => StructureKind::FunctionMethod,
            _ => StructureKind::FunctionFree,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ExprContext {
    trailing_closures: bool,
}

const STATEMENT: ExprContext = ExprContext { trailing_closures: true };
// `if`, `while`, `for ... in` and `switch` heads: a `{` opens the body
const CONDITION: ExprContext = ExprContext {
    trailing_closures: false,
};

/// A significant (non-comment) lexeme with its surrounding whitespace facts.
#[derive(Debug, Clone, Copy)]
struct Sig {
    kind: LexKind,
    range: ByteRange,
    newline_before: bool,
    space_before: bool,
}

impl Sig {
    fn start(&self) -> usize {
        self.range.location
    }

    fn end(&self) -> usize {
        self.range.upper_bound()
    }
}

pub(super) struct Parser<'a> {
    source: &'a str,
    lexemes: Vec<Sig>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, lexemes: &[Lexeme]) -> Self {
        let mut significant = Vec::with_capacity(lexemes.len());
        let mut previous_end = 0;
        for lexeme in lexemes.iter().filter(|l| !l.is_comment()) {
            let gap = source.get(previous_end..lexeme.range.location).unwrap_or_default();
            significant.push(Sig {
                kind: lexeme.kind,
                range: lexeme.range,
                newline_before: gap.contains('\n'),
                space_before: !gap.is_empty(),
            });
            previous_end = lexeme.range.upper_bound();
        }
        Self {
            source,
            lexemes: significant,
            pos: 0,
        }
    }

    pub fn parse_file(mut self) -> Result<Vec<StructureNode>, SyntaxError> {
        let nodes = self.statements(Scope::TopLevel, false)?;
        if let Some(stray) = self.peek() {
            return Err(self.unexpected(stray));
        }
        Ok(nodes)
    }

    // ----- lexeme helpers -------------------------------------------------

    fn peek(&self) -> Option<Sig> {
        self.lexemes.get(self.pos).copied()
    }

    fn peek_n(&self, n: usize) -> Option<Sig> {
        self.lexemes.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<Sig> {
        let sig = self.peek()?;
        self.pos += 1;
        Some(sig)
    }

    fn text(&self, sig: Sig) -> &'a str {
        sig.range.slice(self.source).unwrap_or_default()
    }

    fn is_punct(&self, sig: Sig, text: &str) -> bool {
        sig.kind == LexKind::Punct && self.text(sig) == text
    }

    fn is_keyword(&self, sig: Sig, text: &str) -> bool {
        sig.kind == LexKind::Token(TokenKind::Keyword) && self.text(sig) == text
    }

    fn at_punct(&self, text: &str) -> bool {
        self.peek().is_some_and(|sig| self.is_punct(sig, text))
    }

    fn at_keyword(&self, text: &str) -> bool {
        self.peek().is_some_and(|sig| self.is_keyword(sig, text))
    }

    fn is_closer(&self, sig: Sig) -> bool {
        sig.kind == LexKind::Punct && matches!(self.text(sig), ")" | "]" | "}")
    }

    fn is_operator(&self, sig: Sig) -> bool {
        if sig.kind != LexKind::Punct {
            return false;
        }
        let text = self.text(sig);
        text != "->"
            && (matches!(text, "..." | "..<") || text.bytes().next().is_some_and(|b| OPERATOR_CHARS.contains(&b)))
    }

    fn is_postfix_operator(&self, sig: Sig) -> bool {
        sig.kind == LexKind::Punct
            && !sig.space_before
            && self.text(sig).chars().all(|c| c == '?' || c == '!')
            && !self.text(sig).is_empty()
    }

    /// Whether `sig` can name a member after `.`: identifiers, keywords, tuple indices.
    fn is_member_name(sig: Sig) -> bool {
        matches!(
            sig.kind,
            LexKind::Token(TokenKind::Identifier | TokenKind::Keyword | TokenKind::Other)
        )
    }

    fn last_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|idx| self.lexemes.get(idx))
            .map_or(0, |sig| sig.end())
    }

    fn offset_here(&self) -> usize {
        self.peek().map_or(self.source.len(), |sig| sig.start())
    }

    fn unexpected(&self, sig: Sig) -> SyntaxError {
        SyntaxError::Unexpected {
            found: self.text(sig).to_string(),
            offset: sig.start(),
        }
    }

    fn expected(&self, expected: &'static str) -> SyntaxError {
        SyntaxError::Expected {
            expected,
            offset: self.offset_here(),
        }
    }

    fn expect_punct(&mut self, text: &str, expected: &'static str) -> Result<Sig, SyntaxError> {
        match self.peek() {
            Some(sig) if self.is_punct(sig, text) => {
                self.pos += 1;
                Ok(sig)
            }
            _ => Err(self.expected(expected)),
        }
    }

    fn close(&mut self, text: &str, open: Sig) -> Result<Sig, SyntaxError> {
        match self.peek() {
            Some(sig) if self.is_punct(sig, text) => {
                self.pos += 1;
                Ok(sig)
            }
            Some(sig) if self.is_closer(sig) => Err(self.unexpected(sig)),
            _ => Err(SyntaxError::Unclosed {
                delimiter: self.text(open).chars().next().unwrap_or('{'),
                offset: open.start(),
            }),
        }
    }

    /// Source text between two offsets with whitespace removed, as used for call names.
    fn compact(&self, start: usize, end: usize) -> String {
        self.source
            .get(start..end)
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    /// Skip a balanced `(...)`, `[...]` or `{...}` group; returns the end of the closer.
    fn skip_balanced(&mut self) -> Result<usize, SyntaxError> {
        let mut stack: Vec<Sig> = Vec::new();
        while let Some(sig) = self.bump() {
            match (sig.kind, self.text(sig)) {
                (LexKind::Punct, "(" | "[" | "{") => stack.push(sig),
                (LexKind::Punct, closer @ (")" | "]" | "}")) => {
                    let Some(open) = stack.pop() else {
                        return Err(self.unexpected(sig));
                    };
                    let expected = match self.text(open) {
                        "(" => ")",
                        "[" => "]",
                        _ => "}",
                    };
                    if closer != expected {
                        return Err(self.unexpected(sig));
                    }
                    if stack.is_empty() {
                        return Ok(sig.end());
                    }
                }
                _ if stack.is_empty() => return Ok(sig.end()),
                _ => {}
            }
        }
        match stack.first() {
            Some(open) => Err(SyntaxError::Unclosed {
                delimiter: self.text(*open).chars().next().unwrap_or('('),
                offset: open.start(),
            }),
            None => Ok(self.last_end()),
        }
    }

    /// Skip to the end of the current logical line, keeping delimiters balanced.
    fn skip_line(&mut self) -> Result<(), SyntaxError> {
        self.pos += 1;
        while let Some(sig) = self.peek() {
            if sig.newline_before || self.is_closer(sig) || self.is_punct(sig, ";") {
                break;
            }
            if sig.kind == LexKind::Punct && matches!(self.text(sig), "(" | "[" | "{") {
                self.skip_balanced()?;
            } else {
                self.pos += 1;
            }
        }
        Ok(())
    }

    /// Skip tokens up to (not including) a `{` at the current nesting level.
    fn skip_until_brace(&mut self) -> Result<(), SyntaxError> {
        while let Some(sig) = self.peek() {
            if self.is_punct(sig, "{") || self.is_closer(sig) {
                break;
            }
            if sig.kind == LexKind::Punct && matches!(self.text(sig), "(" | "[") {
                self.skip_balanced()?;
            } else {
                self.pos += 1;
            }
        }
        Ok(())
    }

    fn skip_generic(&mut self) -> Result<(), SyntaxError> {
        let mut depth: i32 = 0;
        while let Some(sig) = self.peek() {
            let text = self.text(sig);
            if sig.kind == LexKind::Punct {
                if matches!(text, "(" | "[") {
                    self.skip_balanced()?;
                    continue;
                }
                if matches!(text, "{" | "}" | ")" | "]" | ";") {
                    break;
                }
                if text != "->" {
                    for c in text.chars() {
                        match c {
                            '<' => depth += 1,
                            '>' => depth -= 1,
                            _ => {}
                        }
                    }
                }
            }
            self.pos += 1;
            if depth <= 0 {
                break;
            }
        }
        Ok(())
    }

    fn skip_type(&mut self) -> Result<(), SyntaxError> {
        let mut expect_more = true;
        while let Some(sig) = self.peek() {
            if !expect_more && sig.newline_before {
                break;
            }
            let text = self.text(sig);
            match sig.kind {
                LexKind::Token(TokenKind::Identifier) if expect_more => {
                    self.pos += 1;
                    expect_more = matches!(text, "some" | "any");
                }
                LexKind::Token(TokenKind::Keyword) if expect_more && matches!(text, "Self" | "inout" | "_") => {
                    self.pos += 1;
                    expect_more = text == "inout";
                }
                LexKind::Token(TokenKind::Keyword) if !expect_more && matches!(text, "throws" | "rethrows" | "async") => {
                    self.pos += 1;
                }
                LexKind::Token(TokenKind::Other) if text.starts_with('@') => {
                    self.pos += 1;
                    expect_more = true;
                }
                LexKind::Punct => match text {
                    "(" | "[" if expect_more => {
                        self.skip_balanced()?;
                        expect_more = false;
                    }
                    "." | "->" | "&" => {
                        self.pos += 1;
                        expect_more = true;
                    }
                    "..." => self.pos += 1,
                    t if t.starts_with('<') && !sig.space_before => {
                        self.skip_generic()?;
                        expect_more = false;
                    }
                    _ if self.is_postfix_operator(sig) => self.pos += 1,
                    _ => break,
                },
                _ => break,
            }
        }
        Ok(())
    }

    // ----- statements -----------------------------------------------------

    fn statements(&mut self, scope: Scope, in_switch: bool) -> Result<Vec<StructureNode>, SyntaxError> {
        let mut out = Vec::new();
        while let Some(sig) = self.peek() {
            if self.is_punct(sig, "}") {
                break;
            }
            if in_switch
                && (self.is_keyword(sig, "case") || self.is_keyword(sig, "default") || self.text(sig) == "@unknown")
            {
                break;
            }
            if self.is_punct(sig, ";") {
                self.pos += 1;
                continue;
            }
            if self.is_closer(sig) {
                return Err(self.unexpected(sig));
            }
            let before = self.pos;
            self.statement(scope, &mut out)?;
            if self.pos == before {
                self.pos += 1;
            }
        }
        Ok(out)
    }

    fn block(&mut self, scope: Scope) -> Result<StructureNode, SyntaxError> {
        let open = self.expect_punct("{", "'{'")?;
        let children = self.statements(scope, false)?;
        let close = self.close("}", open)?;
        Ok(StructureNode::new(StructureKind::Brace, ByteRange::from_bounds(open.start(), close.end()))
            .with_body(ByteRange::from_bounds(open.end(), close.start()))
            .with_children(children))
    }

    fn is_modifier_position(&self, sig: Sig) -> bool {
        let text = self.text(sig);
        if !MODIFIERS.contains(&text) {
            return false;
        }
        let Some(next) = self.peek_n(1) else {
            return false;
        };
        let next_text = self.text(next);
        match next.kind {
            LexKind::Token(TokenKind::Keyword) => {
                DECLARATION_KEYWORDS.contains(&next_text) || MODIFIERS.contains(&next_text)
            }
            LexKind::Token(TokenKind::Other) => next_text.starts_with('@'),
            // `private(set)`, `unowned(unsafe)`
            LexKind::Punct => {
                next_text == "("
                    && !next.space_before
                    && self
                        .peek_n(2)
                        .is_some_and(|arg| matches!(self.text(arg), "set" | "safe" | "unsafe"))
            }
            _ => false,
        }
    }

    fn modifiers(&mut self) -> Result<Vec<Attribute>, SyntaxError> {
        let mut attributes = Vec::new();
        while let Some(sig) = self.peek() {
            let text = self.text(sig);
            let kind = if sig.kind == LexKind::Token(TokenKind::Other) && text.starts_with('@') {
                if text == "@unknown" {
                    break;
                }
                Some(AttributeKind::Custom)
            } else if self.is_modifier_position(sig) {
                AttributeKind::from_modifier(text)
            } else {
                break;
            };
            self.pos += 1;
            let mut end = sig.end();
            if let Some(next) = self.peek()
                && self.is_punct(next, "(")
                && !next.space_before
            {
                end = self.skip_balanced()?;
            }
            if let Some(kind) = kind {
                attributes.push(Attribute {
                    kind,
                    range: ByteRange::from_bounds(sig.start(), end),
                });
            }
        }
        Ok(attributes)
    }

    fn statement(&mut self, scope: Scope, out: &mut Vec<StructureNode>) -> Result<(), SyntaxError> {
        // Labeled loops: `outer: for ...`
        if let (Some(label), Some(colon), Some(target)) = (self.peek(), self.peek_n(1), self.peek_n(2))
            && label.kind == LexKind::Token(TokenKind::Identifier)
            && self.is_punct(colon, ":")
            && ["for", "while", "repeat", "switch", "if", "do"]
                .iter()
                .any(|kw| self.is_keyword(target, kw))
        {
            self.pos += 2;
        }

        let attributes = self.modifiers()?;
        let Some(sig) = self.peek() else {
            return Ok(());
        };
        let text = self.text(sig);

        match sig.kind {
            LexKind::Token(TokenKind::Keyword) => match text {
                "let" | "var" => self.variable(scope, attributes, out),
                "func" | "init" | "deinit" | "subscript" => self.function(scope, attributes, out),
                "class" | "struct" | "enum" | "extension" | "protocol" | "actor" => {
                    self.type_declaration(attributes, out)
                }
                "for" => self.for_each(out),
                "while" => self.while_loop(out),
                "repeat" => self.repeat_while(out),
                "if" => {
                    let node = self.if_statement()?;
                    out.push(node);
                    Ok(())
                }
                "guard" => self.guard(out),
                "switch" => self.switch(out),
                "do" => self.do_catch(out),
                "defer" => {
                    self.pos += 1;
                    let body = self.block(Scope::FunctionBody)?;
                    out.push(body);
                    Ok(())
                }
                "return" | "throw" => {
                    self.pos += 1;
                    if let Some(next) = self.peek()
                        && !next.newline_before
                        && !self.is_closer(next)
                        && !self.is_punct(next, ";")
                    {
                        self.expression(STATEMENT, out)?;
                    }
                    Ok(())
                }
                "break" | "continue" | "fallthrough" => {
                    self.pos += 1;
                    if let Some(next) = self.peek()
                        && next.kind == LexKind::Token(TokenKind::Identifier)
                        && !next.newline_before
                    {
                        self.pos += 1;
                    }
                    Ok(())
                }
                "import" | "typealias" | "associatedtype" | "case" | "operator" => self.skip_line(),
                _ => self.expression(STATEMENT, out).map(|_| ()),
            },
            LexKind::Token(TokenKind::Other)
                if matches!(
                    text,
                    "#if" | "#elseif" | "#else" | "#endif" | "#warning" | "#error" | "#sourceLocation"
                ) =>
            {
                self.skip_line()
            }
            _ => self.expression(STATEMENT, out).map(|_| ()),
        }
    }

    fn variable(
        &mut self,
        scope: Scope,
        attributes: Vec<Attribute>,
        out: &mut Vec<StructureNode>,
    ) -> Result<(), SyntaxError> {
        let Some(keyword) = self.bump() else {
            return Ok(());
        };
        let mut start = keyword.start();
        loop {
            let pattern = self.peek().ok_or_else(|| self.expected("variable name"))?;
            let mut name = None;
            if self.is_punct(pattern, "(") {
                self.skip_balanced()?;
            } else if matches!(
                pattern.kind,
                LexKind::Token(TokenKind::Identifier | TokenKind::Keyword)
            ) {
                self.pos += 1;
                name = Some(pattern);
            } else {
                return Err(self.expected("variable name"));
            }

            if self.at_punct(":") {
                self.pos += 1;
                self.skip_type()?;
            }

            let mut children = Vec::new();
            if self.at_punct("=") {
                self.pos += 1;
                if self.expression(STATEMENT, &mut children)?.is_none() {
                    return Err(self.expected("expression"));
                }
            } else if let Some(next) = self.peek()
                && self.is_punct(next, "{")
                && !next.newline_before
            {
                // Computed property or observers
                let accessors = self.block(Scope::FunctionBody)?;
                children.push(accessors);
            }

            let mut node = StructureNode::new(scope.variable_kind(), ByteRange::from_bounds(start, self.last_end()))
                .with_children(children);
            if let Some(name) = name {
                node = node.with_name(self.text(name), Some(name.range));
            }
            node.attributes = attributes.clone();
            out.push(node);

            if self.at_punct(",") {
                self.pos += 1;
                start = self.offset_here();
            } else {
                return Ok(());
            }
        }
    }

    fn function(
        &mut self,
        scope: Scope,
        attributes: Vec<Attribute>,
        out: &mut Vec<StructureNode>,
    ) -> Result<(), SyntaxError> {
        let Some(keyword) = self.bump() else {
            return Ok(());
        };
        let keyword_text = self.text(keyword);
        let (name, name_range) = if keyword_text == "func" {
            let name = self.bump().ok_or_else(|| self.expected("function name"))?;
            (self.text(name).to_string(), Some(name.range))
        } else {
            if let Some(next) = self.peek()
                && self.is_postfix_operator(next)
            {
                self.pos += 1;
            }
            (keyword_text.to_string(), Some(keyword.range))
        };

        if let Some(next) = self.peek()
            && next.kind == LexKind::Punct
            && self.text(next).starts_with('<')
        {
            self.skip_generic()?;
        }

        let mut children = Vec::new();
        if self.at_punct("(") {
            self.parameters(&mut children)?;
        }
        while self.at_keyword("async") || self.at_keyword("throws") || self.at_keyword("rethrows") {
            self.pos += 1;
        }
        if self.at_punct("->") {
            self.pos += 1;
            self.skip_type()?;
        }
        if self.at_keyword("where") {
            self.skip_until_brace()?;
        }

        let mut body_range = None;
        if let Some(next) = self.peek()
            && self.is_punct(next, "{")
        {
            let body = self.block(Scope::FunctionBody)?;
            body_range = body.body_range;
            children.extend(body.substructure);
        }

        let mut node = StructureNode::new(
            scope.function_kind(),
            ByteRange::from_bounds(keyword.start(), self.last_end()),
        )
        .with_name(name, name_range)
        .with_children(children);
        node.body_range = body_range;
        node.attributes = attributes;
        out.push(node);
        Ok(())
    }

    fn parameters(&mut self, out: &mut Vec<StructureNode>) -> Result<(), SyntaxError> {
        let Some(open) = self.bump() else {
            return Ok(());
        };
        loop {
            let Some(sig) = self.peek() else {
                return Err(SyntaxError::Unclosed {
                    delimiter: '(',
                    offset: open.start(),
                });
            };
            if self.is_punct(sig, ")") {
                self.pos += 1;
                return Ok(());
            }
            if self.is_punct(sig, ",") {
                self.pos += 1;
                continue;
            }
            if self.is_closer(sig) {
                return Err(self.unexpected(sig));
            }

            let before = self.pos;
            let start = sig.start();
            let mut name = None;
            while let Some(part) = self.peek()
                && matches!(
                    part.kind,
                    LexKind::Token(TokenKind::Identifier | TokenKind::Keyword)
                )
            {
                self.pos += 1;
                if self.text(part) != "_" {
                    name = Some(part);
                }
            }
            if self.at_punct(":") {
                self.pos += 1;
                self.skip_type()?;
            }
            let mut defaults = Vec::new();
            if self.at_punct("=") {
                self.pos += 1;
                self.expression(STATEMENT, &mut defaults)?;
            }
            if self.pos == before {
                // Unrecognized parameter syntax
                self.pos += 1;
                continue;
            }
            let mut node = StructureNode::new(
                StructureKind::VarParameter,
                ByteRange::from_bounds(start, self.last_end()),
            )
            .with_children(defaults);
            if let Some(name) = name {
                node = node.with_name(self.text(name), Some(name.range));
            }
            out.push(node);
        }
    }

    fn type_declaration(&mut self, attributes: Vec<Attribute>, out: &mut Vec<StructureNode>) -> Result<(), SyntaxError> {
        let Some(keyword) = self.bump() else {
            return Ok(());
        };
        let kind = match self.text(keyword) {
            "struct" => StructureKind::Struct,
            "enum" => StructureKind::Enum,
            "extension" => StructureKind::Extension,
            "protocol" => StructureKind::Protocol,
            _ => StructureKind::Class,
        };

        let name_start = self.offset_here();
        while let Some(sig) = self.peek()
            && sig.kind == LexKind::Token(TokenKind::Identifier)
        {
            self.pos += 1;
            if self.at_punct(".") {
                self.pos += 1;
            } else {
                break;
            }
        }
        let name_end = self.last_end().max(name_start);
        if name_end == name_start {
            return Err(self.expected("type name"));
        }

        if let Some(next) = self.peek()
            && next.kind == LexKind::Punct
            && self.text(next).starts_with('<')
        {
            self.skip_generic()?;
        }
        if self.at_punct(":") {
            self.pos += 1;
            loop {
                self.skip_type()?;
                if self.at_punct(",") {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        if self.at_keyword("where") {
            self.skip_until_brace()?;
        }

        let open = self.expect_punct("{", "'{'")?;
        let members = self.statements(Scope::TypeBody, false)?;
        let close = self.close("}", open)?;

        let mut node = StructureNode::new(kind, ByteRange::from_bounds(keyword.start(), close.end()))
            .with_name(
                self.compact(name_start, name_end),
                Some(ByteRange::from_bounds(name_start, name_end)),
            )
            .with_body(ByteRange::from_bounds(open.end(), close.start()))
            .with_children(members);
        node.attributes = attributes;
        out.push(node);
        Ok(())
    }

    fn for_each(&mut self, out: &mut Vec<StructureNode>) -> Result<(), SyntaxError> {
        let Some(keyword) = self.bump() else {
            return Ok(());
        };
        while self.at_keyword("case") || self.at_keyword("try") || self.at_keyword("await") {
            self.pos += 1;
        }

        let pattern_start = self.offset_here();
        let mut pattern_end = pattern_start;
        let mut depth = 0usize;
        loop {
            let Some(sig) = self.peek() else {
                return Err(self.expected("'in'"));
            };
            if depth == 0 && self.is_keyword(sig, "in") {
                break;
            }
            if depth == 0 && self.is_punct(sig, "{") {
                return Err(self.expected("'in'"));
            }
            if sig.kind == LexKind::Punct {
                match self.text(sig) {
                    "(" | "[" => depth += 1,
                    ")" | "]" => {
                        depth = depth.checked_sub(1).ok_or_else(|| self.unexpected(sig))?;
                    }
                    _ => {}
                }
            }
            pattern_end = sig.end();
            self.pos += 1;
        }
        self.pos += 1; // `in`

        let mut children = Vec::new();
        let sequence_start = self.offset_here();
        if self.expression(CONDITION, &mut children)?.is_none() {
            return Err(self.expected("sequence expression"));
        }
        let sequence_end = self.last_end();
        if self.at_keyword("where") {
            self.pos += 1;
            self.expression(CONDITION, &mut children)?;
        }
        let body = self.block(Scope::FunctionBody)?;
        children.push(body);

        let mut node = StructureNode::new(
            StructureKind::ForEach,
            ByteRange::from_bounds(keyword.start(), self.last_end()),
        )
        .with_children(children);
        node.elements = vec![
            StructureElement {
                kind: ElementKind::Id,
                range: ByteRange::from_bounds(pattern_start, pattern_end),
            },
            StructureElement {
                kind: ElementKind::Expr,
                range: ByteRange::from_bounds(sequence_start, sequence_end),
            },
        ];
        out.push(node);
        Ok(())
    }

    fn conditions(
        &mut self,
        children: &mut Vec<StructureNode>,
        elements: &mut Vec<StructureElement>,
    ) -> Result<(), SyntaxError> {
        loop {
            let start = self.offset_here();
            if self.at_keyword("let") || self.at_keyword("var") {
                self.pos += 1;
                if self.at_punct("(") {
                    self.skip_balanced()?;
                } else {
                    self.bump().ok_or_else(|| self.expected("binding name"))?;
                }
                if self.at_punct(":") {
                    self.pos += 1;
                    self.skip_type()?;
                }
                if self.at_punct("=") {
                    self.pos += 1;
                    self.expression(CONDITION, children)?;
                }
            } else {
                if self.at_keyword("case") {
                    self.pos += 1;
                }
                if self.expression(CONDITION, children)?.is_none() {
                    return Err(self.expected("condition"));
                }
            }
            elements.push(StructureElement {
                kind: ElementKind::Condition,
                range: ByteRange::from_bounds(start, self.last_end()),
            });
            if self.at_punct(",") {
                self.pos += 1;
            } else {
                return Ok(());
            }
        }
    }

    fn while_loop(&mut self, out: &mut Vec<StructureNode>) -> Result<(), SyntaxError> {
        let Some(keyword) = self.bump() else {
            return Ok(());
        };
        let mut children = Vec::new();
        let mut elements = Vec::new();
        self.conditions(&mut children, &mut elements)?;
        children.push(self.block(Scope::FunctionBody)?);
        let mut node = StructureNode::new(StructureKind::While, ByteRange::from_bounds(keyword.start(), self.last_end()))
            .with_children(children);
        node.elements = elements;
        out.push(node);
        Ok(())
    }

    fn repeat_while(&mut self, out: &mut Vec<StructureNode>) -> Result<(), SyntaxError> {
        let Some(keyword) = self.bump() else {
            return Ok(());
        };
        let mut children = vec![self.block(Scope::FunctionBody)?];
        if !self.at_keyword("while") {
            return Err(self.expected("'while'"));
        }
        self.pos += 1;
        let mut elements = Vec::new();
        self.conditions(&mut children, &mut elements)?;
        let mut node = StructureNode::new(
            StructureKind::RepeatWhile,
            ByteRange::from_bounds(keyword.start(), self.last_end()),
        )
        .with_children(children);
        node.elements = elements;
        out.push(node);
        Ok(())
    }

    fn if_statement(&mut self) -> Result<StructureNode, SyntaxError> {
        let keyword = self.bump().ok_or_else(|| self.expected("'if'"))?;
        let mut children = Vec::new();
        let mut elements = Vec::new();
        self.conditions(&mut children, &mut elements)?;
        children.push(self.block(Scope::FunctionBody)?);
        if self.at_keyword("else") {
            self.pos += 1;
            if self.at_keyword("if") {
                children.push(self.if_statement()?);
            } else {
                children.push(self.block(Scope::FunctionBody)?);
            }
        }
        let mut node = StructureNode::new(StructureKind::If, ByteRange::from_bounds(keyword.start(), self.last_end()))
            .with_children(children);
        node.elements = elements;
        Ok(node)
    }

    fn guard(&mut self, out: &mut Vec<StructureNode>) -> Result<(), SyntaxError> {
        let Some(keyword) = self.bump() else {
            return Ok(());
        };
        let mut children = Vec::new();
        let mut elements = Vec::new();
        self.conditions(&mut children, &mut elements)?;
        if !self.at_keyword("else") {
            return Err(self.expected("'else'"));
        }
        self.pos += 1;
        children.push(self.block(Scope::FunctionBody)?);
        let mut node = StructureNode::new(StructureKind::Guard, ByteRange::from_bounds(keyword.start(), self.last_end()))
            .with_children(children);
        node.elements = elements;
        out.push(node);
        Ok(())
    }

    fn switch(&mut self, out: &mut Vec<StructureNode>) -> Result<(), SyntaxError> {
        let Some(keyword) = self.bump() else {
            return Ok(());
        };
        let mut children = Vec::new();
        if self.expression(CONDITION, &mut children)?.is_none() {
            return Err(self.expected("switch subject"));
        }
        let open = self.expect_punct("{", "'{'")?;
        loop {
            let Some(sig) = self.peek() else {
                break;
            };
            if self.is_punct(sig, "}") {
                break;
            }
            let case_start = sig.start();
            if self.text(sig) == "@unknown" {
                self.pos += 1;
            }
            if self.at_keyword("case") {
                self.pos += 1;
                self.skip_case_pattern()?;
            } else if self.at_keyword("default") {
                self.pos += 1;
                self.expect_punct(":", "':'")?;
            } else {
                return Err(self.expected("'case' or 'default'"));
            }
            let body = self.statements(Scope::FunctionBody, true)?;
            children.push(
                StructureNode::new(StructureKind::Case, ByteRange::from_bounds(case_start, self.last_end()))
                    .with_children(body),
            );
        }
        let close = self.close("}", open)?;
        out.push(
            StructureNode::new(StructureKind::Switch, ByteRange::from_bounds(keyword.start(), close.end()))
                .with_body(ByteRange::from_bounds(open.end(), close.start()))
                .with_children(children),
        );
        Ok(())
    }

    fn skip_case_pattern(&mut self) -> Result<(), SyntaxError> {
        while let Some(sig) = self.peek() {
            if self.is_punct(sig, ":") {
                self.pos += 1;
                return Ok(());
            }
            if self.is_closer(sig) || self.is_punct(sig, "{") {
                break;
            }
            if sig.kind == LexKind::Punct && matches!(self.text(sig), "(" | "[") {
                self.skip_balanced()?;
            } else {
                self.pos += 1;
            }
        }
        Err(self.expected("':'"))
    }

    fn do_catch(&mut self, out: &mut Vec<StructureNode>) -> Result<(), SyntaxError> {
        self.pos += 1;
        out.push(self.block(Scope::FunctionBody)?);
        while self.at_keyword("catch") {
            self.pos += 1;
            self.skip_until_brace()?;
            out.push(self.block(Scope::FunctionBody)?);
        }
        Ok(())
    }

    // ----- expressions ----------------------------------------------------

    /// Parse one expression, appending the nodes it produces to `out`.
    /// Returns the end offset, or `None` if nothing here starts an expression.
    fn expression(&mut self, ctx: ExprContext, out: &mut Vec<StructureNode>) -> Result<Option<usize>, SyntaxError> {
        let mut end = None;
        loop {
            while let Some(sig) = self.peek() {
                if self.is_keyword(sig, "try") || self.is_keyword(sig, "await") {
                    self.pos += 1;
                    if let Some(next) = self.peek()
                        && self.is_postfix_operator(next)
                    {
                        self.pos += 1;
                    }
                } else if self.is_operator(sig) && self.peek_n(1).is_some_and(|next| !next.space_before) {
                    self.pos += 1;
                } else {
                    break;
                }
            }

            let Some(operand_end) = self.postfix(ctx, out)? else {
                return Ok(end);
            };
            end = Some(operand_end);

            while self.at_keyword("as") || self.at_keyword("is") {
                self.pos += 1;
                if let Some(next) = self.peek()
                    && self.is_postfix_operator(next)
                {
                    self.pos += 1;
                }
                self.skip_type()?;
                end = Some(self.last_end());
            }

            let Some(sig) = self.peek() else {
                break;
            };
            if !self.is_operator(sig) {
                break;
            }
            let prefix_on_new_line = sig.newline_before && self.peek_n(1).is_some_and(|next| !next.space_before);
            if prefix_on_new_line {
                break;
            }
            self.pos += 1;
            if self.text(sig) == "?" {
                // Ternary
                self.expression(ctx, out)?;
                if self.at_punct(":") {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        Ok(end)
    }

    fn postfix(&mut self, ctx: ExprContext, out: &mut Vec<StructureNode>) -> Result<Option<usize>, SyntaxError> {
        let Some(first) = self.peek() else {
            return Ok(None);
        };
        let start = first.start();
        let mut chain = Vec::new();
        let Some(mut end) = self.primary(&mut chain)? else {
            return Ok(None);
        };
        let mut callee_end = end;

        while let Some(sig) = self.peek() {
            if sig.kind != LexKind::Punct {
                break;
            }
            match self.text(sig) {
                "." => {
                    let Some(member) = self.peek_n(1) else {
                        break;
                    };
                    if !Self::is_member_name(member) || member.space_before {
                        break;
                    }
                    self.pos += 2;
                    end = member.end();
                    callee_end = end;
                }
                "(" if !sig.newline_before => {
                    self.pos += 1;
                    let mut arguments = Vec::new();
                    let close = self.comma_list(sig, ")", &mut arguments)?;
                    let mut children = std::mem::take(&mut chain);
                    children.extend(arguments);
                    chain.push(
                        StructureNode::new(StructureKind::Call, ByteRange::from_bounds(start, close.end()))
                            .with_name(
                                self.compact(start, callee_end),
                                Some(ByteRange::from_bounds(start, callee_end)),
                            )
                            .with_body(ByteRange::from_bounds(sig.end(), close.start()))
                            .with_children(children),
                    );
                    end = close.end();
                }
                "[" if !sig.newline_before && !sig.space_before => {
                    self.pos += 1;
                    let close = self.comma_list(sig, "]", &mut chain)?;
                    end = close.end();
                    callee_end = end;
                }
                "{" if ctx.trailing_closures && !sig.newline_before => {
                    let closure = self.closure()?;
                    let closure_end = closure.range.upper_bound();
                    match chain.last_mut() {
                        Some(call) if call.kind == StructureKind::Call && call.range.upper_bound() == end => {
                            call.range = ByteRange::from_bounds(call.range.location, closure_end);
                            call.substructure.push(closure);
                        }
                        _ => {
                            let mut children = std::mem::take(&mut chain);
                            children.push(closure);
                            chain.push(
                                StructureNode::new(StructureKind::Call, ByteRange::from_bounds(start, closure_end))
                                    .with_name(
                                        self.compact(start, callee_end),
                                        Some(ByteRange::from_bounds(start, callee_end)),
                                    )
                                    .with_children(children),
                            );
                        }
                    }
                    end = closure_end;
                }
                _ if self.is_postfix_operator(sig) => {
                    self.pos += 1;
                    end = sig.end();
                    callee_end = end;
                }
                _ => break,
            }
        }

        out.extend(chain);
        Ok(Some(end))
    }

    fn primary(&mut self, out: &mut Vec<StructureNode>) -> Result<Option<usize>, SyntaxError> {
        let Some(sig) = self.peek() else {
            return Ok(None);
        };
        let text = self.text(sig);
        match sig.kind {
            LexKind::Token(TokenKind::Identifier | TokenKind::String | TokenKind::Other) => {
                self.pos += 1;
                Ok(Some(sig.end()))
            }
            LexKind::Token(TokenKind::Keyword) if VALUE_KEYWORDS.contains(&text) => {
                self.pos += 1;
                Ok(Some(sig.end()))
            }
            LexKind::Punct => match text {
                "(" => {
                    self.pos += 1;
                    let close = self.comma_list(sig, ")", out)?;
                    Ok(Some(close.end()))
                }
                "[" => self.collection(out).map(Some),
                "{" => {
                    let closure = self.closure()?;
                    let end = closure.range.upper_bound();
                    out.push(closure);
                    Ok(Some(end))
                }
                "." => match self.peek_n(1) {
                    Some(member) if Self::is_member_name(member) && !member.space_before => {
                        self.pos += 2;
                        Ok(Some(member.end()))
                    }
                    _ => Ok(None),
                },
                "\\" => {
                    self.pos += 1;
                    Ok(Some(sig.end()))
                }
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    /// Parse a comma-separated group after its opener; returns the closer.
    fn comma_list(&mut self, open: Sig, close: &str, out: &mut Vec<StructureNode>) -> Result<Sig, SyntaxError> {
        loop {
            let Some(sig) = self.peek() else {
                return Err(SyntaxError::Unclosed {
                    delimiter: self.text(open).chars().next().unwrap_or('('),
                    offset: open.start(),
                });
            };
            if self.is_punct(sig, close) {
                self.pos += 1;
                return Ok(sig);
            }
            if self.is_punct(sig, ",") || self.is_punct(sig, ":") {
                self.pos += 1;
                continue;
            }
            if self.is_closer(sig) {
                return Err(self.unexpected(sig));
            }
            // Argument labels
            if matches!(
                sig.kind,
                LexKind::Token(TokenKind::Identifier | TokenKind::Keyword)
            ) && self.peek_n(1).is_some_and(|next| self.is_punct(next, ":"))
            {
                self.pos += 2;
                continue;
            }
            let before = self.pos;
            self.expression(STATEMENT, out)?;
            if self.pos == before {
                self.pos += 1;
            }
        }
    }

    fn collection(&mut self, out: &mut Vec<StructureNode>) -> Result<usize, SyntaxError> {
        let Some(open) = self.bump() else {
            return Err(self.expected("'['"));
        };
        let mut children = Vec::new();
        let mut is_dictionary = false;
        let close = loop {
            let Some(sig) = self.peek() else {
                return Err(SyntaxError::Unclosed {
                    delimiter: '[',
                    offset: open.start(),
                });
            };
            if self.is_punct(sig, "]") {
                self.pos += 1;
                break sig;
            }
            if self.is_punct(sig, ":") {
                is_dictionary = true;
                self.pos += 1;
                continue;
            }
            if self.is_punct(sig, ",") {
                self.pos += 1;
                continue;
            }
            if self.is_closer(sig) {
                return Err(self.unexpected(sig));
            }
            let before = self.pos;
            self.expression(STATEMENT, &mut children)?;
            if self.pos == before {
                self.pos += 1;
            }
        };
        let kind = if is_dictionary {
            StructureKind::Dictionary
        } else {
            StructureKind::Array
        };
        out.push(
            StructureNode::new(kind, ByteRange::from_bounds(open.start(), close.end()))
                .with_body(ByteRange::from_bounds(open.end(), close.start()))
                .with_children(children),
        );
        Ok(close.end())
    }

    fn closure(&mut self) -> Result<StructureNode, SyntaxError> {
        let open = self.expect_punct("{", "'{'")?;
        let mut children = Vec::new();

        if self.at_punct("[")
            && let Some(after) = self.matching_close(self.pos)
            && self.signature_end(after + 1).is_some()
        {
            self.capture_list(&mut children)?;
        }
        if let Some(in_index) = self.signature_end(self.pos) {
            self.signature_parameters(in_index, &mut children);
            self.pos = in_index + 1;
        }

        children.extend(self.statements(Scope::FunctionBody, false)?);
        let close = self.close("}", open)?;
        Ok(
            StructureNode::new(StructureKind::Closure, ByteRange::from_bounds(open.start(), close.end()))
                .with_body(ByteRange::from_bounds(open.end(), close.start()))
                .with_children(children),
        )
    }

    /// Index of the lexeme closing the group opened at `index`.
    fn matching_close(&self, index: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (offset, sig) in self.lexemes.get(index..)?.iter().enumerate() {
            if sig.kind != LexKind::Punct {
                continue;
            }
            match self.text(*sig) {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(index + offset);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// If the lexemes from `index` form a closure signature ending in `in`,
    /// the index of that `in`.
    fn signature_end(&self, index: usize) -> Option<usize> {
        for (offset, sig) in self.lexemes.get(index..)?.iter().enumerate() {
            let text = self.text(*sig);
            let allowed = match sig.kind {
                LexKind::Token(TokenKind::Keyword) if text == "in" => return Some(index + offset),
                LexKind::Token(TokenKind::Identifier) => true,
                LexKind::Token(TokenKind::Keyword) => {
                    matches!(text, "_" | "throws" | "rethrows" | "async" | "inout" | "Self")
                }
                LexKind::Token(TokenKind::Other) => text.starts_with('@'),
                LexKind::Punct => {
                    matches!(text, "(" | ")" | "," | ":" | "->" | "." | "[" | "]" | "..." | "&")
                        || text.chars().all(|c| matches!(c, '?' | '!' | '<' | '>'))
                }
                _ => false,
            };
            if !allowed {
                return None;
            }
        }
        None
    }

    fn signature_parameters(&self, in_index: usize, out: &mut Vec<StructureNode>) {
        let mut in_type = false;
        let mut expect_name = true;
        let mut depth = 0usize;
        for sig in &self.lexemes[self.pos..in_index] {
            let text = self.text(*sig);
            match sig.kind {
                LexKind::Punct => match text {
                    "(" => {
                        depth += 1;
                        if depth == 1 {
                            expect_name = true;
                        }
                    }
                    ")" => depth = depth.saturating_sub(1),
                    "," if depth <= 1 => {
                        in_type = false;
                        expect_name = true;
                    }
                    ":" | "->" => in_type = true,
                    _ => {}
                },
                LexKind::Token(TokenKind::Identifier | TokenKind::Keyword) if !in_type && expect_name => {
                    expect_name = false;
                    if text != "_" {
                        out.push(
                            StructureNode::new(StructureKind::VarParameter, sig.range)
                                .with_name(text, Some(sig.range)),
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn capture_list(&mut self, out: &mut Vec<StructureNode>) -> Result<(), SyntaxError> {
        let Some(open) = self.bump() else {
            return Ok(());
        };
        loop {
            let Some(sig) = self.peek() else {
                return Err(SyntaxError::Unclosed {
                    delimiter: '[',
                    offset: open.start(),
                });
            };
            if self.is_punct(sig, "]") {
                self.pos += 1;
                return Ok(());
            }
            if self.is_punct(sig, ",") {
                self.pos += 1;
                continue;
            }

            let before = self.pos;
            let item_start = sig.start();
            let mut attributes = Vec::new();
            if self.is_keyword(sig, "weak") || self.is_keyword(sig, "unowned") {
                self.pos += 1;
                let mut end = sig.end();
                if let Some(next) = self.peek()
                    && self.is_punct(next, "(")
                    && !next.space_before
                {
                    end = self.skip_balanced()?;
                }
                attributes.push(Attribute {
                    kind: AttributeKind::Weak,
                    range: ByteRange::from_bounds(sig.start(), end),
                });
            }
            let name = match self.peek() {
                Some(name)
                    if name.kind == LexKind::Token(TokenKind::Identifier)
                        || self.is_keyword(name, "self") =>
                {
                    self.pos += 1;
                    Some(name)
                }
                _ => None,
            };
            let mut children = Vec::new();
            if self.at_punct("=") {
                self.pos += 1;
                self.expression(STATEMENT, &mut children)?;
            }
            if self.pos == before {
                self.pos += 1;
                continue;
            }

            let mut node = StructureNode::new(
                StructureKind::VarLocal,
                ByteRange::from_bounds(item_start, self.last_end()),
            )
            .with_children(children);
            if let Some(name) = name {
                node = node.with_name(self.text(name), Some(name.range));
            }
            node.attributes = attributes;
            out.push(node);
        }
    }
}
