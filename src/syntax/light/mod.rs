//! Reference [`SyntaxProvider`] for the subset of the language the built-in
//! rules inspect.

mod lexer;
mod parser;

use self::lexer::{LexKind, Lexer};
use self::parser::Parser;
use super::{StructureTree, SyntaxError, SyntaxProvider, SyntaxSnapshot, Token, TokenStream};

#[derive(Debug, Clone, Copy, Default)]
pub struct LightSyntax;

impl LightSyntax {
    pub fn new() -> Self {
        Self
    }
}

impl SyntaxProvider for LightSyntax {
    fn parse(&self, source: &str) -> Result<SyntaxSnapshot, SyntaxError> {
        let lexemes = Lexer::new(source).tokenize()?;
        let tokens = lexemes
            .iter()
            .filter_map(|lexeme| match lexeme.kind {
                LexKind::Token(kind) => Some(Token::new(kind, lexeme.range)),
                LexKind::Punct => None,
            })
            .collect();
        let nodes = Parser::new(source, &lexemes).parse_file()?;
        log::trace!("parsed {} top-level nodes from {} bytes", nodes.len(), source.len());
        SyntaxSnapshot::new(StructureTree::new(nodes), TokenStream::new(tokens), source.len())
    }
}
