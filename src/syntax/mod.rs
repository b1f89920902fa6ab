//! The structural and lexical model rules operate on.
//!
//! A [`SyntaxProvider`] turns source text into a [`SyntaxSnapshot`]: a
//! [`StructureTree`] of nested syntactic units plus a flat, ordered
//! [`TokenStream`]. Both are immutable for the duration of a lint pass and are
//! cross-referenced purely by byte range, so a snapshot can be shared freely
//! between the rules that inspect it.
//!
//! [`light::LightSyntax`] is a small reference provider covering the subset of
//! the language the built-in rules care about. Production frontends plug in by
//! implementing [`SyntaxProvider`].

pub mod light;
mod structure;
mod token;

pub use structure::{
    Attribute, AttributeKind, BreadthFirst, ElementKind, PreOrder, StructureElement, StructureKind, StructureNode,
    StructureTree,
};
pub use token::{Token, TokenKind, TokenStream};

use thiserror::Error;

/// Failure to produce a snapshot for one file.
///
/// Syntax errors are file-scoped: the linter reports them for the offending
/// file and keeps going with the rest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("unterminated string literal starting at byte {offset}")]
    UnterminatedString { offset: usize },
    #[error("unterminated block comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },
    #[error("unclosed '{delimiter}' opened at byte {offset}")]
    Unclosed { delimiter: char, offset: usize },
    #[error("unexpected '{found}' at byte {offset}")]
    Unexpected { found: String, offset: usize },
    #[error("expected {expected} at byte {offset}")]
    Expected { expected: &'static str, offset: usize },
    #[error("malformed syntax snapshot: {0}")]
    Contract(String),
}

/// Converts source text into structure and tokens.
///
/// Implementations must be deterministic and must not return partial trees:
/// either the whole file parses or the call fails.
pub trait SyntaxProvider: Send + Sync {
    fn parse(&self, source: &str) -> Result<SyntaxSnapshot, SyntaxError>;
}

/// Structure and tokens for one file.
#[derive(Debug, Clone, Default)]
pub struct SyntaxSnapshot {
    pub tree: StructureTree,
    pub tokens: TokenStream,
}

impl SyntaxSnapshot {
    /// Assemble a snapshot, checking the ordering and nesting invariants
    /// rules rely on.
    pub fn new(tree: StructureTree, tokens: TokenStream, source_len: usize) -> Result<Self, SyntaxError> {
        tokens.check_invariants(source_len)?;
        tree.check_invariants(source_len)?;
        Ok(Self { tree, tokens })
    }
}
