//! Token model
//!
//! Typed tokens with positional metadata and pairing links. Tokens live in a
//! single growable arena owned by [`TokenStream`]; every cross-link
//! (`parent`, `next`, `previous`, `opened`, `closed`) is an index into that
//! arena, never an owning reference. Consumers read tokens; they do not
//! mutate them — replacement text for embedded content is printed directly
//! instead of being written back.

use serde::{Deserialize, Serialize};

use crate::directives::DirectivesMap;

pub type TokenId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    TagOpen,
    TagClose,
    ControlFlowOpen,
    ControlFlowClose,
    Attribute,
    Equals,
    Value,
    Comment,
    Text,
    Unknown,
    Eof,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Newlines between the previous token and this one.
    pub newlines: u32,
    /// Whitespace after the last of those newlines (or all of it when there
    /// was no newline).
    pub whitespace_before: String,
    /// Comment-class tokens preceding this one. Unused by the markup
    /// tokenizer (comments are first-class tokens here) but part of the
    /// shared token model.
    pub comments_before: Vec<TokenId>,
    pub parent: Option<TokenId>,
    pub next: Option<TokenId>,
    pub previous: Option<TokenId>,
    /// On a closing marker: the opening token it closes.
    pub opened: Option<TokenId>,
    /// On an opening token: the marker that closed it.
    pub closed: Option<TokenId>,
    /// Directives parsed out of a comment token.
    pub directives: Option<DirectivesMap>,
}

impl Token {
    pub fn new(kind: TokenKind, text: String, newlines: u32, whitespace_before: String) -> Self {
        Token {
            kind,
            text,
            newlines,
            whitespace_before,
            comments_before: Vec::new(),
            parent: None,
            next: None,
            previous: None,
            opened: None,
            closed: None,
            directives: None,
        }
    }
}

/// Arena of tokens in document order, plus a consumption cursor with bounded
/// lookahead.
#[derive(Debug, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    cursor: usize,
}

impl TokenStream {
    pub fn new() -> Self {
        TokenStream::default()
    }

    pub(crate) fn push(&mut self, token: Token) -> TokenId {
        let id = self.tokens.len();
        self.tokens.push(token);
        id
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Consume and return the next token id. Once the stream is exhausted the
    /// final (end-of-stream) token is returned indefinitely.
    pub fn next(&mut self) -> TokenId {
        let id = self.cursor.min(self.tokens.len() - 1);
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
        id
    }

    /// Look `offset` tokens ahead of the cursor without consuming, clamped to
    /// the end-of-stream token.
    pub fn peek(&self, offset: usize) -> &Token {
        let index = (self.cursor + offset).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub fn get(&self, id: TokenId) -> &Token {
        &self.tokens[id]
    }

    pub(crate) fn get_mut(&mut self, id: TokenId) -> &mut Token {
        &mut self.tokens[id]
    }

    pub fn kind_of(&self, id: Option<TokenId>) -> Option<TokenKind> {
        id.map(|id| self.tokens[id].kind)
    }
}

impl std::ops::Index<TokenId> for TokenStream {
    type Output = Token;

    fn index(&self, id: TokenId) -> &Token {
        &self.tokens[id]
    }
}
