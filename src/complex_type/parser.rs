//! Recursive-descent parser for type tags.
//!
//! Grammar:
//!
//! ```text
//! list   := unique ("," unique)*
//! unique := NAME params? "?"?
//! params := "<" list ">" | "{" list "=>" list "}"
//! ```
//!
//! A trailing `?` adds `nil` to the union. Parameters nest at most
//! `MAX_NESTING` levels deep.

use super::{
    complex_type::UniqueType,
    lexer::{tokenize, Token, TokenKind},
};

pub const MAX_NESTING: usize = 32;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn current_token_kind(&self) -> TokenKind {
        self.tokens
            .get(self.pos)
            .map(|token| token.kind)
            .unwrap_or(TokenKind::EOF)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        if self.current_token_kind() == kind {
            self.advance()
        } else {
            None
        }
    }

    fn parse_list(&mut self) -> Option<Vec<UniqueType>> {
        if self.depth > MAX_NESTING {
            return None;
        }
        self.depth += 1;
        let mut items = self.parse_unique()?;
        while self.current_token_kind() == TokenKind::Comma {
            self.advance();
            items.extend(self.parse_unique()?);
        }
        self.depth -= 1;
        Some(items)
    }

    fn parse_unique(&mut self) -> Option<Vec<UniqueType>> {
        let name = self.expect(TokenKind::Name)?.value;
        let bare = name.strip_prefix("::").unwrap_or(&name);
        if !bare.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
            return None;
        }

        let unique = match self.current_token_kind() {
            TokenKind::Less => {
                self.advance();
                let subtypes = self.parse_list()?;
                self.expect(TokenKind::Greater)?;
                UniqueType::with_subtypes(&name, subtypes)
            }
            TokenKind::OpenCurly => {
                self.advance();
                let key_types = self.parse_list()?;
                self.expect(TokenKind::HashRocket)?;
                let value_types = self.parse_list()?;
                self.expect(TokenKind::CloseCurly)?;
                UniqueType::mapping(&name, key_types, value_types)
            }
            _ => UniqueType::new(&name),
        };

        let mut result = vec![unique];
        if self.current_token_kind() == TokenKind::Question {
            self.advance();
            result.push(UniqueType::nil());
        }
        Some(result)
    }
}

/// Parses a full tag into its atoms. `None` if the tag is malformed.
pub fn parse_type(source: &str) -> Option<Vec<UniqueType>> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(tokens);
    let items = parser.parse_list()?;
    parser.expect(TokenKind::EOF)?;
    Some(items)
}
