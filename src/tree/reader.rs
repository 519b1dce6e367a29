//! S-expression reader for syntax trees.
//!
//! Tokenizes with anchored regex patterns, then builds nodes with a small
//! recursive parser. Bare words become token children, quoted strings
//! become token children with escapes resolved, and the bare word `nil`
//! marks an empty child slot.

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, Range, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::{
    node::{Child, Node},
    source::{Comment, Source},
};

/// Deepest node nesting the reader accepts.
pub const MAX_NESTING: usize = 128;

pub type RegexHandler = fn(&mut Lexer, &Regex);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    OpenParen,
    CloseParen,
    Word,
    String,
    Comment,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub offset: usize,
}

lazy_static! {
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern { regex: Regex::new(r"^\s+").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new(r"^;[^\n]*").unwrap(), handler: comment_handler },
        RegexPattern { regex: Regex::new(r"^\(").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(") },
        RegexPattern { regex: Regex::new(r"^\)").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")") },
        RegexPattern { regex: Regex::new(r#"^"(?:[^"\\]|\\.)*""#).unwrap(), handler: string_handler },
        RegexPattern { regex: Regex::new(r#"^[^\s()";]+"#).unwrap(), handler: word_handler },
    ];
}

pub struct Lexer {
    tokens: Vec<Token>,
    source: String,
    pos: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            tokens: vec![],
            source: source.to_string(),
            pos: 0,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn matched(&self, regex: &Regex) -> String {
        regex
            .find(self.remainder())
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    lexer.advance_n(matched.len());
}

fn comment_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    let offset = lexer.pos;
    let length = matched.len();
    let text = matched[1..].strip_prefix(' ').unwrap_or(&matched[1..]).to_string();

    lexer.push(MK_TOKEN!(TokenKind::Comment, text, offset));
    lexer.advance_n(length);
}

fn string_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    let offset = lexer.pos;
    let length = matched.len();

    let mut result = String::new();
    let mut chars = matched[1..length - 1].chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some(other) => result.push(other),
                None => result.push(ch),
            }
        } else {
            result.push(ch);
        }
    }

    lexer.push(MK_TOKEN!(TokenKind::String, result, offset));
    lexer.advance_n(length);
}

fn word_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    let offset = lexer.pos;
    let length = matched.len();

    lexer.push(MK_TOKEN!(TokenKind::Word, matched, offset));
    lexer.advance_n(length);
}

/// Maps byte offsets to line/column positions.
struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (index, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(index + 1);
            }
        }
        LineIndex { text, line_starts }
    }

    fn position(&self, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let end = offset.min(self.text.len());
        let column = self.text[start..end].chars().count();
        Position::new(line as u32, column as u32)
    }

    fn line_end(&self, offset: usize) -> usize {
        self.text[offset..]
            .find('\n')
            .map(|found| offset + found)
            .unwrap_or(self.text.len())
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(source);
    let index = LineIndex::new(source);

    while !lex.at_eof() {
        let pattern = PATTERNS
            .iter()
            .find(|pattern| pattern.regex.is_match(lex.remainder()));

        match pattern {
            Some(pattern) => (pattern.handler)(&mut lex, &pattern.regex),
            None => {
                let position = index.position(lex.pos);
                let error = if lex.remainder().starts_with('"') {
                    ErrorImpl::UnterminatedString
                } else {
                    ErrorImpl::UnexpectedToken {
                        token: lex.remainder().chars().take(1).collect(),
                    }
                };
                return Err(Error::new(error, position));
            }
        }
    }

    let offset = lex.pos;
    lex.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), offset));
    Ok(lex.tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    index: &'a LineIndex<'a>,
}

impl<'a> Parser<'a> {
    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        self.pos += 1;
        token
    }

    fn unexpected(&self, token: &Token) -> Error {
        Error::new(
            ErrorImpl::UnexpectedToken {
                token: token.value.clone(),
            },
            self.index.position(token.offset),
        )
    }

    fn parse_node(&mut self, depth: usize) -> Result<Node, Error> {
        let open = self.advance();
        if open.kind != TokenKind::OpenParen {
            return Err(self.unexpected(&open));
        }
        if depth > MAX_NESTING {
            return Err(Error::new(
                ErrorImpl::NestingTooDeep { limit: MAX_NESTING },
                self.index.position(open.offset),
            ));
        }

        let kind = self.advance();
        if kind.kind != TokenKind::Word {
            return Err(self.unexpected(&kind));
        }

        let mut children = vec![];
        loop {
            match self.current().kind {
                TokenKind::CloseParen => break,
                TokenKind::OpenParen => children.push(Child::Node(self.parse_node(depth + 1)?)),
                TokenKind::Word => {
                    let word = self.advance();
                    if word.value == "nil" {
                        children.push(Child::Nil);
                    } else {
                        children.push(Child::Token(word.value));
                    }
                }
                TokenKind::String => children.push(Child::Token(self.advance().value)),
                TokenKind::EOF | TokenKind::Comment => {
                    return Err(Error::new(
                        ErrorImpl::UnbalancedParens { open: depth },
                        self.index.position(self.current().offset),
                    ));
                }
            }
        }

        let close = self.advance();
        let range = Range::new(
            self.index.position(open.offset),
            self.index.position(close.offset + 1),
        );
        Ok(Node::new(&kind.value, children, range))
    }
}

/// Merges comment tokens on consecutive lines into comment blocks.
fn collect_comments(tokens: &[Token], index: &LineIndex) -> Vec<Comment> {
    let mut comments: Vec<Comment> = vec![];
    for token in tokens {
        let start = index.position(token.offset);
        let end = index.position(index.line_end(token.offset));

        match comments.last_mut() {
            Some(previous) if previous.range.end.line + 1 == start.line => {
                previous.range.end = end;
                previous.text.push('\n');
                previous.text.push_str(&token.value);
            }
            _ => comments.push(Comment::new(Range::new(start, end), &token.value)),
        }
    }
    comments
}

/// Reads an s-expression tree and its comments into a `Source`.
///
/// Several top-level nodes are wrapped in a `begin` node spanning all of them.
pub fn read(filename: &str, text: &str) -> Result<Source, Error> {
    let index = LineIndex::new(text);
    let (comment_tokens, tokens): (Vec<Token>, Vec<Token>) = tokenize(text)?
        .into_iter()
        .partition(|token| token.kind == TokenKind::Comment);
    let comments = collect_comments(&comment_tokens, &index);

    let mut parser = Parser {
        tokens,
        pos: 0,
        index: &index,
    };

    let mut roots = vec![];
    while parser.current().kind != TokenKind::EOF {
        if parser.current().kind == TokenKind::CloseParen {
            let stray = parser.current().clone();
            return Err(parser.unexpected(&stray));
        }
        roots.push(parser.parse_node(1)?);
    }

    let node = match roots.len() {
        0 => return Err(Error::new(ErrorImpl::EmptyTree, Position::default())),
        1 => roots.remove(0),
        _ => {
            let range = Range::new(roots[0].range.start, roots[roots.len() - 1].range.end);
            Node::new("begin", roots.into_iter().map(Child::Node).collect(), range)
        }
    };

    Ok(Source::new(filename, Some(node), comments))
}
