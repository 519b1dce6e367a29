use lazy_static::lazy_static;
use regex::Regex;

use crate::{MK_DEFAULT_HANDLER, MK_TOKEN};

pub type RegexHandler = fn(&mut Lexer, &Regex);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Name,
    Less,
    Greater,
    OpenCurly,
    CloseCurly,
    HashRocket,
    Comma,
    Question,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub offset: usize,
}

lazy_static! {
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern { regex: Regex::new(r"^\s+").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new(r"^(::)?[A-Za-z_$0-9][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*").unwrap(), handler: name_handler },
        RegexPattern { regex: Regex::new(r"^=>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::HashRocket, "=>") },
        RegexPattern { regex: Regex::new(r"^<").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Less, "<") },
        RegexPattern { regex: Regex::new(r"^>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Greater, ">") },
        RegexPattern { regex: Regex::new(r"^\{").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{") },
        RegexPattern { regex: Regex::new(r"^\}").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}") },
        RegexPattern { regex: Regex::new(r"^,").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Comma, ",") },
        RegexPattern { regex: Regex::new(r"^\?").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Question, "?") },
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
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = regex.find(lexer.remainder()).map(|m| m.end()).unwrap_or(0);
    lexer.advance_n(matched);
}

fn name_handler(lexer: &mut Lexer, regex: &Regex) {
    let value = match regex.find(lexer.remainder()) {
        Some(found) => found.as_str().to_string(),
        None => return,
    };
    let offset = lexer.pos;
    let length = value.len();

    lexer.push(MK_TOKEN!(TokenKind::Name, value, offset));
    lexer.advance_n(length);
}

/// Splits a type tag into tokens.
///
/// Returns `None` when the tag contains a character no pattern accepts.
pub fn tokenize(source: &str) -> Option<Vec<Token>> {
    let mut lex = Lexer::new(source);

    while !lex.at_eof() {
        let pattern = PATTERNS
            .iter()
            .find(|pattern| pattern.regex.is_match(lex.remainder()))?;
        let before = lex.pos;
        (pattern.handler)(&mut lex, &pattern.regex);
        if lex.pos == before {
            return None;
        }
    }

    let offset = lex.pos;
    lex.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), offset));
    Some(lex.tokens)
}
