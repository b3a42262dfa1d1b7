//! `require("...")` statement scanner.
//!
//! The scanner works on tokens, not on a syntax tree. The source is split
//! into identifiers, punctuators, numbers and string, template and regular
//! expression literals, and the token stream is matched against
//! `require ( <string> )`. Text inside comments and literals never matches,
//! and syntax errors elsewhere in the file are not the scanner's concern.
//!
//! The `import` and `export` keywords reject the file with
//! [`Error::UnsupportedSyntax`]: module bodies are wrapped in a plain
//! function, where neither can work. Property names (`loader.import`) are
//! not keywords.

use std::path::Path;

use crate::{Error, Result};

/// A `require` call found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireOccurrence {
    /// The specifier as written, without quotes.
    pub specifier: String,
    /// Byte offset of the `require` token in the source text.
    pub offset: u32,
}

/// Scan `source` for `require("...")` calls, in order of appearance.
///
/// `origin` is only used for error messages. Only lexical errors
/// (unterminated literals and comments) fail the scan.
pub fn scan(source: &str, origin: &Path) -> Result<Vec<RequireOccurrence>> {
    let mut lexer = Lexer::new(source);
    let mut state = MatchState::Idle;
    let mut found = Vec::new();

    while let Some(token) = lexer.next_token().map_err(|message| Error::Parse {
        origin: origin.to_path_buf(),
        message,
    })? {
        if let Some(form) = module_form(&token, &lexer) {
            return Err(Error::UnsupportedSyntax {
                form,
                origin: origin.to_path_buf(),
                offset: offset_of(token.start),
            });
        }

        let (next, occurrence) = state.advance(&token);
        state = next;
        found.extend(occurrence);
    }

    Ok(found)
}

fn module_form(token: &Token<'_>, lexer: &Lexer<'_>) -> Option<&'static str> {
    if token.kind != TokenKind::Identifier || token.follows_dot {
        return None;
    }
    match token.text {
        "export" => Some("an export declaration"),
        "import" => {
            let next = lexer.clone().next_token().ok().flatten();
            Some(match next {
                Some(next) if next.is_punct("(") => "a dynamic import()",
                Some(next) if next.is_punct(".") => "import.meta",
                _ => "an import declaration",
            })
        }
        _ => None,
    }
}

fn offset_of(position: usize) -> u32 {
    u32::try_from(position).unwrap_or(u32::MAX)
}

/// Progress through `require` `(` string `)`.
#[derive(Debug, Clone, Copy)]
enum MatchState<'a> {
    Idle,
    Callee(usize),
    Open(usize),
    Argument(usize, &'a str),
}

impl<'a> MatchState<'a> {
    fn advance(self, token: &Token<'a>) -> (Self, Option<RequireOccurrence>) {
        match self {
            MatchState::Callee(start) if token.is_punct("(") => (MatchState::Open(start), None),
            MatchState::Open(start) if token.kind == TokenKind::String => {
                (MatchState::Argument(start, token.text), None)
            }
            MatchState::Argument(start, specifier) if token.is_punct(")") => (
                MatchState::Idle,
                Some(RequireOccurrence {
                    specifier: specifier.to_string(),
                    offset: offset_of(start),
                }),
            ),
            _ if token.kind == TokenKind::Identifier && token.text == "require" => {
                (MatchState::Callee(token.start), None)
            }
            _ => (MatchState::Idle, None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Identifier,
    Punctuator,
    /// Text is the literal's contents without the quotes.
    String,
    /// A template chunk: from a backtick or `}` up to a backtick or `${`.
    Template,
    Number,
    Regex,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
    start: usize,
    /// Whether the previous token was a `.` (property access).
    follows_dot: bool,
}

impl Token<'_> {
    fn is_punct(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punctuator && self.text == punct
    }

    /// Whether a `/` right after this token starts a regular expression.
    fn allows_regex(&self) -> bool {
        match self.kind {
            TokenKind::Identifier => {
                !self.follows_dot
                    && matches!(
                        self.text,
                        "return"
                            | "typeof"
                            | "instanceof"
                            | "in"
                            | "of"
                            | "new"
                            | "delete"
                            | "void"
                            | "throw"
                            | "case"
                            | "do"
                            | "else"
                            | "yield"
                            | "await"
                    )
            }
            TokenKind::Punctuator => !matches!(self.text, ")" | "]" | "}" | "++" | "--"),
            TokenKind::Template => self.text.ends_with("${"),
            TokenKind::String | TokenKind::Number | TokenKind::Regex => false,
        }
    }
}

/// Byte-level JavaScript tokenizer.
///
/// Token boundaries always fall on ASCII bytes, so slicing the source at
/// them is safe for any UTF-8 input.
#[derive(Debug, Clone)]
struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    regex_allowed: bool,
    follows_dot: bool,
    /// Only whitespace and comments since the last line break.
    line_start: bool,
    /// One entry per open brace, `true` for a template substitution.
    braces: Vec<bool>,
}

type LexResult<T> = std::result::Result<T, String>;

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            regex_allowed: true,
            follows_dot: false,
            line_start: true,
            braces: Vec::new(),
        }
    }

    fn next_token(&mut self) -> LexResult<Option<Token<'a>>> {
        self.skip_trivia()?;

        let start = self.pos;
        let Some(&byte) = self.bytes.get(start) else {
            return Ok(None);
        };

        let (kind, text) = match byte {
            b'"' | b'\'' => self.string(byte)?,
            b'`' => {
                self.pos += 1;
                self.template(start)?
            }
            b'0'..=b'9' => self.number(),
            b'.' if self.peek(1).is_some_and(|b| b.is_ascii_digit()) => self.number(),
            b'/' if self.regex_allowed => self.regex()?,
            b'{' => {
                self.braces.push(false);
                self.punct(1)
            }
            b'}' if self.braces.last() == Some(&true) => {
                self.braces.pop();
                self.pos += 1;
                self.template(start)?
            }
            b'}' => {
                self.braces.pop();
                self.punct(1)
            }
            b'+' | b'-' if self.peek(1) == Some(byte) => self.punct(2),
            _ if is_identifier_start(byte) => self.identifier(),
            _ => self.punct(1),
        };

        let token = Token {
            kind,
            text,
            start,
            follows_dot: self.follows_dot,
        };
        self.regex_allowed = token.allows_regex();
        self.follows_dot = token.is_punct(".");
        self.line_start = false;
        Ok(Some(token))
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn rest(&self) -> &'a [u8] {
        self.bytes.get(self.pos..).unwrap_or_default()
    }

    fn skip_trivia(&mut self) -> LexResult<()> {
        loop {
            let rest = self.rest();
            match rest.first() {
                Some(b'\n') => {
                    self.pos += 1;
                    self.line_start = true;
                }
                Some(b) if b.is_ascii_whitespace() || *b == 0x0b => self.pos += 1,
                Some(b'/') if rest.get(1) == Some(&b'/') => self.skip_line(),
                Some(b'/') if rest.get(1) == Some(&b'*') => {
                    let body = &rest[2..];
                    let Some(end) = body.windows(2).position(|w| w == b"*/") else {
                        return Err(format!("Unterminated comment at offset {}", self.pos));
                    };
                    if body[..end].contains(&b'\n') {
                        self.line_start = true;
                    }
                    self.pos += end + 4;
                }
                // HTML-like comments of classic scripts.
                Some(b'<') if rest.starts_with(b"<!--") => self.skip_line(),
                Some(b'-') if self.line_start && rest.starts_with(b"-->") => self.skip_line(),
                Some(b'#') if self.pos == 0 && rest.starts_with(b"#!") => self.skip_line(),
                // No-break space and byte order mark.
                Some(0xc2) if rest.get(1) == Some(&0xa0) => self.pos += 2,
                Some(0xef) if rest.starts_with(&[0xef, 0xbb, 0xbf]) => self.pos += 3,
                _ => return Ok(()),
            }
        }
    }

    fn skip_line(&mut self) {
        self.pos += self
            .rest()
            .iter()
            .position(|&b| b == b'\n')
            .unwrap_or(self.rest().len());
    }

    fn punct(&mut self, len: usize) -> (TokenKind, &'a str) {
        let start = self.pos;
        self.pos += len;
        (TokenKind::Punctuator, &self.source[start..self.pos])
    }

    fn identifier(&mut self) -> (TokenKind, &'a str) {
        let start = self.pos;
        while self.peek(0).is_some_and(is_identifier_part) {
            self.pos += 1;
        }
        (TokenKind::Identifier, &self.source[start..self.pos])
    }

    fn number(&mut self) -> (TokenKind, &'a str) {
        let start = self.pos;
        while self
            .peek(0)
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.')
        {
            self.pos += 1;
        }
        (TokenKind::Number, &self.source[start..self.pos])
    }

    fn string(&mut self, quote: u8) -> LexResult<(TokenKind, &'a str)> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek(0) {
                Some(b) if b == quote => break,
                Some(b'\\') => {
                    self.pos += if self.peek(1) == Some(b'\r') && self.peek(2) == Some(b'\n') {
                        3
                    } else {
                        2
                    };
                }
                Some(b'\n' | b'\r') | None => {
                    return Err(format!("Unterminated string literal at offset {}", start));
                }
                Some(_) => self.pos += 1,
            }
        }
        self.pos += 1;
        Ok((TokenKind::String, &self.source[start + 1..self.pos - 1]))
    }

    /// Continue a template after its opening backtick or closing `}`.
    fn template(&mut self, start: usize) -> LexResult<(TokenKind, &'a str)> {
        loop {
            match self.peek(0) {
                Some(b'`') => {
                    self.pos += 1;
                    break;
                }
                Some(b'$') if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.braces.push(true);
                    break;
                }
                Some(b'\\') => self.pos += 2,
                Some(_) => self.pos += 1,
                None => {
                    return Err(format!("Unterminated template literal at offset {}", start));
                }
            }
        }
        Ok((TokenKind::Template, &self.source[start..self.pos]))
    }

    fn regex(&mut self) -> LexResult<(TokenKind, &'a str)> {
        let start = self.pos;
        let mut in_class = false;
        self.pos += 1;
        loop {
            match self.peek(0) {
                Some(b'\\') => self.pos += 2,
                Some(b'[') => {
                    in_class = true;
                    self.pos += 1;
                }
                Some(b']') => {
                    in_class = false;
                    self.pos += 1;
                }
                Some(b'/') if !in_class => {
                    self.pos += 1;
                    break;
                }
                Some(b'\n' | b'\r') | None => {
                    return Err(format!(
                        "Unterminated regular expression at offset {}",
                        start
                    ));
                }
                Some(_) => self.pos += 1,
            }
        }
        while self.peek(0).is_some_and(is_identifier_part) {
            self.pos += 1;
        }
        Ok((TokenKind::Regex, &self.source[start..self.pos]))
    }
}

fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b == b'\\' || b >= 0x80
}

fn is_identifier_part(b: u8) -> bool {
    is_identifier_start(b) || b.is_ascii_digit()
}
