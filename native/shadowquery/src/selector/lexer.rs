//! Selector Lexer
//!
//! Tokenizes CSS selector text. Whitespace is significant (it is the
//! descendant combinator), so runs of it come out as a single token.

use super::parser::AttrOperator;

/// Selector token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    /// Name followed by `(`
    Function(String),
    /// `:nth-*(` with its raw argument, closing paren consumed
    Nth(String, String),
    Hash(String),
    String(String),
    Number(String),

    Dot,         // .
    Star,        // *
    Colon,       // :
    Comma,       // ,
    Gt,          // >
    Plus,        // +
    Tilde,       // ~
    Pipe,        // |
    Whitespace,

    LeftBracket,  // [
    RightBracket, // ]
    RightParen,   // )

    /// Attribute matcher: = ~= |= ^= $= *=
    Match(AttrOperator),
    Delim(char),
    /// Lexically broken input
    Bad(&'static str),

    Eof,
}

impl Token {
    /// Short human-readable form for error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier '{s}'"),
            Token::Function(s) => format!("'{s}('"),
            Token::Nth(s, _) => format!("'{s}('"),
            Token::Hash(s) => format!("'#{s}'"),
            Token::String(_) => "string".to_string(),
            Token::Number(s) => format!("number '{s}'"),
            Token::Dot => "'.'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Colon => "':'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Gt => "'>'".to_string(),
            Token::Plus => "'+'".to_string(),
            Token::Tilde => "'~'".to_string(),
            Token::Pipe => "'|'".to_string(),
            Token::Whitespace => "whitespace".to_string(),
            Token::LeftBracket => "'['".to_string(),
            Token::RightBracket => "']'".to_string(),
            Token::RightParen => "')'".to_string(),
            Token::Match(op) => format!("'{}'", op.as_str()),
            Token::Delim(c) => format!("'{c}'"),
            Token::Bad(reason) => reason.to_string(),
            Token::Eof => "end of selector".to_string(),
        }
    }
}

/// Selector lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    /// Advance by n bytes
    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Consume `c` and return `matched` if the next char is `=`, else `single`
    fn maybe_match(&mut self, matched: AttrOperator, single: Token) -> Token {
        self.advance(1);
        if self.peek() == Some('=') {
            self.advance(1);
            Token::Match(matched)
        } else {
            single
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        let Some(c) = self.peek() else {
            return Token::Eof;
        };

        if c.is_whitespace() {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance(self.peek().map_or(1, char::len_utf8));
            }
            return Token::Whitespace;
        }

        match c {
            '"' | '\'' => self.read_string(c),
            '#' => {
                self.advance(1);
                if self.starts_name(0) {
                    Token::Hash(self.read_name())
                } else {
                    Token::Delim('#')
                }
            }
            '.' => {
                self.advance(1);
                Token::Dot
            }
            ':' => {
                self.advance(1);
                Token::Colon
            }
            ',' => {
                self.advance(1);
                Token::Comma
            }
            '>' => {
                self.advance(1);
                Token::Gt
            }
            '+' => {
                self.advance(1);
                Token::Plus
            }
            '[' => {
                self.advance(1);
                Token::LeftBracket
            }
            ']' => {
                self.advance(1);
                Token::RightBracket
            }
            ')' => {
                self.advance(1);
                Token::RightParen
            }
            '=' => {
                self.advance(1);
                Token::Match(AttrOperator::Equals)
            }
            '*' => self.maybe_match(AttrOperator::Substring, Token::Star),
            '~' => self.maybe_match(AttrOperator::Includes, Token::Tilde),
            '|' => self.maybe_match(AttrOperator::DashMatch, Token::Pipe),
            '^' => self.maybe_match(AttrOperator::Prefix, Token::Delim('^')),
            '$' => self.maybe_match(AttrOperator::Suffix, Token::Delim('$')),
            '0'..='9' => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance(1);
                }
                Token::Number(self.input[start..self.pos].to_string())
            }
            _ if self.starts_name(0) => self.read_ident_like(),
            _ => {
                self.advance(c.len_utf8());
                Token::Delim(c)
            }
        }
    }

    /// Whether an identifier starts `offset` chars ahead
    fn starts_name(&self, offset: usize) -> bool {
        match self.peek_at(offset) {
            Some('-') => match self.peek_at(offset + 1) {
                Some('-') => true,
                Some('\\') => true,
                Some(c) => is_name_start_char(c),
                None => false,
            },
            Some('\\') => self.peek_at(offset + 1).is_some(),
            Some(c) => is_name_start_char(c),
            None => false,
        }
    }

    /// Read a name, resolving escapes
    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.advance(1);
                name.push(self.read_escape());
            } else if is_name_char(c) {
                name.push(c);
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        name
    }

    /// Read the escaped code point after a backslash
    fn read_escape(&mut self) -> char {
        let Some(c) = self.peek() else {
            return char::REPLACEMENT_CHARACTER;
        };

        if !c.is_ascii_hexdigit() {
            self.advance(c.len_utf8());
            return c;
        }

        let start = self.pos;
        while self.pos - start < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.advance(1);
        }
        let code = u32::from_str_radix(&self.input[start..self.pos], 16).unwrap_or(0xFFFD);
        // One whitespace character terminates a hex escape
        if self.peek().is_some_and(char::is_whitespace) {
            self.advance(self.peek().map_or(1, char::len_utf8));
        }
        match char::from_u32(code) {
            Some(ch) if code != 0 => ch,
            _ => char::REPLACEMENT_CHARACTER,
        }
    }

    fn read_ident_like(&mut self) -> Token {
        let name = self.read_name();
        if self.peek() != Some('(') {
            return Token::Ident(name);
        }
        self.advance(1);

        if name.to_ascii_lowercase().starts_with("nth-") {
            let rest = self.remaining();
            return match rest.find(')') {
                Some(end) => {
                    let raw = rest[..end].to_string();
                    self.advance(end + 1);
                    Token::Nth(name, raw)
                }
                None => {
                    self.advance(rest.len());
                    Token::Bad("unclosed ':nth-*(' argument")
                }
            };
        }

        Token::Function(name)
    }

    fn read_string(&mut self, quote: char) -> Token {
        self.advance(1);
        let mut value = String::new();

        while let Some(c) = self.peek() {
            match c {
                _ if c == quote => {
                    self.advance(1);
                    return Token::String(value);
                }
                '\\' => {
                    self.advance(1);
                    match self.peek() {
                        None => break,
                        // Escaped newline is a line continuation
                        Some('\n') => self.advance(1),
                        Some(_) => value.push(self.read_escape()),
                    }
                }
                _ => {
                    value.push(c);
                    self.advance(c.len_utf8());
                }
            }
        }

        Token::Bad("unterminated string")
    }

    /// Tokenize the entire input; the last token is always Eof
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}
