//! Selector Parser
//!
//! Recursive descent parser for a Selectors Level 4 subset. Complex
//! selectors are stored right-to-left: the subject compound first, then its
//! ancestry with the combinator that links each step.

use super::lexer::{Lexer, Token};

/// Comma-separated list of complex selectors
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

/// Compound selectors joined by combinators
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    /// Compound the matched element itself must satisfy
    pub subject: CompoundSelector,
    /// Remaining compounds, nearest first, each with the combinator that
    /// relates it to the previous one
    pub ancestry: Vec<(Combinator, CompoundSelector)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// whitespace
    Descendant,
    /// >
    Child,
    /// +
    NextSibling,
    /// ~
    SubsequentSibling,
}

/// Type selector plus any number of simple selectors
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelector {
    /// Element name; None is the universal selector
    pub tag: Option<String>,
    pub simple: Vec<SimpleSelector>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimpleSelector {
    Id(String),
    Class(String),
    Attribute(AttributeSelector),
    Pseudo(PseudoClass),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: String,
    /// None tests presence only
    pub matcher: Option<(AttrOperator, String)>,
    pub case_insensitive: bool,
}

/// Attribute value operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOperator {
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

impl AttrOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            AttrOperator::Equals => "=",
            AttrOperator::Includes => "~=",
            AttrOperator::DashMatch => "|=",
            AttrOperator::Prefix => "^=",
            AttrOperator::Suffix => "$=",
            AttrOperator::Substring => "*=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PseudoClass {
    Not(SelectorList),
    /// :is() and :where()
    Is(SelectorList),
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    NthChild(Nth),
    NthLastChild(Nth),
    NthOfType(Nth),
    NthLastOfType(Nth),
    Empty,
    Root,
    /// :hover, :focus and friends; a static document never matches them
    UserAction,
}

/// `an+b` position pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    pub a: i32,
    pub b: i32,
}

impl Nth {
    /// Whether a 1-based position fits the pattern
    pub fn matches(self, position: i32) -> bool {
        // Widened so extreme coefficients cannot overflow
        let (a, b, position) = (i64::from(self.a), i64::from(self.b), i64::from(position));
        if a == 0 {
            return position == b;
        }
        let offset = position - b;
        offset % a == 0 && offset / a >= 0
    }

    /// Parse `odd`, `even`, `b`, `an`, `an+b` or `an-b`
    pub fn parse(raw: &str) -> Result<Nth, String> {
        let compact = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let invalid = || format!("invalid :nth-* argument '{}'", raw.trim());

        match compact.as_str() {
            "odd" => return Ok(Nth { a: 2, b: 1 }),
            "even" => return Ok(Nth { a: 2, b: 0 }),
            "" => return Err(invalid()),
            _ => {}
        }

        let Some(n_pos) = compact.find('n') else {
            let b = compact.parse().map_err(|_| invalid())?;
            return Ok(Nth { a: 0, b });
        };

        let a = match &compact[..n_pos] {
            "" | "+" => 1,
            "-" => -1,
            digits => digits.parse().map_err(|_| invalid())?,
        };
        let b = match &compact[n_pos + 1..] {
            "" => 0,
            rest if rest.starts_with('+') || rest.starts_with('-') => {
                rest.parse().map_err(|_| invalid())?
            }
            _ => return Err(invalid()),
        };

        Ok(Nth { a, b })
    }
}

/// Parse a selector list
pub fn parse(selector: &str) -> Result<SelectorList, String> {
    let mut parser = Parser::new(selector);
    parser.parse_list(false)
}

/// Selector parser
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Parser {
            tokens: Lexer::new(input).tokenize(),
            pos: 0,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Skip whitespace, reporting whether any was skipped
    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while matches!(self.peek(), Token::Whitespace) {
            self.advance();
            skipped = true;
        }
        skipped
    }

    fn unexpected(&self) -> String {
        match self.peek() {
            Token::Bad(reason) => reason.to_string(),
            Token::Pipe => "namespaces are not supported".to_string(),
            other => format!("unexpected {}", other.describe()),
        }
    }

    /// Parse a selector list; a nested list ends at (and consumes) ')'
    fn parse_list(&mut self, nested: bool) -> Result<SelectorList, String> {
        let mut list = Vec::new();
        loop {
            self.skip_whitespace();
            list.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.peek() {
                Token::Comma => {
                    self.advance();
                }
                Token::RightParen if nested => {
                    self.advance();
                    return Ok(SelectorList(list));
                }
                Token::Eof if !nested => return Ok(SelectorList(list)),
                Token::Eof => return Err("unclosed '('".to_string()),
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, String> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                Token::Gt => Combinator::Child,
                Token::Plus => Combinator::NextSibling,
                Token::Tilde => Combinator::SubsequentSibling,
                Token::Comma | Token::RightParen | Token::Eof => break,
                Token::Pipe => return Err("unexpected '|'".to_string()),
                _ if had_whitespace => Combinator::Descendant,
                _ => return Err(self.unexpected()),
            };
            if combinator != Combinator::Descendant {
                self.advance();
                self.skip_whitespace();
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        // Reverse into subject-first order
        let subject = compounds.pop().unwrap_or_default();
        let mut ancestry = Vec::with_capacity(compounds.len());
        while let (Some(compound), Some(combinator)) = (compounds.pop(), combinators.pop()) {
            ancestry.push((combinator, compound));
        }

        Ok(ComplexSelector { subject, ancestry })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, String> {
        let mut compound = CompoundSelector::default();
        let mut any = false;

        match self.peek() {
            Token::Ident(name) => {
                compound.tag = Some(name.clone());
                self.advance();
                any = true;
            }
            Token::Star => {
                self.advance();
                any = true;
            }
            _ => {}
        }
        if matches!(self.peek(), Token::Pipe) {
            return Err("namespaces are not supported".to_string());
        }

        loop {
            let simple = match self.peek() {
                Token::Hash(id) => {
                    let id = id.clone();
                    self.advance();
                    SimpleSelector::Id(id)
                }
                Token::Dot => {
                    self.advance();
                    match self.advance() {
                        Token::Ident(class) => SimpleSelector::Class(class),
                        _ => return Err("expected class name after '.'".to_string()),
                    }
                }
                Token::LeftBracket => {
                    self.advance();
                    SimpleSelector::Attribute(self.parse_attribute()?)
                }
                Token::Colon => {
                    self.advance();
                    SimpleSelector::Pseudo(self.parse_pseudo()?)
                }
                _ => break,
            };
            compound.simple.push(simple);
            any = true;
        }

        if !any {
            return Err(match self.peek() {
                Token::Eof | Token::Comma | Token::RightParen => "expected a selector".to_string(),
                _ => self.unexpected(),
            });
        }
        Ok(compound)
    }

    /// Parse the inside of `[...]`, opening bracket already consumed
    fn parse_attribute(&mut self) -> Result<AttributeSelector, String> {
        self.skip_whitespace();
        let name = match self.advance() {
            Token::Ident(name) => name,
            _ => return Err("expected attribute name".to_string()),
        };
        self.skip_whitespace();
        if matches!(self.peek(), Token::Pipe) {
            return Err("namespaces are not supported".to_string());
        }

        let mut selector = AttributeSelector {
            name,
            matcher: None,
            case_insensitive: false,
        };

        if let Token::Match(op) = self.peek() {
            let op = *op;
            self.advance();
            self.skip_whitespace();
            let value = match self.advance() {
                Token::Ident(v) | Token::String(v) | Token::Number(v) => v,
                Token::Bad(reason) => return Err(reason.to_string()),
                _ => return Err("expected attribute value".to_string()),
            };
            selector.matcher = Some((op, value));
            self.skip_whitespace();

            if let Token::Ident(flag) = self.peek() {
                selector.case_insensitive = match flag.as_str() {
                    "i" | "I" => true,
                    "s" | "S" => false,
                    _ => return Err(format!("unknown attribute flag '{flag}'")),
                };
                self.advance();
                self.skip_whitespace();
            }
        }

        match self.advance() {
            Token::RightBracket => Ok(selector),
            Token::Eof => Err("unclosed '['".to_string()),
            _ => Err("expected ']'".to_string()),
        }
    }

    /// Parse a pseudo-class, colon already consumed
    fn parse_pseudo(&mut self) -> Result<PseudoClass, String> {
        match self.advance() {
            Token::Colon => Err("pseudo-elements are not supported".to_string()),
            Token::Ident(name) => match name.to_ascii_lowercase().as_str() {
                "first-child" => Ok(PseudoClass::FirstChild),
                "last-child" => Ok(PseudoClass::LastChild),
                "only-child" => Ok(PseudoClass::OnlyChild),
                "first-of-type" => Ok(PseudoClass::FirstOfType),
                "last-of-type" => Ok(PseudoClass::LastOfType),
                "only-of-type" => Ok(PseudoClass::OnlyOfType),
                "empty" => Ok(PseudoClass::Empty),
                "root" => Ok(PseudoClass::Root),
                "hover" | "focus" | "active" | "focus-within" | "focus-visible" | "visited" | "target" => {
                    Ok(PseudoClass::UserAction)
                }
                _ => Err(format!("unsupported pseudo-class ':{name}'")),
            },
            Token::Function(name) => match name.to_ascii_lowercase().as_str() {
                "not" => Ok(PseudoClass::Not(self.parse_list(true)?)),
                "is" | "where" => Ok(PseudoClass::Is(self.parse_list(true)?)),
                _ => Err(format!("unsupported pseudo-class ':{name}()'")),
            },
            Token::Nth(name, raw) => {
                let nth = Nth::parse(&raw)?;
                match name.to_ascii_lowercase().as_str() {
                    "nth-child" => Ok(PseudoClass::NthChild(nth)),
                    "nth-last-child" => Ok(PseudoClass::NthLastChild(nth)),
                    "nth-of-type" => Ok(PseudoClass::NthOfType(nth)),
                    "nth-last-of-type" => Ok(PseudoClass::NthLastOfType(nth)),
                    _ => Err(format!("unsupported pseudo-class ':{name}()'")),
                }
            }
            Token::Bad(reason) => Err(reason.to_string()),
            _ => Err("expected pseudo-class name after ':'".to_string()),
        }
    }
}
