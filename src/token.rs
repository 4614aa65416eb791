//! Token sources feeding the parse driver.

use std::fmt::{self, Display};

use crate::symbol::Symbol;

/// Where a token came from, as reported by the token source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    /// 1-based line; 0 when unknown.
    pub line: usize,
    /// 1-based column; for sources without text, the token index.
    pub column: usize,
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A stream of terminal symbols. The empty symbol marks the end of input and
/// must be returned on every call after it.
pub trait TokenSource {
    /// The next token.
    fn next_token(&mut self) -> Symbol;

    /// Location of the token most recently returned.
    fn location(&self) -> Location {
        Location::default()
    }
}

/// Splits text on whitespace; every word is one token.
#[derive(Debug, Clone)]
pub struct WhitespaceTokens<'a> {
    input: &'a str,
    offset: usize,
    line: usize,
    line_start: usize,
    location: Location,
}

impl<'a> WhitespaceTokens<'a> {
    /// Tokenize `input`.
    pub fn new(input: &'a str) -> Self {
        WhitespaceTokens {
            input,
            offset: 0,
            line: 1,
            line_start: 0,
            location: Location::default(),
        }
    }
}

impl<'a> TokenSource for WhitespaceTokens<'a> {
    fn next_token(&mut self) -> Symbol {
        let rest = &self.input[self.offset..];
        for (i, c) in rest.char_indices() {
            if c == '\n' {
                self.line += 1;
                self.line_start = self.offset + i + 1;
            }
            if !c.is_whitespace() {
                let start = self.offset + i;
                let len = self.input[start..]
                    .find(char::is_whitespace)
                    .unwrap_or(self.input.len() - start);
                self.offset = start + len;
                self.location = Location {
                    line: self.line,
                    column: self.input[self.line_start..start].chars().count() + 1,
                };
                return Symbol::new(&self.input[start..start + len]);
            }
        }
        self.offset = self.input.len();
        self.location = Location {
            line: self.line,
            column: self.input[self.line_start..].chars().count() + 1,
        };
        Symbol::empty()
    }

    fn location(&self) -> Location {
        self.location
    }
}

/// Feeds a prepared list of symbols; the location column is the 1-based
/// token index.
#[derive(Debug, Clone)]
pub struct SymbolTokens {
    tokens: std::vec::IntoIter<Symbol>,
    index: usize,
}

impl SymbolTokens {
    /// Feed `tokens` in order.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        SymbolTokens {
            tokens: tokens.into_iter().map(Into::into).collect::<Vec<_>>().into_iter(),
            index: 0,
        }
    }
}

impl TokenSource for SymbolTokens {
    fn next_token(&mut self) -> Symbol {
        self.index += 1;
        self.tokens.next().unwrap_or_default()
    }

    fn location(&self) -> Location {
        Location {
            line: 1,
            column: self.index,
        }
    }
}
