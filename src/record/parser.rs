//! Parser for the record subset of Lua
//!
//! Grammar:
//!
//! ```text
//! chunk   := { name '=' value [';'] }
//! value   := 'nil' | 'true' | 'false' | ['-'] number | string | table
//! table   := '{' [ field { sep field } [sep] ] '}'
//! field   := name '=' value | '[' string ']' '=' value | value
//! sep     := ',' | ';'
//! ```
//!
//! Later assignments to the same name replace earlier ones, as they would
//! when the file is run by a Lua interpreter.

use super::lexer::{Lexer, Spanned, Token};
use super::{SyntaxError, Table, Value};

/// Deepest table nesting accepted. Project files need five levels.
pub const MAX_TABLE_DEPTH: usize = 64;

/// Parse record source text into its top-level table of globals
pub fn parse(source: &str) -> Result<Table, SyntaxError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser { tokens, pos: 0, depth: 0 };
    parser.chunk()
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map(|s| &s.token).unwrap_or(&Token::Eof)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).map(|s| &s.token).unwrap_or(&Token::Eof)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.line())
    }

    fn expect(&mut self, expected: Token) -> Result<(), SyntaxError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!(
                "expected {}, found {}",
                expected.describe(),
                self.peek().describe()
            )))
        }
    }

    fn chunk(&mut self) -> Result<Table, SyntaxError> {
        let mut globals = Table::new();
        loop {
            match self.peek().clone() {
                Token::Eof => return Ok(globals),
                Token::Semicolon => {
                    self.advance();
                }
                Token::Name(name) => {
                    self.advance();
                    self.expect(Token::Assign)?;
                    let value = self.value()?;
                    globals.insert(name, value);
                }
                other => {
                    return Err(self.error(format!(
                        "expected an assignment, found {}",
                        other.describe()
                    )));
                }
            }
        }
    }

    fn value(&mut self) -> Result<Value, SyntaxError> {
        match self.advance() {
            Token::Nil => Ok(Value::Nil),
            Token::True => Ok(Value::Bool(true)),
            Token::False => Ok(Value::Bool(false)),
            Token::Int(i) => Ok(Value::Int(i)),
            Token::Float(f) => Ok(Value::Float(f)),
            Token::Str(s) => Ok(Value::Str(s)),
            Token::Minus => match self.advance() {
                Token::Int(i) => Ok(Value::Int(-i)),
                Token::Float(f) => Ok(Value::Float(-f)),
                other => {
                    self.pos -= 1;
                    Err(self.error(format!("expected a number after '-', found {}", other.describe())))
                }
            },
            Token::LBrace => {
                if self.depth == MAX_TABLE_DEPTH {
                    self.pos -= 1;
                    return Err(self.error(format!("tables nested deeper than {} levels", MAX_TABLE_DEPTH)));
                }
                self.depth += 1;
                let table = self.table();
                self.depth -= 1;
                table
            }
            other => {
                self.pos -= 1;
                Err(self.error(format!("expected a value, found {}", other.describe())))
            }
        }
    }

    fn table(&mut self) -> Result<Value, SyntaxError> {
        let mut table = Table::new();
        loop {
            if *self.peek() == Token::RBrace {
                self.advance();
                return Ok(Value::Table(table));
            }

            let named = *self.peek_at(1) == Token::Assign;
            match self.peek().clone() {
                Token::Name(name) if named => {
                    self.advance();
                    self.advance();
                    let value = self.value()?;
                    table.insert(name, value);
                }
                Token::LBracket => {
                    self.advance();
                    let key = match self.advance() {
                        Token::Str(s) => s,
                        other => {
                            self.pos -= 1;
                            return Err(self.error(format!(
                                "only string keys are supported, found {}",
                                other.describe()
                            )));
                        }
                    };
                    self.expect(Token::RBracket)?;
                    self.expect(Token::Assign)?;
                    let value = self.value()?;
                    table.insert(key, value);
                }
                _ => {
                    let value = self.value()?;
                    table.push(value);
                }
            }

            match self.peek() {
                Token::Comma | Token::Semicolon => {
                    self.advance();
                }
                Token::RBrace => {}
                other => {
                    return Err(self.error(format!(
                        "expected ',' or '}}', found {}",
                        other.describe()
                    )));
                }
            }
        }
    }
}
