//! Token extraction for record files

use super::SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,
    Nil,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Assign,
    Comma,
    Semicolon,
    Minus,
    Eof,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Name(n) => format!("identifier '{}'", n),
            Token::Int(i) => format!("number {}", i),
            Token::Float(f) => format!("number {}", f),
            Token::Str(_) => "string".to_string(),
            Token::True => "'true'".to_string(),
            Token::False => "'false'".to_string(),
            Token::Nil => "'nil'".to_string(),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::Assign => "'='".to_string(),
            Token::Comma => "','".to_string(),
            Token::Semicolon => "';'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Eof => "end of file".to_string(),
        }
    }
}

/// A token and the line it starts on
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub line: usize,
}

pub(crate) struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self { chars: source.chars().peekable(), line: 1 }
    }

    /// Tokenize the whole input, ending with [`Token::Eof`]
    pub(crate) fn tokenize(mut self) -> Result<Vec<Spanned>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('-') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.peek() != Some(&'-') {
                        return Ok(());
                    }
                    self.bump();
                    self.bump();
                    self.skip_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_comment(&mut self) -> Result<(), SyntaxError> {
        let start = self.line;
        let mut ahead = self.chars.clone();
        if ahead.next() == Some('[') && ahead.next() == Some('[') {
            self.bump();
            self.bump();
            let mut prev = '\0';
            while let Some(c) = self.bump() {
                if prev == ']' && c == ']' {
                    return Ok(());
                }
                prev = c;
            }
            return Err(SyntaxError::new("unfinished long comment", start));
        }
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<Spanned, SyntaxError> {
        self.skip_trivia()?;
        let line = self.line;
        let Some(&c) = self.chars.peek() else {
            return Ok(Spanned { token: Token::Eof, line });
        };

        let token = match c {
            '{' => self.single(Token::LBrace),
            '}' => self.single(Token::RBrace),
            '[' => self.single(Token::LBracket),
            ']' => self.single(Token::RBracket),
            '=' => self.single(Token::Assign),
            ',' => self.single(Token::Comma),
            ';' => self.single(Token::Semicolon),
            '-' => self.single(Token::Minus),
            '"' | '\'' => self.string(c)?,
            c if c.is_ascii_digit() || c == '.' => self.number()?,
            c if c.is_alphabetic() || c == '_' => self.name(),
            other => {
                return Err(SyntaxError::new(format!("unexpected character '{}'", other), line));
            }
        };
        Ok(Spanned { token, line })
    }

    fn single(&mut self, token: Token) -> Token {
        self.bump();
        token
    }

    fn name(&mut self) -> Token {
        let mut name = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match name.as_str() {
            "true" => Token::True,
            "false" => Token::False,
            "nil" => Token::Nil,
            _ => Token::Name(name),
        }
    }

    fn number(&mut self) -> Result<Token, SyntaxError> {
        let line = self.line;
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            let exponent_sign =
                (c == '+' || c == '-') && matches!(text.chars().last(), Some('e') | Some('E'));
            if c.is_ascii_alphanumeric() || c == '.' || exponent_sign {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }

        if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            return i64::from_str_radix(hex, 16)
                .map(Token::Int)
                .map_err(|_| SyntaxError::new(format!("malformed number '{}'", text), line));
        }
        if !text.contains(['.', 'e', 'E']) {
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Token::Int(i));
            }
        }
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| SyntaxError::new(format!("malformed number '{}'", text), line))
    }

    fn string(&mut self, quote: char) -> Result<Token, SyntaxError> {
        let line = self.line;
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(SyntaxError::new("unfinished string", line));
                }
                Some(c) if c == quote => return Ok(Token::Str(value)),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some(other) => {
                            return Err(SyntaxError::new(
                                format!("invalid escape sequence '\\{}'", other),
                                self.line,
                            ));
                        }
                        None => return Err(SyntaxError::new("unfinished string", line)),
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
            }
        }
    }
}
