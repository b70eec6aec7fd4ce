// ABOUTME: Hand-written lexer turning source text into a token stream

use crate::error::ScriptError;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Let,
    If,
    Else,
    While,
    For,
    Def,
    Return,
    True,
    False,
    Break,
    Continue,
}

impl Keyword {
    fn from_str(s: &str) -> Option<Keyword> {
        Some(match s {
            "let" => Keyword::Let,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "for" => Keyword::For,
            "def" => Keyword::Def,
            "return" => Keyword::Return,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberLiteral {
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(NumberLiteral),
    String(String),
    Identifier(String),
    Keyword(Keyword),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    Assign,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,

    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    AndAnd,
    OrOr,
    Bang,

    PlusPlus,
    MinusMinus,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(source: &str) -> Result<Vec<Token>, ScriptError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        debug!("lexing done, {} token(s)", tokens.len());
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), ScriptError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let (start_line, start_col) = (self.line, self.column);
                    self.advance();
                    self.advance();
                    let mut closed = false;
                    while let Some(c) = self.peek() {
                        if c == '*' && self.peek_at(1) == Some('/') {
                            self.advance();
                            self.advance();
                            closed = true;
                            break;
                        }
                        self.advance();
                    }
                    if !closed {
                        return Err(ScriptError::syntax(
                            "unterminated block comment",
                            start_line,
                            start_col,
                        ));
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<Token, ScriptError> {
        self.skip_whitespace_and_comments()?;

        let (line, column) = (self.line, self.column);

        let c = match self.peek() {
            None => {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    lexeme: String::new(),
                    line,
                    column,
                })
            }
            Some(c) => c,
        };

        if c.is_ascii_digit() {
            return self.lex_number(line, column);
        }

        if c == '"' {
            return self.lex_string(line, column);
        }

        if c.is_alphabetic() || c == '_' {
            return self.lex_identifier(line, column);
        }

        // Two-character operators checked before their single-character prefixes.
        if let Some(next) = self.peek_at(1) {
            let two = match (c, next) {
                ('=', '=') => Some(TokenKind::EqEq),
                ('!', '=') => Some(TokenKind::NotEq),
                ('<', '=') => Some(TokenKind::LtEq),
                ('>', '=') => Some(TokenKind::GtEq),
                ('&', '&') => Some(TokenKind::AndAnd),
                ('|', '|') => Some(TokenKind::OrOr),
                ('+', '+') => Some(TokenKind::PlusPlus),
                ('-', '-') => Some(TokenKind::MinusMinus),
                ('+', '=') => Some(TokenKind::PlusEq),
                ('-', '=') => Some(TokenKind::MinusEq),
                ('*', '=') => Some(TokenKind::StarEq),
                ('/', '=') => Some(TokenKind::SlashEq),
                ('%', '=') => Some(TokenKind::PercentEq),
                _ => None,
            };
            if let Some(kind) = two {
                self.advance();
                self.advance();
                let lexeme: String = [c, next].iter().collect();
                return Ok(Token {
                    kind,
                    lexeme,
                    line,
                    column,
                });
            }
        }

        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Assign,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '!' => TokenKind::Bang,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            other => {
                return Err(ScriptError::syntax(
                    format!("unexpected character '{}'", other),
                    line,
                    column,
                ))
            }
        };

        self.advance();
        Ok(Token {
            kind,
            lexeme: c.to_string(),
            line,
            column,
        })
    }

    fn lex_number(&mut self, line: usize, column: usize) -> Result<Token, ScriptError> {
        let mut lexeme = String::new();
        let mut dot_count = 0;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                lexeme.push(c);
                self.advance();
            } else if c == '.' {
                dot_count += 1;
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if dot_count > 1 {
            return Err(ScriptError::syntax(
                format!("invalid number literal '{}'", lexeme),
                line,
                column,
            ));
        }

        let kind = if dot_count == 1 {
            let value: f64 = lexeme.parse().map_err(|_| {
                ScriptError::syntax(format!("invalid number literal '{}'", lexeme), line, column)
            })?;
            TokenKind::Number(NumberLiteral::Float(value))
        } else {
            let value: i64 = lexeme.parse().map_err(|_| {
                ScriptError::syntax(format!("invalid number literal '{}'", lexeme), line, column)
            })?;
            TokenKind::Number(NumberLiteral::Int(value))
        };

        Ok(Token {
            kind,
            lexeme,
            line,
            column,
        })
    }

    fn lex_string(&mut self, line: usize, column: usize) -> Result<Token, ScriptError> {
        self.advance(); // opening quote
        let mut value = String::new();
        let mut raw = String::from("\"");
        loop {
            match self.advance() {
                None => {
                    return Err(ScriptError::syntax(
                        "unterminated string literal",
                        line,
                        column,
                    ))
                }
                Some('"') => {
                    raw.push('"');
                    break;
                }
                Some('\\') => {
                    raw.push('\\');
                    match self.advance() {
                        None => {
                            return Err(ScriptError::syntax(
                                "unterminated string literal",
                                line,
                                column,
                            ))
                        }
                        Some(escaped) => {
                            raw.push(escaped);
                            value.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                '"' => '"',
                                '\\' => '\\',
                                other => other,
                            });
                        }
                    }
                }
                Some(c) => {
                    raw.push(c);
                    value.push(c);
                }
            }
        }

        Ok(Token {
            kind: TokenKind::String(value),
            lexeme: raw,
            line,
            column,
        })
    }

    fn lex_identifier(&mut self, line: usize, column: usize) -> Result<Token, ScriptError> {
        let mut lexeme = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match Keyword::from_str(&lexeme) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier(lexeme.clone()),
        };

        Ok(Token {
            kind,
            lexeme,
            line,
            column,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_simple_declaration() {
        let tokens = kinds("let x = 2;");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Keyword(Keyword::Let),
                TokenKind::Identifier("x".into()),
                TokenKind::Assign,
                TokenKind::Number(NumberLiteral::Int(2)),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn distinguishes_int_and_float() {
        let tokens = kinds("1 1.5");
        assert_eq!(
            tokens[0],
            TokenKind::Number(NumberLiteral::Int(1))
        );
        assert_eq!(
            tokens[1],
            TokenKind::Number(NumberLiteral::Float(1.5))
        );
    }

    #[test]
    fn rejects_two_dots() {
        let err = Lexer::tokenize("1.2.3").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { .. }));
    }

    #[test]
    fn two_char_operators_take_priority() {
        let tokens = kinds("a += 1; b == c; x++ ; y--;");
        assert!(tokens.contains(&TokenKind::PlusEq));
        assert!(tokens.contains(&TokenKind::EqEq));
        assert!(tokens.contains(&TokenKind::PlusPlus));
        assert!(tokens.contains(&TokenKind::MinusMinus));
    }

    #[test]
    fn skips_comments() {
        let tokens = kinds("1 // comment\n/* block */ 2");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Number(NumberLiteral::Int(1)),
                TokenKind::Number(NumberLiteral::Int(2)),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        let tokens = kinds(r#""a\nb\t\"\\c""#);
        match &tokens[0] {
            TokenKind::String(s) => assert_eq!(s, "a\nb\t\"\\c"),
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_string_is_lex_error() {
        let err = Lexer::tokenize("\"abc").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { .. }));
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = Lexer::tokenize("let\nx = 1;").unwrap();
        let x_tok = &tokens[1];
        assert_eq!(x_tok.line, 2);
        assert_eq!(x_tok.column, 1);
    }

    #[test]
    fn unknown_character_is_lex_error() {
        let err = Lexer::tokenize("let x = 1 $ 2;").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { .. }));
    }
}
