use crate::error::{Error, Result};
use crate::token::{Keyword, Operator, Token, TokenKind};
use pcpu::Word;

/// Byte cursor over the source with 1-based row/column tracking. The
/// source language is ASCII, so byte positions double as column counts.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    row: usize,
    col: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Cursor<'a> {
        Cursor {
            bytes: source.as_bytes(),
            pos: 0,
            row: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.bytes.get(self.pos).map(|&b| b as char)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.bytes.get(self.pos + offset).map(|&b| b as char)
    }

    fn advance(&mut self) -> Option<char> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        if b == b'\n' {
            self.row += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b as char)
    }

    /// Consumes the next character when it equals `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn position(&self) -> (usize, usize) {
        (self.row, self.col)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn lex_number(cursor: &mut Cursor, row: usize, col: usize) -> Result<TokenKind> {
    let mut digits = String::new();
    let radix = if cursor.peek() == Some('0') && matches!(cursor.peek_at(1), Some('x') | Some('X'))
    {
        cursor.advance();
        cursor.advance();
        16
    } else {
        10
    };

    while let Some(c) = cursor.peek() {
        if c.is_ascii_hexdigit() && (radix == 16 || c.is_ascii_digit()) {
            digits.push(c);
            cursor.advance();
        } else {
            break;
        }
    }

    if digits.is_empty() {
        return Err(Error::new(row, col, "malformed number".to_string()));
    }

    let value = i64::from_str_radix(&digits, radix)
        .map_err(|err| Error::new(row, col, format!("malformed number: {}", err)))?;
    if value > i64::from(u32::max_value()) {
        return Err(Error::new(
            row,
            col,
            "number out of range for a machine word".to_string(),
        ));
    }

    // Values above i32::MAX are reinterpreted as their two's-complement
    // word, matching the assembler.
    Ok(TokenKind::Number(value as Word))
}

fn lex_word(cursor: &mut Cursor) -> TokenKind {
    let mut name = String::new();
    while let Some(c) = cursor.peek() {
        if is_ident_char(c) {
            name.push(c);
            cursor.advance();
        } else {
            break;
        }
    }

    match name.as_str() {
        "if" => TokenKind::Keyword(Keyword::If),
        "while" => TokenKind::Keyword(Keyword::While),
        "end" => TokenKind::Keyword(Keyword::End),
        _ => TokenKind::Field(name),
    }
}

/// Tokenizes the whole source. Whitespace is skipped; newlines, `;` and
/// `:` become explicit end-of-line tokens; identifiers matching the
/// keyword table become keywords. `*` and `/` are reserved and rejected.
pub fn lex(source: &str) -> Result<Vec<Token>> {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();

    loop {
        while matches!(cursor.peek(), Some(' ') | Some('\t') | Some('\r')) {
            cursor.advance();
        }

        let (row, col) = cursor.position();
        let c = match cursor.peek() {
            Some(c) => c,
            None => break,
        };

        let kind = match c {
            '\n' | ';' | ':' => {
                cursor.advance();
                TokenKind::Eol
            }
            '(' => {
                cursor.advance();
                TokenKind::LParen
            }
            ')' => {
                cursor.advance();
                TokenKind::RParen
            }
            ',' => {
                cursor.advance();
                TokenKind::Comma
            }
            '=' => {
                cursor.advance();
                if cursor.eat('=') {
                    TokenKind::Operator(Operator::Eq)
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                cursor.advance();
                if cursor.eat('=') {
                    TokenKind::Operator(Operator::Ne)
                } else {
                    return Err(Error::new(row, col, "unexpected character '!'".to_string()));
                }
            }
            '<' => {
                cursor.advance();
                if cursor.eat('<') {
                    TokenKind::Operator(Operator::Shl)
                } else if cursor.eat('=') {
                    TokenKind::Operator(Operator::Le)
                } else {
                    TokenKind::Operator(Operator::Lt)
                }
            }
            '>' => {
                cursor.advance();
                if cursor.eat('>') {
                    if cursor.eat('>') {
                        TokenKind::Operator(Operator::Srl)
                    } else {
                        TokenKind::Operator(Operator::Sra)
                    }
                } else if cursor.eat('=') {
                    TokenKind::Operator(Operator::Ge)
                } else {
                    TokenKind::Operator(Operator::Gt)
                }
            }
            '+' => {
                cursor.advance();
                TokenKind::Operator(Operator::Add)
            }
            '-' => {
                cursor.advance();
                TokenKind::Operator(Operator::Sub)
            }
            '&' => {
                cursor.advance();
                TokenKind::Operator(Operator::And)
            }
            '^' => {
                cursor.advance();
                TokenKind::Operator(Operator::Xor)
            }
            '|' => {
                cursor.advance();
                TokenKind::Operator(Operator::Or)
            }
            '*' | '/' => {
                return Err(Error::new(
                    row,
                    col,
                    format!("operator '{}' is reserved", c),
                ));
            }
            c if c.is_ascii_digit() => lex_number(&mut cursor, row, col)?,
            c if is_ident_start(c) => lex_word(&mut cursor),
            c => {
                return Err(Error::new(
                    row,
                    col,
                    format!("unexpected character '{}'", c),
                ));
            }
        };

        tokens.push(Token::new(kind, row, col));
    }

    let (row, col) = cursor.position();
    tokens.push(Token::new(TokenKind::Eof, row, col));

    Ok(tokens)
}
