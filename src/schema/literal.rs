//! Python literal decoding: string unescaping and `literal_eval`-style
//! evaluation of default values into JSON.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Why a piece of source text is not a plain literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("unterminated string literal")]
    Unterminated,

    #[error("unsupported string prefix `{0}`")]
    Prefix(String),

    #[error("invalid escape sequence `{0}`")]
    Escape(String),

    #[error("unexpected `{text}` at offset {offset}")]
    Unexpected { offset: usize, text: String },

    #[error("not a literal: {0}")]
    NotLiteral(String),

    #[error("unexpected end of input")]
    Eof,
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

/// Decode a single string literal, prefix and quotes included.
///
/// Only `r` and `u` prefixes are accepted; bytes and f-strings are rejected.
pub fn decode_string(raw: &str) -> Result<String, LiteralError> {
    let quote_at = raw.find(['\'', '"']).ok_or(LiteralError::Unterminated)?;
    let (prefix, rest) = raw.split_at(quote_at);

    let is_raw = match prefix.to_ascii_lowercase().as_str() {
        "" | "u" => false,
        "r" => true,
        _ => return Err(LiteralError::Prefix(prefix.to_string())),
    };

    let quote = if rest.starts_with("\"\"\"") {
        "\"\"\""
    } else if rest.starts_with("'''") {
        "'''"
    } else {
        &rest[..1]
    };
    if rest.len() < 2 * quote.len() || !rest.ends_with(quote) {
        return Err(LiteralError::Unterminated);
    }
    let body = &rest[quote.len()..rest.len() - quote.len()];

    if is_raw {
        Ok(body.to_string())
    } else {
        unescape(body)
    }
}

fn unescape(body: &str) -> Result<String, LiteralError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            return Err(LiteralError::Escape("\\".into()));
        };
        match esc {
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\\' | '\'' | '"' => out.push(esc),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = esc.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                let ch = char::from_u32(code)
                    .ok_or_else(|| LiteralError::Escape(format!("\\{:o}", code)))?;
                out.push(ch);
            }
            'x' => out.push(hex_escape(&mut chars, 2, 'x')?),
            'u' => out.push(hex_escape(&mut chars, 4, 'u')?),
            'U' => out.push(hex_escape(&mut chars, 8, 'U')?),
            // Named escapes need the Unicode name table.
            'N' => return Err(LiteralError::Escape("\\N".into())),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Ok(out)
}

fn hex_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digits: usize,
    tag: char,
) -> Result<char, LiteralError> {
    let mut code = 0u32;
    let mut seen = String::new();
    for _ in 0..digits {
        let d = chars
            .next()
            .ok_or_else(|| LiteralError::Escape(format!("\\{}{}", tag, seen)))?;
        seen.push(d);
        let v = d
            .to_digit(16)
            .ok_or_else(|| LiteralError::Escape(format!("\\{}{}", tag, seen)))?;
        code = code * 16 + v;
    }
    char::from_u32(code).ok_or_else(|| LiteralError::Escape(format!("\\{}{}", tag, seen)))
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Number(Value),
    Name(String),
    Punct(char),
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if trimmed.starts_with('#') {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else if trimmed.starts_with("\\\n") {
                self.pos += 2;
            } else {
                return;
            }
        }
    }

    fn tokenize(mut self) -> Result<Vec<(usize, Token)>, LiteralError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos;
            let Some(c) = self.peek_char() else {
                return Ok(tokens);
            };
            let token = if let Some(len) = self.string_len() {
                self.pos += len;
                Token::Str(decode_string(&self.src[start..self.pos])?)
            } else if c.is_ascii_digit()
                || (c == '.' && self.rest()[1..].starts_with(|d: char| d.is_ascii_digit()))
            {
                self.number()?
            } else if c.is_alphabetic() || c == '_' {
                let len = self
                    .rest()
                    .find(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
                    .unwrap_or(self.rest().len());
                self.pos += len;
                Token::Name(self.src[start..self.pos].to_string())
            } else if "()[]{},:+-".contains(c) {
                self.pos += c.len_utf8();
                Token::Punct(c)
            } else {
                return Err(LiteralError::Unexpected {
                    offset: start,
                    text: c.to_string(),
                });
            };
            tokens.push((start, token));
        }
    }

    /// Byte length of a string literal starting here, prefix included.
    fn string_len(&self) -> Option<usize> {
        let rest = self.rest();
        let prefix_len = rest
            .find(|ch: char| !"rRuUbBfF".contains(ch))
            .unwrap_or(rest.len());
        if prefix_len > 2 {
            return None;
        }
        let body = &rest[prefix_len..];
        let quote = if body.starts_with("\"\"\"") {
            "\"\"\""
        } else if body.starts_with("'''") {
            "'''"
        } else if body.starts_with('"') {
            "\""
        } else if body.starts_with('\'') {
            "'"
        } else {
            return None;
        };

        let mut i = quote.len();
        while i < body.len() {
            let tail = &body[i..];
            if tail.starts_with(quote) {
                return Some(prefix_len + i + quote.len());
            }
            let mut it = tail.chars();
            let ch = it.next()?;
            i += ch.len_utf8();
            if ch == '\\' {
                if let Some(next) = it.next() {
                    i += next.len_utf8();
                }
            }
        }
        // Unterminated: hand the whole tail to the decoder so it reports it.
        Some(rest.len())
    }

    fn number(&mut self) -> Result<Token, LiteralError> {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let is_hex = self
            .rest()
            .get(..2)
            .is_some_and(|p| p.eq_ignore_ascii_case("0x"));
        let mut i = self.pos;
        while i < bytes.len() {
            let b = bytes[i];
            let exponent_sign = (b == b'+' || b == b'-')
                && !is_hex
                && i > start
                && matches!(bytes[i - 1], b'e' | b'E');
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || exponent_sign {
                i += 1;
            } else {
                break;
            }
        }
        self.pos = i;
        let text = &self.src[start..i];
        parse_number(text).map(Token::Number)
    }
}

fn parse_number(text: &str) -> Result<Value, LiteralError> {
    let cleaned = text.replace('_', "").to_ascii_lowercase();
    let not_literal = || LiteralError::NotLiteral(text.to_string());

    let radix = match cleaned.get(..2) {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let n = i64::from_str_radix(&cleaned[2..], radix).map_err(|_| not_literal())?;
        return Ok(Value::Number(n.into()));
    }
    if cleaned.ends_with('j') {
        return Err(not_literal());
    }
    if cleaned.contains(['.', 'e']) {
        let f: f64 = cleaned.parse().map_err(|_| not_literal())?;
        return Number::from_f64(f).map(Value::Number).ok_or_else(not_literal);
    }
    if let Ok(n) = cleaned.parse::<i64>() {
        return Ok(Value::Number(n.into()));
    }
    cleaned
        .parse::<u64>()
        .map(|n| Value::Number(n.into()))
        .map_err(|_| not_literal())
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate the source text of a Python literal into JSON.
///
/// Accepts strings (with implicit concatenation), numbers with an optional
/// sign, `True`/`False`/`None`, and tuples, lists, sets and dicts of those.
/// Tuples and sets become arrays; non-string dict keys are rendered as JSON
/// text.
pub fn eval_literal(src: &str) -> Result<Value, LiteralError> {
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = LiteralParser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(value),
        Some((offset, token)) => Err(LiteralError::Unexpected {
            offset: *offset,
            text: format!("{:?}", token),
        }),
    }
}

/// Deepest container nesting a default may have and still count as a literal.
const MAX_LITERAL_DEPTH: usize = 100;

struct LiteralParser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
}

impl LiteralParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Result<Token, LiteralError> {
        let (_, token) = self.tokens.get(self.pos).cloned().ok_or(LiteralError::Eof)?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, punct: char) -> bool {
        if self.peek() == Some(&Token::Punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: char) -> Result<(), LiteralError> {
        if self.eat(punct) {
            return Ok(());
        }
        match self.tokens.get(self.pos) {
            Some((offset, token)) => Err(LiteralError::Unexpected {
                offset: *offset,
                text: format!("{:?}", token),
            }),
            None => Err(LiteralError::Eof),
        }
    }

    fn expr(&mut self) -> Result<Value, LiteralError> {
        match self.next()? {
            Token::Str(first) => {
                let mut s = first;
                while let Some(Token::Str(more)) = self.peek() {
                    s.push_str(more);
                    self.pos += 1;
                }
                Ok(Value::String(s))
            }
            Token::Number(n) => Ok(n),
            Token::Punct(sign @ ('-' | '+')) => match self.next()? {
                Token::Number(n) if sign == '+' => Ok(n),
                Token::Number(n) => negate(&n),
                other => Err(LiteralError::NotLiteral(format!("{}{:?}", sign, other))),
            },
            Token::Name(name) => match name.as_str() {
                "True" => Ok(Value::Bool(true)),
                "False" => Ok(Value::Bool(false)),
                "None" => Ok(Value::Null),
                _ => Err(LiteralError::NotLiteral(name)),
            },
            Token::Punct(open @ ('(' | '[' | '{')) => {
                if self.depth >= MAX_LITERAL_DEPTH {
                    return Err(LiteralError::NotLiteral(format!(
                        "nested deeper than {} levels",
                        MAX_LITERAL_DEPTH
                    )));
                }
                self.depth += 1;
                let value = match open {
                    '(' => self.paren(),
                    '[' => self.items(']').map(Value::Array),
                    _ => self.brace(),
                };
                self.depth -= 1;
                value
            }
            Token::Punct(c) => Err(LiteralError::NotLiteral(c.to_string())),
        }
    }

    /// Comma-separated values up to `close`, trailing comma allowed.
    fn items(&mut self, close: char) -> Result<Vec<Value>, LiteralError> {
        let mut out = Vec::new();
        while !self.eat(close) {
            out.push(self.expr()?);
            if !self.eat(',') {
                self.expect_punct(close)?;
                break;
            }
        }
        Ok(out)
    }

    fn paren(&mut self) -> Result<Value, LiteralError> {
        if self.eat(')') {
            return Ok(Value::Array(Vec::new()));
        }
        let first = self.expr()?;
        if self.eat(')') {
            return Ok(first);
        }
        self.expect_punct(',')?;
        let mut items = vec![first];
        items.extend(self.items(')')?);
        Ok(Value::Array(items))
    }

    fn brace(&mut self) -> Result<Value, LiteralError> {
        if self.eat('}') {
            return Ok(Value::Object(Map::new()));
        }
        let first = self.expr()?;
        if !self.eat(':') {
            let mut items = vec![first];
            if self.eat(',') {
                items.extend(self.items('}')?);
            } else {
                self.expect_punct('}')?;
            }
            return Ok(Value::Array(items));
        }

        let mut map = Map::new();
        let mut key = first;
        loop {
            let value = self.expr()?;
            map.insert(object_key(key), value);
            if !self.eat(',') {
                self.expect_punct('}')?;
                break;
            }
            if self.eat('}') {
                break;
            }
            key = self.expr()?;
            self.expect_punct(':')?;
        }
        Ok(Value::Object(map))
    }
}

fn negate(n: &Value) -> Result<Value, LiteralError> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::Number((-i).into()));
    }
    n.as_f64()
        .and_then(|f| Number::from_f64(-f))
        .map(Value::Number)
        .ok_or_else(|| LiteralError::NotLiteral(format!("-{}", n)))
}

fn object_key(key: Value) -> String {
    match key {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
