//! Lenient reader for the JavaScript literal subset that callback scripts
//! pass as their argument.
//!
//! Accepts everything JSON accepts, plus unquoted and single-quoted keys,
//! single-quoted strings, trailing commas, comments, hex numbers, `\x`
//! escapes and `undefined`/`NaN`/`Infinity` (read as `null`).

use serde_json::{Map, Number, Value};

/// Parse one literal at the start of `input` (after optional whitespace).
///
/// Returns the value and the number of bytes consumed.
pub fn parse_literal(input: &str) -> Result<(Value, usize), LiteralError> {
    let mut parser = Parser {
        bytes: input.as_bytes(),
        pos: 0,
        depth: 0,
    };
    parser.skip_trivia()?;
    let value = parser.value()?;
    Ok((value, parser.pos))
}

/// A syntax error at a byte offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralError {
    pub position: usize,
    pub message: &'static str,
}

impl std::fmt::Display for LiteralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at byte {}", self.message, self.position)
    }
}

impl std::error::Error for LiteralError {}

const MAX_DEPTH: usize = 128;

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &'static str) -> LiteralError {
        LiteralError {
            position: self.pos,
            message,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_trivia(&mut self) -> Result<(), LiteralError> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\n' | b'\r') => self.pos += 1,
                Some(b'/') => match self.bytes.get(self.pos + 1) {
                    Some(b'/') => {
                        while !matches!(self.peek(), None | Some(b'\n')) {
                            self.pos += 1;
                        }
                    }
                    Some(b'*') => {
                        self.pos += 2;
                        loop {
                            match self.peek() {
                                None => return Err(self.error("unterminated comment")),
                                Some(b'*') if self.bytes.get(self.pos + 1) == Some(&b'/') => {
                                    self.pos += 2;
                                    break;
                                }
                                Some(_) => self.pos += 1,
                            }
                        }
                    }
                    _ => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(b'{') => self.nested(Self::object),
            Some(b'[') => self.nested(Self::array),
            Some(quote @ (b'"' | b'\'')) => Ok(Value::String(self.string(quote)?)),
            Some(b'-' | b'+' | b'.' | b'0'..=b'9') => self.number(),
            Some(c) if is_ident_start(c) => {
                let word = self.identifier();
                match word {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" | "undefined" | "NaN" | "Infinity" => Ok(Value::Null),
                    _ => Err(self.error("unexpected identifier")),
                }
            }
            Some(_) => Err(self.error("unexpected character")),
        }
    }

    fn nested(
        &mut self,
        f: fn(&mut Self) -> Result<Value, LiteralError>,
    ) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let value = f(self);
        self.depth -= 1;
        value
    }

    fn object(&mut self) -> Result<Value, LiteralError> {
        self.pos += 1;
        let mut map = Map::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                None => return Err(self.error("unterminated object")),
                _ => {}
            }

            let key = match self.peek() {
                Some(quote @ (b'"' | b'\'')) => self.string(quote)?,
                Some(c) if is_ident_start(c) => self.identifier().to_string(),
                Some(b'0'..=b'9') => self.number()?.to_string(),
                _ => return Err(self.error("expected object key")),
            };

            self.skip_trivia()?;
            if self.peek() != Some(b':') {
                return Err(self.error("expected ':'"));
            }
            self.pos += 1;
            self.skip_trivia()?;
            let value = self.value()?;
            map.insert(key, value);

            self.skip_trivia()?;
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {}
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn array(&mut self) -> Result<Value, LiteralError> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                None => return Err(self.error("unterminated array")),
                _ => {}
            }

            items.push(self.value()?);

            self.skip_trivia()?;
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {}
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }

    fn identifier(&mut self) -> &'a str {
        let bytes: &'a [u8] = self.bytes;
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        // Identifier bytes are ASCII
        std::str::from_utf8(&bytes[start..self.pos]).unwrap_or_default()
    }

    fn string(&mut self, quote: u8) -> Result<String, LiteralError> {
        self.pos += 1;
        let mut out: Vec<u8> = Vec::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error("unterminated string"));
            };
            self.pos += 1;
            match c {
                c if c == quote => break,
                b'\\' => self.escape(&mut out)?,
                b'\n' => return Err(self.error("newline in string")),
                c => out.push(c),
            }
        }
        String::from_utf8(out).map_err(|_| self.error("invalid UTF-8 in string"))
    }

    fn escape(&mut self, out: &mut Vec<u8>) -> Result<(), LiteralError> {
        let Some(c) = self.peek() else {
            return Err(self.error("unterminated escape"));
        };
        self.pos += 1;
        let ch = match c {
            b'n' => '\n',
            b't' => '\t',
            b'r' => '\r',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'v' => '\u{b}',
            b'0' => '\0',
            // Line continuation
            b'\n' => return Ok(()),
            b'\r' => {
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
                return Ok(());
            }
            b'x' => {
                let code = self.hex_digits(2)?;
                char::from_u32(code).ok_or_else(|| self.error("invalid escape"))?
            }
            b'u' => self.unicode_escape()?,
            other => {
                out.push(other);
                return Ok(());
            }
        };
        let mut buf = [0u8; 4];
        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        Ok(())
    }

    fn unicode_escape(&mut self) -> Result<char, LiteralError> {
        let high = self.hex_digits(4)?;
        if (0xD800..0xDC00).contains(&high)
            && self.bytes.get(self.pos) == Some(&b'\\')
            && self.bytes.get(self.pos + 1) == Some(&b'u')
        {
            let save = self.pos;
            self.pos += 2;
            let low = self.hex_digits(4)?;
            if (0xDC00..0xE000).contains(&low) {
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(code).ok_or_else(|| self.error("invalid escape"));
            }
            self.pos = save;
        }
        Ok(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn hex_digits(&mut self, count: usize) -> Result<u32, LiteralError> {
        let mut code = 0u32;
        for _ in 0..count {
            let digit = self
                .peek()
                .and_then(|c| (c as char).to_digit(16))
                .ok_or_else(|| self.error("invalid hex escape"))?;
            code = code * 16 + digit;
            self.pos += 1;
        }
        Ok(code)
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                true
            }
            Some(b'+') => {
                self.pos += 1;
                false
            }
            _ => false,
        };

        if self.peek() == Some(b'0') && matches!(self.bytes.get(self.pos + 1), Some(b'x' | b'X')) {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            let digits = std::str::from_utf8(&self.bytes[digits_start..self.pos]).unwrap_or_default();
            let magnitude =
                i64::from_str_radix(digits, 16).map_err(|_| self.error("invalid hex number"))?;
            return Ok(Value::from(if negative { -magnitude } else { magnitude }));
        }

        if self.bytes[self.pos..].starts_with(b"Infinity") {
            self.pos += "Infinity".len();
            return Ok(Value::Null);
        }

        let mut is_float = false;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some(b'.') {
            is_float = true;
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            is_float = true;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }

        let text = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or_default();
        let text = text.strip_prefix('+').unwrap_or(text);

        if !is_float {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Value::from(n));
            }
        }
        let n: f64 = text.parse().map_err(|_| self.error("invalid number"))?;
        Ok(Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null))
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

pub(crate) fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$'
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(input: &str) -> Value {
        parse_literal(input).unwrap().0
    }

    #[test]
    fn test_plain_json() {
        let value = parse(r#"["rust", ["rust book", "rustup"], {"a": 1.5, "b": null}]"#);
        assert_eq!(value, json!(["rust", ["rust book", "rustup"], { "a": 1.5, "b": null }]));
    }

    #[test]
    fn test_javascript_object_literal() {
        let value = parse("{q:'glib',p:false,s:['glib rs','glib 2',],}");
        assert_eq!(value, json!({ "q": "glib", "p": false, "s": ["glib rs", "glib 2"] }));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(parse(r#""a\"b\n中\x41""#), json!("a\"b\n中A"));
        assert_eq!(parse(r"'it\'s'"), json!("it's"));
        assert_eq!(parse(r#""😀""#), json!("😀"));
    }

    #[test]
    fn test_non_ascii_passthrough() {
        assert_eq!(parse("['原神', \"bilibili 中\"]"), json!(["原神", "bilibili 中"]));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse("[1, -2, 3.25, 1e3, 0x1F, +4, .5]"), json!([1, -2, 3.25, 1000.0, 31, 4, 0.5]));
        assert_eq!(parse("[NaN, Infinity, -Infinity, undefined]"), json!([null, null, null, null]));
    }

    #[test]
    fn test_comments_and_consumed_length() {
        let input = "/* lead */ [1, // one\n 2] );";
        let (value, consumed) = parse_literal(input).unwrap();
        assert_eq!(value, json!([1, 2]));
        assert_eq!(&input[consumed..], " );");
    }

    #[test]
    fn test_errors() {
        assert!(parse_literal("").is_err());
        assert!(parse_literal("[1, 2").is_err());
        assert!(parse_literal("{a 1}").is_err());
        assert!(parse_literal("alert").is_err());
        assert!(parse_literal("'open").is_err());
    }

    #[test]
    fn test_depth_limit() {
        let deep = "[".repeat(MAX_DEPTH + 1);
        let err = parse_literal(&deep).unwrap_err();
        assert_eq!(err.message, "nesting too deep");
    }
}
