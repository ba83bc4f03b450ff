//! Reader for tuple literals
//!
//! Format:
//! ( <value>, <value>, ... )
//!
//! Values:
//! - Integers: 3, -1, +2 (read as decimals when they overflow i64)
//! - Decimals: 1.5, .25
//! - Fractions: 1/3, 3/2
//! - Booleans: True, False, true, false
//!
//! Whitespace between tokens is ignored and one trailing comma is allowed.
//! Nothing else is accepted, in particular no expressions.

/// A single value inside a tuple
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Literal {
    /// Integer literals only
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Literal::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Integers, decimals and fractions
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            Literal::Int(v) => Some(v as f64),
            Literal::Float(v) => Some(v),
            Literal::Bool(_) => None,
        }
    }

    /// Booleans, plus the integers 0 and 1
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Literal::Bool(b) => Some(b),
            Literal::Int(0) => Some(false),
            Literal::Int(1) => Some(true),
            _ => None,
        }
    }
}

/// Literal read errors
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LiteralError {
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),
    #[error("expected {expected}, found `{found}`")]
    Unexpected {
        expected: &'static str,
        found: String,
    },
    #[error("unexpected end of input, expected {0}")]
    UnexpectedEnd(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Open,
    Close,
    Comma,
    Value(Literal),
}

/// A token with its byte range in the source
#[derive(Debug, Clone, Copy)]
struct Spanned {
    token: Token,
    start: usize,
    end: usize,
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.src.len()
    }

    /// Consume characters while `accept` holds, starting after `skip` bytes
    fn take_while(&mut self, skip: usize, accept: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        self.pos += skip;
        while let Some(c) = self.peek_char() {
            if !accept(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.src[start..self.pos]
    }

    fn next_token(&mut self) -> Result<Option<Spanned>, LiteralError> {
        self.skip_whitespace();
        let start = self.pos;
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(None),
        };

        let token = match c {
            '(' => {
                self.pos += 1;
                Token::Open
            }
            ')' => {
                self.pos += 1;
                Token::Close
            }
            ',' => {
                self.pos += 1;
                Token::Comma
            }
            '+' | '-' | '.' | '0'..='9' => {
                let skip = if c == '+' || c == '-' { 1 } else { 0 };
                let text = self.take_while(skip, |c| c.is_ascii_digit() || c == '.' || c == '/');
                Token::Value(parse_number(text)?)
            }
            c if c.is_alphabetic() || c == '_' => {
                let text = self.take_while(0, |c| c.is_alphanumeric() || c == '_');
                match text {
                    "True" | "true" => Token::Value(Literal::Bool(true)),
                    "False" | "false" => Token::Value(Literal::Bool(false)),
                    _ => return Err(LiteralError::UnknownIdentifier(text.to_string())),
                }
            }
            c => return Err(LiteralError::UnexpectedChar(c)),
        };

        Ok(Some(Spanned {
            token,
            start,
            end: self.pos,
        }))
    }
}

fn parse_number(text: &str) -> Result<Literal, LiteralError> {
    let invalid = || LiteralError::InvalidNumber(text.to_string());

    if let Some((num, den)) = text.split_once('/') {
        let num: f64 = num.parse().map_err(|_| invalid())?;
        let den: f64 = den.parse().map_err(|_| invalid())?;
        if den == 0.0 {
            return Err(invalid());
        }
        return Ok(Literal::Float(num / den));
    }

    if text.contains('.') {
        return text.parse().map(Literal::Float).map_err(|_| invalid());
    }

    // Integers too wide for i64 are still numbers
    text.parse()
        .map(Literal::Int)
        .or_else(|_| text.parse().map(Literal::Float))
        .map_err(|_| invalid())
}

/// A tuple together with the source text it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple<'a> {
    pub values: Vec<Literal>,
    pub text: &'a str,
}

/// Reads consecutive tuples out of a string
///
/// # Example
/// ```
/// use solfa::pipeline::literal::{Literal, TupleReader};
///
/// let tuples: Vec<_> = TupleReader::new("(0,1,1) (1,-1,0.5)")
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(tuples.len(), 2);
/// assert_eq!(tuples[1].text, "(1,-1,0.5)");
/// assert_eq!(tuples[1].values[2], Literal::Float(0.5));
/// ```
pub struct TupleReader<'a> {
    lexer: Lexer<'a>,
    failed: bool,
}

impl<'a> TupleReader<'a> {
    /// Start reading at the beginning of `src`
    pub fn new(src: &'a str) -> Self {
        Self {
            lexer: Lexer::new(src),
            failed: false,
        }
    }

    /// Read the next tuple, or `None` once only whitespace is left
    pub fn read(&mut self) -> Result<Option<Tuple<'a>>, LiteralError> {
        let open = match self.lexer.next_token()? {
            None => return Ok(None),
            Some(spanned) if spanned.token == Token::Open => spanned,
            Some(spanned) => return Err(self.unexpected("`(`", spanned)),
        };

        let mut values = Vec::new();
        let close = loop {
            let spanned = self
                .lexer
                .next_token()?
                .ok_or(LiteralError::UnexpectedEnd("a value or `)`"))?;
            match spanned.token {
                Token::Close => break spanned,
                Token::Value(value) => values.push(value),
                _ => return Err(self.unexpected("a value or `)`", spanned)),
            }

            let spanned = self
                .lexer
                .next_token()?
                .ok_or(LiteralError::UnexpectedEnd("`,` or `)`"))?;
            match spanned.token {
                Token::Close => break spanned,
                Token::Comma => {}
                _ => return Err(self.unexpected("`,` or `)`", spanned)),
            }
        };

        Ok(Some(Tuple {
            values,
            text: &self.lexer.src[open.start..close.end],
        }))
    }

    /// Whether only whitespace remains
    pub fn is_exhausted(&mut self) -> bool {
        self.lexer.at_end()
    }

    fn unexpected(&self, expected: &'static str, spanned: Spanned) -> LiteralError {
        LiteralError::Unexpected {
            expected,
            found: self.lexer.src[spanned.start..spanned.end].to_string(),
        }
    }
}

impl<'a> Iterator for TupleReader<'a> {
    type Item = Result<Tuple<'a>, LiteralError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.read().transpose();
        if matches!(result, Some(Err(_))) {
            self.failed = true;
        }
        result
    }
}

/// Read exactly one tuple from `text`
pub fn read_tuple(text: &str) -> Result<Vec<Literal>, LiteralError> {
    let mut reader = TupleReader::new(text);
    let tuple = reader.read()?.ok_or(LiteralError::UnexpectedEnd("`(`"))?;

    if !reader.is_exhausted() {
        let rest = reader.lexer.src[reader.lexer.pos..].trim_end();
        return Err(LiteralError::Unexpected {
            expected: "end of input",
            found: rest.to_string(),
        });
    }

    Ok(tuple.values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_loop_tuple() {
        let values = read_tuple("(2, 3, 1, False)").unwrap();
        assert_eq!(
            values,
            vec![
                Literal::Int(2),
                Literal::Int(3),
                Literal::Int(1),
                Literal::Bool(false)
            ]
        );

        let values = read_tuple("(1, 1, 0, true)").unwrap();
        assert_eq!(values[3], Literal::Bool(true));
        assert_eq!(values[3].as_bool(), Some(true));

        let values = read_tuple("(1,2,3,false)").unwrap();
        assert_eq!(values[3].as_bool(), Some(false));
    }

    #[test]
    fn test_wide_integers() {
        let values =
            read_tuple("(9223372036854775807, 10000000000000000000, -10000000000000000000)")
                .unwrap();
        assert_eq!(values[0], Literal::Int(i64::MAX));
        assert_eq!(values[1], Literal::Float(1e19));
        assert_eq!(values[2], Literal::Float(-1e19));
        assert_eq!(values[1].as_int(), None);
    }

    #[test]
    fn test_read_numbers() {
        let values = read_tuple("(-1, +2, 1.5, .25, 3/2, -1/4)").unwrap();
        assert_eq!(values[0], Literal::Int(-1));
        assert_eq!(values[1], Literal::Int(2));
        assert_eq!(values[2], Literal::Float(1.5));
        assert_eq!(values[3], Literal::Float(0.25));
        assert_eq!(values[4], Literal::Float(1.5));
        assert_eq!(values[5], Literal::Float(-0.25));
    }

    #[test]
    fn test_trailing_comma_and_whitespace() {
        let values = read_tuple("  ( 1 ,\t2 , )  ").unwrap();
        assert_eq!(values, vec![Literal::Int(1), Literal::Int(2)]);
    }

    #[test]
    fn test_coercions() {
        assert_eq!(Literal::Int(1).as_bool(), Some(true));
        assert_eq!(Literal::Int(0).as_bool(), Some(false));
        assert_eq!(Literal::Int(2).as_bool(), None);
        assert_eq!(Literal::Bool(true).as_bool(), Some(true));

        assert_eq!(Literal::Int(3).as_number(), Some(3.0));
        assert_eq!(Literal::Float(0.5).as_number(), Some(0.5));
        assert_eq!(Literal::Bool(true).as_number(), None);

        assert_eq!(Literal::Float(1.0).as_int(), None);
        assert_eq!(Literal::Int(-4).as_int(), Some(-4));
    }

    #[test]
    fn test_reject_code() {
        assert_eq!(
            read_tuple("(__import__('os'),)"),
            Err(LiteralError::UnknownIdentifier("__import__".to_string()))
        );
        assert_eq!(
            read_tuple("(1+2, 3)"),
            Err(LiteralError::Unexpected {
                expected: "`,` or `)`",
                found: "+2".to_string()
            })
        );
        assert!(read_tuple("(1, [2])").is_err());
        assert_eq!(
            read_tuple("(None, 1)"),
            Err(LiteralError::UnknownIdentifier("None".to_string()))
        );
    }

    #[test]
    fn test_invalid_numbers() {
        assert_eq!(
            read_tuple("(1.2.3)"),
            Err(LiteralError::InvalidNumber("1.2.3".to_string()))
        );
        assert_eq!(
            read_tuple("(1/0)"),
            Err(LiteralError::InvalidNumber("1/0".to_string()))
        );
        assert_eq!(
            read_tuple("(-)"),
            Err(LiteralError::InvalidNumber("-".to_string()))
        );
    }

    #[test]
    fn test_structure_errors() {
        assert_eq!(read_tuple(""), Err(LiteralError::UnexpectedEnd("`(`")));
        assert_eq!(
            read_tuple("(1, 2"),
            Err(LiteralError::UnexpectedEnd("`,` or `)`"))
        );
        assert!(matches!(
            read_tuple("1, 2)"),
            Err(LiteralError::Unexpected { expected: "`(`", .. })
        ));
        assert!(matches!(
            read_tuple("(1 2)"),
            Err(LiteralError::Unexpected { .. })
        ));
        assert!(matches!(
            read_tuple("(1,,2)"),
            Err(LiteralError::Unexpected { .. })
        ));
        assert_eq!(
            read_tuple("(1) (2)"),
            Err(LiteralError::Unexpected {
                expected: "end of input",
                found: "(2)".to_string()
            })
        );
    }

    #[test]
    fn test_tuple_reader_sequence() {
        let mut reader = TupleReader::new("(0,1,1)(0,2,1)   (0,3,2)");
        let texts: Vec<&str> = reader
            .by_ref()
            .map(|t| t.unwrap().text)
            .collect();
        assert_eq!(texts, vec!["(0,1,1)", "(0,2,1)", "(0,3,2)"]);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_tuple_reader_stops_after_error() {
        let mut reader = TupleReader::new("(0,1,1) x (0,2,1)");
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }
}
