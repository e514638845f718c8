use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::expression::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(val) => write!(f, "{}", val),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Caret => write!(f, "^"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// token with the byte offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub pos: usize,
}

/// characters that may start a symbol name
pub fn is_alpha(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

/// characters that may continue a symbol name. A dot is accepted so that
/// hierarchical names like `device.sensor.value` stay a single token.
pub fn is_identifier_char(c: char) -> bool {
    is_alpha(c) || c.is_ascii_digit() || c == '.'
}

pub fn tokenize(input: &str) -> Result<Vec<Lexeme>, ParseError> {
    let mut lexemes = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let token = if c.is_ascii_digit() || (c == '.' && next_is_digit(input, pos + 1)) {
            Token::Number(read_number(input, &mut chars)?)
        } else if is_alpha(c) {
            let mut end = pos;
            while let Some(&(i, ch)) = chars.peek() {
                if !is_identifier_char(ch) {
                    break;
                }
                end = i + ch.len_utf8();
                chars.next();
            }
            Token::Ident(input[pos..end].to_string())
        } else {
            chars.next();
            match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '%' => Token::Percent,
                '^' => Token::Caret,
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                other => return Err(ParseError::UnexpectedChar { ch: other, pos }),
            }
        };
        lexemes.push(Lexeme { token, pos });
    }
    Ok(lexemes)
}

fn next_is_digit(input: &str, pos: usize) -> bool {
    input[pos..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
}

fn consume_digits(input: &str, chars: &mut Peekable<CharIndices<'_>>) -> usize {
    let mut end = chars.peek().map_or(input.len(), |&(i, _)| i);
    while let Some(&(i, c)) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        end = i + 1;
        chars.next();
    }
    end
}

// digits [. digits] [(e|E) [+|-] digits], or a leading dot: .5
fn read_number(input: &str, chars: &mut Peekable<CharIndices<'_>>) -> Result<f64, ParseError> {
    let start = chars.peek().map_or(input.len(), |&(i, _)| i);
    let mut end = consume_digits(input, chars);

    if let Some(&(i, '.')) = chars.peek() {
        chars.next();
        end = i + 1;
        end = end.max(consume_digits(input, chars));
    }

    if let Some(&(i, c)) = chars.peek() {
        if c == 'e' || c == 'E' {
            let rest = &input[i + 1..];
            let sign_len = usize::from(rest.starts_with('+') || rest.starts_with('-'));
            // only an exponent if digits follow, otherwise `e` is a symbol
            if next_is_digit(input, i + 1 + sign_len) {
                chars.next();
                if sign_len == 1 {
                    chars.next();
                }
                end = consume_digits(input, chars);
            }
        }
    }

    let literal = &input[start..end];
    literal
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(literal.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|l| l.token)
            .collect()
    }

    #[test]
    fn test_tokenize_arithmetic() {
        assert_eq!(
            tokens("a + 2*(b - 3)"),
            vec![
                Token::Ident("a".to_string()),
                Token::Plus,
                Token::Number(2.0),
                Token::Star,
                Token::LParen,
                Token::Ident("b".to_string()),
                Token::Minus,
                Token::Number(3.0),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_dot_is_identifier_char() {
        assert_eq!(
            tokens("device.sensor.value+1"),
            vec![
                Token::Ident("device.sensor.value".to_string()),
                Token::Plus,
                Token::Number(1.0),
            ]
        );
    }

    #[test]
    fn test_number_formats() {
        assert_eq!(tokens("1.5"), vec![Token::Number(1.5)]);
        assert_eq!(tokens(".5"), vec![Token::Number(0.5)]);
        assert_eq!(tokens("2."), vec![Token::Number(2.0)]);
        assert_eq!(tokens("1e3"), vec![Token::Number(1000.0)]);
        assert_eq!(tokens("2.5E-1"), vec![Token::Number(0.25)]);
    }

    #[test]
    fn test_e_without_digits_is_symbol() {
        assert_eq!(
            tokens("2e"),
            vec![Token::Number(2.0), Token::Ident("e".to_string())]
        );
        assert_eq!(
            tokens("2ex"),
            vec![Token::Number(2.0), Token::Ident("ex".to_string())]
        );
    }

    #[test]
    fn test_newlines_are_whitespace() {
        assert_eq!(
            tokens("a\r\n+\nb"),
            vec![
                Token::Ident("a".to_string()),
                Token::Plus,
                Token::Ident("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_positions() {
        let lexemes = tokenize("ab + c").unwrap();
        let positions: Vec<usize> = lexemes.iter().map(|l| l.pos).collect();
        assert_eq!(positions, vec![0, 3, 5]);
    }

    #[test]
    fn test_unexpected_char() {
        assert_eq!(
            tokenize("a ; b"),
            Err(ParseError::UnexpectedChar { ch: ';', pos: 2 })
        );
        assert!(tokenize("evaluate(\"1\")").is_err());
        assert!(tokenize(".x").is_err());
    }
}
