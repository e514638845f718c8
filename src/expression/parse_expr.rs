use log::trace;

use crate::expression::error::ParseError;
use crate::expression::evaluator::Namespace;
use crate::expression::expr::Expr;
use crate::expression::tokenizer::{Lexeme, Token, tokenize};

//                  precedence ladder, loosest binding on top
//                |_________________________________|
//                |  additive        a + b, a - b   |
//                |  multiplicative  a * b, a / b,  |
//                |                  a % b          |
//                |  implicit        2a, 2(a), a 2, |
//                |                  1/2a = (1/2)a  |
//                |  unary           -a, +a         |
//                |  power           a ^ b (right)  |
//                |  primary         1.5, a, f(..), |
//                |                  ( expr )       |
//                |_________________________________|

/// how deep brackets, signs and exponents may nest
pub const MAX_NESTING: usize = 256;
/// height limit of the parsed tree, long operator chains count too
pub const MAX_TREE_HEIGHT: usize = 1024;

// parsed subtree with the height of its tree
struct Node {
    expr: Expr,
    height: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Self {
        Node { expr, height: 1 }
    }
}

pub struct Parser<'a> {
    lexemes: Vec<Lexeme>,
    pos: usize,
    depth: usize,
    namespace: &'a Namespace,
    implicit_multiplication: bool,
}

impl<'a> Parser<'a> {
    pub fn new(
        input: &str,
        namespace: &'a Namespace,
        implicit_multiplication: bool,
    ) -> Result<Self, ParseError> {
        Ok(Self {
            lexemes: tokenize(input)?,
            pos: 0,
            depth: 0,
            namespace,
            implicit_multiplication,
        })
    }

    pub fn parse(mut self) -> Result<Expr, ParseError> {
        if self.lexemes.is_empty() {
            return Err(ParseError::Empty);
        }
        let node = self.parse_additive()?;
        if let Some(lexeme) = self.lexemes.get(self.pos) {
            return Err(unexpected(lexeme));
        }
        trace!("parsed expression: {} (height {})", node.expr, node.height);
        Ok(node.expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.lexemes.get(self.pos + offset).map(|l| &l.token)
    }

    fn advance(&mut self) -> Option<Lexeme> {
        let lexeme = self.lexemes.get(self.pos).cloned();
        if lexeme.is_some() {
            self.pos += 1;
        }
        lexeme
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        match self.advance() {
            Some(lexeme) if lexeme.token == expected => Ok(()),
            Some(lexeme) => Err(unexpected(&lexeme)),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn binary(
        &self,
        op: fn(Box<Expr>, Box<Expr>) -> Expr,
        lhs: Node,
        rhs: Node,
    ) -> Result<Node, ParseError> {
        let height = checked_height(lhs.height.max(rhs.height))?;
        Ok(Node {
            expr: op(lhs.expr.boxed(), rhs.expr.boxed()),
            height,
        })
    }

    fn parse_additive(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op: fn(Box<Expr>, Box<Expr>) -> Expr = match self.peek() {
                Some(Token::Plus) => Expr::Add,
                Some(Token::Minus) => Expr::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_implicit()?;
        loop {
            let op: fn(Box<Expr>, Box<Expr>) -> Expr = match self.peek() {
                Some(Token::Star) => Expr::Mul,
                Some(Token::Slash) => Expr::Div,
                Some(Token::Percent) => Expr::Mod,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_implicit()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
    }

    // a symbol or an opening bracket directly after an operand multiplies;
    // a number does too, unless the operand before it is itself a number literal
    fn parse_implicit(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_unary()?;
        if !self.implicit_multiplication {
            return Ok(lhs);
        }
        lhs = self.parse_literal_division(lhs)?;
        loop {
            let starts_operand = match self.peek() {
                Some(Token::Ident(_)) | Some(Token::LParen) => true,
                Some(Token::Number(_)) => !is_number_literal(&lhs.expr),
                _ => false,
            };
            if !starts_operand {
                return Ok(lhs);
            }
            let rhs = self.parse_power()?;
            lhs = self.binary(Expr::Mul, lhs, rhs)?;
        }
    }

    // `1/2x` is `(1/2) x` and `1/2/3x` is `((1/2)/3) x`: a literal divided by
    // a literal that starts an implicit product divides first
    fn parse_literal_division(&mut self, mut lhs: Node) -> Result<Node, ParseError> {
        let mut last_is_literal = is_number_literal(&lhs.expr);
        while last_is_literal && self.literal_division_ahead() {
            self.advance();
            let divisor = self.parse_unary()?;
            last_is_literal = is_number_literal(&divisor.expr);
            lhs = self.binary(Expr::Div, lhs, divisor)?;
        }
        Ok(lhs)
    }

    fn literal_division_ahead(&self) -> bool {
        matches!(self.peek(), Some(Token::Slash))
            && matches!(self.peek_at(1), Some(Token::Number(_)))
            && matches!(
                self.peek_at(2),
                Some(Token::Ident(_)) | Some(Token::LParen)
            )
    }

    // every nesting level (bracket, call, sign, exponent) passes through here
    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ParseError::TooDeep { limit: MAX_NESTING });
        }
        let node = self.parse_signed();
        self.depth -= 1;
        node
    }

    fn parse_signed(&mut self) -> Result<Node, ParseError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Node {
                    height: checked_height(operand.height)?,
                    expr: Expr::Neg(operand.expr.boxed()),
                })
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Node, ParseError> {
        let base = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.advance();
            // the exponent may carry its own sign: 2^-1
            let exponent = self.parse_unary()?;
            return self.binary(Expr::Pow, base, exponent);
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        let lexeme = self.advance().ok_or(ParseError::UnexpectedEnd)?;
        match lexeme.token {
            Token::Number(value) => Ok(Node::leaf(Expr::Const(value))),
            Token::Ident(name) => {
                if let Some(Token::LParen) = self.peek() {
                    let function = self.namespace.resolve_call(&name)?;
                    self.advance();
                    let args = self.parse_arguments()?;
                    let height = checked_height(args.iter().map(|a| a.height).max().unwrap_or(0))?;
                    Ok(Node {
                        expr: Expr::Call(function, args.into_iter().map(|a| a.expr).collect()),
                        height,
                    })
                } else {
                    Ok(Node::leaf(Expr::Var(name)))
                }
            }
            Token::LParen => {
                let inner = self.parse_additive()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            _ => Err(unexpected(&lexeme)),
        }
    }

    // called after the opening bracket, consumes the closing one
    fn parse_arguments(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut args = Vec::new();
        if let Some(Token::RParen) = self.peek() {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_additive()?);
            match self.advance() {
                Some(Lexeme {
                    token: Token::Comma,
                    ..
                }) => continue,
                Some(Lexeme {
                    token: Token::RParen,
                    ..
                }) => return Ok(args),
                Some(lexeme) => return Err(unexpected(&lexeme)),
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
    }
}

// height of a node placed on top of a subtree of `child` height
fn checked_height(child: usize) -> Result<usize, ParseError> {
    let height = child + 1;
    if height > MAX_TREE_HEIGHT {
        return Err(ParseError::TooDeep {
            limit: MAX_TREE_HEIGHT,
        });
    }
    Ok(height)
}

// `2`, `-2`, `--2.5`
fn is_number_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Const(_) => true,
        Expr::Neg(inner) => is_number_literal(inner),
        _ => false,
    }
}

fn unexpected(lexeme: &Lexeme) -> ParseError {
    ParseError::UnexpectedToken {
        found: lexeme.token.to_string(),
        pos: lexeme.pos,
    }
}
