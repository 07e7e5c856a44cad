//! Recursive descent parser for story expressions.
//!
//! Precedence, lowest first: assignment, `?:`, `||`, `&&`, equality,
//! relational, additive, multiplicative, unary, postfix steps, member access.

use std::ops::Range;

use gamebook_core::{EvalError, Value};

use crate::ast::{AssignOp, BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::lexer::{Token, tokenize};

const NAMESPACE: &str = "Variables";

/// Parses `source` into its `;`-separated statements.
///
/// # Errors
///
/// Returns `EvalError::Empty` for a blank source and `EvalError::Syntax` for
/// anything that does not parse.
pub fn parse(source: &str) -> Result<Vec<Expr>, EvalError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
    };
    let mut statements = Vec::new();
    while !parser.at_end() {
        if parser.eat(&Token::Semicolon) {
            continue;
        }
        statements.push(parser.expression()?);
        if !parser.at_end() && !parser.eat(&Token::Semicolon) {
            return Err(parser.unexpected());
        }
    }
    if statements.is_empty() {
        return Err(EvalError::Empty);
    }
    Ok(statements)
}

struct Parser {
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), EvalError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{expected}`")))
        }
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.end, |(_, span)| span.start)
    }

    fn error(&self, message: String) -> EvalError {
        EvalError::Syntax {
            position: self.position(),
            message,
        }
    }

    fn unexpected(&self) -> EvalError {
        match self.peek() {
            Some(token) => self.error(format!("unexpected `{token}`")),
            None => self.error("unexpected end of expression".to_owned()),
        }
    }

    fn expression(&mut self) -> Result<Expr, EvalError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, EvalError> {
        let start = self.position();
        let target = self.conditional()?;
        let op = match self.peek() {
            Some(Token::Assign) => AssignOp::Set,
            Some(Token::PlusAssign) => AssignOp::Add,
            Some(Token::MinusAssign) => AssignOp::Subtract,
            Some(Token::StarAssign) => AssignOp::Multiply,
            Some(Token::SlashAssign) => AssignOp::Divide,
            _ => return Ok(target),
        };
        let Expr::Variable(name) = target else {
            return Err(EvalError::Syntax {
                position: start,
                message: "only story variables can be assigned".to_owned(),
            });
        };
        self.pos += 1;
        let value = self.assignment()?;
        Ok(Expr::Assign {
            target: name,
            op,
            value: Box::new(value),
        })
    }

    fn conditional(&mut self) -> Result<Expr, EvalError> {
        let condition = self.logical_or()?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let then = self.assignment()?;
        self.expect(&Token::Colon)?;
        let otherwise = self.assignment()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn logical_or(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.logical_and()?;
        while self.eat(&Token::Or) {
            let right = self.logical_and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.equality()?;
        while self.eat(&Token::And) {
            let right = self.equality()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn binary_level(
        &mut self,
        operators: &[(Token, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, EvalError>,
    ) -> Result<Expr, EvalError> {
        let mut left = next(self)?;
        'outer: loop {
            for (token, op) in operators {
                if self.eat(token) {
                    let right = next(self)?;
                    left = Expr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn equality(&mut self) -> Result<Expr, EvalError> {
        self.binary_level(
            &[
                (Token::StrictEq, BinaryOp::StrictEq),
                (Token::StrictNotEq, BinaryOp::StrictNotEq),
                (Token::Eq, BinaryOp::LooseEq),
                (Token::NotEq, BinaryOp::LooseNotEq),
            ],
            Self::relational,
        )
    }

    fn relational(&mut self) -> Result<Expr, EvalError> {
        self.binary_level(
            &[
                (Token::LtEq, BinaryOp::LessEq),
                (Token::GtEq, BinaryOp::GreaterEq),
                (Token::Lt, BinaryOp::Less),
                (Token::Gt, BinaryOp::Greater),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> Result<Expr, EvalError> {
        self.binary_level(
            &[
                (Token::Plus, BinaryOp::Add),
                (Token::Minus, BinaryOp::Subtract),
            ],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Expr, EvalError> {
        self.binary_level(
            &[
                (Token::Star, BinaryOp::Multiply),
                (Token::Slash, BinaryOp::Divide),
                (Token::Percent, BinaryOp::Remainder),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Negate,
            Some(Token::Plus) => UnaryOp::Plus,
            _ => return self.postfix(),
        };
        self.pos += 1;
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, EvalError> {
        let start = self.position();
        let expr = self.member()?;
        let delta = match self.peek() {
            Some(Token::Increment) => 1.0,
            Some(Token::Decrement) => -1.0,
            _ => return Ok(expr),
        };
        let Expr::Variable(target) = expr else {
            return Err(EvalError::Syntax {
                position: start,
                message: "only story variables can be incremented".to_owned(),
            });
        };
        self.pos += 1;
        Ok(Expr::Step { target, delta })
    }

    fn member(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::Dot) {
                let name = self.identifier()?;
                if self.eat(&Token::LParen) {
                    let args = self.arguments(&Token::RParen)?;
                    expr = Expr::Call {
                        target: Box::new(expr),
                        method: name,
                        args,
                    };
                } else {
                    expr = Expr::Member {
                        target: Box::new(expr),
                        name,
                    };
                }
            } else if self.eat(&Token::LBracket) {
                let index = self.expression()?;
                self.expect(&Token::RBracket)?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn identifier(&mut self) -> Result<String, EvalError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error("expected a name".to_owned())),
        }
    }

    fn arguments(&mut self, close: &Token) -> Result<Vec<Expr>, EvalError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(&Token::Comma)?;
        }
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        let Some(token) = self.advance() else {
            return Err(self.unexpected());
        };
        match token {
            Token::Number(value) => Ok(Expr::Literal(Value::Number(value))),
            Token::Text(text) => Ok(Expr::Literal(Value::Text(text))),
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => Ok(Expr::List(self.arguments(&Token::RBracket)?)),
            Token::Ident(name) => self.named(name),
            _ => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }

    fn named(&mut self, name: String) -> Result<Expr, EvalError> {
        let literal = match name.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "null" | "undefined" => Value::Null,
            "NaN" => Value::Number(f64::NAN),
            "Infinity" => Value::Number(f64::INFINITY),
            NAMESPACE if self.peek() == Some(&Token::Dot) => {
                self.pos += 1;
                return Ok(Expr::Variable(self.identifier()?));
            }
            _ => return Ok(Expr::Identifier(name)),
        };
        Ok(Expr::Literal(literal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(source: &str) -> Expr {
        let mut statements = parse(source).unwrap();
        assert_eq!(statements.len(), 1);
        statements.remove(0)
    }

    #[test]
    fn test_precedence_of_arithmetic() {
        let expr = single("1 + 2 * 3");
        let Expr::Binary { op, right, .. } = expr else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Multiply, .. }));
    }

    #[test]
    fn test_variable_assignment() {
        let expr = single("Variables.gold += 5");
        assert!(matches!(
            expr,
            Expr::Assign { ref target, op: AssignOp::Add, .. } if target == "gold"
        ));
    }

    #[test]
    fn test_bare_identifier_parses() {
        assert_eq!(single("Bob"), Expr::Identifier("Bob".into()));
    }

    #[test]
    fn test_assignment_to_literal_is_rejected() {
        assert!(matches!(parse("3 = 4"), Err(EvalError::Syntax { .. })));
    }

    #[test]
    fn test_statements_split_on_semicolons() {
        let statements = parse("Variables.a = 1; Variables.b = 2;").unwrap();
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_blank_source_is_empty() {
        assert_eq!(parse("  ;  "), Err(EvalError::Empty));
    }

    #[test]
    fn test_two_names_in_a_row_is_a_syntax_error() {
        assert!(matches!(
            parse("Bob Smith"),
            Err(EvalError::Syntax { position: 4, .. })
        ));
    }

    #[test]
    fn test_method_call_and_index() {
        let expr = single("Variables.items.includes('rope') && Variables.items[0]");
        assert!(matches!(expr, Expr::Logical { op: LogicalOp::And, .. }));
    }
}
