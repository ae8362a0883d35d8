//! Arithmetic combination of two average matrices.
//!
//! Expressions are restricted to the operands `a` and `b`, the operators
//! `+ - * /`, unary minus, and parentheses. Anything else is rejected while
//! tokenizing, before any matrix is touched.

use std::fmt::Display;

use ndarray::{Array2, ArrayView2, Zip};

use crate::errors::{RescaleError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    A,
    B,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(expression: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expression.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut end = position + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' || next == '.' {
                        end = i + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                match &expression[position..end] {
                    "a" => Token::A,
                    "b" => Token::B,
                    word => return Err(unrecognized(expression, word, position)),
                }
            }
            other => return Err(unrecognized(expression, &other.to_string(), position)),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

fn unrecognized(expression: &str, token: &str, position: usize) -> RescaleError {
    RescaleError::UnrecognizedToken {
        expression: expression.to_string(),
        token: token.to_string(),
        position,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Ast {
    A,
    B,
    Neg(Box<Ast>),
    Binary(Box<Ast>, Token, Box<Ast>),
}

/// Deepest nesting of parentheses, unary minus or operator chains accepted.
pub const MAX_DEPTH: usize = 256;

/// Recursive descent over `expr := term (('+'|'-') term)*`,
/// `term := factor (('*'|'/') factor)*`, `factor := '-' factor | atom`.
///
/// Every rule returns the height of the tree it built; both the height and
/// the parser's own recursion are capped at [MAX_DEPTH].
struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn malformed(&self, reason: &str) -> RescaleError {
        RescaleError::MalformedExpression {
            expression: self.source.to_string(),
            reason: reason.to_string(),
        }
    }

    fn too_deep(&self) -> RescaleError {
        self.malformed(&format!("nested deeper than {} levels", MAX_DEPTH))
    }

    fn checked(&self, ast: Ast, height: usize) -> Result<(Ast, usize)> {
        if height > MAX_DEPTH {
            return Err(self.too_deep());
        }
        Ok((ast, height))
    }

    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.too_deep());
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<(Ast, usize)> {
        let (mut lhs, mut height) = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let (rhs, rh) = self.term()?;
            (lhs, height) = self.checked(Ast::Binary(Box::new(lhs), op, Box::new(rhs)), height.max(rh) + 1)?;
        }
        Ok((lhs, height))
    }

    fn term(&mut self) -> Result<(Ast, usize)> {
        let (mut lhs, mut height) = self.factor()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let (rhs, rh) = self.factor()?;
            (lhs, height) = self.checked(Ast::Binary(Box::new(lhs), op, Box::new(rhs)), height.max(rh) + 1)?;
        }
        Ok((lhs, height))
    }

    fn factor(&mut self) -> Result<(Ast, usize)> {
        let token = self.peek().ok_or_else(|| self.malformed("unexpected end of expression"))?;
        self.pos += 1;
        match token {
            Token::A => Ok((Ast::A, 1)),
            Token::B => Ok((Ast::B, 1)),
            Token::Minus => {
                self.descend()?;
                let (inner, height) = self.factor()?;
                self.depth -= 1;
                self.checked(Ast::Neg(Box::new(inner)), height + 1)
            }
            Token::LParen => {
                self.descend()?;
                let inner = self.expr()?;
                self.depth -= 1;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err(self.malformed("missing closing parenthesis")),
                }
            }
            _ => Err(self.malformed("expected a, b, '-' or '('")),
        }
    }
}

fn eval(ast: &Ast, a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Array2<f64> {
    match ast {
        Ast::A => a.to_owned(),
        Ast::B => b.to_owned(),
        Ast::Neg(inner) => -eval(inner, a, b),
        Ast::Binary(lhs, op, rhs) => {
            let l = eval(lhs, a, b);
            let r = eval(rhs, a, b);
            let f: fn(f64, f64) -> f64 = match op {
                Token::Plus => |x: f64, y: f64| x + y,
                Token::Minus => |x: f64, y: f64| x - y,
                Token::Star => |x: f64, y: f64| x * y,
                _ => |x: f64, y: f64| x / y,
            };
            Zip::from(&l).and(&r).map_collect(|&x, &y| f(x, y))
        }
    }
}

///
/// A parsed combination of two matrices.
///
/// ```
/// use avtad_rescale::Expression;
/// use ndarray::array;
///
/// let expr = Expression::parse("(a - b) / b").unwrap();
/// let out = expr.evaluate(array![[6.0]].view(), array![[2.0]].view()).unwrap();
/// assert_eq!(out, array![[2.0]]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Ast,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            source,
            tokens,
            pos: 0,
            depth: 0,
        };
        let (ast, _) = parser.expr()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.malformed("unexpected trailing tokens"));
        }
        Ok(Expression {
            source: source.to_string(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    ///
    /// Apply the expression cell-wise. Infinite results are stored as NaN.
    pub fn evaluate(&self, a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if a.dim() != b.dim() {
            return Err(RescaleError::ShapeMismatch {
                left: a.dim(),
                right: b.dim(),
            });
        }
        let mut out = eval(&self.ast, a, b);
        out.mapv_inplace(|v| if v.is_infinite() { f64::NAN } else { v });
        Ok(out)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("a - b", 3.0)]
    #[case("a+b", 5.0)]
    #[case("a * b - b", 3.0)]
    #[case("a - b * b", 3.0)]
    #[case("(a - b) * b", 3.0)]
    #[case("a / b / b", 4.0)]
    #[case("-a + b", -3.0)]
    #[case("-(a - b)", -3.0)]
    fn test_precedence(#[case] source: &str, #[case] expected: f64) {
        let expr = Expression::parse(source).unwrap();
        let out = expr.evaluate(array![[4.0]].view(), array![[1.0]].view()).unwrap();
        assert_eq!(out, array![[expected]]);
    }

    #[rstest]
    fn test_division_by_zero_is_nan() {
        let expr = Expression::parse("a / b").unwrap();
        let out = expr
            .evaluate(array![[1.0, 0.0]].view(), array![[0.0, 0.0]].view())
            .unwrap();
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[rstest]
    fn test_nan_propagates() {
        let expr = Expression::parse("a - b").unwrap();
        let out = expr
            .evaluate(array![[f64::NAN, 2.0]].view(), array![[1.0, 1.0]].view())
            .unwrap();
        assert!(out[(0, 0)].is_nan());
        assert_eq!(out[(0, 1)], 1.0);
    }

    #[rstest]
    #[case("import os", "import", 0)]
    #[case("a + c", "c", 4)]
    #[case("a ** 2", "2", 5)]
    #[case("a; b", ";", 1)]
    #[case("__class__", "__class__", 0)]
    fn test_rejects_foreign_tokens(#[case] source: &str, #[case] token: &str, #[case] position: usize) {
        match Expression::parse(source) {
            Err(RescaleError::UnrecognizedToken {
                token: t, position: p, ..
            }) => {
                assert_eq!(t, token);
                assert_eq!(p, position);
            }
            other => panic!("expected an unrecognized token, got {:?}", other),
        }
    }

    #[rstest]
    #[case("(a - b")]
    #[case("a - b)")]
    #[case("a b")]
    #[case("a -")]
    #[case("")]
    #[case("* a")]
    fn test_malformed(#[case] source: &str) {
        assert!(matches!(
            Expression::parse(source),
            Err(RescaleError::MalformedExpression { .. })
        ));
    }

    #[rstest]
    #[case(format!("{}a", "-".repeat(500_000)))]
    #[case(format!("{}a{}", "(".repeat(500_000), ")".repeat(500_000)))]
    #[case(format!("a{}", " + b".repeat(500_000)))]
    #[case(format!("a{}", " * b".repeat(MAX_DEPTH)))]
    fn test_rejects_deep_nesting(#[case] source: String) {
        assert!(matches!(
            Expression::parse(&source),
            Err(RescaleError::MalformedExpression { .. })
        ));
    }

    #[rstest]
    fn test_accepts_moderate_nesting() {
        let source = format!("{}a - b{}", "(".repeat(100), ")".repeat(100));
        let expr = Expression::parse(&source).unwrap();
        let out = expr.evaluate(array![[4.0]].view(), array![[1.0]].view()).unwrap();
        assert_eq!(out, array![[3.0]]);
    }

    #[rstest]
    fn test_shape_mismatch() {
        let expr = Expression::parse("a").unwrap();
        let result = expr.evaluate(array![[1.0]].view(), array![[1.0, 2.0]].view());
        assert!(matches!(result, Err(RescaleError::ShapeMismatch { .. })));
    }
}
